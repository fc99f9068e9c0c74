//! Shared application state.

use crate::config::Config;
use crate::exporter::Exporter;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Cloned per request; the exporter (label memory plus gauge sink) lives
/// for the process lifetime behind the Arc.
#[derive(Clone)]
pub struct AppState {
    /// Process configuration loaded at startup.
    pub config: Arc<Config>,
    /// The reconciliation engine driving the gauge sink.
    pub exporter: Arc<Exporter>,
}
