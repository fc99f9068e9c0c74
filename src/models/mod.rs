// This module re-exports the status record types for convenience,
// so we can "use crate::models::*" easily.
pub mod agent;
pub mod backup;
pub mod pitr;

pub use agent::*;
pub use backup::*;
pub use pitr::*;

/// Everything obtained from a single read of the PBM status collections.
///
/// A snapshot is produced once per scrape and handed to the reconciliation
/// engine as a unit, so the published metrics are always derived from one
/// self-consistent read.
#[derive(Debug, Clone, Default)]
pub struct StatusSnapshot {
    /// Backup entries, sorted by name descending (most recent first).
    pub backups: Vec<BackupEntry>,
    /// Agent entries, sorted by node name ascending.
    pub agents: Vec<AgentEntry>,
    /// PITR status. `None` means PITR is disabled in the PBM config.
    pub pitr: Option<PitrStatus>,
}
