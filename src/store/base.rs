use std::fmt;

use async_trait::async_trait;

use crate::models::StatusSnapshot;

/// Failure of a scrape's read phase. Reconciliation itself cannot fail:
/// once a snapshot was obtained, all metric writes succeed, so an error
/// here means no metric state was committed for the scrape.
#[derive(Debug)]
pub enum ScrapeError {
    /// The coordination store was unreachable, after one bounded retry.
    Connect(String),
    /// A fatal read failed (backups or agents). Degraded reads (config,
    /// PITR lock/chunks) are logged and never surface here.
    Query {
        operation: &'static str,
        cause: String,
    },
}

impl fmt::Display for ScrapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScrapeError::Connect(cause) => {
                write!(f, "failed to connect to MongoDB: {}", cause)
            }
            ScrapeError::Query { operation, cause } => {
                write!(f, "failed to {}: {}", operation, cause)
            }
        }
    }
}

impl std::error::Error for ScrapeError {}

/// The StatusSource trait abstracts the read phase of a scrape: one call,
/// one self-consistent snapshot of the PBM status collections.
///
/// The production implementation opens a short-lived MongoDB connection
/// per call; tests substitute a stub that returns canned snapshots.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn snapshot(&self) -> Result<StatusSnapshot, ScrapeError>;
}
