/// Point-in-time-recovery status, read only when PITR is enabled in the
/// PBM config.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PitrStatus {
    /// Heartbeat of the active PITR lock, in epoch seconds. `None` means
    /// no lock document was found in either lock registry, which counts
    /// as a stale heartbeat rather than an error.
    pub heartbeat: Option<i64>,
    /// Estimated number of oplog chunks. `None` when the count query
    /// failed (degraded read, logged as a warning).
    pub chunk_count: Option<u64>,
    /// End timestamp of the newest chunk (greatest start timestamp),
    /// in epoch seconds.
    pub last_chunk_end: Option<i64>,
}

/// Heartbeats older than this are considered stale and flip
/// `pbm_pitr_error` to 1.
pub const PITR_HEARTBEAT_STALE_SECS: i64 = 30;

impl PitrStatus {
    /// PITR is in error when there is no heartbeat at all, or the
    /// heartbeat has not been refreshed within the staleness window.
    pub fn is_stale(&self, now_epoch: i64) -> bool {
        match self.heartbeat {
            Some(hb) => hb + PITR_HEARTBEAT_STALE_SECS < now_epoch,
            None => true,
        }
    }
}
