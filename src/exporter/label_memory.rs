use std::collections::BTreeSet;
use std::sync::Mutex;

/// Process-lifetime memory of every backup status string ever observed.
///
/// Once a status has appeared, its metric series must keep being emitted
/// (at zero when absent) so alerting rules never confuse a disappeared
/// series with "still true". The set only grows; the vocabulary is small
/// and owned by PBM, so unbounded growth is acceptable. Nothing is
/// persisted across restarts, so rare historical statuses are absent
/// until re-observed.
#[derive(Default)]
pub struct LabelMemory {
    statuses: Mutex<BTreeSet<String>>,
}

impl LabelMemory {
    pub fn new() -> Self {
        LabelMemory::default()
    }

    /// Records a status as seen. Safe under concurrent scrapes.
    pub fn observe(&self, status: &str) {
        let mut statuses = self.statuses.lock().expect("label memory lock poisoned");
        if !statuses.contains(status) {
            statuses.insert(status.to_string());
        }
    }

    /// Returns every status ever observed, in stable sorted order.
    pub fn known_statuses(&self) -> Vec<String> {
        let statuses = self.statuses.lock().expect("label memory lock poisoned");
        statuses.iter().cloned().collect()
    }
}
