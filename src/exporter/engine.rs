//! The reconciliation engine.
//!
//! One scrape is one pass: read a snapshot of the PBM status collections,
//! then rewrite the gauge sink so it reflects exactly that read. The only
//! cross-scrape state is the label memory of backup statuses, which exists
//! so series for statuses absent from the current read are published at
//! zero instead of disappearing.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::exporter::{LabelMemory, MetricSink};
use crate::models::StatusSnapshot;
use crate::store::{ScrapeError, StatusSource};

/// Node health is a fixed binary vocabulary. The agent population is
/// re-enumerated on every read, so zeroing crosses the full current
/// population with both values instead of using label memory.
const NODE_STATUSES: [&str; 2] = ["ok", "error"];

pub struct Exporter {
    source: Arc<dyn StatusSource>,
    memory: LabelMemory,
    sink: MetricSink,
}

impl Exporter {
    pub fn new(source: Arc<dyn StatusSource>) -> Self {
        Exporter {
            source,
            memory: LabelMemory::new(),
            sink: MetricSink::new(),
        }
    }

    /// Performs one scrape: read, reconcile, render.
    ///
    /// A read failure surfaces here and leaves the sink untouched; metric
    /// state is only written once a full snapshot was obtained, so a
    /// failed scrape never commits partial values.
    pub async fn scrape(&self) -> Result<String, ScrapeError> {
        let snapshot = self.source.snapshot().await?;
        self.reconcile(&snapshot, Utc::now());
        Ok(self.sink.render())
    }

    /// Rewrites the sink from one snapshot, taken at wall-clock `now`.
    pub fn reconcile(&self, snapshot: &StatusSnapshot, now: DateTime<Utc>) {
        self.reconcile_backups(snapshot, now);
        self.reconcile_nodes(snapshot);
        self.reconcile_pitr(snapshot, now);
    }

    fn reconcile_backups(&self, snapshot: &StatusSnapshot, now: DateTime<Utc>) {
        for backup in &snapshot.backups {
            self.memory.observe(&backup.status);
        }
        let known = self.memory.known_statuses();

        let mut counts: HashMap<&str, u64> = HashMap::new();
        for backup in &snapshot.backups {
            *counts.entry(backup.status.as_str()).or_insert(0) += 1;
        }

        // Per-name series are rebuilt from scratch: names have unbounded
        // cardinality, so vanished names are dropped rather than zeroed.
        // Totals instead cover every status ever seen, zero when absent.
        self.sink.clear_snapshot_series();
        for status in &known {
            let count = counts.get(status.as_str()).copied().unwrap_or(0);
            self.sink.set_snapshots_total(status, count as f64);
            self.sink.set_last_snapshot(status, 0.0);
            for backup in &snapshot.backups {
                let value = if backup.status == *status { 1.0 } else { 0.0 };
                self.sink.set_snapshot(&backup.name, status, value);
            }
        }

        // Backups arrive sorted by name descending, so the first entry is
        // the most recent one. An empty read has zeroed every known status
        // above; the error and age gauges are left as they were.
        if let Some(last) = snapshot.backups.first() {
            self.sink.set_last_snapshot(&last.status, 1.0);
            self.sink
                .set_last_snapshot_error(if last.status == "error" { 1.0 } else { 0.0 });

            // Backup names are normally RFC 3339 timestamps. A name that
            // does not parse skips the age gauge and nothing else.
            if let Ok(started) = DateTime::parse_from_rfc3339(&last.name) {
                let since = (now - started.with_timezone(&Utc)).num_milliseconds() as f64 / 1000.0;
                self.sink.set_last_snapshot_since(since);
            }
        }
    }

    fn reconcile_nodes(&self, snapshot: &StatusSnapshot) {
        self.sink.clear_node_series();
        for status in NODE_STATUSES {
            self.sink.set_nodes_total(status, 0.0);
            for agent in &snapshot.agents {
                self.sink
                    .set_node(&agent.replica_set, &agent.host(), status, 0.0);
            }
        }

        let mut counts: HashMap<&str, u64> = HashMap::new();
        for agent in &snapshot.agents {
            let status = agent.status();
            *counts.entry(status).or_insert(0) += 1;
            self.sink
                .set_node(&agent.replica_set, &agent.host(), status, 1.0);
        }
        for (status, count) in counts {
            self.sink.set_nodes_total(status, count as f64);
        }
    }

    fn reconcile_pitr(&self, snapshot: &StatusSnapshot, now: DateTime<Utc>) {
        // When PITR is disabled the four gauges are not touched at all and
        // keep whatever the previous enabled read left behind.
        let Some(pitr) = &snapshot.pitr else {
            return;
        };
        let now_epoch = now.timestamp();

        self.sink
            .set_pitr_error(if pitr.is_stale(now_epoch) { 1.0 } else { 0.0 });
        if let Some(count) = pitr.chunk_count {
            self.sink.set_pitr_chunks_total(count as f64);
        }
        if let Some(end) = pitr.last_chunk_end {
            self.sink.set_last_pitr_chunk_since((now_epoch - end) as f64);
        }
    }
}
