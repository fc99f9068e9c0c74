//! The gauge sink backing the exposition endpoint.

use prometheus::{
    Encoder, Gauge, GaugeVec, Opts, Registry, TextEncoder, register_gauge_vec_with_registry,
    register_gauge_with_registry,
};
use std::sync::Arc;

/// The full set of exposed gauge families, registered on an explicitly
/// owned registry rather than the process-global one.
///
/// Every family is a last-value-wins gauge: writing a (family, label set)
/// key overwrites its value, and `render` serializes whatever the latest
/// reconciliation pass left behind. The metric names are a compatibility
/// surface consumed by existing dashboards; do not rename them.
#[derive(Clone)]
pub struct MetricSink {
    registry: Arc<Registry>,

    // Snapshot (backup) metrics
    snapshots_total: GaugeVec,
    snapshots: GaugeVec,
    last_snapshot: GaugeVec,
    last_snapshot_error: Gauge,
    last_snapshot_since_seconds: Gauge,

    // Node metrics
    nodes_total: GaugeVec,
    nodes: GaugeVec,

    // PITR metrics
    pitr_chunks_total: Gauge,
    pitr_error: Gauge,
    last_pitr_chunk_since_seconds: Gauge,
}

impl MetricSink {
    /// Creates a sink with all ten families registered.
    pub fn new() -> Self {
        let registry = Arc::new(Registry::new());

        let snapshots_total = register_gauge_vec_with_registry!(
            Opts::new("pbm_snapshots_total", "Number of snapshots per status"),
            &["status"],
            registry.clone()
        )
        .expect("Failed to register pbm_snapshots_total");

        let snapshots = register_gauge_vec_with_registry!(
            Opts::new("pbm_snapshots", "Detail of snapshots with statuses"),
            &["name", "status"],
            registry.clone()
        )
        .expect("Failed to register pbm_snapshots");

        let last_snapshot = register_gauge_vec_with_registry!(
            Opts::new("pbm_last_snapshot", "Status of last snapshot"),
            &["status"],
            registry.clone()
        )
        .expect("Failed to register pbm_last_snapshot");

        let last_snapshot_error = register_gauge_with_registry!(
            Opts::new("pbm_last_snapshot_error", "1 if last snapshot is in error"),
            registry.clone()
        )
        .expect("Failed to register pbm_last_snapshot_error");

        let last_snapshot_since_seconds = register_gauge_with_registry!(
            Opts::new("pbm_last_snapshot_since_seconds", "Time since last snapshot"),
            registry.clone()
        )
        .expect("Failed to register pbm_last_snapshot_since_seconds");

        let nodes_total = register_gauge_vec_with_registry!(
            Opts::new("pbm_nodes_total", "Number of nodes per status"),
            &["status"],
            registry.clone()
        )
        .expect("Failed to register pbm_nodes_total");

        let nodes = register_gauge_vec_with_registry!(
            Opts::new("pbm_nodes", "Detail of nodes with statuses"),
            &["rs", "host", "status"],
            registry.clone()
        )
        .expect("Failed to register pbm_nodes");

        let pitr_chunks_total = register_gauge_with_registry!(
            Opts::new("pbm_pitr_chunks_total", "Number of PITR chunks"),
            registry.clone()
        )
        .expect("Failed to register pbm_pitr_chunks_total");

        let pitr_error = register_gauge_with_registry!(
            Opts::new("pbm_pitr_error", "1 if PITR is in error"),
            registry.clone()
        )
        .expect("Failed to register pbm_pitr_error");

        let last_pitr_chunk_since_seconds = register_gauge_with_registry!(
            Opts::new(
                "pbm_last_pitr_chunk_since_seconds",
                "Time since last PITR chunk"
            ),
            registry.clone()
        )
        .expect("Failed to register pbm_last_pitr_chunk_since_seconds");

        MetricSink {
            registry,
            snapshots_total,
            snapshots,
            last_snapshot,
            last_snapshot_error,
            last_snapshot_since_seconds,
            nodes_total,
            nodes,
            pitr_chunks_total,
            pitr_error,
            last_pitr_chunk_since_seconds,
        }
    }

    /// Drops every per-name snapshot series. Backup name cardinality is
    /// unbounded, so series for names absent from the current read are
    /// removed outright instead of being zeroed.
    pub fn clear_snapshot_series(&self) {
        self.snapshots.reset();
    }

    pub fn set_snapshot(&self, name: &str, status: &str, value: f64) {
        self.snapshots.with_label_values(&[name, status]).set(value);
    }

    pub fn set_snapshots_total(&self, status: &str, value: f64) {
        self.snapshots_total.with_label_values(&[status]).set(value);
    }

    pub fn set_last_snapshot(&self, status: &str, value: f64) {
        self.last_snapshot.with_label_values(&[status]).set(value);
    }

    pub fn set_last_snapshot_error(&self, value: f64) {
        self.last_snapshot_error.set(value);
    }

    pub fn set_last_snapshot_since(&self, seconds: f64) {
        self.last_snapshot_since_seconds.set(seconds);
    }

    /// Drops every per-node series; the agent population is re-enumerated
    /// on each read.
    pub fn clear_node_series(&self) {
        self.nodes.reset();
    }

    pub fn set_node(&self, replica_set: &str, host: &str, status: &str, value: f64) {
        self.nodes
            .with_label_values(&[replica_set, host, status])
            .set(value);
    }

    pub fn set_nodes_total(&self, status: &str, value: f64) {
        self.nodes_total.with_label_values(&[status]).set(value);
    }

    pub fn set_pitr_chunks_total(&self, value: f64) {
        self.pitr_chunks_total.set(value);
    }

    pub fn set_pitr_error(&self, value: f64) {
        self.pitr_error.set(value);
    }

    pub fn set_last_pitr_chunk_since(&self, seconds: f64) {
        self.last_pitr_chunk_since_seconds.set(seconds);
    }

    /// Renders all families in the Prometheus text exposition format.
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .expect("Failed to encode metrics");
        String::from_utf8(buffer).expect("Metrics encoding produced invalid UTF-8")
    }
}

impl Default for MetricSink {
    fn default() -> Self {
        MetricSink::new()
    }
}
