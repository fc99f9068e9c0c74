//! The metric reconciliation core: label memory, the gauge sink, and the
//! engine that turns one status snapshot into a full set of gauge values.

pub mod engine;
pub mod label_memory;
pub mod sink;

pub use engine::Exporter;
pub use label_memory::LabelMemory;
pub use sink::MetricSink;
