//! ABOUTME: Prometheus registry adapter with idempotent instrument registration
//! ABOUTME: Owns metric definitions, collision handling and text exposition

pub mod definition;
pub mod instrument;
pub mod registry;

pub use definition::{MetricDefinition, MetricKind};
pub use instrument::{CounterVec, GaugeVec, HistogramVec, Instrument};
pub use registry::{MetricsRegistry, Registration};
