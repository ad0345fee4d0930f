pub mod metrics;
pub mod observers;
pub mod outbox;

pub use metrics::{Metrics, MetricsSnapshot, SharedMetrics};
pub use observers::*;
pub use outbox::*;
