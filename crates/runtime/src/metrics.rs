use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

/// Counter and gauge names used across the workspace.
pub mod names {
    pub const SYNC_RESYNCS: &str = "sync.resyncs";
    pub const SYNC_COMMANDS: &str = "sync.commands";
    pub const SYNC_WAYPOINTS: &str = "sync.waypoints";
    pub const SYNC_IGNORED_INPUT: &str = "sync.ignored_input";
    pub const INBOUND_WAYPOINTS: &str = "inbound.waypoints";
    pub const INBOUND_DROPPED_NOT_READY: &str = "inbound.dropped_not_ready";
    pub const INBOUND_APPLIED: &str = "inbound.applied";
    pub const INBOUND_MALFORMED: &str = "inbound.malformed";
    pub const OUTBOX_SENT: &str = "outbox.sent";
    pub const OUTBOX_DROPPED: &str = "outbox.dropped";
    pub const STATE_MARKERS: &str = "state.markers";
}

/// Deterministic counters and gauges.
///
/// Metrics must not depend on wall-clock time or unordered iteration.
/// This type uses sorted maps so snapshots have stable ordering.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Metrics {
    counters: BTreeMap<String, u64>,
    gauges: BTreeMap<String, i64>,
}

/// Metrics shared between the app loop and the transport tasks.
pub type SharedMetrics = Arc<Mutex<Metrics>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub counters: Vec<(String, u64)>,
    pub gauges: Vec<(String, i64)>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedMetrics {
        Arc::new(Mutex::new(Self::new()))
    }

    pub fn counter(&self, name: &str) -> u64 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    pub fn inc_counter(&mut self, name: impl Into<String>, by: u64) {
        *self.counters.entry(name.into()).or_insert(0) += by;
    }

    pub fn gauge(&self, name: &str) -> Option<i64> {
        self.gauges.get(name).copied()
    }

    pub fn set_gauge(&mut self, name: impl Into<String>, value: i64) {
        self.gauges.insert(name.into(), value);
    }

    /// Returns a stable, sorted snapshot suitable for logs and the status endpoint.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            counters: self.counters.iter().map(|(k, v)| (k.clone(), *v)).collect(),
            gauges: self.gauges.iter().map(|(k, v)| (k.clone(), *v)).collect(),
        }
    }
}
