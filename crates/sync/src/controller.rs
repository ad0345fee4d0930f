use std::sync::Arc;

use formats::CommandEncoder;
use foundation::{LatLng, MarkerId};
use parking_lot::Mutex;
use runtime::metrics::names;
use runtime::{ObserverId, Outbox, SharedMetrics};
use state::{MapState, Marker, StateStore};
use tracing::{debug, warn};

/// Fire-and-forget destination for renderer script statements.
///
/// Implementations must not block and must keep dispatch order.
pub trait CommandSink: Send + Sync {
    fn dispatch(&self, script: String);
}

impl CommandSink for Outbox<String> {
    fn dispatch(&self, script: String) {
        // Nothing attached: the statement is lost, which the outbox counts.
        let _ = self.send(script);
    }
}

/// Sink that keeps every statement in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    scripts: Arc<Mutex<Vec<String>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scripts(&self) -> Vec<String> {
        self.scripts.lock().clone()
    }

    /// Returns and forgets everything recorded so far.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.scripts.lock())
    }
}

impl CommandSink for RecordingSink {
    fn dispatch(&self, script: String) {
        self.scripts.lock().push(script);
    }
}

/// One full-resync pass, cloned into the store observer.
#[derive(Clone)]
struct Resync {
    sink: Arc<dyn CommandSink>,
    metrics: SharedMetrics,
    encoder: CommandEncoder,
}

impl Resync {
    fn run(&self, state: &MapState) {
        let scripts = self.encoder.encode_state(state);
        debug!(
            revision = state.revision,
            markers = state.markers.len(),
            commands = scripts.len(),
            "resync"
        );
        {
            let mut metrics = self.metrics.lock();
            metrics.inc_counter(names::SYNC_RESYNCS, 1);
            metrics.inc_counter(names::SYNC_COMMANDS, scripts.len() as u64);
            metrics.set_gauge(names::STATE_MARKERS, state.markers.len() as i64);
        }
        for script in scripts {
            self.sink.dispatch(script);
        }
    }
}

/// Keeps the renderer mirrored to a [`StateStore`].
///
/// Every store notification triggers a full resync: viewport, clear, then
/// one add per marker. There is no diffing, so after a resync completes
/// the renderer depends only on the state it was given.
pub struct SyncController {
    resync: Resync,
    observer: ObserverId,
}

impl std::fmt::Debug for SyncController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncController")
            .field("observer", &self.observer)
            .field("encoder", &self.resync.encoder)
            .finish()
    }
}

impl SyncController {
    /// Subscribes to `store`. Later mutations resync through `sink`.
    pub fn attach(
        store: &mut StateStore,
        sink: Arc<dyn CommandSink>,
        metrics: SharedMetrics,
        encoder: CommandEncoder,
    ) -> Self {
        let resync = Resync {
            sink,
            metrics,
            encoder,
        };
        let observer_resync = resync.clone();
        let observer = store.subscribe(move |state| observer_resync.run(state));
        Self { resync, observer }
    }

    pub fn detach(self, store: &mut StateStore) -> bool {
        store.unsubscribe(self.observer)
    }

    /// Resyncs without a state change, e.g. for a freshly loaded renderer.
    pub fn resync_now(&self, store: &StateStore) {
        self.resync.run(store.state());
    }

    /// Turns a renderer waypoint report into a canonical marker.
    ///
    /// The marker gets a fresh store id and a `WP<n>` label, `n` being its
    /// position after insertion. Returns `None` for non-finite positions.
    pub fn on_waypoint_added(&self, store: &mut StateStore, position: LatLng) -> Option<MarkerId> {
        if !position.is_finite() {
            warn!(lat = position.lat, lng = position.lng, "non-finite waypoint ignored");
            self.resync
                .metrics
                .lock()
                .inc_counter(names::SYNC_IGNORED_INPUT, 1);
            return None;
        }
        let id = store.allocate_marker_id();
        let label = format!("WP{}", store.len() + 1);
        debug!(%id, %label, lat = position.lat, lng = position.lng, "waypoint");
        self.resync
            .metrics
            .lock()
            .inc_counter(names::SYNC_WAYPOINTS, 1);
        store.add_marker(Marker::new(id.clone(), position, label));
        Some(id)
    }
}
