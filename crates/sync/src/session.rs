use std::sync::Arc;

use bridge::InboundEvent;
use formats::CommandEncoder;
use runtime::SharedMetrics;
use runtime::metrics::names;
use state::{MapView, StateStore};
use tracing::{debug, info};

use crate::actions::UiAction;
use crate::controller::{CommandSink, SyncController};

/// Single owner of the map state and its renderer mirror.
///
/// Lives on the app loop; every mutation goes through `&mut self`, so the
/// store needs no locking.
#[derive(Debug)]
pub struct MapSession {
    store: StateStore,
    controller: SyncController,
    metrics: SharedMetrics,
}

impl MapSession {
    pub fn new(
        view: MapView,
        sink: Arc<dyn CommandSink>,
        metrics: SharedMetrics,
        encoder: CommandEncoder,
    ) -> Self {
        let mut store = StateStore::with_view(view);
        let controller = SyncController::attach(&mut store, sink, metrics.clone(), encoder);
        Self {
            store,
            controller,
            metrics,
        }
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Direct store access; mutations still resync.
    pub fn store_mut(&mut self) -> &mut StateStore {
        &mut self.store
    }

    /// Applies a shell action. Unparseable coordinates are ignored.
    ///
    /// Returns whether the store changed.
    pub fn apply_ui(&mut self, action: UiAction) -> bool {
        match action.apply(&mut self.store) {
            Ok(()) => true,
            Err(err) => {
                debug!(action = action.name(), "ignored: {err}");
                self.metrics
                    .lock()
                    .inc_counter(names::SYNC_IGNORED_INPUT, 1);
                false
            }
        }
    }

    pub fn apply_inbound(&mut self, event: InboundEvent) {
        match event {
            InboundEvent::RendererReady { session } => {
                info!(%session, "renderer ready, full resync");
                self.controller.resync_now(&self.store);
            }
            InboundEvent::WaypointAdded { position } => {
                self.controller.on_waypoint_added(&mut self.store, position);
            }
            InboundEvent::RendererClosed { session } => {
                info!(%session, "renderer closed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bridge::InboundEvent;
    use formats::CommandEncoder;
    use foundation::LatLng;
    use runtime::Metrics;
    use runtime::metrics::names;
    use state::MapView;

    use super::MapSession;
    use crate::actions::UiAction;
    use crate::controller::RecordingSink;

    fn session() -> (MapSession, RecordingSink, runtime::SharedMetrics) {
        let sink = RecordingSink::new();
        let metrics = Metrics::shared();
        let session = MapSession::new(
            MapView::default(),
            Arc::new(sink.clone()),
            metrics.clone(),
            CommandEncoder::new(),
        );
        (session, sink, metrics)
    }

    #[test]
    fn ignored_ui_input_dispatches_nothing() {
        let (mut session, sink, metrics) = session();
        assert!(!session.apply_ui(UiAction::add_marker("abc", "1")));
        assert!(sink.scripts().is_empty());
        assert_eq!(metrics.lock().counter(names::SYNC_IGNORED_INPUT), 1);
    }

    #[test]
    fn ready_replays_current_state() {
        let (mut session, sink, _) = session();
        session.apply_ui(UiAction::add_marker("1", "2"));
        sink.take();

        session.apply_inbound(InboundEvent::RendererReady {
            session: "s".to_string(),
        });
        assert_eq!(
            sink.take(),
            vec![
                "setViewport(22.904888, 120.2719823, 20);",
                "clearAllMarkers();",
                "addMarker('m1', 1, 2, '1');",
            ]
        );
    }

    #[test]
    fn closing_is_not_a_state_change() {
        let (mut session, sink, _) = session();
        session.apply_inbound(InboundEvent::RendererClosed {
            session: "s".to_string(),
        });
        assert_eq!(session.store().revision(), 0);
        assert!(sink.scripts().is_empty());
    }

    #[test]
    fn waypoint_event_adds_marker() {
        let (mut session, _, _) = session();
        session.apply_inbound(InboundEvent::WaypointAdded {
            position: LatLng::new(22.9, 120.3),
        });
        assert_eq!(session.store().len(), 1);
        assert_eq!(session.store().markers()[0].label, "WP1");
    }
}
