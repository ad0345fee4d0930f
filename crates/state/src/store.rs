use foundation::{IdAllocator, LatLng, MarkerId};
use runtime::{ObserverId, Observers};
use tracing::debug;

use crate::marker::Marker;
use crate::view::MapView;

/// Everything an observer can read after a change notification.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapState {
    /// Bumped by exactly one on every mutation.
    pub revision: u64,
    pub view: MapView,
    /// Insertion order is presentation order.
    pub markers: Vec<Marker>,
}

/// Canonical native map state.
///
/// Contract:
/// - Every mutating call is synchronous and fires exactly one notification,
///   even when it leaves the data unchanged (e.g. clearing an empty store).
/// - Notifications carry no diff; observers receive the full [`MapState`].
/// - Marker ids are not checked for uniqueness by `add_marker`. Callers get
///   unique ids from [`StateStore::allocate_marker_id`].
/// - There is no per-marker removal; `clear_markers` is the only way to
///   remove markers.
#[derive(Debug, Default)]
pub struct StateStore {
    state: MapState,
    ids: IdAllocator,
    observers: Observers<MapState>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_view(view: MapView) -> Self {
        Self {
            state: MapState {
                view,
                ..MapState::default()
            },
            ..Self::default()
        }
    }

    pub fn subscribe(&mut self, observer: impl FnMut(&MapState) + Send + 'static) -> ObserverId {
        self.observers.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        self.observers.unsubscribe(id)
    }

    pub fn state(&self) -> &MapState {
        &self.state
    }

    pub fn view(&self) -> MapView {
        self.state.view
    }

    pub fn markers(&self) -> &[Marker] {
        &self.state.markers
    }

    pub fn len(&self) -> usize {
        self.state.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.markers.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.state.revision
    }

    /// Hands out a marker id that this store has never issued before.
    ///
    /// Allocation alone is not a state change and fires no notification.
    pub fn allocate_marker_id(&mut self) -> MarkerId {
        self.ids.next_id()
    }

    pub fn add_marker(&mut self, marker: Marker) {
        debug!(id = %marker.id, lat = marker.lat(), lng = marker.lng(), "add marker");
        self.state.markers.push(marker);
        self.changed();
    }

    pub fn clear_markers(&mut self) {
        debug!(count = self.state.markers.len(), "clear markers");
        self.state.markers.clear();
        self.changed();
    }

    pub fn set_center(&mut self, center: LatLng) {
        debug!(lat = center.lat, lng = center.lng, "set center");
        self.state.view = self.state.view.with_center(center);
        self.changed();
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        debug!(zoom, "set zoom");
        self.state.view = self.state.view.with_zoom(zoom);
        self.changed();
    }

    fn changed(&mut self) {
        self.state.revision += 1;
        self.observers.notify(&self.state);
    }
}
