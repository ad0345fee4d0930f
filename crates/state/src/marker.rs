use foundation::{LatLng, MarkerId};

/// Point of interest in native state, mirrored as a layer on the renderer.
///
/// An empty label means "no popup".
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub id: MarkerId,
    pub position: LatLng,
    pub label: String,
}

impl Marker {
    pub fn new(id: impl Into<MarkerId>, position: LatLng, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            position,
            label: label.into(),
        }
    }

    pub fn lat(&self) -> f64 {
        self.position.lat
    }

    pub fn lng(&self) -> f64 {
        self.position.lng
    }
}
