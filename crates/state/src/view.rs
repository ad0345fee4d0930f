use foundation::LatLng;

/// Initial map center (the launch site the console was built around).
pub const DEFAULT_CENTER: LatLng = LatLng::new(22.904888, 120.2719823);

/// Initial zoom level. The renderer defines the usable range.
pub const DEFAULT_ZOOM: f64 = 20.0;

/// Viewport state: always replaced as a whole.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MapView {
    center: LatLng,
    zoom: f64,
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
        }
    }
}

impl MapView {
    pub fn new(center: LatLng, zoom: f64) -> Self {
        Self {
            center,
            zoom: sanitize_zoom(zoom),
        }
    }

    pub fn center(&self) -> LatLng {
        self.center
    }

    /// Never negative, never NaN.
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn with_center(self, center: LatLng) -> Self {
        Self { center, ..self }
    }

    pub fn with_zoom(self, zoom: f64) -> Self {
        Self {
            zoom: sanitize_zoom(zoom),
            ..self
        }
    }
}

/// Zoom is non-negative; negative and non-finite levels collapse to 0.
fn sanitize_zoom(zoom: f64) -> f64 {
    if zoom.is_finite() { zoom.max(0.0) } else { 0.0 }
}
