use foundation::{LatLng, MarkerId};

use crate::literal::{format_number, quote};

/// Renderer-side function names. The page shim defines one global function
/// per command kind.
pub const SET_VIEWPORT: &str = "setViewport";
pub const CLEAR_ALL_MARKERS: &str = "clearAllMarkers";
pub const ADD_MARKER: &str = "addMarker";
pub const DRAW_PATH: &str = "drawPath";

/// A single fire-and-forget instruction for the map renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum RendererCommand {
    /// `zoom: None` keeps the renderer's current zoom.
    SetViewport { center: LatLng, zoom: Option<f64> },
    ClearAllMarkers,
    /// Creates or overwrites the renderer layer keyed by `id`.
    AddMarker {
        id: MarkerId,
        position: LatLng,
        label: String,
    },
    /// Replaces the route polyline; fewer than two points just clears it.
    DrawPath { points: Vec<LatLng> },
}

impl RendererCommand {
    pub fn name(&self) -> &'static str {
        match self {
            RendererCommand::SetViewport { .. } => SET_VIEWPORT,
            RendererCommand::ClearAllMarkers => CLEAR_ALL_MARKERS,
            RendererCommand::AddMarker { .. } => ADD_MARKER,
            RendererCommand::DrawPath { .. } => DRAW_PATH,
        }
    }

    /// Renders the command as one script statement, e.g.
    /// `addMarker('m1', 1, 2, 'O\'Brien');`.
    pub fn to_script(&self) -> String {
        let args = match self {
            RendererCommand::SetViewport { center, zoom } => {
                let zoom = zoom.map_or_else(|| "null".to_string(), format_number);
                format!(
                    "{}, {}, {zoom}",
                    format_number(center.lat),
                    format_number(center.lng)
                )
            }
            RendererCommand::ClearAllMarkers => String::new(),
            RendererCommand::AddMarker {
                id,
                position,
                label,
            } => format!(
                "{}, {}, {}, {}",
                quote(id.as_str()),
                format_number(position.lat),
                format_number(position.lng),
                quote(label)
            ),
            RendererCommand::DrawPath { points } => {
                let pairs: Vec<String> = points
                    .iter()
                    .map(|p| format!("[{}, {}]", format_number(p.lat), format_number(p.lng)))
                    .collect();
                format!("[{}]", pairs.join(", "))
            }
        };
        format!("{}({args});", self.name())
    }
}
