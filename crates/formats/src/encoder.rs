use state::{MapState, MapView, Marker};

use crate::command::RendererCommand;

/// Builds the full-resync command sequence for a state snapshot.
///
/// Order is fixed: viewport first (so markers are not placed under the old
/// viewport), then clear (so re-adding cannot duplicate layers), then one
/// add per marker in collection order. The optional route comes last.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommandEncoder {
    draw_route: bool,
}

impl CommandEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also emit a `drawPath` through every marker after the adds.
    pub fn with_route(mut self, draw_route: bool) -> Self {
        self.draw_route = draw_route;
        self
    }

    pub fn commands(&self, view: &MapView, markers: &[Marker]) -> Vec<RendererCommand> {
        let mut out = Vec::with_capacity(markers.len() + 3);
        out.push(RendererCommand::SetViewport {
            center: view.center(),
            zoom: Some(view.zoom()),
        });
        out.push(RendererCommand::ClearAllMarkers);
        out.extend(markers.iter().map(|m| RendererCommand::AddMarker {
            id: m.id.clone(),
            position: m.position,
            label: m.label.clone(),
        }));
        if self.draw_route {
            out.push(RendererCommand::DrawPath {
                points: markers.iter().map(|m| m.position).collect(),
            });
        }
        out
    }

    /// Script statements for [`CommandEncoder::commands`].
    pub fn encode(&self, view: &MapView, markers: &[Marker]) -> Vec<String> {
        self.commands(view, markers)
            .iter()
            .map(RendererCommand::to_script)
            .collect()
    }

    pub fn encode_state(&self, state: &MapState) -> Vec<String> {
        self.encode(&state.view, &state.markers)
    }
}
