use foundation::{CoordinateParseError, parse_lat_lng};
use state::{Marker, StateStore};

/// User action from the shell around the map.
///
/// Coordinates stay as the raw field text until applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiAction {
    AddMarker { lat: String, lng: String },
    Center { lat: String, lng: String },
    ClearAll,
}

impl UiAction {
    pub fn add_marker(lat: impl Into<String>, lng: impl Into<String>) -> Self {
        UiAction::AddMarker {
            lat: lat.into(),
            lng: lng.into(),
        }
    }

    pub fn center(lat: impl Into<String>, lng: impl Into<String>) -> Self {
        UiAction::Center {
            lat: lat.into(),
            lng: lng.into(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            UiAction::AddMarker { .. } => "add_marker",
            UiAction::Center { .. } => "center",
            UiAction::ClearAll => "clear_all",
        }
    }

    /// Applies the action to `store`.
    ///
    /// On a parse error the store is left untouched. UI markers are labelled
    /// with their ordinal position (`"1"`, `"2"`, ...).
    pub fn apply(&self, store: &mut StateStore) -> Result<(), CoordinateParseError> {
        match self {
            UiAction::AddMarker { lat, lng } => {
                let position = parse_lat_lng(lat, lng)?;
                let id = store.allocate_marker_id();
                let label = (store.len() + 1).to_string();
                store.add_marker(Marker::new(id, position, label));
            }
            UiAction::Center { lat, lng } => {
                store.set_center(parse_lat_lng(lat, lng)?);
            }
            UiAction::ClearAll => store.clear_markers(),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use foundation::{CoordinateParseError, LatLng};
    use state::StateStore;

    use super::UiAction;

    #[test]
    fn add_marker_uses_ordinal_labels() {
        let mut store = StateStore::new();
        UiAction::add_marker("1", "2").apply(&mut store).unwrap();
        UiAction::add_marker("3", "4").apply(&mut store).unwrap();

        let labels: Vec<&str> = store.markers().iter().map(|m| m.label.as_str()).collect();
        assert_eq!(labels, vec!["1", "2"]);
        assert_eq!(store.markers()[1].position, LatLng::new(3.0, 4.0));
    }

    #[test]
    fn bad_text_leaves_store_untouched() {
        let mut store = StateStore::new();
        assert_eq!(
            UiAction::add_marker("north", "2").apply(&mut store),
            Err(CoordinateParseError::NotANumber("north".to_string()))
        );
        assert_eq!(
            UiAction::center("NaN", "2").apply(&mut store),
            Err(CoordinateParseError::NotFinite("NaN".to_string()))
        );
        assert_eq!(
            UiAction::center("1", "").apply(&mut store),
            Err(CoordinateParseError::Empty)
        );
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn center_keeps_zoom() {
        let mut store = StateStore::new();
        let zoom = store.view().zoom();
        UiAction::center(" 10.5", "-20 ").apply(&mut store).unwrap();
        assert_eq!(store.view().center(), LatLng::new(10.5, -20.0));
        assert_eq!(store.view().zoom(), zoom);
    }

    #[test]
    fn clear_all_on_empty_store_still_counts_as_a_change() {
        let mut store = StateStore::new();
        UiAction::ClearAll.apply(&mut store).unwrap();
        assert_eq!(store.revision(), 1);
    }
}
