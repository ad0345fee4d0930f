/// WGS84 position in decimal degrees.
///
/// No range normalization is applied: the renderer accepts whatever it is
/// handed, so values are carried through exactly as entered.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinateParseError {
    Empty,
    NotANumber(String),
    NotFinite(String),
}

impl std::fmt::Display for CoordinateParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoordinateParseError::Empty => write!(f, "coordinate text is empty"),
            CoordinateParseError::NotANumber(text) => write!(f, "not a number: {text:?}"),
            CoordinateParseError::NotFinite(text) => write!(f, "not a finite number: {text:?}"),
        }
    }
}

impl std::error::Error for CoordinateParseError {}

/// Parses one free-text coordinate component (as typed into a UI field).
///
/// Surrounding whitespace is ignored. Rust's float grammar also accepts
/// `inf` and `NaN`, which are rejected here.
pub fn parse_degrees(text: &str) -> Result<f64, CoordinateParseError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(CoordinateParseError::Empty);
    }
    let value: f64 = trimmed
        .parse()
        .map_err(|_| CoordinateParseError::NotANumber(trimmed.to_string()))?;
    if !value.is_finite() {
        return Err(CoordinateParseError::NotFinite(trimmed.to_string()));
    }
    Ok(value)
}

/// Parses a latitude/longitude pair from two text fields.
pub fn parse_lat_lng(lat: &str, lng: &str) -> Result<LatLng, CoordinateParseError> {
    Ok(LatLng::new(parse_degrees(lat)?, parse_degrees(lng)?))
}

#[cfg(test)]
mod tests {
    use super::{CoordinateParseError, LatLng, parse_degrees, parse_lat_lng};

    #[test]
    fn parses_trimmed_decimals() {
        assert_eq!(parse_degrees(" 22.904888 "), Ok(22.904888));
        assert_eq!(parse_degrees("-120"), Ok(-120.0));
        assert_eq!(parse_degrees("1e-3"), Ok(0.001));
    }

    #[test]
    fn rejects_non_numeric_text() {
        assert_eq!(parse_degrees(""), Err(CoordinateParseError::Empty));
        assert_eq!(parse_degrees("   "), Err(CoordinateParseError::Empty));
        assert_eq!(
            parse_degrees("north"),
            Err(CoordinateParseError::NotANumber("north".to_string()))
        );
        // Locale-style decimal commas are not accepted.
        assert!(parse_degrees("22,9").is_err());
    }

    #[test]
    fn rejects_non_finite_values() {
        assert!(matches!(
            parse_degrees("inf"),
            Err(CoordinateParseError::NotFinite(_))
        ));
        assert!(matches!(
            parse_degrees("NaN"),
            Err(CoordinateParseError::NotFinite(_))
        ));
    }

    #[test]
    fn pair_fails_if_either_side_fails() {
        assert_eq!(parse_lat_lng("1.5", "2.5"), Ok(LatLng::new(1.5, 2.5)));
        assert!(parse_lat_lng("1.5", "").is_err());
        assert!(parse_lat_lng("x", "2.5").is_err());
    }
}
