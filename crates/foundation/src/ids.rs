/// Marker identifier shared by the native store and the renderer's layer map.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(String);

impl MarkerId {
    pub fn new(id: impl Into<String>) -> Self {
        MarkerId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MarkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MarkerId {
    fn from(id: &str) -> Self {
        MarkerId::new(id)
    }
}

/// Monotonic `m1`, `m2`, ... allocator.
///
/// The counter never moves backwards, so an identifier is never handed out
/// twice even after the owning collection is cleared.
#[derive(Debug, Default)]
pub struct IdAllocator {
    issued: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> MarkerId {
        self.issued += 1;
        MarkerId(format!("m{}", self.issued))
    }
}

#[cfg(test)]
mod tests {
    use super::{IdAllocator, MarkerId};

    #[test]
    fn allocates_sequential_ids() {
        let mut ids = IdAllocator::new();
        assert_eq!(ids.next_id(), MarkerId::new("m1"));
        assert_eq!(ids.next_id(), MarkerId::new("m2"));
    }

    #[test]
    fn display_is_the_raw_identifier() {
        assert_eq!(MarkerId::from("m7").to_string(), "m7");
    }
}
