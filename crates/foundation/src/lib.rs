pub mod coords;
pub mod ids;

// Foundation crate: small, well-tested primitives only.
pub use coords::*;
pub use ids::*;
