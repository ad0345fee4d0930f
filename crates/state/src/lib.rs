pub mod marker;
pub mod store;
pub mod view;

pub use marker::*;
pub use store::*;
pub use view::*;
