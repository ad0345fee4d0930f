pub mod actions;
pub mod controller;
pub mod session;

pub use actions::*;
pub use controller::*;
pub use session::*;
