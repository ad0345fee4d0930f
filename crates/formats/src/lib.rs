pub mod command;
pub mod decoder;
pub mod encoder;
pub mod literal;

pub use command::*;
pub use decoder::{DecodeError, decode};
pub use encoder::*;
