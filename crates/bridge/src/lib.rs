pub mod inbound;
pub mod page;
pub mod protocol;

pub use inbound::*;
pub use page::*;
pub use protocol::*;
