//! Transport layer: framed link, adaptive negotiation, connection actor.

mod connection;
mod link;
mod negotiate;


pub use connection::Op;
pub(crate) use connection::Connection;
pub use link::Link;
pub use negotiate::establish;
