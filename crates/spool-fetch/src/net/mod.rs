//! Network transport abstraction.

#[cfg(feature = "reqwest")]
mod https;
mod transport;

#[cfg(feature = "reqwest")]
pub use https::ReqwestTransport;
pub use transport::{EventHandler, Transport, TransportEvent};
