//! TCP endpoint bootstrap for pipebench.
//!
//! Binds the listening endpoint and establishes outbound connections.
//! This is the lowest layer of pipebench. Everything else builds on top of
//! the tokio [`TcpStream`](tokio::net::TcpStream) values handed out here.

pub mod error;
pub mod tcp;

pub use error::{Result, TransportError};
pub use tcp::{connect, resolve, TcpEndpoint};
