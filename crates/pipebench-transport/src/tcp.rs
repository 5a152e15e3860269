use std::net::{SocketAddr, ToSocketAddrs};

use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info};

use crate::error::{Result, TransportError};

/// A bound, listening TCP endpoint.
///
/// Every stream handed out by [`TcpEndpoint::accept`] has `TCP_NODELAY` set,
/// matching the streams produced by [`connect`].
#[derive(Debug)]
pub struct TcpEndpoint {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl TcpEndpoint {
    /// Bind and listen on `addr`.
    ///
    /// Port `0` asks the OS for an ephemeral port; use [`TcpEndpoint::local_addr`]
    /// to learn which one was assigned.
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| TransportError::Bind { addr, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| TransportError::Bind { addr, source })?;

        info!(%local_addr, "listening on tcp endpoint");

        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Accept the next incoming connection.
    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr)> {
        let (stream, peer) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::Accept)?;
        stream.set_nodelay(true)?;
        debug!(%peer, "accepted connection");
        Ok((stream, peer))
    }

    /// The address this endpoint is actually bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        "tcp"
    }
}

/// Connect to a listening TCP endpoint.
pub async fn connect(addr: SocketAddr) -> Result<TcpStream> {
    let stream = TcpStream::connect(addr)
        .await
        .map_err(|source| TransportError::Connect { addr, source })?;
    stream
        .set_nodelay(true)
        .map_err(|source| TransportError::Connect { addr, source })?;
    debug!(%addr, "connected to tcp endpoint");
    Ok(stream)
}

/// Resolve `host:port` to the first matching socket address.
pub fn resolve(addr: &str) -> Result<SocketAddr> {
    let mut candidates = addr.to_socket_addrs().map_err(|err| TransportError::Resolve {
        addr: addr.to_string(),
        reason: err.to_string(),
    })?;
    candidates.next().ok_or_else(|| TransportError::Resolve {
        addr: addr.to_string(),
        reason: "no addresses found".to_string(),
    })
}
