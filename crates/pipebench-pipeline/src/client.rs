use std::net::SocketAddr;

use pipebench_frame::FrameConfig;
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::connection::{run_connection, ConnectionStats};
use crate::error::Result;
use crate::requester::PipelinedRequester;

/// The single outbound connection of the benchmark.
pub struct PipelineClient {
    stream: TcpStream,
    peer: SocketAddr,
    frame_config: FrameConfig,
}

impl PipelineClient {
    /// Connect to the echo server. Fails with a transport connect error.
    pub async fn connect(addr: SocketAddr, frame_config: FrameConfig) -> Result<Self> {
        let stream = pipebench_transport::connect(addr).await?;
        Ok(Self {
            stream,
            peer: addr,
            frame_config,
        })
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Fill the pipeline and keep it full until the connection ends.
    ///
    /// The requester is borrowed so its counters can be inspected afterwards;
    /// it is left in the terminated state.
    pub async fn run(
        self,
        requester: &mut PipelinedRequester,
        shutdown: CancellationToken,
    ) -> Result<ConnectionStats> {
        info!(
            peer = %self.peer,
            depth = requester.depth(),
            "starting pipelined requests"
        );
        let stats = run_connection(self.stream, &self.frame_config, requester, shutdown).await?;
        debug!(
            peer = %self.peer,
            completed = requester.completed(),
            end = ?stats.end,
            "client connection finished"
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;

    #[tokio::test]
    async fn connect_failure_is_transport_error() {
        let addr = {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };
        let err = PipelineClient::connect(addr, FrameConfig::default())
            .await
            .err()
            .expect("nothing is listening");
        assert!(matches!(
            err,
            PipelineError::Transport(pipebench_transport::TransportError::Connect { .. })
        ));
    }
}
