use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use pipebench_frame::FrameConfig;
use pipebench_transport::TcpEndpoint;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::connection::run_connection;
use crate::error::Result;
use crate::payload::Payload;
use crate::responder::EchoResponder;

const MIN_ACCEPT_BACKOFF: Duration = Duration::from_millis(10);
const MAX_ACCEPT_BACKOFF: Duration = Duration::from_secs(1);

/// Delay before the next accept after `failures` consecutive failures.
fn accept_backoff(failures: u32) -> Duration {
    MIN_ACCEPT_BACKOFF
        .saturating_mul(1 << failures.saturating_sub(1).min(16))
        .min(MAX_ACCEPT_BACKOFF)
}

/// Listens for connections and echoes every frame it receives.
///
/// Each accepted connection runs on its own task with its own
/// [`EchoResponder`]; a failing connection is logged and dropped without
/// affecting the listener or other connections.
pub struct EchoServer {
    endpoint: TcpEndpoint,
    frame_config: FrameConfig,
    payload: Payload,
    next_conn_id: AtomicU64,
}

impl EchoServer {
    /// Bind the listening endpoint. Fails with a transport bind error.
    pub async fn bind(
        addr: SocketAddr,
        frame_config: FrameConfig,
        payload: Payload,
    ) -> Result<Self> {
        let endpoint = TcpEndpoint::bind(addr).await?;
        Ok(Self {
            endpoint,
            frame_config,
            payload,
            next_conn_id: AtomicU64::new(1),
        })
    }

    /// Bound address.
    pub fn local_addr(&self) -> SocketAddr {
        self.endpoint.local_addr()
    }

    /// Accept and serve connections until `shutdown` fires.
    ///
    /// Live connections are cancelled through the same token and awaited
    /// before this returns.
    pub async fn serve(self, shutdown: CancellationToken) -> Result<()> {
        info!(
            addr = %self.local_addr(),
            transport = self.endpoint.transport_name(),
            payload_size = self.payload.len(),
            "echo server ready"
        );
        let mut tasks = JoinSet::new();
        let mut failures: u32 = 0;

        loop {
            let accepted = tokio::select! {
                _ = shutdown.cancelled() => break,
                accepted = self.endpoint.accept() => accepted,
            };
            let (stream, peer) = match accepted {
                Ok(accepted) => {
                    failures = 0;
                    accepted
                }
                Err(err) => {
                    failures = failures.saturating_add(1);
                    let delay = accept_backoff(failures);
                    warn!(error = %err, failures, ?delay, "accept failed");
                    // Persistent failures (e.g. out of descriptors) must not spin.
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(delay) => continue,
                    }
                }
            };

            let id = self.next_conn_id.fetch_add(1, Ordering::Relaxed);
            let frame_config = self.frame_config.clone();
            let mut responder = EchoResponder::new(self.payload.clone());
            let shutdown = shutdown.child_token();

            tasks.spawn(async move {
                debug!(id, %peer, "serving connection");
                match run_connection(stream, &frame_config, &mut responder, shutdown).await {
                    Ok(stats) => debug!(
                        id,
                        %peer,
                        received = stats.frames_received,
                        sent = stats.frames_sent,
                        end = ?stats.end,
                        "connection finished"
                    ),
                    Err(err) => warn!(id, %peer, error = %err, "connection torn down"),
                }
            });

            // Reap finished connections so the set does not grow without bound.
            while tasks.try_join_next().is_some() {}
        }

        debug!(live = tasks.len(), "echo server stopping");
        while tasks.join_next().await.is_some() {}
        Ok(())
    }
}
