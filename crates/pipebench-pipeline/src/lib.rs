//! Pipelined request engine for the pipebench throughput benchmark.
//!
//! A client keeps a fixed number of requests in flight over one TCP
//! connection while an echo server answers every frame with a frame of the
//! same fixed size. Completed round trips are published through a
//! single-writer counter that a monitor samples once per interval.
//!
//! Both roles share one framing driver ([`run_connection`]) and plug in their
//! own [`FrameHandler`]: [`EchoResponder`] on the server side and
//! [`PipelinedRequester`] on the client side.

pub mod client;
pub mod config;
pub mod connection;
pub mod counter;
pub mod error;
pub mod handler;
pub mod monitor;
pub mod payload;
pub mod requester;
pub mod responder;
pub mod server;

pub use client::PipelineClient;
pub use config::{
    BenchConfig, DEFAULT_PAYLOAD_SIZE, DEFAULT_PIPELINE_DEPTH, DEFAULT_PORT,
    DEFAULT_REPORT_INTERVAL,
};
pub use connection::{run_connection, ConnectionEnd, ConnectionStats};
pub use counter::{completion_counter, CompletionReader, CompletionRecorder};
pub use error::{PipelineError, Result};
pub use handler::{FrameHandler, Outbound};
pub use monitor::{ThroughputMonitor, ThroughputSample};
pub use payload::Payload;
pub use requester::{PipelinedRequester, RequesterState};
pub use responder::EchoResponder;
pub use server::EchoServer;
