//! Pipelined request/response throughput benchmark.
//!
//! pipebench keeps a fixed number of length-prefixed requests in flight over
//! a single TCP connection against an echo server and reports completed round
//! trips per interval.
//!
//! # Crate Structure
//!
//! - [`transport`]: TCP endpoint bootstrap (bind, accept, connect)
//! - [`frame`]: 4-byte big-endian length-prefixed framing
//! - [`pipeline`]: Echo responder, pipelined requester, counter and monitor

/// Re-export transport types.
pub mod transport {
    pub use pipebench_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use pipebench_frame::*;
}

/// Re-export pipeline types.
pub mod pipeline {
    pub use pipebench_pipeline::*;
}
