use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use pipebench_frame::{FrameConfig, DEFAULT_MAX_PAYLOAD};

use crate::error::{PipelineError, Result};

/// Port used by the reference configuration.
pub const DEFAULT_PORT: u16 = 4711;

/// Outstanding requests kept in flight by the reference configuration.
pub const DEFAULT_PIPELINE_DEPTH: usize = 1000;

/// Payload bytes per frame in the reference configuration.
pub const DEFAULT_PAYLOAD_SIZE: usize = 32;

/// Interval between throughput reports.
pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_secs(1);

/// Benchmark configuration.
///
/// `Default` is the reference configuration: loopback port 4711, 1000 frames
/// in flight, 32-byte payloads, a 128 MiB frame ceiling and one report per
/// second, with one runtime worker per available CPU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchConfig {
    /// Address the server listens on and the client connects to.
    pub address: SocketAddr,
    /// Frames the requester keeps outstanding after the initial burst.
    pub pipeline_depth: usize,
    /// Size of the shared payload sent in every frame.
    pub payload_size: usize,
    /// Largest payload either side accepts.
    pub max_frame_size: usize,
    /// How often the throughput monitor reports.
    pub report_interval: Duration,
    /// Worker threads for the async runtime.
    pub worker_threads: usize,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            address: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            pipeline_depth: DEFAULT_PIPELINE_DEPTH,
            payload_size: DEFAULT_PAYLOAD_SIZE,
            max_frame_size: DEFAULT_MAX_PAYLOAD,
            report_interval: DEFAULT_REPORT_INTERVAL,
            worker_threads: default_worker_threads(),
        }
    }
}

impl BenchConfig {
    /// Reject configurations that cannot produce a meaningful run.
    pub fn validate(&self) -> Result<()> {
        if self.pipeline_depth == 0 {
            return Err(PipelineError::InvalidConfig(
                "pipeline depth must be greater than zero".to_string(),
            ));
        }
        if self.payload_size > self.max_frame_size {
            return Err(PipelineError::InvalidConfig(format!(
                "payload size {} exceeds max frame size {}",
                self.payload_size, self.max_frame_size
            )));
        }
        if self.max_frame_size > u32::MAX as usize {
            return Err(PipelineError::InvalidConfig(format!(
                "max frame size {} does not fit the 4-byte length field",
                self.max_frame_size
            )));
        }
        if self.report_interval.is_zero() {
            return Err(PipelineError::InvalidConfig(
                "report interval must be greater than zero".to_string(),
            ));
        }
        if self.worker_threads == 0 {
            return Err(PipelineError::InvalidConfig(
                "worker threads must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Codec settings shared by both connection roles.
    pub fn frame_config(&self) -> FrameConfig {
        FrameConfig {
            max_payload_size: self.max_frame_size,
        }
    }
}

fn default_worker_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
