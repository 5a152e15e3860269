/// Errors that can occur while running the benchmark pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Transport-level error (bind, connect, accept).
    #[error("transport error: {0}")]
    Transport(#[from] pipebench_transport::TransportError),

    /// Frame-level error; fatal for the connection it occurred on.
    #[error("frame error: {0}")]
    Frame(#[from] pipebench_frame::FrameError),

    /// Configuration rejected before anything was started.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
