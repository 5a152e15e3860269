use std::fmt;
use std::io;

use pipebench_frame::FrameError;
use pipebench_pipeline::PipelineError;
use pipebench_transport::TransportError;

// Process exit codes.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    let code = match &err {
        TransportError::Bind { source, .. } | TransportError::Connect { source, .. }
            if source.kind() == io::ErrorKind::PermissionDenied =>
        {
            PERMISSION_DENIED
        }
        TransportError::Resolve { .. } => USAGE,
        _ => TRANSPORT_ERROR,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::PayloadTooLarge { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        FrameError::ConnectionClosed => CliError::new(FAILURE, format!("{context}: {err}")),
    }
}

pub fn pipeline_error(context: &str, err: PipelineError) -> CliError {
    match err {
        PipelineError::Transport(err) => transport_error(context, err),
        PipelineError::Frame(err) => frame_error(context, err),
        PipelineError::InvalidConfig(_) => CliError::new(USAGE, format!("{context}: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_and_connect_failures_map_to_transport_code() {
        let addr = "127.0.0.1:4711".parse().unwrap();
        let bind = TransportError::Bind {
            addr,
            source: io::ErrorKind::AddrInUse.into(),
        };
        assert_eq!(transport_error("bind failed", bind).code, TRANSPORT_ERROR);

        let connect = TransportError::Connect {
            addr,
            source: io::ErrorKind::ConnectionRefused.into(),
        };
        let err = pipeline_error("connect failed", PipelineError::Transport(connect));
        assert_eq!(err.code, TRANSPORT_ERROR);
        assert!(err.message.starts_with("connect failed: failed to connect to 127.0.0.1:4711"));
    }

    #[test]
    fn privileged_port_maps_to_permission_denied() {
        let bind = TransportError::Bind {
            addr: "0.0.0.0:80".parse().unwrap(),
            source: io::ErrorKind::PermissionDenied.into(),
        };
        assert_eq!(transport_error("bind failed", bind).code, PERMISSION_DENIED);
    }

    #[test]
    fn oversize_frame_is_data_invalid() {
        let err = pipeline_error(
            "client failed",
            PipelineError::Frame(FrameError::PayloadTooLarge { size: 2, max: 1 }),
        );
        assert_eq!(err.code, DATA_INVALID);
    }

    #[test]
    fn invalid_config_is_usage() {
        let err = pipeline_error(
            "invalid options",
            PipelineError::InvalidConfig("pipeline depth must be greater than zero".into()),
        );
        assert_eq!(err.code, USAGE);
    }
}
