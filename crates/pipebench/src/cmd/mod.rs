use std::time::Duration;

use clap::{Args, Subcommand};
use pipebench_frame::DEFAULT_MAX_PAYLOAD;
use pipebench_pipeline::{BenchConfig, DEFAULT_PAYLOAD_SIZE, DEFAULT_PIPELINE_DEPTH};
use tokio_util::sync::CancellationToken;

use crate::exit::{io_error, pipeline_error, transport_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod drive;
pub mod run;
pub mod serve;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run server and client in one process and report throughput.
    Run(RunArgs),
    /// Start only the echo server.
    Serve(ServeArgs),
    /// Drive a remote echo server and report throughput.
    Drive(DriveArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Run(args) => run::run(args, format),
        Command::Serve(args) => serve::run(args),
        Command::Drive(args) => drive::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Options shared by every role that owns a connection.
#[derive(Args, Debug, Clone)]
pub struct EndpointArgs {
    /// Address to listen on or connect to (host:port).
    #[arg(long, env = "PIPEBENCH_ADDRESS", default_value = "127.0.0.1:4711")]
    pub address: String,
    /// Payload bytes carried by every frame.
    #[arg(long, env = "PIPEBENCH_PAYLOAD_SIZE", default_value_t = DEFAULT_PAYLOAD_SIZE)]
    pub payload_size: usize,
    /// Largest frame payload accepted from the peer.
    #[arg(long, env = "PIPEBENCH_MAX_FRAME_SIZE", default_value_t = DEFAULT_MAX_PAYLOAD)]
    pub max_frame_size: usize,
    /// Runtime worker threads. Default: one per CPU.
    #[arg(long, env = "PIPEBENCH_WORKERS")]
    pub workers: Option<usize>,
    /// Stop after this long (e.g. 30s, 500ms). Default: run until Ctrl-C.
    #[arg(long, env = "PIPEBENCH_DURATION")]
    pub duration: Option<String>,
}

/// Options for the requesting side.
#[derive(Args, Debug, Clone)]
pub struct LoadArgs {
    /// Requests kept in flight.
    #[arg(long, env = "PIPEBENCH_DEPTH", default_value_t = DEFAULT_PIPELINE_DEPTH)]
    pub depth: usize,
    /// Reporting interval (e.g. 1s, 250ms).
    #[arg(long, env = "PIPEBENCH_INTERVAL", default_value = "1s")]
    pub interval: String,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub endpoint: EndpointArgs,
    #[command(flatten)]
    pub load: LoadArgs,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    #[command(flatten)]
    pub endpoint: EndpointArgs,
}

#[derive(Args, Debug)]
pub struct DriveArgs {
    #[command(flatten)]
    pub endpoint: EndpointArgs,
    #[command(flatten)]
    pub load: LoadArgs,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Resolve and validate options into a benchmark configuration.
pub fn bench_config(endpoint: &EndpointArgs, load: Option<&LoadArgs>) -> CliResult<BenchConfig> {
    let defaults = BenchConfig::default();
    let address = pipebench_transport::resolve(&endpoint.address)
        .map_err(|err| transport_error("invalid --address", err))?;

    let (pipeline_depth, report_interval) = match load {
        Some(load) => (load.depth, parse_duration(&load.interval)?),
        None => (defaults.pipeline_depth, defaults.report_interval),
    };

    let config = BenchConfig {
        address,
        pipeline_depth,
        payload_size: endpoint.payload_size,
        max_frame_size: endpoint.max_frame_size,
        report_interval,
        worker_threads: endpoint.workers.unwrap_or(defaults.worker_threads),
    };
    config
        .validate()
        .map_err(|err| pipeline_error("invalid options", err))?;
    Ok(config)
}

/// Optional run time limit from `--duration`.
pub fn run_limit(endpoint: &EndpointArgs) -> CliResult<Option<Duration>> {
    endpoint.duration.as_deref().map(parse_duration).transpose()
}

pub fn build_runtime(workers: usize) -> CliResult<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(workers)
        .thread_name("pipebench-worker")
        .enable_all()
        .build()
        .map_err(|err| io_error("runtime setup failed", err))
}

/// A token cancelled on Ctrl-C or once `limit` has elapsed.
///
/// Must be called from within the runtime.
pub fn shutdown_token(limit: Option<Duration>) -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        let interrupted = async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => tracing::info!("interrupted; shutting down"),
                Err(err) => {
                    tracing::warn!(error = %err, "ctrl-c handler unavailable");
                    std::future::pending::<()>().await
                }
            }
        };
        let elapsed = async {
            match limit {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::select! {
            _ = trigger.cancelled() => {}
            _ = interrupted => {}
            _ = elapsed => tracing::debug!("run duration elapsed"),
        }
        trigger.cancel();
    });
    token
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(address: &str) -> EndpointArgs {
        EndpointArgs {
            address: address.to_string(),
            payload_size: DEFAULT_PAYLOAD_SIZE,
            max_frame_size: DEFAULT_MAX_PAYLOAD,
            workers: Some(2),
            duration: None,
        }
    }

    fn load(depth: usize, interval: &str) -> LoadArgs {
        LoadArgs {
            depth,
            interval: interval.to_string(),
        }
    }

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert!(parse_duration("").is_err());
    }

    #[test]
    fn bench_config_from_defaults() {
        let config = bench_config(&endpoint("127.0.0.1:4711"), Some(&load(1000, "1s"))).unwrap();
        assert_eq!(config.address.port(), 4711);
        assert_eq!(config.pipeline_depth, 1000);
        assert_eq!(config.payload_size, 32);
        assert_eq!(config.report_interval, Duration::from_secs(1));
        assert_eq!(config.worker_threads, 2);
    }

    #[test]
    fn bench_config_rejects_zero_depth_as_usage() {
        let err = bench_config(&endpoint("127.0.0.1:4711"), Some(&load(0, "1s"))).unwrap_err();
        assert_eq!(err.code, USAGE);
    }

    #[test]
    fn bench_config_rejects_unresolvable_address() {
        let err = bench_config(&endpoint("no-port-here"), None).unwrap_err();
        assert_eq!(err.code, USAGE);
    }

    #[test]
    fn run_limit_is_optional() {
        let mut args = endpoint("127.0.0.1:0");
        assert_eq!(run_limit(&args).unwrap(), None);
        args.duration = Some("250ms".to_string());
        assert_eq!(run_limit(&args).unwrap(), Some(Duration::from_millis(250)));
    }
}
