use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use pipebench_pipeline::{EchoServer, Payload};
use tracing::info;

use crate::cmd::drive::drive_load;
use crate::cmd::{bench_config, build_runtime, run_limit, shutdown_token, RunArgs};
use crate::exit::{pipeline_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::OutputFormat;

pub fn run(args: RunArgs, format: OutputFormat) -> CliResult<i32> {
    let config = bench_config(&args.endpoint, Some(&args.load))?;
    let limit = run_limit(&args.endpoint)?;
    let runtime = build_runtime(config.worker_threads)?;

    runtime.block_on(async move {
        let shutdown = shutdown_token(limit);
        let payload = Payload::zeroed(config.payload_size);

        let server = EchoServer::bind(config.address, config.frame_config(), payload.clone())
            .await
            .map_err(|err| pipeline_error("bind failed", err))?;
        let target = dialable(server.local_addr());
        let server = tokio::spawn(server.serve(shutdown.clone()));

        let completed = drive_load(&config, target, payload, format, shutdown.clone()).await;
        // The client side may have bailed out early; the server must still stop.
        shutdown.cancel();
        let served = server
            .await
            .map_err(|err| CliError::new(INTERNAL, format!("server task failed: {err}")))?;

        let completed = completed?;
        served.map_err(|err| pipeline_error("server failed", err))?;
        info!(completed, "benchmark finished");
        Ok(SUCCESS)
    })
}

/// The address a local client should dial to reach a listener bound to `addr`.
fn dialable(mut addr: SocketAddr) -> SocketAddr {
    match addr.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => addr.set_ip(Ipv4Addr::LOCALHOST.into()),
        IpAddr::V6(ip) if ip.is_unspecified() => addr.set_ip(Ipv6Addr::LOCALHOST.into()),
        _ => {}
    }
    addr
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_binds_are_dialed_on_loopback() {
        assert_eq!(
            dialable("0.0.0.0:4711".parse().unwrap()),
            "127.0.0.1:4711".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(
            dialable("[::]:9000".parse().unwrap()),
            "[::1]:9000".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(
            dialable("10.1.2.3:80".parse().unwrap()),
            "10.1.2.3:80".parse::<SocketAddr>().unwrap()
        );
    }
}
