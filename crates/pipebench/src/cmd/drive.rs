use std::net::SocketAddr;

use pipebench_pipeline::{
    completion_counter, BenchConfig, ConnectionEnd, Payload, PipelineClient, PipelinedRequester,
    ThroughputMonitor,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cmd::{bench_config, build_runtime, run_limit, shutdown_token, DriveArgs};
use crate::exit::{pipeline_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_sample, OutputFormat};

pub fn run(args: DriveArgs, format: OutputFormat) -> CliResult<i32> {
    let config = bench_config(&args.endpoint, Some(&args.load))?;
    let limit = run_limit(&args.endpoint)?;
    let runtime = build_runtime(config.worker_threads)?;

    runtime.block_on(async move {
        let shutdown = shutdown_token(limit);
        let payload = Payload::zeroed(config.payload_size);
        let completed = drive_load(&config, config.address, payload, format, shutdown).await?;
        info!(completed, "benchmark finished");
        Ok(SUCCESS)
    })
}

/// Keep `config.pipeline_depth` requests in flight against `addr` and print
/// one report per interval until `shutdown` fires.
///
/// Losing the connection does not end the run: reports keep coming (at zero)
/// until shutdown. Returns the final completion count.
pub(crate) async fn drive_load(
    config: &BenchConfig,
    addr: SocketAddr,
    payload: Payload,
    format: OutputFormat,
    shutdown: CancellationToken,
) -> CliResult<u64> {
    let client = PipelineClient::connect(addr, config.frame_config())
        .await
        .map_err(|err| pipeline_error("connect failed", err))?;

    let (recorder, reader) = completion_counter();
    let mut requester = PipelinedRequester::new(payload, config.pipeline_depth, recorder);

    let interval = config.report_interval;
    let stop = shutdown.clone();
    let monitor = tokio::spawn(ThroughputMonitor::new(reader.clone()).run(
        interval,
        shutdown.clone(),
        move |sample| {
            if let Err(err) = print_sample(sample, interval, format) {
                // Nobody is left to read the reports.
                if !stop.is_cancelled() {
                    warn!(error = %err, "report output closed; shutting down");
                    stop.cancel();
                }
            }
        },
    ));

    match client.run(&mut requester, shutdown.clone()).await {
        Ok(stats) if stats.end == ConnectionEnd::PeerClosed => warn!(
            completed = requester.completed(),
            outstanding = requester.outstanding(),
            "server closed the connection"
        ),
        Ok(_) => {}
        Err(err) => warn!(
            error = %err,
            completed = requester.completed(),
            "connection failed"
        ),
    }

    shutdown.cancelled().await;
    monitor
        .await
        .map_err(|err| CliError::new(INTERNAL, format!("monitor task failed: {err}")))?;
    Ok(reader.get())
}
