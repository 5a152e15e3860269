use pipebench_pipeline::{EchoServer, Payload};

use crate::cmd::{bench_config, build_runtime, run_limit, shutdown_token, ServeArgs};
use crate::exit::{pipeline_error, CliResult, SUCCESS};

pub fn run(args: ServeArgs) -> CliResult<i32> {
    let config = bench_config(&args.endpoint, None)?;
    let limit = run_limit(&args.endpoint)?;
    let runtime = build_runtime(config.worker_threads)?;

    runtime.block_on(async move {
        let shutdown = shutdown_token(limit);
        let server = EchoServer::bind(
            config.address,
            config.frame_config(),
            Payload::zeroed(config.payload_size),
        )
        .await
        .map_err(|err| pipeline_error("bind failed", err))?;

        server
            .serve(shutdown)
            .await
            .map_err(|err| pipeline_error("server failed", err))?;
        tracing::info!("echo server stopped");
        Ok(SUCCESS)
    })
}
