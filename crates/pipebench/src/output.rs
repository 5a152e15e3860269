use std::io::{self, Write};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use pipebench_pipeline::ThroughputSample;
use serde::Serialize;

#[derive(Clone, Debug, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// `<requests> requests in <interval>ms (<rate> req/s)`, one line per interval.
    #[default]
    Text,
    /// One JSON object per interval.
    Json,
}

#[derive(Serialize)]
struct SampleOutput {
    requests: u64,
    total: u64,
    interval_ms: u64,
    rate_per_sec: u64,
    timestamp: String,
}

/// Completions per second over one interval, truncated.
pub fn rate_per_second(sample: ThroughputSample, interval: Duration) -> u64 {
    let millis = interval.as_millis().max(1);
    (u128::from(sample.delta) * 1000 / millis) as u64
}

pub fn format_sample(sample: ThroughputSample, interval: Duration, format: OutputFormat) -> String {
    let rate = rate_per_second(sample, interval);
    match format {
        OutputFormat::Text => format!(
            "{} requests in {}ms ({rate} req/s)",
            sample.delta,
            interval.as_millis()
        ),
        OutputFormat::Json => {
            let out = SampleOutput {
                requests: sample.delta,
                total: sample.total,
                interval_ms: interval.as_millis() as u64,
                rate_per_sec: rate,
                timestamp: now_unix_seconds(),
            };
            serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
        }
    }
}

/// Write one report line and flush, so piped consumers see it immediately.
pub fn write_sample<W: Write>(
    out: &mut W,
    sample: ThroughputSample,
    interval: Duration,
    format: OutputFormat,
) -> io::Result<()> {
    writeln!(out, "{}", format_sample(sample, interval, format))?;
    out.flush()
}

/// Report one sample on stdout.
pub fn print_sample(
    sample: ThroughputSample,
    interval: Duration,
    format: OutputFormat,
) -> io::Result<()> {
    write_sample(&mut io::stdout().lock(), sample, interval, format)
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
