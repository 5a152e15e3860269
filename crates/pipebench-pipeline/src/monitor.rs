use std::time::Duration;

use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::counter::CompletionReader;

/// One throughput observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThroughputSample {
    /// Completions since the counter was created.
    pub total: u64,
    /// Completions since the previous sample.
    pub delta: u64,
}

/// Periodically samples the completion counter and reports the increase.
///
/// Read-only with respect to the counter. The baseline starts at zero, so the
/// first sample covers everything completed since startup.
#[derive(Debug)]
pub struct ThroughputMonitor {
    reader: CompletionReader,
    previous: u64,
}

impl ThroughputMonitor {
    pub fn new(reader: CompletionReader) -> Self {
        Self {
            reader,
            previous: 0,
        }
    }

    /// Take a sample now and move the baseline forward.
    pub fn sample(&mut self) -> ThroughputSample {
        let total = self.reader.get();
        let delta = total - self.previous;
        self.previous = total;
        ThroughputSample { total, delta }
    }

    /// Report one sample every `period` until `shutdown` fires.
    ///
    /// The first report comes one full period after the call. Late ticks are
    /// delayed rather than bunched up, so every report spans roughly `period`.
    pub async fn run<F>(mut self, period: Duration, shutdown: CancellationToken, mut report: F)
    where
        F: FnMut(ThroughputSample),
    {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let sample = self.sample();
                    trace!(total = sample.total, delta = sample.delta, "throughput sample");
                    report(sample);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::counter::completion_counter;

    #[test]
    fn first_sample_is_measured_from_zero() {
        let (mut recorder, reader) = completion_counter();
        let mut monitor = ThroughputMonitor::new(reader);

        for _ in 0..7 {
            recorder.increment();
        }
        assert_eq!(monitor.sample(), ThroughputSample { total: 7, delta: 7 });

        for _ in 0..3 {
            recorder.increment();
        }
        assert_eq!(monitor.sample(), ThroughputSample { total: 10, delta: 3 });
        assert_eq!(monitor.sample(), ThroughputSample { total: 10, delta: 0 });
    }

    #[tokio::test(start_paused = true)]
    async fn reports_once_per_period_until_cancelled() {
        let (mut recorder, reader) = completion_counter();
        let monitor = ThroughputMonitor::new(reader);
        let shutdown = CancellationToken::new();
        let reports = Arc::new(Mutex::new(Vec::new()));

        let task = {
            let reports = Arc::clone(&reports);
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                monitor
                    .run(Duration::from_secs(1), shutdown, move |sample| {
                        reports.lock().unwrap().push(sample.delta);
                    })
                    .await;
            })
        };

        // Nothing is reported before the first full period.
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(reports.lock().unwrap().is_empty());

        for _ in 0..5 {
            recorder.increment();
        }
        tokio::time::sleep(Duration::from_millis(600)).await;

        for _ in 0..2 {
            recorder.increment();
        }
        tokio::time::sleep(Duration::from_secs(1)).await;

        shutdown.cancel();
        task.await.unwrap();

        assert_eq!(*reports.lock().unwrap(), vec![5, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_counter_reports_zero() {
        let (_recorder, reader) = completion_counter();
        let shutdown = CancellationToken::new();
        let reports = Arc::new(Mutex::new(Vec::new()));

        let task = {
            let reports = Arc::clone(&reports);
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                ThroughputMonitor::new(reader)
                    .run(Duration::from_secs(1), shutdown, move |sample| {
                        reports.lock().unwrap().push(sample);
                    })
                    .await;
            })
        };

        tokio::time::sleep(Duration::from_millis(3500)).await;
        shutdown.cancel();
        task.await.unwrap();

        let reports = reports.lock().unwrap();
        assert_eq!(reports.len(), 3);
        assert!(reports.iter().all(|s| s.delta == 0 && s.total == 0));
    }
}
