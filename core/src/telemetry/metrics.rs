use serde::Serialize;
use std::sync::Mutex;

/// Cycle counters shared between the worker and whoever reports on it.
pub struct MetricsRecorder {
    inner: Mutex<Metrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Metrics {
    pub processed: usize,
    pub channel_errors: usize,
    pub cycle_errors: usize,
    pub dropped: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Metrics::default()),
        }
    }

    pub fn record_processed(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.processed += 1;
        }
    }

    pub fn record_channel_errors(&self, count: usize) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.channel_errors += count;
        }
    }

    /// A cycle that failed as a whole, before any channel was classified.
    pub fn record_cycle_error(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.cycle_errors += 1;
        }
    }

    pub fn record_dropped(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.dropped += 1;
        }
    }

    pub fn snapshot(&self) -> Metrics {
        self.inner
            .lock()
            .map(|metrics| *metrics)
            .unwrap_or_default()
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let metrics = MetricsRecorder::new();
        metrics.record_processed();
        metrics.record_processed();
        metrics.record_channel_errors(3);
        metrics.record_dropped();
        metrics.record_cycle_error();
        assert_eq!(
            metrics.snapshot(),
            Metrics {
                processed: 2,
                channel_errors: 3,
                cycle_errors: 1,
                dropped: 1
            }
        );
    }
}
