use std::sync::Mutex;

/// Backend round-trip counters for one collection run.
pub struct MetricsRecorder {
    inner: Mutex<Metrics>,
}

struct Metrics {
    round_trips: usize,
    failures: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Metrics {
                round_trips: 0,
                failures: 0,
            }),
        }
    }

    pub fn record_round_trip(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.round_trips += 1;
        }
    }

    pub fn record_failure(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.failures += 1;
        }
    }

    pub fn snapshot(&self) -> (usize, usize) {
        if let Ok(metrics) = self.inner.lock() {
            (metrics.round_trips, metrics.failures)
        } else {
            (0, 0)
        }
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}
