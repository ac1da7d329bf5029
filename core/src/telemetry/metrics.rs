use std::sync::Mutex;

pub struct MetricsRecorder {
    inner: Mutex<Metrics>,
}

/// Counters collected while loading networks and converting coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub cache_hits: usize,
    pub cache_misses: usize,
    pub conversions_ok: usize,
    pub conversions_failed: usize,
}

#[derive(Default)]
struct Metrics {
    snapshot: MetricsSnapshot,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Metrics::default()),
        }
    }

    pub fn record_cache_hit(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.snapshot.cache_hits += 1;
        }
    }

    pub fn record_cache_miss(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.snapshot.cache_misses += 1;
        }
    }

    pub fn record_conversion(&self, succeeded: bool) {
        if let Ok(mut metrics) = self.inner.lock() {
            if succeeded {
                metrics.snapshot.conversions_ok += 1;
            } else {
                metrics.snapshot.conversions_failed += 1;
            }
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        if let Ok(metrics) = self.inner.lock() {
            metrics.snapshot
        } else {
            MetricsSnapshot::default()
        }
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}
