//! Metrics primitives and Prometheus text exposition

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt::Write;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;

/// Monotonic counter
#[derive(Clone, Default)]
pub struct Counter {
    value: Arc<AtomicU64>,
    name: String,
}

impl Counter {
    pub fn new(name: &str) -> Self {
        Self {
            value: Arc::new(AtomicU64::new(0)),
            name: name.to_string(),
        }
    }

    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(&self, n: u64) {
        self.value.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Gauge that can move in both directions
#[derive(Clone, Default)]
pub struct Gauge {
    value: Arc<AtomicI64>,
    name: String,
}

impl Gauge {
    pub fn new(name: &str) -> Self {
        Self {
            value: Arc::new(AtomicI64::new(0)),
            name: name.to_string(),
        }
    }

    pub fn set(&self, val: i64) {
        self.value.store(val, Ordering::Relaxed);
    }

    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dec(&self) {
        self.value.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

struct HistogramState {
    window: VecDeque<f64>,
    count: u64,
    sum: f64,
}

/// Sample histogram. Count and sum cover every observation; percentiles
/// are computed over the most recent `max_samples` observations.
#[derive(Clone)]
pub struct Histogram {
    state: Arc<Mutex<HistogramState>>,
    name: String,
    max_samples: usize,
}

impl Histogram {
    pub fn new(name: &str) -> Self {
        Self::with_window(name, 10_000)
    }

    pub fn with_window(name: &str, max_samples: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(HistogramState {
                window: VecDeque::with_capacity(max_samples.min(1024)),
                count: 0,
                sum: 0.0,
            })),
            name: name.to_string(),
            max_samples: max_samples.max(1),
        }
    }

    pub fn record(&self, value: f64) {
        let mut state = self.state.lock();
        if state.window.len() >= self.max_samples {
            state.window.pop_front();
        }
        state.window.push_back(value);
        state.count += 1;
        state.sum += value;
    }

    /// Nearest-rank percentile, `p` in `[0, 100]`.
    pub fn percentile(&self, p: f64) -> f64 {
        let mut samples: Vec<f64> = {
            let state = self.state.lock();
            state.window.iter().copied().collect()
        };
        if samples.is_empty() {
            return 0.0;
        }
        samples.sort_by(f64::total_cmp);
        let idx = ((samples.len() as f64) * p / 100.0) as usize;
        samples[idx.min(samples.len() - 1)]
    }

    pub fn mean(&self) -> f64 {
        let state = self.state.lock();
        if state.count == 0 {
            return 0.0;
        }
        state.sum / state.count as f64
    }

    pub fn count(&self) -> u64 {
        self.state.lock().count
    }

    pub fn sum(&self) -> f64 {
        self.state.lock().sum
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Builder for the Prometheus text exposition format.
#[derive(Default)]
pub struct PrometheusText {
    out: String,
}

impl PrometheusText {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counter(&mut self, counter: &Counter, help: &str) -> &mut Self {
        self.header(counter.name(), help, "counter");
        let _ = writeln!(self.out, "{} {}", counter.name(), counter.get());
        self
    }

    pub fn gauge(&mut self, gauge: &Gauge, help: &str) -> &mut Self {
        self.header(gauge.name(), help, "gauge");
        let _ = writeln!(self.out, "{} {}", gauge.name(), gauge.get());
        self
    }

    pub fn summary(&mut self, histogram: &Histogram, help: &str) -> &mut Self {
        let name = histogram.name();
        self.header(name, help, "summary");
        for quantile in [0.5, 0.9, 0.99] {
            let _ = writeln!(
                self.out,
                "{}{{quantile=\"{}\"}} {}",
                name,
                quantile,
                histogram.percentile(quantile * 100.0)
            );
        }
        let _ = writeln!(self.out, "{}_sum {}", name, histogram.sum());
        let _ = writeln!(self.out, "{}_count {}", name, histogram.count());
        self
    }

    pub fn finish(self) -> String {
        self.out
    }

    fn header(&mut self, name: &str, help: &str, kind: &str) {
        let _ = writeln!(self.out, "# HELP {} {}", name, help);
        let _ = writeln!(self.out, "# TYPE {} {}", name, kind);
    }
}
