//! Aggregate counters for the scoring service.
//!
//! Only totals and a bounded latency window are kept; no request content
//! is ever retained.

use crate::error::PredictionErrorKind;
use crate::types::prediction::PredictionOutput;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

/// Number of recent latencies kept for percentiles
const LATENCY_WINDOW: usize = 10_000;

/// Probability histogram resolution
const PROBABILITY_BUCKETS: usize = 10;

/// Counters shared by every request handler
pub struct ServiceMetrics {
    pub predictions_served: AtomicU64,
    pub high_risk: AtomicU64,
    pub validation_rejections: AtomicU64,
    pub scoring_failures: AtomicU64,
    /// Scoring latencies in microseconds, most recent last
    latencies: RwLock<VecDeque<u64>>,
    probability_buckets: RwLock<[u64; PROBABILITY_BUCKETS]>,
    start_time: Instant,
}

impl ServiceMetrics {
    pub fn new() -> Self {
        Self {
            predictions_served: AtomicU64::new(0),
            high_risk: AtomicU64::new(0),
            validation_rejections: AtomicU64::new(0),
            scoring_failures: AtomicU64::new(0),
            latencies: RwLock::new(VecDeque::with_capacity(1024)),
            probability_buckets: RwLock::new([0; PROBABILITY_BUCKETS]),
            start_time: Instant::now(),
        }
    }

    /// Record a successful prediction
    pub fn record_prediction(&self, output: &PredictionOutput, latency: Duration) {
        self.predictions_served.fetch_add(1, Ordering::Relaxed);
        if output.prediction == 1 {
            self.high_risk.fetch_add(1, Ordering::Relaxed);
        }
        self.record_latency(latency);

        let bucket = ((output.probability * PROBABILITY_BUCKETS as f64) as usize)
            .min(PROBABILITY_BUCKETS - 1);
        if let Ok(mut buckets) = self.probability_buckets.write() {
            buckets[bucket] += 1;
        }
    }

    /// Record a rejected or failed request
    pub fn record_error(&self, kind: PredictionErrorKind) {
        let counter = match kind {
            PredictionErrorKind::InvalidInput => &self.validation_rejections,
            PredictionErrorKind::ScoringFailure => &self.scoring_failures,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn record_latency(&self, latency: Duration) {
        if let Ok(mut window) = self.latencies.write() {
            if window.len() == LATENCY_WINDOW {
                window.pop_front();
            }
            window.push_back(latency.as_micros() as u64);
        }
    }

    /// Latency statistics over the current window
    pub fn latency_stats(&self) -> LatencyStats {
        let mut sorted: Vec<u64> = match self.latencies.read() {
            Ok(window) => window.iter().copied().collect(),
            Err(_) => return LatencyStats::default(),
        };
        if sorted.is_empty() {
            return LatencyStats::default();
        }
        sorted.sort_unstable();

        let count = sorted.len();
        let percentile = |q: f64| sorted[((count as f64 * q) as usize).min(count - 1)];
        LatencyStats {
            count: count as u64,
            mean_us: sorted.iter().sum::<u64>() / count as u64,
            p50_us: percentile(0.50),
            p95_us: percentile(0.95),
            p99_us: percentile(0.99),
            max_us: sorted[count - 1],
        }
    }

    /// Successful predictions per second since start
    pub fn throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.predictions_served.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn probability_distribution(&self) -> [u64; PROBABILITY_BUCKETS] {
        self.probability_buckets
            .read()
            .map(|buckets| *buckets)
            .unwrap_or_default()
    }

    /// Log a boxed summary of all counters
    pub fn print_summary(&self) {
        let served = self.predictions_served.load(Ordering::Relaxed);
        let high_risk = self.high_risk.load(Ordering::Relaxed);
        let rejected = self.validation_rejections.load(Ordering::Relaxed);
        let failed = self.scoring_failures.load(Ordering::Relaxed);
        let high_risk_rate = if served > 0 {
            (high_risk as f64 / served as f64) * 100.0
        } else {
            0.0
        };
        let latency = self.latency_stats();

        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║             CHD RISK SERVICE - METRICS SUMMARY               ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Predictions Served: {:>8}  │  Throughput: {:>8.1} req/s   ║",
            served,
            self.throughput()
        );
        info!(
            "║ High Risk:          {:>8}  │  Rate: {:>6.1}%               ║",
            high_risk, high_risk_rate
        );
        info!(
            "║ Rejected Inputs:    {:>8}  │  Scoring Failures: {:>6}    ║",
            rejected, failed
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Latency (μs): mean={:>5} p50={:>5} p95={:>5} p99={:>5}      ║",
            latency.mean_us, latency.p50_us, latency.p95_us, latency.p99_us
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Probability Distribution:                                    ║");
        let distribution = self.probability_distribution();
        let total: u64 = distribution.iter().sum();
        for (i, &count) in distribution.iter().enumerate() {
            let pct = if total > 0 {
                (count as f64 / total as f64) * 100.0
            } else {
                0.0
            };
            let bar = "█".repeat(((pct / 2.0) as usize).min(20));
            info!(
                "║   {:.1}-{:.1}: {:>6} ({:>5.1}%) {}",
                i as f64 / 10.0,
                (i + 1) as f64 / 10.0,
                count,
                pct,
                bar
            );
        }
        info!("╚══════════════════════════════════════════════════════════════╝");
    }
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Latency percentiles in microseconds
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LatencyStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Periodic summary logger
pub struct MetricsReporter {
    metrics: Arc<ServiceMetrics>,
    interval: Duration,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<ServiceMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval: Duration::from_secs(interval_secs.max(1)),
        }
    }

    /// Run until the task is dropped
    pub async fn start(self) {
        let mut interval = tokio::time::interval(self.interval);
        // the first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}
