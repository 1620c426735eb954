//! In-memory service metrics, kept separate from the human-readable log.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::info;

/// Width of a predicted-strength histogram bucket (MPa)
const STRENGTH_BUCKET_MPA: f64 = 10.0;
/// Number of histogram buckets; the last one collects everything above
const STRENGTH_BUCKETS: usize = 9;
/// Latency samples kept before the oldest half is dropped
const MAX_LATENCY_SAMPLES: usize = 10_000;

/// Metrics collector for the prediction service
pub struct ServiceMetrics {
    /// Predictions served
    pub predictions_made: AtomicU64,
    /// Submissions rejected by validation
    pub validation_rejections: AtomicU64,
    /// Model calls that failed
    pub inference_failures: AtomicU64,
    /// Model latencies (in microseconds)
    latencies: RwLock<Vec<u64>>,
    /// Predicted strength distribution
    strength_buckets: RwLock<[u64; STRENGTH_BUCKETS]>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl ServiceMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            predictions_made: AtomicU64::new(0),
            validation_rejections: AtomicU64::new(0),
            inference_failures: AtomicU64::new(0),
            latencies: RwLock::new(Vec::with_capacity(1000)),
            strength_buckets: RwLock::new([0; STRENGTH_BUCKETS]),
            start_time: Instant::now(),
        }
    }

    /// Record a served prediction
    pub fn record_prediction(&self, latency: Duration, strength_mpa: f64) {
        self.predictions_made.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut times) = self.latencies.write() {
            times.push(latency.as_micros() as u64);
            if times.len() > MAX_LATENCY_SAMPLES {
                times.drain(0..MAX_LATENCY_SAMPLES / 2);
            }
        }

        let bucket = (strength_mpa.max(0.0) / STRENGTH_BUCKET_MPA) as usize;
        if let Ok(mut buckets) = self.strength_buckets.write() {
            buckets[bucket.min(STRENGTH_BUCKETS - 1)] += 1;
        }
    }

    /// Record a submission rejected by validation
    pub fn record_rejection(&self) {
        self.validation_rejections.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed model call
    pub fn record_failure(&self) {
        self.inference_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get latency statistics
    pub fn get_latency_stats(&self) -> LatencyStats {
        let mut sorted = self
            .latencies
            .read()
            .map(|times| times.clone())
            .unwrap_or_default();
        if sorted.is_empty() {
            return LatencyStats::default();
        }
        sorted.sort_unstable();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();

        LatencyStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: sorted[(count as f64 * 0.95) as usize],
            p99_us: sorted[(count as f64 * 0.99) as usize],
            max_us: sorted[count - 1],
        }
    }

    /// Get current throughput (predictions per second)
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.predictions_made.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Get predicted strength distribution
    pub fn get_strength_distribution(&self) -> [u64; STRENGTH_BUCKETS] {
        self.strength_buckets
            .read()
            .map(|buckets| *buckets)
            .unwrap_or_default()
    }

    /// Point-in-time copy of every metric
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            predictions_made: self.predictions_made.load(Ordering::Relaxed),
            validation_rejections: self.validation_rejections.load(Ordering::Relaxed),
            inference_failures: self.inference_failures.load(Ordering::Relaxed),
            latency: self.get_latency_stats(),
            strength_distribution: self.get_strength_distribution().to_vec(),
            throughput_per_sec: self.get_throughput(),
            uptime_secs: self.start_time.elapsed().as_secs(),
        }
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let snapshot = self.snapshot();
        let latency = &snapshot.latency;

        info!("==================== PREDICTOR METRICS ====================");
        info!(
            "Predictions: {}  Rejected: {}  Failed: {}  Uptime: {}s",
            snapshot.predictions_made,
            snapshot.validation_rejections,
            snapshot.inference_failures,
            snapshot.uptime_secs
        );
        info!(
            "Model latency (us): mean={} p50={} p95={} p99={} max={}",
            latency.mean_us, latency.p50_us, latency.p95_us, latency.p99_us, latency.max_us
        );

        let total: u64 = snapshot.strength_distribution.iter().sum();
        for (i, &count) in snapshot.strength_distribution.iter().enumerate() {
            let pct = if total > 0 {
                (count as f64 / total as f64) * 100.0
            } else {
                0.0
            };
            let low = i as f64 * STRENGTH_BUCKET_MPA;
            let range = if i + 1 == STRENGTH_BUCKETS {
                format!("{low:>3.0}+    ")
            } else {
                format!("{:>3.0}-{:<3.0}", low, low + STRENGTH_BUCKET_MPA)
            };
            info!(
                "  {} MPa: {:>6} ({:>5.1}%) {}",
                range,
                count,
                pct,
                "#".repeat(((pct / 5.0) as usize).min(20))
            );
        }
        info!("===========================================================");
    }
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Model latency statistics
#[derive(Debug, Default, Clone, Serialize)]
pub struct LatencyStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Serializable view of [`ServiceMetrics`]
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub predictions_made: u64,
    pub validation_rejections: u64,
    pub inference_failures: u64,
    pub latency: LatencyStats,
    pub strength_distribution: Vec<u64>,
    pub throughput_per_sec: f64,
    pub uptime_secs: u64,
}
