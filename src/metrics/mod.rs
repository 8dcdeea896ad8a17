//! Prometheus metrics for scheduling passes
//!
//! This module tracks:
//! - Pass counts and duration
//! - Candidate list size and how many candidates end up recording
//! - Demotions by arbitration stage and inputs moved by the multi-card pass
//!
//! # Usage
//!
//! Call `init_metrics()` at application startup to register all metrics.
//! If initialization fails (or is never called), metrics operations become no-ops.

use prometheus::{
    register_counter, register_counter_vec, register_gauge, register_histogram, Counter,
    CounterVec, Encoder, Gauge, Histogram, TextEncoder,
};
use std::sync::OnceLock;

// ============================================================================
// Metrics Storage
// ============================================================================

/// Container for all scheduler metrics
struct SchedulerMetrics {
    passes_total: Counter,
    pass_duration: Histogram,
    candidates: Gauge,
    recording: Gauge,
    unresolved_conflicts: Gauge,
    demotions: CounterVec,
    rebalanced_inputs: Counter,
}

/// Global storage for scheduler metrics
static SCHEDULER_METRICS: OnceLock<SchedulerMetrics> = OnceLock::new();

/// Flag to track if initialization was attempted
static METRICS_INIT_ATTEMPTED: OnceLock<bool> = OnceLock::new();

/// Arbitration stage that demoted a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemotionStage {
    Override,
    Dislike,
    Guess,
}

impl DemotionStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Override => "override",
            Self::Dislike => "dislike",
            Self::Guess => "guess",
        }
    }
}

// ============================================================================
// Initialization
// ============================================================================

/// Initialize all Prometheus metrics
///
/// Safe to call more than once; only the first call registers anything.
///
/// # Example
///
/// ```ignore
/// if let Err(e) = recsched::metrics::init_metrics() {
///     eprintln!("Warning: Metrics initialization failed: {}", e);
/// }
/// ```
pub fn init_metrics() -> Result<(), Box<dyn std::error::Error>> {
    if METRICS_INIT_ATTEMPTED.get().is_some() {
        return Ok(());
    }
    METRICS_INIT_ATTEMPTED.set(true).ok();

    let metrics = SchedulerMetrics {
        passes_total: register_counter!(
            "recsched_passes_total",
            "Total number of completed scheduling passes"
        )?,
        pass_duration: register_histogram!(
            "recsched_pass_duration_seconds",
            "Scheduling pass duration in seconds",
            vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
        )?,
        candidates: register_gauge!(
            "recsched_candidates",
            "Candidates in the list after the last pass"
        )?,
        recording: register_gauge!(
            "recsched_recording_candidates",
            "Candidates marked for recording after the last pass"
        )?,
        unresolved_conflicts: register_gauge!(
            "recsched_unresolved_conflicts",
            "Candidates still flagged conflicting after the last pass"
        )?,
        demotions: register_counter_vec!(
            "recsched_demotions_total",
            "Candidates demoted to not recording, by arbitration stage",
            &["stage"]
        )?,
        rebalanced_inputs: register_counter!(
            "recsched_rebalanced_inputs_total",
            "Candidates moved to another input by the multi-card pass"
        )?,
    };

    SCHEDULER_METRICS
        .set(metrics)
        .map_err(|_| "Scheduler metrics already initialized")?;

    tracing::info!("Prometheus metrics initialized successfully");
    Ok(())
}

/// Check if metrics have been initialized
pub fn metrics_initialized() -> bool {
    SCHEDULER_METRICS.get().is_some()
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Render all registered metrics in Prometheus text format
pub fn gather_metrics() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Record the outcome of a finished pass
pub fn record_pass(candidates: usize, recording: usize, unresolved: usize) {
    let Some(m) = SCHEDULER_METRICS.get() else {
        return;
    };

    m.passes_total.inc();
    m.candidates.set(candidates as f64);
    m.recording.set(recording as f64);
    m.unresolved_conflicts.set(unresolved as f64);
}

/// Record candidates demoted by one arbitration stage
pub fn record_demotions(stage: DemotionStage, count: usize) {
    if count == 0 {
        return;
    }
    if let Some(m) = SCHEDULER_METRICS.get() {
        m.demotions
            .with_label_values(&[stage.as_str()])
            .inc_by(count as f64);
    }
}

/// Record candidates moved to a different input
pub fn record_rebalanced(count: usize) {
    if count == 0 {
        return;
    }
    if let Some(m) = SCHEDULER_METRICS.get() {
        m.rebalanced_inputs.inc_by(count as f64);
    }
}

/// Histogram timer guard that records duration on drop
pub struct MetricsTimer {
    timer: Option<prometheus::HistogramTimer>,
}

impl MetricsTimer {
    fn new(timer: prometheus::HistogramTimer) -> Self {
        Self { timer: Some(timer) }
    }

    /// Create a no-op timer when metrics are not initialized
    fn noop() -> Self {
        Self { timer: None }
    }
}

impl Drop for MetricsTimer {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.stop_and_record();
        }
    }
}

/// Start a pass timer; the duration is recorded when the guard drops
pub fn start_pass_timer() -> MetricsTimer {
    match SCHEDULER_METRICS.get() {
        Some(m) => MetricsTimer::new(m.pass_duration.start_timer()),
        None => MetricsTimer::noop(),
    }
}

// ============================================================================
// Tests
// ============================================================================
