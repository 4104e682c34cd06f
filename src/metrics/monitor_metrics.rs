//! Monitor metrics tracking using OpenTelemetry.

use crate::core::DictionarySnapshot;
use crate::monitor::CycleOutcome;
use opentelemetry::KeyValue;
use opentelemetry::metrics::{Counter, Gauge, Histogram, Meter};
use std::sync::Arc;
use std::time::Instant;

/// Metrics collector for dictionary monitor cycles.
///
/// # Examples
///
/// ```rust,no_run
/// use hotswap_dict::metrics::MonitorMetrics;
/// use hotswap_dict::monitor::CycleOutcome;
/// use opentelemetry::global;
///
/// let metrics = MonitorMetrics::new(global::meter("hotswap-dict"));
///
/// let start = metrics.start_cycle();
/// // ... run the cycle ...
/// metrics.record_outcome(&CycleOutcome::NoOp, start);
/// ```
#[derive(Clone)]
pub struct MonitorMetrics {
    cycles: Counter<u64>,
    outcomes: Counter<u64>,
    cycle_duration: Histogram<f64>,
    entries: Gauge<u64>,
    snapshot_age_seconds: Gauge<i64>,
    last_update: Arc<parking_lot::Mutex<Instant>>,
}

impl MonitorMetrics {
    /// Create a new metrics collector with the provided meter.
    pub fn new(meter: Meter) -> Self {
        let cycles = meter
            .u64_counter("hotswap_dict.cycles")
            .with_description("Total number of monitor cycles")
            .build();

        let outcomes = meter
            .u64_counter("hotswap_dict.cycle.outcomes")
            .with_description("Monitor cycles by outcome (reloaded, noop, failed)")
            .build();

        let cycle_duration = meter
            .f64_histogram("hotswap_dict.cycle.duration")
            .with_description("Duration of monitor cycles in seconds")
            .with_unit("s")
            .build();

        let entries = meter
            .u64_gauge("hotswap_dict.entries")
            .with_description("Entries in the published dictionary snapshot")
            .build();

        let snapshot_age_seconds = meter
            .i64_gauge("hotswap_dict.age")
            .with_description("Time since the last published snapshot in seconds")
            .with_unit("s")
            .build();

        Self {
            cycles,
            outcomes,
            cycle_duration,
            entries,
            snapshot_age_seconds,
            last_update: Arc::new(parking_lot::Mutex::new(Instant::now())),
        }
    }

    /// Count a cycle and start its timer.
    pub fn start_cycle(&self) -> Instant {
        self.cycles.add(1, &[]);
        Instant::now()
    }

    /// Record how a cycle ended.
    ///
    /// # Arguments
    ///
    /// * `outcome` - The finished cycle's outcome
    /// * `start` - The `Instant` the cycle started at
    pub fn record_outcome(&self, outcome: &CycleOutcome, start: Instant) {
        let label = match outcome {
            CycleOutcome::NoOp => "noop",
            CycleOutcome::Reloaded { .. } => "reloaded",
            CycleOutcome::Failed(_) => "failed",
        };
        let attributes = [KeyValue::new("outcome", label)];

        self.outcomes.add(1, &attributes);
        self.cycle_duration
            .record(start.elapsed().as_secs_f64(), &attributes);
    }

    /// Record a newly published snapshot.
    pub fn record_snapshot(&self, snapshot: &DictionarySnapshot) {
        self.entries.record(snapshot.len() as u64, &[]);
        *self.last_update.lock() = Instant::now();
    }

    /// Update the snapshot age gauge.
    pub fn update_snapshot_age(&self) {
        let age_secs = self.last_update.lock().elapsed().as_secs() as i64;
        self.snapshot_age_seconds.record(age_secs, &[]);
    }
}
