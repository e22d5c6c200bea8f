use std::fmt;
use std::time::{Duration, Instant};

/// Ingestion counters for the status bar and the shutdown summary.
#[derive(Debug, Clone)]
pub struct Metrics {
    lines: u64,
    samples: u64,
    duty_updates: u64,
    unrecognized: u64,
    transport_errors: u64,
    last_sample: Instant,
    idle_reported: bool,
}

impl Metrics {
    /// `now` is the baseline for idle detection until the first sample arrives.
    pub fn new(now: Instant) -> Self {
        Self {
            lines: 0,
            samples: 0,
            duty_updates: 0,
            unrecognized: 0,
            transport_errors: 0,
            last_sample: now,
            idle_reported: false,
        }
    }

    pub fn record_line(&mut self) {
        self.lines += 1;
    }

    pub fn record_sample(&mut self, at: Instant) {
        self.samples += 1;
        self.last_sample = at;
        if self.idle_reported {
            self.idle_reported = false;
            tracing::info!(samples = self.samples, "samples resumed");
        }
    }

    pub fn record_duty_update(&mut self) {
        self.duty_updates += 1;
    }

    pub fn record_unrecognized(&mut self) {
        self.unrecognized += 1;
    }

    pub fn record_transport_error(&mut self) {
        self.transport_errors += 1;
    }

    /// How long the stream has been without samples, once that exceeds `threshold`.
    /// Logs a single warning per idle stretch.
    pub fn check_idle(&mut self, now: Instant, threshold: Duration) -> Option<Duration> {
        let age = now.saturating_duration_since(self.last_sample);
        if age <= threshold {
            return None;
        }
        if !self.idle_reported {
            self.idle_reported = true;
            tracing::warn!(
                idle_seconds = ?age.as_secs_f64(),
                "no samples in the last {} seconds",
                threshold.as_secs()
            );
        }
        Some(age)
    }

    pub fn snapshot(&self) -> IngestSnapshot {
        IngestSnapshot {
            lines: self.lines,
            samples: self.samples,
            duty_updates: self.duty_updates,
            unrecognized: self.unrecognized,
            transport_errors: self.transport_errors,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestSnapshot {
    pub lines: u64,
    pub samples: u64,
    pub duty_updates: u64,
    pub unrecognized: u64,
    pub transport_errors: u64,
}

impl fmt::Display for IngestSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "samples {} lines {} skipped {} duty updates {} read errors {}",
            self.samples, self.lines, self.unrecognized, self.duty_updates, self.transport_errors
        )
    }
}
