use anyhow::Result;
use std::time::{Duration, Instant};

use crate::{
    metrics::Metrics,
    parser::{decode_line, Record},
    persistence::Persistence,
    render::Viewport,
    serial::LineSource,
    visibility::VisibilityFlags,
    window::{Sample, SampleWindow},
};

/// Everything the render/drain loop mutates, owned by the dispatcher.
pub struct PlotState {
    pub window: SampleWindow,
    /// Most recent duty cycle; attached to every sample until superseded.
    pub duty_cycle: u8,
    pub visibility: VisibilityFlags,
    pub view: Viewport,
    pub metrics: Metrics,
    /// Last toggle notice.
    pub status: Option<String>,
    /// Most recent read failure; cleared once the source delivers again.
    pub transport_error: Option<String>,
    pub idle_for: Option<Duration>,
    started: Instant,
}

impl PlotState {
    pub fn new(max_points: usize, started: Instant) -> Self {
        Self {
            window: SampleWindow::new(max_points),
            duty_cycle: 0,
            visibility: VisibilityFlags::default(),
            view: Viewport::default(),
            metrics: Metrics::new(started),
            status: None,
            transport_error: None,
            idle_for: None,
            started,
        }
    }

    pub fn elapsed_at(&self, now: Instant) -> f64 {
        now.saturating_duration_since(self.started).as_secs_f64()
    }

    /// Applies one decoded line. Returns the sample that must be persisted, if any.
    pub fn ingest(&mut self, line: &str, now: Instant) -> Option<Sample> {
        self.metrics.record_line();
        match Record::classify(line) {
            Record::DutyCycleUpdate { percent } => {
                self.duty_cycle = percent;
                self.metrics.record_duty_update();
                tracing::debug!(percent, "duty cycle updated");
                None
            }
            Record::SampleReading { raw, scaled } => {
                let sample = Sample {
                    elapsed_seconds: self.elapsed_at(now),
                    raw,
                    scaled,
                    duty_cycle_percent: self.duty_cycle,
                };
                self.window.append(sample);
                self.metrics.record_sample(now);
                self.transport_error = None;
                Some(sample)
            }
            Record::Unrecognized => {
                self.metrics.record_unrecognized();
                tracing::trace!(line, "line ignored");
                None
            }
        }
    }

    /// Recomputes the axis ranges from the window; keeps the prior view when nothing is visible.
    pub fn refresh_view(&mut self, margin: f64) -> bool {
        self.view.refresh(&self.window, &self.visibility, margin)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrainReport {
    pub lines: usize,
    pub samples: usize,
    pub transport_error: bool,
}

/// Reads every record the source has ready, without waiting for more.
///
/// Transport failures end this drain and are surfaced through `state.transport_error`.
/// Persistence failures are returned to the caller.
pub async fn drain<S>(
    source: &mut S,
    sink: &mut Persistence,
    state: &mut PlotState,
) -> Result<DrainReport>
where
    S: LineSource + ?Sized,
{
    let mut report = DrainReport::default();
    loop {
        let record = match source.has_pending() {
            Ok(false) => break,
            Ok(true) => source.read_record().await,
            Err(err) => Err(err),
        };
        let bytes = match record {
            Ok(Some(bytes)) => bytes,
            Ok(None) => break,
            Err(err) => {
                state.metrics.record_transport_error();
                tracing::warn!(error = %format!("{err:#}"), "serial read failed");
                state.transport_error = Some(format!("transport error: {err:#}"));
                report.transport_error = true;
                break;
            }
        };
        state.transport_error = None;
        let line = decode_line(&bytes);
        report.lines += 1;
        if let Some(sample) = state.ingest(&line, Instant::now()) {
            sink.append_row(&sample).await?;
            report.samples += 1;
        }
    }
    Ok(report)
}
