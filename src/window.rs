use std::collections::VecDeque;

use crate::visibility::{Series, VisibilityFlags};

/// One accepted photocell reading, stamped with the duty cycle in effect when it arrived.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub elapsed_seconds: f64,
    pub raw: u32,
    pub scaled: u32,
    pub duty_cycle_percent: u8,
}

impl Sample {
    pub fn value(&self, series: Series) -> f64 {
        match series {
            Series::Raw => f64::from(self.raw),
            Series::Scaled => f64::from(self.scaled),
            Series::Duty => f64::from(self.duty_cycle_percent),
        }
    }
}

/// Per-series values aligned with `timestamps`; hidden series are all `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowContents {
    pub timestamps: Vec<f64>,
    pub raw: Vec<Option<f64>>,
    pub scaled: Vec<Option<f64>>,
    pub duty: Vec<Option<f64>>,
}

impl WindowContents {
    pub fn series(&self, series: Series) -> &[Option<f64>] {
        match series {
            Series::Raw => &self.raw,
            Series::Scaled => &self.scaled,
            Series::Duty => &self.duty,
        }
    }

    /// The present `(time, value)` pairs of a series, ready for plotting.
    pub fn points(&self, series: Series) -> Vec<(f64, f64)> {
        self.timestamps
            .iter()
            .zip(self.series(series))
            .filter_map(|(t, v)| v.map(|v| (*t, v)))
            .collect()
    }
}

/// Fixed-capacity FIFO of the most recent samples.
#[derive(Debug, Clone)]
pub struct SampleWindow {
    samples: VecDeque<Sample>,
    capacity: usize,
}

impl SampleWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub fn append(&mut self, sample: Sample) {
        debug_assert!(self
            .samples
            .back()
            .map_or(true, |last| last.elapsed_seconds <= sample.elapsed_seconds));
        self.samples.push_back(sample);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    pub fn latest(&self) -> Option<&Sample> {
        self.samples.back()
    }

    pub fn current_contents(&self, flags: &VisibilityFlags) -> WindowContents {
        let column = |series: Series| -> Vec<Option<f64>> {
            if flags.is_visible(series) {
                self.samples.iter().map(|s| Some(s.value(series))).collect()
            } else {
                vec![None; self.samples.len()]
            }
        };
        WindowContents {
            timestamps: self.samples.iter().map(|s| s.elapsed_seconds).collect(),
            raw: column(Series::Raw),
            scaled: column(Series::Scaled),
            duty: column(Series::Duty),
        }
    }

    /// Min and max over every visible series, or `None` if nothing would be drawn.
    pub fn bounds(&self, flags: &VisibilityFlags) -> Option<(f64, f64)> {
        Series::ALL
            .into_iter()
            .filter(|series| flags.is_visible(*series))
            .flat_map(|series| self.samples.iter().map(move |s| s.value(series)))
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Elapsed seconds of the oldest and newest sample.
    pub fn time_span(&self) -> Option<(f64, f64)> {
        let first = self.samples.front()?;
        let last = self.samples.back()?;
        Some((first.elapsed_seconds, last.elapsed_seconds))
    }
}
