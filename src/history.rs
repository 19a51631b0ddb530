//! Rolling window of download samples and its sparkline chart.

use std::collections::VecDeque;

/// Maximum number of samples retained.
pub const CAPACITY: usize = 60;

/// Maximum number of samples drawn in the chart.
pub const CHART_WIDTH: usize = 50;

/// Number of text rows in the chart.
pub const CHART_HEIGHT: usize = 8;

/// Bounded, arrival-ordered sample buffer. The oldest sample is evicted
/// once [`CAPACITY`] is exceeded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryBuffer {
    samples: VecDeque<f64>,
}

impl HistoryBuffer {
    pub fn new() -> Self {
        Self { samples: VecDeque::with_capacity(CAPACITY + 1) }
    }

    /// Append a sample, evicting the oldest when full.
    pub fn push(&mut self, sample: f64) {
        self.samples.push_back(sample);
        if self.samples.len() > CAPACITY {
            self.samples.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }

    /// The most recent samples, at most [`CHART_WIDTH`], oldest first.
    pub fn chart_window(&self) -> Vec<f64> {
        let skip = self.samples.len().saturating_sub(CHART_WIDTH);
        self.iter().skip(skip).collect()
    }

    /// Render the chart as [`CHART_HEIGHT`] rows of block glyphs, top row
    /// first. Fewer than two samples render nothing.
    pub fn chart_rows(&self) -> Vec<String> {
        if self.samples.len() < 2 {
            return Vec::new();
        }

        let window = self.chart_window();
        let max = window.iter().copied().fold(1.0, f64::max);

        (0..CHART_HEIGHT)
            .rev()
            .map(|row| {
                let threshold = row as f64 / (CHART_HEIGHT - 1) as f64 * max;
                window
                    .iter()
                    .map(|&sample| if sample >= threshold { '█' } else { ' ' })
                    .collect()
            })
            .collect()
    }
}
