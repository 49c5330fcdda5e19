use crate::config::setup::parameters::sampling::SamplingParams;

// Longest grid a run may ask for: about 46 hours at the default 60 samples/s.
pub const MAX_SAMPLES: usize = 10_000_000;

/// Samples in `[0, t_max)`: `floor(t_max * rate)`, zero for a non-positive
/// or non-finite duration. `None` when the count would exceed `MAX_SAMPLES`.
pub fn sample_count(t_max: f64, sampling: &SamplingParams) -> Option<usize> {
    if !(t_max.is_finite() && t_max > 0.0) {
        return Some(0);
    }
    let n = (t_max * sampling.sample_rate()).floor();
    if n > MAX_SAMPLES as f64 {
        None
    } else {
        Some(n as usize)
    }
}

/// Strictly increasing output times starting at zero, spaced by the sample
/// interval, never past the requested duration.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeGrid {
    times: Vec<f64>,
    interval: f64,
}

impl TimeGrid {
    /// Samples at `i / rate` for `i` in `0..sample_count(t_max)`.
    /// A non-positive or non-finite duration gives an empty grid, and a
    /// duration past `MAX_SAMPLES` gives `None`.
    pub fn new(t_max: f64, sampling: &SamplingParams) -> Option<Self> {
        let n = sample_count(t_max, sampling)?;
        let rate = sampling.sample_rate();
        // Compute each time from its index so rounding never accumulates.
        let times = (0..n).map(|i| i as f64 / rate).collect();
        Some(TimeGrid {
            times,
            interval: sampling.sample_interval(),
        })
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn interval(&self) -> f64 {
        self.interval
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn last(&self) -> Option<f64> {
        self.times.last().copied()
    }
}
