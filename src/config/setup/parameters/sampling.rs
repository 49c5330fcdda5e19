#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct SamplingParams {
    // Animation frame rate (frames/s).
    pub fps: u32,
    // Samples per animation frame. Higher values smooth the trace.
    pub resolution_factor: u32,
}

impl Default for SamplingParams {
    fn default() -> Self {
        SamplingParams {
            fps: 30,
            resolution_factor: 2,
        }
    }
}

impl SamplingParams {
    pub fn is_valid(&self) -> bool {
        self.fps > 0 && self.resolution_factor > 0
    }

    // Samples per second of simulated time.
    pub fn sample_rate(&self) -> f64 {
        self.fps as f64 * self.resolution_factor as f64
    }

    pub fn sample_interval(&self) -> f64 {
        1.0 / self.sample_rate()
    }
}

#[cfg(test)]
mod tests {
    use super::SamplingParams;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_rate() {
        let s = SamplingParams::default();
        assert!(s.is_valid());
        assert_eq!(s.sample_rate(), 60.0);
        assert_relative_eq!(s.sample_interval(), 1.0 / 60.0);
    }

    #[test]
    fn test_zero_rate_is_invalid() {
        let s = SamplingParams {
            fps: 0,
            resolution_factor: 2,
        };
        assert!(!s.is_valid());
        let s = SamplingParams {
            fps: 30,
            resolution_factor: 0,
        };
        assert!(!s.is_valid());
    }
}
