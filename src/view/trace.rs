use std::error::Error;

use colorgrad::Gradient;

// Alpha of the oldest trace point; the newest is fully opaque.
pub const MIN_ALPHA: f32 = 0.05;

/// Colours the joint-2 path so that older points fade into the background.
pub struct TracePalette {
    gradient: colorgrad::LinearGradient,
}

impl TracePalette {
    pub fn new() -> Result<Self, Box<dyn Error>> {
        let gradient = colorgrad::GradientBuilder::new()
            .html_colors(&["#400000", "#ff2020"])
            .build::<colorgrad::LinearGradient>()?;
        Ok(TracePalette { gradient })
    }

    /// RGBA for a point at `age` in [0, 1], where 0 is the oldest point
    /// and 1 the current position.
    pub fn rgba_at(&self, age: f64) -> [f32; 4] {
        let age = age.clamp(0.0, 1.0);
        let c = self.gradient.at(age as f32).to_array();
        let alpha = MIN_ALPHA + (1.0 - MIN_ALPHA) * age as f32;
        [c[0] as f32, c[1] as f32, c[2] as f32, alpha]
    }

    /// One colour per point of a trace of length `n`, oldest first.
    pub fn colors(&self, n: usize) -> Vec<[f32; 4]> {
        match n {
            0 => vec![],
            1 => vec![self.rgba_at(1.0)],
            _ => (0..n)
                .map(|i| self.rgba_at(i as f64 / (n - 1) as f64))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_colors_fade_in() {
        let palette = TracePalette::new().unwrap();
        let colors = palette.colors(5);
        assert_eq!(colors.len(), 5);
        assert_abs_diff_eq!(colors[0][3], MIN_ALPHA, epsilon = 1e-6);
        assert_abs_diff_eq!(colors[4][3], 1.0, epsilon = 1e-6);
        for pair in colors.windows(2) {
            assert!(pair[1][3] > pair[0][3]);
            // Red channel brightens towards the head of the trace.
            assert!(pair[1][0] >= pair[0][0]);
        }
    }

    #[test]
    fn test_short_traces() {
        let palette = TracePalette::new().unwrap();
        assert!(palette.colors(0).is_empty());
        let single = palette.colors(1);
        assert_eq!(single.len(), 1);
        assert_abs_diff_eq!(single[0][3], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_age_is_clamped() {
        let palette = TracePalette::new().unwrap();
        assert_eq!(palette.rgba_at(-3.0), palette.rgba_at(0.0));
        assert_eq!(palette.rgba_at(7.0), palette.rgba_at(1.0));
    }
}
