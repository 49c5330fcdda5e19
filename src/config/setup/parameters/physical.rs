// Derive YAML deserialize for PhysicalParams.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct PhysicalParams {
    // Gravitational acceleration (m/s^2).
    pub gravity: f64,
    // Rod lengths (m). Fixed for the whole run.
    pub length1: f64,
    pub length2: f64,
    // Point masses at the rod ends (kg).
    pub mass1: f64,
    pub mass2: f64,
}

impl Default for PhysicalParams {
    fn default() -> Self {
        PhysicalParams {
            gravity: 9.81,
            length1: 1.0,
            length2: 1.0,
            mass1: 0.5,
            mass2: 0.5,
        }
    }
}

impl PhysicalParams {
    pub fn total_mass(&self) -> f64 {
        self.mass1 + self.mass2
    }

    pub fn total_length(&self) -> f64 {
        self.length1 + self.length2
    }

    // Small-oscillation period of a single pendulum of length L1.
    pub fn natural_period(&self) -> f64 {
        2.0 * std::f64::consts::PI * (self.length1 / self.gravity).sqrt()
    }

    /// Returns a description of the first offending field, if any.
    pub fn validate(&self) -> Result<(), String> {
        if !self.gravity.is_finite() {
            return Err(format!("gravity must be finite, got {}", self.gravity));
        }
        for (name, v) in [
            ("length1", self.length1),
            ("length2", self.length2),
            ("mass1", self.mass1),
            ("mass2", self.mass2),
        ] {
            if !(v.is_finite() && v > 0.0) {
                return Err(format!("{} must be finite and positive, got {}", name, v));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::PhysicalParams;

    #[test]
    fn test_defaults_are_valid() {
        let p = PhysicalParams::default();
        assert!(p.validate().is_ok());
        assert_eq!(p.total_mass(), 1.0);
        assert_eq!(p.total_length(), 2.0);
    }

    #[test]
    fn test_rejects_degenerate() {
        let p = PhysicalParams {
            mass1: 0.0,
            ..Default::default()
        };
        assert!(p.validate().unwrap_err().contains("mass1"));

        let p = PhysicalParams {
            length2: f64::NAN,
            ..Default::default()
        };
        assert!(p.validate().unwrap_err().contains("length2"));

        let p = PhysicalParams {
            gravity: f64::INFINITY,
            ..Default::default()
        };
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_zero_gravity_is_allowed() {
        let p = PhysicalParams {
            gravity: 0.0,
            ..Default::default()
        };
        assert!(p.validate().is_ok());
    }
}
