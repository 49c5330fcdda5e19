pub mod parameters;

use std::{error::Error, fs::File, io::Read, path::Path};

use crate::{
    dynamics::energy,
    numerics::{grid, solver::Tolerances},
};

use self::parameters::{
    initial::InitialConditions, physical::PhysicalParams, sampling::SamplingParams,
};

/// Everything needed to reproduce one run. Built once, then only read.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SetupConfig {
    pub initial_conditions: InitialConditions,
    // Simulated duration (s).
    pub t_max: f64,
    pub parameters: PhysicalParams,
    pub sampling: SamplingParams,
    pub tolerances: Tolerances,
}

impl Default for SetupConfig {
    fn default() -> Self {
        SetupConfig {
            initial_conditions: InitialConditions::default(),
            t_max: 60.0,
            parameters: PhysicalParams::default(),
            sampling: SamplingParams::default(),
            tolerances: Tolerances::default(),
        }
    }
}

impl SetupConfig {
    pub fn parse<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn Error>> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        Self::parse_str(&contents)
    }

    pub fn parse_str(contents: &str) -> Result<Self, Box<dyn Error>> {
        let config: SetupConfig = serde_yaml::from_str(contents)?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, Box<dyn Error>> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Frames the run will produce, or `None` if the duration is too long
    /// to sample.
    pub fn n_frames(&self) -> Option<usize> {
        grid::sample_count(self.t_max, &self.sampling)
    }

    pub fn print(&self) {
        let p = &self.parameters;
        let ic = &self.initial_conditions;
        let e0 = energy::total(&ic.state(), p);
        let n = match self.n_frames() {
            Some(n) => n.to_string(),
            None => format!("more than {}", grid::MAX_SAMPLES),
        };
        println!(
            "\
Physical parameters:
  Gravity: {g} m/s^2
  Arm 1: length {l1} m, mass {m1} kg
  Arm 2: length {l2} m, mass {m2} kg

Initial conditions:
  Angle 1: {a1}°
  Angle 2: {a2}°
  Duration: {t_max} s

Sampling:
  Frame rate: {fps} frames/s
  Resolution factor: {rf}
  Solver tolerances: rtol={rtol:e}, atol={atol:e}

Computed derived parameters (for info only):
  Sample interval: {dt:.4} s
  Frame count: {n}
  Small-oscillation period (arm 1): {period:.3} s
  Initial mechanical energy: {e0:.4} J",
            g = p.gravity,
            l1 = p.length1,
            m1 = p.mass1,
            l2 = p.length2,
            m2 = p.mass2,
            a1 = ic.angle1_deg,
            a2 = ic.angle2_deg,
            t_max = self.t_max,
            fps = self.sampling.fps,
            rf = self.sampling.resolution_factor,
            rtol = self.tolerances.rtol,
            atol = self.tolerances.atol,
            dt = self.sampling.sample_interval(),
            period = p.natural_period(),
            e0 = e0,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::SetupConfig;

    #[test]
    fn test_empty_document_is_default() {
        let config = SetupConfig::parse_str("{}").unwrap();
        assert_eq!(config, SetupConfig::default());
        assert_eq!(config.n_frames(), Some(3600));
    }

    #[test]
    fn test_partial_override() {
        let config = SetupConfig::parse_str(
            "
initial_conditions:
  angle1_deg: 90.0
t_max: 10
parameters:
  mass2: 2.0
sampling:
  fps: 24
tolerances:
  rtol: 1.0e-6
",
        )
        .unwrap();
        assert_eq!(config.initial_conditions.angle1_deg, 90.0);
        assert_eq!(config.initial_conditions.angle2_deg, 133.4);
        assert_eq!(config.t_max, 10.0);
        assert_eq!(config.parameters.mass2, 2.0);
        assert_eq!(config.parameters.mass1, 0.5);
        assert_eq!(config.sampling.fps, 24);
        assert_eq!(config.sampling.resolution_factor, 2);
        assert_eq!(config.tolerances.rtol, 1e-6);
        assert_eq!(config.tolerances.atol, 1e-10);
        assert_eq!(config.n_frames(), Some(480));
    }

    #[test]
    fn test_yaml_round_trip_keeps_values() {
        let mut config = SetupConfig::default();
        config.t_max = 12.5;
        config.tolerances.atol = 1e-12;
        let yaml = config.to_yaml().unwrap();
        assert_eq!(SetupConfig::parse_str(&yaml).unwrap(), config);
    }

    #[test]
    fn test_frame_count_of_unsampleable_durations() {
        let mut config = SetupConfig::default();
        config.t_max = f64::INFINITY;
        assert_eq!(config.n_frames(), Some(0));
        config.t_max = 1e30;
        assert_eq!(config.n_frames(), None);
        config.t_max = -1.0;
        assert_eq!(config.n_frames(), Some(0));
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(SetupConfig::parse_str("sampling: {fps: -3}").is_err());
        assert!(SetupConfig::parse("/nonexistent/setup.yaml").is_err());
    }
}
