use std::{error::Error, path::PathBuf};

use super::setup::SetupConfig;

/// Command-line values that take precedence over the config file.
#[derive(Debug, Default, clap::Args)]
pub struct SetupArgs {
    /// YAML setup file; missing fields fall back to defaults
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Initial angle of the first arm from the downward vertical, in degrees
    #[arg(long = "angle1", allow_hyphen_values = true)]
    pub angle1: Option<f64>,

    /// Initial angle of the second arm, in degrees
    #[arg(long = "angle2", allow_hyphen_values = true)]
    pub angle2: Option<f64>,

    /// Simulated duration in seconds
    #[arg(short = 't', long = "t-max")]
    pub t_max: Option<f64>,

    #[arg(long = "fps")]
    pub fps: Option<u32>,

    /// Solver samples per displayed frame
    #[arg(long = "resolution-factor")]
    pub resolution_factor: Option<u32>,

    #[arg(long = "rtol")]
    pub rtol: Option<f64>,

    #[arg(long = "atol")]
    pub atol: Option<f64>,
}

impl SetupArgs {
    pub fn to_config(&self) -> Result<SetupConfig, Box<dyn Error>> {
        let base = match &self.config {
            Some(path) => SetupConfig::parse(path)?,
            None => SetupConfig::default(),
        };
        Ok(self.apply(base))
    }

    pub fn apply(&self, mut config: SetupConfig) -> SetupConfig {
        let ic = &mut config.initial_conditions;
        if let Some(a) = self.angle1 {
            ic.angle1_deg = a;
        }
        if let Some(a) = self.angle2 {
            ic.angle2_deg = a;
        }
        if let Some(t) = self.t_max {
            config.t_max = t;
        }
        if let Some(fps) = self.fps {
            config.sampling.fps = fps;
        }
        if let Some(rf) = self.resolution_factor {
            config.sampling.resolution_factor = rf;
        }
        if let Some(rtol) = self.rtol {
            config.tolerances.rtol = rtol;
        }
        if let Some(atol) = self.atol {
            config.tolerances.atol = atol;
        }
        config
    }
}
