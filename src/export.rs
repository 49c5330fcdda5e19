use std::{
    error::Error,
    fs,
    path::{Path, PathBuf},
};

use log::info;

use crate::simulation::{RunMetadata, SimulationResult};

pub const SAVE_DIR: &str = "saved_pendulums";

pub fn ensure_dir<P: AsRef<Path>>(dir: P) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(dir.as_ref())?;
    Ok(())
}

/// File name for a still of a run, unique per initial angles and duration.
/// Saving the same run twice overwrites the earlier image.
pub fn snapshot_filename(metadata: &RunMetadata) -> String {
    format!(
        "theta1_{}_theta2_{}_{}s.png",
        metadata.initial_conditions.angle1_deg,
        metadata.initial_conditions.angle2_deg,
        metadata.t_max
    )
}

pub fn snapshot_path<P: AsRef<Path>>(dir: P, metadata: &RunMetadata) -> PathBuf {
    dir.as_ref().join(snapshot_filename(metadata))
}

#[derive(serde::Serialize)]
struct FrameRecord {
    index: usize,
    t: f64,
    theta1: f64,
    omega1: f64,
    theta2: f64,
    omega2: f64,
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
}

/// Writes one CSV row per frame, creating the parent directory if needed.
pub fn write_frames_csv<P: AsRef<Path>>(
    path: P,
    result: &SimulationResult,
) -> Result<(), Box<dyn Error>> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    for (index, f) in result.iter().enumerate() {
        writer.serialize(FrameRecord {
            index,
            t: f.t,
            theta1: f.state.theta1,
            omega1: f.state.omega1,
            theta2: f.state.theta2,
            omega2: f.state.omega2,
            x1: f.joints.joint1.x,
            y1: f.joints.joint1.y,
            x2: f.joints.joint2.x,
            y2: f.joints.joint2.y,
        })?;
    }
    writer.flush()?;
    info!("Wrote {} frames to {}", result.len(), path.display());
    Ok(())
}
