use std::path::{Path, PathBuf};

use log::{debug, info};
use nalgebra::Point2;

use crate::{export, simulation::SimulationResult, state::Frame};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Advance,
    Stop,
    Save,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Advanced(usize),
    // The cursor is on the last frame; playback does not repeat.
    Finished,
    Stopped,
    // The caller writes the image; the session only decides where.
    SaveTo(PathBuf),
    Ignored,
}

/// Playback over a finished run. Owns the result and a cursor into it,
/// and never changes the frames themselves.
pub struct RenderSession {
    result: SimulationResult,
    cursor: usize,
    rendered: Option<usize>,
    stopped: bool,
    save_dir: PathBuf,
}

impl RenderSession {
    pub fn new<P: AsRef<Path>>(result: SimulationResult, save_dir: P) -> Self {
        RenderSession {
            result,
            cursor: 0,
            rendered: None,
            stopped: false,
            save_dir: save_dir.as_ref().to_path_buf(),
        }
    }

    pub fn result(&self) -> &SimulationResult {
        &self.result
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current(&self) -> Option<&Frame> {
        self.result.get(self.cursor)
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn is_finished(&self) -> bool {
        self.result.is_empty() || self.cursor + 1 >= self.result.len()
    }

    pub fn is_stale(&self) -> bool {
        self.rendered != Some(self.cursor)
    }

    pub fn mark_fresh(&mut self) {
        self.rendered = Some(self.cursor);
    }

    /// Joint-2 positions from the first frame up to the cursor.
    pub fn trace(&self) -> Vec<Point2<f64>> {
        if self.result.is_empty() {
            return vec![];
        }
        self.result.trace(self.cursor).collect()
    }

    pub fn handle(&mut self, command: Command) -> Outcome {
        match command {
            Command::Advance => {
                if self.stopped {
                    Outcome::Ignored
                } else if self.is_finished() {
                    Outcome::Finished
                } else {
                    self.cursor += 1;
                    Outcome::Advanced(self.cursor)
                }
            }
            Command::Stop => {
                if !self.stopped {
                    info!("Stopping playback at frame {}", self.cursor);
                }
                self.stopped = true;
                Outcome::Stopped
            }
            Command::Save => {
                if let Err(e) = export::ensure_dir(&self.save_dir) {
                    log::error!("Could not create {}: {}", self.save_dir.display(), e);
                    return Outcome::Ignored;
                }
                let path = export::snapshot_path(&self.save_dir, self.result.metadata());
                debug!("Snapshot of frame {} goes to {}", self.cursor, path.display());
                self.stopped = true;
                Outcome::SaveTo(path)
            }
        }
    }
}
