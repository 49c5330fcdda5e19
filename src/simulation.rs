use std::ops::Index;

use log::{info, warn};
use nalgebra::{Point2, Vector4};

use crate::{
    config::{
        run::RunContext,
        setup::{
            parameters::{
                initial::InitialConditions, physical::PhysicalParams, sampling::SamplingParams,
            },
            SetupConfig,
        },
    },
    dynamics::{kinematics, DoublePendulum},
    numerics::{
        grid::{self, TimeGrid, MAX_SAMPLES},
        solver::{IntegrationError, Integrator, SolverStats},
        OdeSystem,
    },
    state::{Frame, StateVector},
};

// What a run was started with, for labelling and file naming.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct RunMetadata {
    pub initial_conditions: InitialConditions,
    pub t_max: f64,
}

/// The frames of one run, in time order, one per sample time.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    frames: Vec<Frame>,
    sample_interval: f64,
    metadata: RunMetadata,
    complete: bool,
    stats: SolverStats,
}

impl SimulationResult {
    fn assemble(
        times: &[f64],
        states: Vec<Vector4<f64>>,
        params: &PhysicalParams,
        sample_interval: f64,
        metadata: RunMetadata,
        complete: bool,
        stats: SolverStats,
    ) -> Self {
        let states: Vec<StateVector> = states.into_iter().map(StateVector::from).collect();
        let joints = kinematics::project_all(&states, params);
        let frames = times
            .iter()
            .zip(states)
            .zip(joints)
            .map(|((&t, state), joints)| Frame { t, state, joints })
            .collect();
        SimulationResult {
            frames,
            sample_interval,
            metadata,
            complete,
            stats,
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&Frame> {
        self.frames.get(i)
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Frame> {
        self.frames.iter()
    }

    pub fn states(&self) -> impl Iterator<Item = &StateVector> + '_ {
        self.frames.iter().map(|f| &f.state)
    }

    /// Seconds of simulated time between consecutive frames.
    pub fn sample_interval(&self) -> f64 {
        self.sample_interval
    }

    pub fn metadata(&self) -> &RunMetadata {
        &self.metadata
    }

    /// False when the run stopped early and this is only a valid prefix.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn stats(&self) -> &SolverStats {
        &self.stats
    }

    /// Path of the second mass from the first frame up to and including `i`.
    pub fn trace(&self, i: usize) -> impl Iterator<Item = Point2<f64>> + '_ {
        let end = (i + 1).min(self.frames.len());
        self.frames[..end].iter().map(|f| f.joints.joint2)
    }
}

impl Index<usize> for SimulationResult {
    type Output = Frame;

    fn index(&self, i: usize) -> &Frame {
        &self.frames[i]
    }
}

impl<'a> IntoIterator for &'a SimulationResult {
    type Item = &'a Frame;
    type IntoIter = std::slice::Iter<'a, Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum SimulationError {
    #[display(
        "duration must be non-negative and span at most {} samples, got {t_max} s",
        MAX_SAMPLES
    )]
    InvalidDuration { t_max: f64 },
    #[display("fps and resolution factor must be positive, got {fps} and {resolution_factor}")]
    InvalidSampleRate { fps: u32, resolution_factor: u32 },
    #[display("invalid physical setup: {reason}")]
    InvalidParameters { reason: String },
    #[display("invalid solver tolerances: {reason}")]
    InvalidTolerance { reason: String },
    #[display("integration diverged at t={t}, {} frames completed", completed.len())]
    IntegrationDivergence { t: f64, completed: SimulationResult },
    #[display("simulation cancelled at t={t}, {} frames completed", completed.len())]
    Cancelled { t: f64, completed: SimulationResult },
}

impl SimulationError {
    /// The valid prefix of frames, for failures that happened mid-run.
    pub fn completed(&self) -> Option<&SimulationResult> {
        match self {
            SimulationError::IntegrationDivergence { completed, .. }
            | SimulationError::Cancelled { completed, .. } => Some(completed),
            _ => None,
        }
    }
}

fn validate(config: &SetupConfig) -> Result<(), SimulationError> {
    let t_max = config.t_max;
    if !(t_max.is_finite() && t_max >= 0.0) {
        return Err(SimulationError::InvalidDuration { t_max });
    }
    let SamplingParams {
        fps,
        resolution_factor,
    } = config.sampling;
    if !config.sampling.is_valid() {
        return Err(SimulationError::InvalidSampleRate {
            fps,
            resolution_factor,
        });
    }
    if grid::sample_count(t_max, &config.sampling).is_none() {
        return Err(SimulationError::InvalidDuration { t_max });
    }
    config
        .parameters
        .validate()
        .map_err(|reason| SimulationError::InvalidParameters { reason })?;
    let ic = &config.initial_conditions;
    if !(ic.angle1_deg.is_finite() && ic.angle2_deg.is_finite()) {
        return Err(SimulationError::InvalidParameters {
            reason: format!(
                "initial angles must be finite, got {}° and {}°",
                ic.angle1_deg, ic.angle2_deg
            ),
        });
    }
    config
        .tolerances
        .validate()
        .map_err(|reason| SimulationError::InvalidTolerance { reason })
}

fn early_stop(
    err: IntegrationError<4>,
    grid: &TimeGrid,
    config: &SetupConfig,
    metadata: RunMetadata,
) -> SimulationError {
    let (t, completed, stats, cancelled) = match err {
        IntegrationError::Diverged {
            t,
            completed,
            stats,
            ..
        } => (t, completed, stats, false),
        IntegrationError::Cancelled {
            t,
            completed,
            stats,
        } => (t, completed, stats, true),
    };
    let n = completed.len();
    let completed = SimulationResult::assemble(
        &grid.times()[..n],
        completed,
        &config.parameters,
        grid.interval(),
        metadata,
        false,
        stats,
    );
    if cancelled {
        SimulationError::Cancelled { t, completed }
    } else {
        SimulationError::IntegrationDivergence { t, completed }
    }
}

/// Runs one simulation to completion, or until the context is cancelled.
pub fn run(config: &SetupConfig, ctx: &RunContext) -> Result<SimulationResult, SimulationError> {
    run_system(config, ctx, &DoublePendulum::new(config.parameters))
}

// Drives any four-dimensional system through the run pipeline. The state is
// read as the pendulum's (theta1, omega1, theta2, omega2).
fn run_system<S: OdeSystem<4>>(
    config: &SetupConfig,
    ctx: &RunContext,
    system: &S,
) -> Result<SimulationResult, SimulationError> {
    validate(config)?;

    let metadata = RunMetadata {
        initial_conditions: config.initial_conditions,
        t_max: config.t_max,
    };
    let grid = TimeGrid::new(config.t_max, &config.sampling)
        .ok_or(SimulationError::InvalidDuration { t_max: config.t_max })?;
    let y0 = config.initial_conditions.state();
    info!(
        "Simulating {} s from angles ({}°, {}°), {} frames at {:.4} s",
        config.t_max,
        config.initial_conditions.angle1_deg,
        config.initial_conditions.angle2_deg,
        grid.len(),
        grid.interval()
    );

    let solution = Integrator::new(system, config.tolerances)
        .with_cancel(&ctx.cancel)
        .solve_at(0.0, y0.as_vector(), grid.times());

    match solution {
        Ok(solution) => {
            info!(
                "Integration done: {} steps accepted, {} rejected",
                solution.stats.n_accepted, solution.stats.n_rejected
            );
            Ok(SimulationResult::assemble(
                grid.times(),
                solution.states,
                &config.parameters,
                grid.interval(),
                metadata,
                true,
                solution.stats,
            ))
        }
        Err(err) => {
            warn!("Simulation stopped early: {}", err);
            Err(early_stop(err, &grid, config, metadata))
        }
    }
}

/// Simulates a pendulum released from rest at the given angles (degrees),
/// with default solver tolerances.
pub fn simulate(
    angle1_deg: f64,
    angle2_deg: f64,
    t_max: f64,
    params: PhysicalParams,
    fps: u32,
    resolution_factor: u32,
) -> Result<SimulationResult, SimulationError> {
    let config = SetupConfig {
        initial_conditions: InitialConditions::new(angle1_deg, angle2_deg),
        t_max,
        parameters: params,
        sampling: SamplingParams {
            fps,
            resolution_factor,
        },
        ..Default::default()
    };
    run(&config, &RunContext::new())
}
