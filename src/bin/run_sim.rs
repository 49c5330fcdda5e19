use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use dpend::{
    config::{overrides::SetupArgs, run::RunContext},
    dynamics::energy,
    export, simulation,
};
use log::{error, info, warn};

#[derive(Debug, clap::Parser)]
#[command(name = "dpend_run", about = "Simulate a double pendulum without a window")]
pub struct RunCli {
    #[command(flatten)]
    pub setup: SetupArgs,

    /// Write every frame to this CSV file
    #[arg(long = "csv")]
    pub csv: Option<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = RunCli::parse();

    let config = match args.setup.to_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Could not load setup: {}", e);
            return ExitCode::FAILURE;
        }
    };
    config.print();

    let (result, ok) = match simulation::run(&config, &RunContext::new()) {
        Ok(result) => (result, true),
        Err(e) => {
            error!("{}", e);
            match e.completed() {
                Some(prefix) => {
                    warn!("Keeping the {} frames computed before the failure", prefix.len());
                    (prefix.clone(), false)
                }
                None => return ExitCode::FAILURE,
            }
        }
    };

    let drift = energy::max_relative_drift(result.states(), &config.parameters);
    let stats = result.stats();
    info!(
        "{} frames, {} right-hand-side evaluations, max relative energy drift {:.3e}",
        result.len(),
        stats.n_rhs_evals,
        drift
    );
    if let Some(last) = result.frames().last() {
        info!(
            "Final frame t={:.3} s: joint1=({:.4}, {:.4}), joint2=({:.4}, {:.4})",
            last.t,
            last.joints.joint1.x,
            last.joints.joint1.y,
            last.joints.joint2.x,
            last.joints.joint2.y
        );
    }

    if let Some(path) = &args.csv {
        if let Err(e) = export::write_frames_csv(path, &result) {
            error!("Could not write {}: {}", path.display(), e);
            return ExitCode::FAILURE;
        }
    }

    if ok {
        info!("Done!");
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
