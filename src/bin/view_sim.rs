use std::{process::ExitCode, time::Duration};

use bevy::{prelude::*, time::common_conditions::on_timer, window::WindowResolution};
use clap::Parser;
use dpend::{
    config::{overrides::SetupArgs, run::RunContext},
    export, simulation,
    view::{
        self, common::WorldScale, session::RenderSession, trace::TracePalette, PaletteRes,
        SessionRes,
    },
};
use log::{error, info, warn};

#[derive(Debug, clap::Parser)]
#[command(name = "dpend_view", about = "Simulate a double pendulum and animate it")]
struct ViewCli {
    #[command(flatten)]
    pub setup: SetupArgs,

    #[arg(short = 'w', long = "window-size", default_value = "800.0")]
    pub window_size: f32,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = ViewCli::parse();

    let config = match args.setup.to_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Could not load setup: {}", e);
            return ExitCode::FAILURE;
        }
    };
    config.print();

    let result = match simulation::run(&config, &RunContext::new()) {
        Ok(result) => result,
        Err(e) => {
            error!("{}", e);
            match e.completed() {
                Some(prefix) if !prefix.is_empty() => {
                    warn!("Showing the {} frames computed before the failure", prefix.len());
                    prefix.clone()
                }
                _ => return ExitCode::FAILURE,
            }
        }
    };
    if result.is_empty() {
        warn!("Nothing to show: the run has no frames");
        return ExitCode::SUCCESS;
    }
    info!("Got {} frames", result.len());

    let palette = match TracePalette::new() {
        Ok(palette) => palette,
        Err(e) => {
            error!("Could not build trace colours: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let frame_period = Duration::from_secs_f64(result.sample_interval());
    let scale = WorldScale::fit(args.window_size, config.parameters.total_length());

    App::new()
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Double pendulum".to_string(),
                        resolution: WindowResolution::new(args.window_size, args.window_size),
                        ..default()
                    }),
                    ..default()
                })
                .set(bevy::log::LogPlugin {
                    level: bevy::log::Level::INFO,
                    ..default()
                }),
        )
        .insert_resource(ClearColor(Color::BLACK))
        .insert_resource(scale)
        .insert_resource(SessionRes(RenderSession::new(result, export::SAVE_DIR)))
        .insert_resource(PaletteRes(palette))
        .add_systems(Startup, (view::add_camera, view::add_title))
        .add_systems(
            Update,
            (
                view::handle_keys,
                view::advance_frame.run_if(on_timer(frame_period)),
                view::update_title,
                view::draw_pendulum,
            )
                .chain(),
        )
        .run();

    info!("Done!");
    ExitCode::SUCCESS
}
