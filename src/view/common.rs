use bevy::prelude::*;
use nalgebra::Point2;

use super::session::Command;

/// Pixels per metre of pendulum.
#[derive(Resource, Debug, Clone, Copy)]
pub struct WorldScale(pub f32);

impl WorldScale {
    // Fit the fully stretched pendulum inside a square window, with a margin.
    pub fn fit(window_size: f32, total_length: f64) -> Self {
        WorldScale(0.45 * window_size / total_length as f32)
    }
}

pub fn point2_to_gvec2(p: &Point2<f64>, scale: f32) -> Vec2 {
    Vec2::new(p.x as f32, p.y as f32) * scale
}

pub fn key_command(input: &ButtonInput<KeyCode>) -> Option<Command> {
    if input.just_pressed(KeyCode::Escape) {
        Some(Command::Stop)
    } else if input.just_pressed(KeyCode::KeyS) {
        Some(Command::Save)
    } else {
        None
    }
}
