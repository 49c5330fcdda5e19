pub mod common;
pub mod session;
pub mod trace;

use bevy::{
    math::Isometry2d,
    prelude::*,
    render::view::screenshot::{save_to_disk, Screenshot},
};

use self::{
    common::{key_command, point2_to_gvec2, WorldScale},
    session::{Command, Outcome, RenderSession},
    trace::TracePalette,
};

// Radius of the mass markers, in pixels.
pub const MASS_RADIUS: f32 = 8.0;

// Resources.

#[derive(Resource)]
pub struct SessionRes(pub RenderSession);

#[derive(Resource)]
pub struct PaletteRes(pub TracePalette);

// Components.

#[derive(Component)]
pub struct TitleText;

pub fn add_camera(mut commands: Commands) {
    commands.spawn(Camera2d);
}

pub fn add_title(mut commands: Commands) {
    commands.spawn((
        Text::new(""),
        TextFont {
            font_size: 20.0,
            ..default()
        },
        TextColor(Color::WHITE),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(12.0),
            left: Val::Px(12.0),
            ..default()
        },
        TitleText,
    ));
}

pub fn advance_frame(mut session: ResMut<SessionRes>) {
    if let Outcome::Finished = session.0.handle(Command::Advance) {
        debug!("Reached the last frame");
    }
}

pub fn handle_keys(
    mut commands: Commands,
    input: Res<ButtonInput<KeyCode>>,
    mut session: ResMut<SessionRes>,
    mut exit: EventWriter<AppExit>,
) {
    let Some(command) = key_command(&input) else {
        return;
    };
    match session.0.handle(command) {
        Outcome::Stopped => {
            exit.send(AppExit::Success);
        }
        Outcome::SaveTo(path) => {
            info!("Saving snapshot to {}", path.display());
            commands
                .spawn(Screenshot::primary_window())
                .observe(save_to_disk(path));
        }
        _ => {}
    }
}

pub fn update_title(
    mut session: ResMut<SessionRes>,
    mut q_title: Query<&mut Text, With<TitleText>>,
) {
    if !session.0.is_stale() {
        return;
    }
    let Some(frame) = session.0.current() else {
        return;
    };
    let ic = session.0.result().metadata().initial_conditions;
    let title = format!(
        "θ1 = {}°, θ2 = {}°    t = {:.2} s",
        ic.angle1_deg, ic.angle2_deg, frame.t
    );
    for mut text in &mut q_title {
        text.0.clone_from(&title);
    }
    session.0.mark_fresh();
}

pub fn draw_pendulum(
    mut gizmos: Gizmos,
    session: Res<SessionRes>,
    palette: Res<PaletteRes>,
    scale: Res<WorldScale>,
) {
    let Some(frame) = session.0.current() else {
        return;
    };

    let trace = session.0.trace();
    let colors = palette.0.colors(trace.len());
    gizmos.linestrip_gradient_2d(
        trace
            .iter()
            .zip(colors)
            .map(|(p, [r, g, b, a])| (point2_to_gvec2(p, scale.0), Color::srgba(r, g, b, a))),
    );

    let points =
        [frame.pivot(), frame.joint1(), frame.joint2()].map(|p| point2_to_gvec2(&p, scale.0));
    gizmos.linestrip_2d(points, Color::WHITE);
    for p in &points[1..] {
        gizmos.circle_2d(Isometry2d::from_translation(*p), MASS_RADIUS, Color::WHITE);
    }
}
