//! Live window that steps the simulation once per update and paints the
//! classified grid into a texture.

use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy::render::render_asset::RenderAssetUsages;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use bevy::window::PresentMode;

use crate::config::SimConfig;
use crate::error::Result;
use crate::simulation::Simulation;

#[derive(Resource)]
struct LiveSimulation {
    simulation: Simulation,
    paused: bool,
}

#[derive(Resource)]
struct FieldTexture(Handle<Image>);

#[derive(Resource)]
struct ViewScale(f32);

#[derive(Component)]
struct StatsText;

/// Opens the window and runs until it is closed or `Esc` is pressed.
pub fn run_viewer(config: SimConfig, scale: f32) -> Result<()> {
    let simulation = Simulation::new(config)?;
    let (width, height) = (
        simulation.grid().width() as f32 * scale,
        simulation.grid().height() as f32 * scale,
    );

    App::new()
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Slime Mold Simulation".into(),
                        resolution: (width, height).into(),
                        present_mode: PresentMode::AutoVsync,
                        ..default()
                    }),
                    ..default()
                })
                .set(ImagePlugin::default_nearest())
                // env_logger is already installed by the binary
                .disable::<LogPlugin>(),
        )
        .insert_resource(LiveSimulation {
            simulation,
            paused: false,
        })
        .insert_resource(ViewScale(scale))
        .add_systems(Startup, setup)
        .add_systems(
            Update,
            (
                step_system,
                paint_system,
                stats_system,
                restart_system,
                pause_system,
                exit_system,
            )
                .chain(),
        )
        .run();

    Ok(())
}

fn setup(
    mut commands: Commands,
    mut images: ResMut<Assets<Image>>,
    live: Res<LiveSimulation>,
    scale: Res<ViewScale>,
) {
    commands.spawn(Camera2dBundle::default());

    let grid = live.simulation.grid();
    let size = Extent3d {
        width: grid.width() as u32,
        height: grid.height() as u32,
        depth_or_array_layers: 1,
    };
    let image = Image::new_fill(
        size,
        TextureDimension::D2,
        &[0, 0, 0, 255],
        TextureFormat::Rgba8UnormSrgb,
        RenderAssetUsages::MAIN_WORLD | RenderAssetUsages::RENDER_WORLD,
    );
    let handle = images.add(image);

    commands.spawn(SpriteBundle {
        texture: handle.clone(),
        transform: Transform::from_scale(Vec3::splat(scale.0)),
        ..default()
    });
    commands.insert_resource(FieldTexture(handle));

    commands.spawn((
        TextBundle::from_section(
            "",
            TextStyle {
                font_size: 18.0,
                color: Color::srgb(0.9, 0.9, 0.2),
                ..default()
            },
        )
        .with_style(Style {
            position_type: PositionType::Absolute,
            top: Val::Px(8.0),
            left: Val::Px(8.0),
            ..default()
        }),
        StatsText,
    ));
}

fn step_system(mut live: ResMut<LiveSimulation>) {
    if live.paused {
        return;
    }
    live.simulation.step();
}

fn paint_system(
    live: Res<LiveSimulation>,
    texture: Res<FieldTexture>,
    mut images: ResMut<Assets<Image>>,
) {
    let frame = live.simulation.frame();
    if let Some(image) = images.get_mut(&texture.0) {
        image.data = live.simulation.palette().to_rgba(&frame);
    }
}

fn stats_system(live: Res<LiveSimulation>, mut texts: Query<&mut Text, With<StatsText>>) {
    let sim = &live.simulation;
    for mut text in texts.iter_mut() {
        text.sections[0].value = format!(
            "step {}  organisms {}  seed {}{}\nSpace: pause  R: restart  Esc: exit",
            sim.steps(),
            sim.population().len(),
            sim.seed(),
            if live.paused { "  (paused)" } else { "" }
        );
    }
}

fn restart_system(keys: Res<ButtonInput<KeyCode>>, mut live: ResMut<LiveSimulation>) {
    if !keys.just_pressed(KeyCode::KeyR) {
        return;
    }
    let config = live.simulation.config().clone();
    let palette = live.simulation.palette().clone();
    match Simulation::new(config) {
        Ok(simulation) => {
            live.simulation = simulation.with_palette(palette);
            log::info!("restarted with seed {}", live.simulation.seed());
        }
        Err(err) => log::error!("restart failed: {err}"),
    }
}

fn pause_system(keys: Res<ButtonInput<KeyCode>>, mut live: ResMut<LiveSimulation>) {
    if keys.just_pressed(KeyCode::Space) {
        live.paused = !live.paused;
    }
}

fn exit_system(keys: Res<ButtonInput<KeyCode>>, mut exit: EventWriter<AppExit>) {
    if keys.just_pressed(KeyCode::Escape) {
        exit.send(AppExit::Success);
    }
}
