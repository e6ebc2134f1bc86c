use bevy::prelude::*;

use endless_drive::{camera, game_state, procgen, render, simulation, ui};

fn main() {
    // Force Vulkan backend on Windows (DX12 causes crashes on some systems)
    #[cfg(target_os = "windows")]
    std::env::set_var("WGPU_BACKEND", "vulkan");
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Endless Drive".into(),
                resolution: (1280., 720.).into(),
                ..default()
            }),
            ..default()
        }))
        // Track seed may be pinned with TRACK_SEED
        .insert_resource(procgen::TrackGenConfig::from_env())
        // Game state and frame ordering
        .add_plugins(game_state::GameStatePlugin)
        // Track generation
        .add_plugins(procgen::ProcgenPlugin)
        // Input and physics
        .add_plugins(simulation::SimulationPlugin)
        // Track projection and the car
        .add_plugins(render::RenderPlugin)
        .add_plugins(camera::CameraPlugin)
        // HUD
        .add_plugins(ui::UiPlugin)
        .run();
}
