//! Core game state and frame ordering.
//!
//! The drive sits in `Loading` until the track has been seeded, then switches
//! to `Driving` for the rest of the session. Every per-frame system belongs
//! to one of the chained `DriveSet`s, which fixes the order within a frame.

use bevy::prelude::*;

pub struct GameStatePlugin;

impl Plugin for GameStatePlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<GameState>()
            .configure_sets(
                Update,
                (
                    DriveSet::Input,
                    DriveSet::Simulate,
                    DriveSet::Project,
                    DriveSet::Present,
                )
                    .chain()
                    .run_if(in_state(GameState::Driving)),
            )
            .add_systems(OnEnter(GameState::Driving), announce_driving);
    }
}

/// High-level game state controlling which systems run.
#[derive(States, Default, Clone, Copy, Eq, PartialEq, Debug, Hash)]
pub enum GameState {
    /// Track not seeded yet; nothing may read the segment store.
    #[default]
    Loading,
    /// Simulation and projection running every frame.
    Driving,
}

/// Per-frame stages, run in declaration order.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriveSet {
    /// Sample the keyboard.
    Input,
    /// Fixed-rate ticks: lookahead refill, then physics.
    Simulate,
    /// Rebuild the visible track window into the instance pools.
    Project,
    /// Consume committed pools, camera effects, HUD.
    Present,
}

fn announce_driving() {
    info!("Track ready, handing control to the driver");
}
