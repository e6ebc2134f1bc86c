//! Drive simulation: input sampling, track replenishment, and vehicle physics.
//!
//! The simulation runs on a fixed timestep (default 60 Hz) decoupled from
//! rendering. Each due tick is sent as a `DriveTick` event and consumed by
//! the physics system in the same frame.

use bevy::prelude::*;

pub mod input;
pub mod vehicle;

pub use input::{DriveBindings, DriveInput};
pub use vehicle::{PhysicsConfig, VehicleState};

use crate::game_state::DriveSet;
use crate::procgen::{SegmentStore, TrackGenerator};

pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SimulationConfig>()
            .init_resource::<SimulationStats>()
            .init_resource::<PhysicsConfig>()
            .init_resource::<DriveBindings>()
            .init_resource::<DriveInput>()
            .init_resource::<VehicleState>()
            .add_event::<DriveTick>()
            .add_systems(
                Update,
                (input::sample_drive_input, simulation_controls).in_set(DriveSet::Input),
            )
            .add_systems(
                Update,
                (simulation_tick_system, advance_vehicle)
                    .chain()
                    .in_set(DriveSet::Simulate),
            );
    }
}

/// Configuration for the simulation clock.
#[derive(Resource)]
pub struct SimulationConfig {
    /// Physics ticks per second.
    pub tick_rate: f32,
    /// Upper bound on ticks run in a single frame, so a long stall does not
    /// turn into a burst of catch-up ticks.
    pub max_ticks_per_frame: u32,
    /// Whether the simulation is paused.
    pub paused: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60.0,
            max_ticks_per_frame: 8,
            paused: false,
        }
    }
}

/// Event sent each simulation tick (at tick_rate Hz).
#[derive(Event)]
pub struct DriveTick {
    /// The tick number since the drive started.
    pub tick: u64,
}

/// Statistics about the simulation.
#[derive(Resource, Default)]
pub struct SimulationStats {
    /// Total ticks since the drive started.
    pub total_ticks: u64,
    /// Accumulated time for fixed timestep.
    pub accumulator: f32,
    /// Segments appended by lookahead refills.
    pub segments_generated: u64,
}

/// One complete tick: keep the road ahead of the vehicle, then move it.
///
/// Curvature is read from the segment the vehicle occupies before it
/// advances. While the store is below its cap, at least
/// `lookahead_threshold` segments remain ahead when this returns. Returns the
/// number of segments generated this tick.
pub fn step_drive(
    store: &mut SegmentStore,
    generator: &mut TrackGenerator,
    vehicle: &mut VehicleState,
    input: DriveInput,
    physics: &PhysicsConfig,
) -> usize {
    let index = vehicle.segment_index();
    let mut generated = generator.ensure_lookahead(store, index);
    let curvature = store.get(index).curvature;
    vehicle.step(input, curvature, physics);
    // The advance may have crossed the refill threshold
    generated += generator.ensure_lookahead(store, vehicle.segment_index());
    generated
}

/// System that generates simulation ticks at fixed intervals.
fn simulation_tick_system(
    config: Res<SimulationConfig>,
    mut stats: ResMut<SimulationStats>,
    time: Res<Time>,
    mut tick_events: EventWriter<DriveTick>,
) {
    if config.paused {
        return;
    }

    stats.accumulator += time.delta_secs();
    let tick_duration = 1.0 / config.tick_rate;

    let mut sent = 0;
    while stats.accumulator >= tick_duration {
        if sent == config.max_ticks_per_frame {
            // Drop the backlog rather than fast-forwarding the car
            stats.accumulator = 0.0;
            break;
        }
        stats.accumulator -= tick_duration;
        stats.total_ticks += 1;
        sent += 1;

        tick_events.send(DriveTick {
            tick: stats.total_ticks,
        });
    }
}

fn advance_vehicle(
    mut ticks: EventReader<DriveTick>,
    input: Res<DriveInput>,
    physics: Res<PhysicsConfig>,
    mut store: ResMut<SegmentStore>,
    mut generator: ResMut<TrackGenerator>,
    mut vehicle: ResMut<VehicleState>,
    mut stats: ResMut<SimulationStats>,
) {
    for tick in ticks.read() {
        let generated =
            step_drive(&mut store, &mut generator, &mut vehicle, *input, &physics);
        if generated > 0 {
            stats.segments_generated += generated as u64;
            debug!(
                "Tick {}: generated {} segments ahead of segment {}",
                tick.tick,
                generated,
                vehicle.segment_index()
            );
        }
    }
}

/// Keyboard controls for pausing the drive.
fn simulation_controls(keyboard: Res<ButtonInput<KeyCode>>, mut config: ResMut<SimulationConfig>) {
    // Space or P: Toggle pause
    if keyboard.just_pressed(KeyCode::Space) || keyboard.just_pressed(KeyCode::KeyP) {
        config.paused = !config.paused;
        if config.paused {
            info!("Drive PAUSED");
        } else {
            info!("Drive RESUMED");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::procgen::TrackGenConfig;
    use crate::procgen::track_generator::add_chunk;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn seeded_track(seed: u64) -> (SegmentStore, TrackGenerator) {
        let mut generator = TrackGenerator::new(TrackGenConfig {
            seed: Some(seed),
            ..default()
        });
        let mut store = SegmentStore::new();
        generator.seed_store(&mut store);
        (store, generator)
    }

    #[test]
    fn lookahead_keeps_pace_with_the_vehicle() {
        let (mut store, mut generator) = seeded_track(21);
        let physics = PhysicsConfig::default();
        let threshold = generator.config().lookahead_threshold as i64;
        let mut vehicle = VehicleState::default();
        let input = DriveInput {
            accelerate: true,
            ..default()
        };

        // ~60k segments at top speed, enough for several refills
        for _ in 0..60_000 {
            step_drive(&mut store, &mut generator, &mut vehicle, input, &physics);
            assert!(store.lookahead(vehicle.segment_index()) >= threshold);
        }
        assert!(store.len() > 20_000 + 500);
    }

    #[test]
    fn physics_reads_curvature_before_advancing() {
        let mut generator = TrackGenerator::new(TrackGenConfig {
            seed: Some(0),
            lookahead_threshold: 0,
            ..default()
        });
        let mut store = SegmentStore::new();
        // Segment 0 curves hard, everything after it is straight
        store.push_curvature(40.0);
        add_chunk(&mut store, 100, 0.0, 0);
        let physics = PhysicsConfig::default();

        // Ends the tick on segment 1, but is pushed by segment 0
        let mut vehicle = VehicleState {
            speed: 300.0,
            distance_traveled: 399.0,
            ..default()
        };
        step_drive(&mut store, &mut generator, &mut vehicle, DriveInput::default(), &physics);
        assert_eq!(vehicle.segment_index(), 1);
        assert!(vehicle.lateral_offset < 0.0);

        let mut vehicle = VehicleState {
            speed: 300.0,
            distance_traveled: 400.0,
            ..default()
        };
        step_drive(&mut store, &mut generator, &mut vehicle, DriveInput::default(), &physics);
        assert_eq!(vehicle.lateral_offset, 0.0);
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let run = |seed: u64| {
            let (mut store, mut generator) = seeded_track(seed);
            let physics = PhysicsConfig::default();
            let mut vehicle = VehicleState::default();
            let mut rng = StdRng::seed_from_u64(seed);
            for _ in 0..5_000 {
                let input = DriveInput {
                    accelerate: rng.gen_bool(0.8),
                    brake: rng.gen_bool(0.05),
                    steer_left: rng.gen_bool(0.2),
                    steer_right: rng.gen_bool(0.2),
                };
                step_drive(&mut store, &mut generator, &mut vehicle, input, &physics);
            }
            vehicle
        };
        assert_eq!(run(17), run(17));
    }
}
