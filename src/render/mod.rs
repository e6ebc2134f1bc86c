//! Rendering: road window projection, instanced track props, and the car.

use bevy::prelude::*;

pub mod instance_pool;
pub mod projection;
pub mod track_instances;
pub mod vehicle_model;

pub use projection::{write_track_window, ProjectionConfig, TrackPools, WindowStats};
pub use vehicle_model::VehicleModelConfig;

use crate::game_state::DriveSet;
use crate::procgen::SegmentStore;
use crate::simulation::VehicleState;

pub struct RenderPlugin;

impl Plugin for RenderPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ProjectionConfig>()
            .init_resource::<track_instances::PropConfig>()
            .init_resource::<track_instances::InstanceMaterials>()
            .init_resource::<VehicleModelConfig>()
            .init_resource::<LastWindow>()
            .add_systems(
                Startup,
                (
                    track_instances::setup_track_instances,
                    vehicle_model::spawn_vehicle,
                ),
            )
            .add_systems(Update, project_track.in_set(DriveSet::Project))
            .add_systems(
                Update,
                (
                    track_instances::sync_track_instances,
                    vehicle_model::orient_vehicle,
                )
                    .in_set(DriveSet::Present),
            )
            // Model loading is independent of the drive state
            .add_systems(
                Update,
                (vehicle_model::watch_model_load, vehicle_model::hide_model_nodes),
            );
    }
}

/// Stats of the most recently projected window.
#[derive(Resource, Default, Debug)]
pub struct LastWindow(pub WindowStats);

fn project_track(
    store: Res<SegmentStore>,
    vehicle: Res<VehicleState>,
    config: Res<ProjectionConfig>,
    mut pools: ResMut<TrackPools>,
    mut last: ResMut<LastWindow>,
) {
    let stats = write_track_window(&store, &vehicle, &config, &mut pools);
    if stats.start_index != last.0.start_index {
        debug!(
            "Track window now starts at segment {} ({} segments, {} pole pairs)",
            stats.start_index, stats.segments_drawn, stats.pole_pairs_drawn
        );
    }
    last.0 = stats;
}
