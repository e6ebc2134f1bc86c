//! The player's car model.
//!
//! The vehicle anchor exists from the first frame and follows the smoothed
//! yaw and roll. The glTF scene is attached under it whenever the asset
//! server finishes loading it; a missing or broken asset only costs the
//! visual, never the drive.

use std::f32::consts::PI;

use bevy::asset::LoadState;
use bevy::prelude::*;

use crate::constants::VEHICLE_ANCHOR;
use crate::simulation::VehicleState;

/// Where the car model comes from and how it is fitted to the anchor.
#[derive(Resource, Clone)]
pub struct VehicleModelConfig {
    /// Asset path of the glTF file.
    pub path: String,
    /// Uniform scale applied to the scene.
    pub scale: f32,
    /// Yaw applied so the model faces down the track.
    pub facing: f32,
    /// Named nodes inside the scene that should never be shown.
    pub hidden_nodes: Vec<String>,
}

impl Default for VehicleModelConfig {
    fn default() -> Self {
        Self {
            path: "car.glb".into(),
            scale: 180.0,
            facing: PI,
            hidden_nodes: vec!["Circle005_50".into()],
        }
    }
}

/// Marker for the entity the car visual is parented to.
#[derive(Component)]
pub struct VehicleAnchor;

/// Load progress of the car model.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ModelStatus {
    #[default]
    Loading,
    Attached,
    Failed,
}

/// Handle and status of the car scene.
#[derive(Resource)]
pub struct VehicleModel {
    pub scene: Handle<Scene>,
    pub status: ModelStatus,
}

pub(super) fn spawn_vehicle(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    config: Res<VehicleModelConfig>,
) {
    let scene: Handle<Scene> =
        asset_server.load(GltfAssetLabel::Scene(0).from_asset(config.path.clone()));

    commands
        .spawn((
            Transform::from_translation(Vec3::from_array(VEHICLE_ANCHOR)),
            Visibility::default(),
            VehicleAnchor,
        ))
        .with_children(|anchor| {
            anchor.spawn((
                SceneRoot(scene.clone()),
                Transform::from_rotation(Quat::from_rotation_y(config.facing))
                    .with_scale(Vec3::splat(config.scale)),
            ));
        });

    info!("Loading vehicle model from {}", config.path);
    commands.insert_resource(VehicleModel {
        scene,
        status: ModelStatus::Loading,
    });
}

/// Report the outcome of the model load exactly once.
pub(super) fn watch_model_load(
    asset_server: Res<AssetServer>,
    config: Res<VehicleModelConfig>,
    mut model: ResMut<VehicleModel>,
) {
    if model.status != ModelStatus::Loading {
        return;
    }

    match asset_server.get_load_state(&model.scene) {
        Some(LoadState::Loaded) => {
            model.status = ModelStatus::Attached;
            info!("Vehicle model attached");
        }
        Some(LoadState::Failed(err)) => {
            model.status = ModelStatus::Failed;
            warn!(
                "Vehicle model {} failed to load, driving without a visual: {}",
                config.path, err
            );
        }
        _ => {}
    }
}

/// Hide the scene nodes listed in the config as soon as they spawn.
pub(super) fn hide_model_nodes(
    config: Res<VehicleModelConfig>,
    mut nodes: Query<(&Name, &mut Visibility), Added<Name>>,
) {
    for (name, mut visibility) in &mut nodes {
        if config.hidden_nodes.iter().any(|hidden| hidden == name.as_str()) {
            *visibility = Visibility::Hidden;
            debug!("Hid vehicle model node {}", name);
        }
    }
}

/// Apply the smoothed yaw and roll to the anchor.
pub(super) fn orient_vehicle(
    vehicle: Res<VehicleState>,
    mut anchors: Query<&mut Transform, With<VehicleAnchor>>,
) {
    let rotation = Quat::from_euler(EulerRot::YXZ, vehicle.yaw, 0.0, vehicle.roll);
    for mut transform in &mut anchors {
        transform.rotation = rotation;
    }
}
