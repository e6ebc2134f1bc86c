//! Scene entities backing the track instance pools.
//!
//! Every pool slot gets one entity, spawned once at startup and never
//! despawned. All entities of a pool share a mesh, and slots with the same
//! color share a material, so Bevy batches them into instanced draws. Each
//! frame the committed pool contents are copied onto the entities.

use bevy::prelude::*;
use bevy::utils::HashMap;

use super::instance_pool::InstanceData;
use super::projection::{ProjectionConfig, TrackPools};
use crate::constants::{ROAD_WIDTH, SEGMENT_LENGTH};

/// Which pool a slot entity mirrors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PoolKind {
    Road,
    Lane,
    Pole,
}

impl PoolKind {
    fn pool_index(self) -> usize {
        match self {
            PoolKind::Road => 0,
            PoolKind::Lane => 1,
            PoolKind::Pole => 2,
        }
    }
}

/// Links an entity to one pool slot.
#[derive(Component)]
pub struct PoolSlot {
    pub kind: PoolKind,
    pub index: usize,
}

/// Dimensions of the instanced props.
#[derive(Resource)]
pub struct PropConfig {
    pub lane_marker_size: Vec2,
    pub pole_radius: f32,
    pub pole_length: f32,
}

impl Default for PropConfig {
    fn default() -> Self {
        Self {
            lane_marker_size: Vec2::new(25.0, 250.0),
            pole_radius: 15.0,
            pole_length: 1200.0,
        }
    }
}

/// Materials shared between slots, keyed by pool and color.
#[derive(Resource, Default)]
pub struct InstanceMaterials {
    by_color: HashMap<(PoolKind, [u32; 4]), Handle<StandardMaterial>>,
}

impl InstanceMaterials {
    fn get_or_create(
        &mut self,
        kind: PoolKind,
        color: [f32; 4],
        materials: &mut Assets<StandardMaterial>,
    ) -> Handle<StandardMaterial> {
        let key = (kind, color.map(f32::to_bits));
        self.by_color
            .entry(key)
            .or_insert_with(|| materials.add(material_for(kind, color)))
            .clone()
    }
}

fn material_for(kind: PoolKind, color: [f32; 4]) -> StandardMaterial {
    let base_color = Color::LinearRgba(LinearRgba::from_f32_array(color));
    match kind {
        // Glossy tarmac picks up the headlight glow
        PoolKind::Road => StandardMaterial {
            base_color,
            perceptual_roughness: 0.1,
            metallic: 0.5,
            ..default()
        },
        PoolKind::Lane | PoolKind::Pole => StandardMaterial {
            base_color,
            unlit: true,
            ..default()
        },
    }
}

pub(super) fn setup_track_instances(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut palette: ResMut<InstanceMaterials>,
    config: Res<ProjectionConfig>,
    props: Res<PropConfig>,
) {
    let pools = TrackPools::new(config.draw_distance);

    let road_mesh = meshes.add(
        Plane3d::default()
            .mesh()
            .size(ROAD_WIDTH, SEGMENT_LENGTH as f32),
    );
    let lane_mesh = meshes.add(
        Plane3d::default()
            .mesh()
            .size(props.lane_marker_size.x, props.lane_marker_size.y),
    );
    let pole_mesh = meshes.add(Cylinder::new(props.pole_radius, props.pole_length));

    let parked = InstanceData::new(
        Vec3::new(0.0, config.parked_depth, 0.0),
        1.0,
        config.marker_color,
    );

    let mut spawned = 0;
    for (kind, mesh, capacity) in [
        (PoolKind::Road, road_mesh, pools.road.capacity()),
        (PoolKind::Lane, lane_mesh, pools.lanes.capacity()),
        (PoolKind::Pole, pole_mesh, pools.poles.capacity()),
    ] {
        let material = palette.get_or_create(kind, parked.color, &mut materials);
        for index in 0..capacity {
            commands.spawn((
                Mesh3d(mesh.clone()),
                MeshMaterial3d(material.clone()),
                Transform::from_translation(parked.position()),
                PoolSlot { kind, index },
            ));
            spawned += 1;
        }
    }

    info!(
        "Spawned {} track instances for a {} segment draw distance",
        spawned, config.draw_distance
    );
    commands.insert_resource(pools);
}

/// Copy the latest committed pool contents onto the slot entities.
pub(super) fn sync_track_instances(
    pools: Res<TrackPools>,
    mut palette: ResMut<InstanceMaterials>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut slots: Query<(
        &PoolSlot,
        &mut Transform,
        &mut MeshMaterial3d<StandardMaterial>,
    )>,
) {
    if !pools.is_changed() {
        return;
    }

    let frames = [
        pools.road.committed(),
        pools.lanes.committed(),
        pools.poles.committed(),
    ];

    for (slot, mut transform, mut material) in &mut slots {
        let frame = &frames[slot.kind.pool_index()];
        if !frame.dirty().contains(&slot.index) {
            continue;
        }
        let data = frame.slots()[slot.index];

        let translation = data.position();
        if transform.translation != translation {
            transform.translation = translation;
        }
        let scale = Vec3::splat(data.scale());
        if transform.scale != scale {
            transform.scale = scale;
        }

        let handle = palette.get_or_create(slot.kind, data.color, &mut materials);
        if material.0 != handle {
            material.0 = handle;
        }
    }
}
