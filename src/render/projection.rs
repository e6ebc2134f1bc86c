//! Road window projection.
//!
//! Every frame the stretch of track around the vehicle is laid out again
//! from scratch into the fixed instance pools. Curvature is integrated
//! twice along the window: it feeds a running slope `dx`, and the slope
//! feeds the running lateral drift `x`. Subtracting the vehicle's own
//! lateral offset gives each tile's screen-space x, so the road bends
//! around a camera that never turns.

use bevy::prelude::*;

use super::instance_pool::{InstanceData, InstancePool};
use crate::constants::{lane_offsets, segment_index, LANE_COUNT, ROAD_WIDTH, SEGMENT_LENGTH};
use crate::procgen::SegmentStore;
use crate::simulation::VehicleState;

/// Layout of the visible track window.
#[derive(Resource, Clone, Debug)]
pub struct ProjectionConfig {
    /// Segments laid out per frame.
    pub draw_distance: usize,
    /// Segments drawn behind the vehicle.
    pub offset_back: usize,
    /// A pole pair stands on every segment whose index is a multiple of this.
    pub pole_interval: usize,
    /// Gap between the road edge and a pole.
    pub pole_margin: f32,
    /// Pole center height.
    pub pole_height: f32,
    /// Lane markers float slightly above the tarmac.
    pub lane_height: f32,
    /// Unused pole slots are parked this far below the ground.
    pub parked_depth: f32,
    /// Road surface shades for color band 0 and 1.
    pub band_colors: [Color; 2],
    /// Lane marker and pole color.
    pub marker_color: Color,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            draw_distance: 1000,
            offset_back: 5,
            pole_interval: 10,
            pole_margin: 200.0,
            pole_height: 300.0,
            lane_height: 5.0,
            parked_depth: -50_000.0,
            band_colors: [
                Color::srgb_u8(0x10, 0x10, 0x10),
                Color::srgb_u8(0x08, 0x08, 0x08),
            ],
            marker_color: Color::srgb_u8(0x00, 0xff, 0xff),
        }
    }
}

/// The three instance pools the projection writes every frame.
#[derive(Resource)]
pub struct TrackPools {
    pub road: InstancePool,
    pub lanes: InstancePool,
    pub poles: InstancePool,
}

impl TrackPools {
    /// Size the pools for `draw_distance` segments. Capacity never changes.
    pub fn new(draw_distance: usize) -> Self {
        Self {
            road: InstancePool::with_capacity(draw_distance),
            lanes: InstancePool::with_capacity(draw_distance * LANE_COUNT),
            poles: InstancePool::with_capacity(draw_distance * 2),
        }
    }

    /// Segments that fit in every pool.
    pub fn segment_capacity(&self) -> usize {
        self.road
            .capacity()
            .min(self.lanes.capacity() / LANE_COUNT)
            .min(self.poles.capacity() / 2)
    }
}

/// Summary of one projected frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WindowStats {
    /// Logical index of the first drawn segment.
    pub start_index: i64,
    pub segments_drawn: usize,
    pub pole_pairs_drawn: usize,
}

/// Lay out the window of segments around `vehicle` into `pools` and commit.
pub fn write_track_window(
    store: &SegmentStore,
    vehicle: &VehicleState,
    config: &ProjectionConfig,
    pools: &mut TrackPools,
) -> WindowStats {
    let draw_distance = config.draw_distance.min(pools.segment_capacity());
    let offset_back = config.offset_back as i64;
    let start_index = segment_index(vehicle.distance_traveled) - offset_back;
    let offset_z = vehicle.distance_traveled.rem_euclid(SEGMENT_LENGTH);

    // Seed the drift with the segments behind the vehicle
    let mut dx = 0.0f32;
    let mut curr_x = 0.0f32;
    for j in 0..offset_back {
        dx += store.get(start_index + j).curvature;
        curr_x += dx;
    }

    let lanes = lane_offsets();
    let pole_offset = ROAD_WIDTH / 2.0 + config.pole_margin;
    let parked = InstanceData::new(
        Vec3::new(0.0, config.parked_depth, 0.0),
        1.0,
        config.marker_color,
    );

    let mut road = pools.road.begin_frame();
    let mut lane_writer = pools.lanes.begin_frame();
    let mut poles = pools.poles.begin_frame();
    let mut pole_pairs_drawn = 0;

    for n in 0..draw_distance {
        let logical = start_index + n as i64;
        let slot = store.resolve(logical);
        let segment = store.get(logical);

        let relative_z = -((n as f64 - offset_back as f64) * SEGMENT_LENGTH - offset_z) as f32;
        let segment_x = curr_x - vehicle.lateral_offset;

        road.write(
            n,
            InstanceData::new(
                Vec3::new(segment_x, 0.0, relative_z),
                1.0,
                config.band_colors[segment.color_band as usize & 1],
            ),
        );

        for (l, lane_x) in lanes.iter().enumerate() {
            lane_writer.write(
                n * LANE_COUNT + l,
                InstanceData::new(
                    Vec3::new(segment_x + lane_x, config.lane_height, relative_z),
                    1.0,
                    config.marker_color,
                ),
            );
        }

        if config.pole_interval > 0 && slot % config.pole_interval == 0 {
            for (side, x) in [segment_x - pole_offset, segment_x + pole_offset]
                .into_iter()
                .enumerate()
            {
                poles.write(
                    n * 2 + side,
                    InstanceData::new(
                        Vec3::new(x, config.pole_height, relative_z),
                        1.0,
                        config.marker_color,
                    ),
                );
            }
            pole_pairs_drawn += 1;
        } else {
            poles.write(n * 2, parked);
            poles.write(n * 2 + 1, parked);
        }

        curr_x += dx;
        dx += segment.curvature;
    }

    road.commit();
    lane_writer.commit();
    poles.commit();

    WindowStats {
        start_index,
        segments_drawn: draw_distance,
        pole_pairs_drawn,
    }
}
