//! Track geometry shared by the generator, physics, and projection.
//!
//! These are compile-time constants so that no runtime value can ever
//! reach a denominator.

// Track geometry
pub const SEGMENT_LENGTH: f64 = 400.0;
pub const ROAD_WIDTH: f32 = 8000.0;
pub const LANE_COUNT: usize = 7;

// Vehicle reference footprint (used to keep the body on the tarmac)
pub const CAR_WIDTH: f32 = 250.0;
pub const ROAD_EDGE_MARGIN: f32 = 100.0;

// Scene placement
pub const VEHICLE_ANCHOR: [f32; 3] = [0.0, 5.0, 700.0];
pub const CAMERA_HEIGHT: f32 = 150.0;
pub const CAMERA_DISTANCE: f32 = 2000.0;
pub const CAMERA_TARGET: [f32; 3] = [0.0, 100.0, -50_000.0];

/// Lateral offset at which the vehicle is considered off-road.
pub fn road_limit() -> f32 {
    ROAD_WIDTH / 2.0 - CAR_WIDTH / 2.0 - ROAD_EDGE_MARGIN
}

/// Lane marker x offsets from the road center, evenly spaced across the width.
pub fn lane_offsets() -> [f32; LANE_COUNT] {
    let spacing = ROAD_WIDTH / (LANE_COUNT + 1) as f32;
    std::array::from_fn(|lane| (lane + 1) as f32 * spacing - ROAD_WIDTH / 2.0)
}

/// Segment index the given distance falls into.
pub fn segment_index(distance: f64) -> i64 {
    (distance / SEGMENT_LENGTH).floor() as i64
}
