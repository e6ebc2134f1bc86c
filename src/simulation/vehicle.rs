//! Arcade vehicle physics.
//!
//! One call to [`VehicleState::step`] is one simulation tick. All constants
//! are per-tick, so the simulation must be driven at a fixed rate.

use bevy::math::FloatExt;
use bevy::prelude::*;

use super::input::DriveInput;
use crate::constants::{road_limit, segment_index};

/// Tuning for the vehicle. All rates are per tick.
#[derive(Resource, Clone, Debug)]
pub struct PhysicsConfig {
    /// Top speed (shown on the speedometer as km/h).
    pub max_speed: f32,
    /// Acceleration at rest; shrinks linearly toward top speed.
    pub accel: f32,
    /// Acceleration never drops below this while the throttle is held.
    pub min_accel: f32,
    /// Speed removed per tick of braking.
    pub brake: f32,
    /// Coasting multiplier.
    pub drag: f32,
    /// Steering is ignored at or below this speed.
    pub steer_min_speed: f32,
    /// Larger values weaken the centrifugal push of curves.
    pub push_divisor: f32,
    /// Larger values weaken steering authority.
    pub pull_divisor: f32,
    /// Maximum lateral offset before the vehicle is off the tarmac.
    pub road_limit: f32,
    /// Speed multiplier for every tick spent against the road edge.
    pub offroad_penalty: f32,
    /// Target yaw while steering.
    pub steer_rotation: f32,
    /// Body roll as a fraction of the target yaw.
    pub roll_factor: f32,
    /// Exponential smoothing toward the target rotation.
    pub rotation_smoothing: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            max_speed: 420.0,
            accel: 6.0,
            min_accel: 0.1,
            brake: 15.0,
            drag: 0.99,
            steer_min_speed: 10.0,
            push_divisor: 200.0,
            pull_divisor: 12.0,
            road_limit: road_limit(),
            offroad_penalty: 0.98,
            steer_rotation: 0.3,
            roll_factor: 0.1,
            rotation_smoothing: 0.1,
        }
    }
}

/// Authoritative vehicle state plus its cosmetic rotation.
#[derive(Resource, Clone, Debug, Default, PartialEq)]
pub struct VehicleState {
    /// Distance along the track; never decreases.
    pub distance_traveled: f64,
    /// Signed offset from the lane center.
    pub lateral_offset: f32,
    pub speed: f32,
    /// Smoothed visual yaw. Never read by the physics.
    pub yaw: f32,
    /// Smoothed visual roll. Never read by the physics.
    pub roll: f32,
}

impl VehicleState {
    /// Segment the vehicle is currently on.
    pub fn segment_index(&self) -> i64 {
        segment_index(self.distance_traveled)
    }

    /// Advance one tick. `curvature` belongs to the segment the vehicle was
    /// on before this tick's advance.
    pub fn step(&mut self, input: DriveInput, curvature: f32, config: &PhysicsConfig) {
        debug_assert!(config.push_divisor != 0.0 && config.pull_divisor != 0.0);
        debug_assert!(config.max_speed > 0.0);

        // Throttle
        if input.accelerate {
            let accel = config.accel * (1.0 - self.speed / config.max_speed);
            self.speed += accel.max(config.min_accel);
        } else if input.brake {
            self.speed = (self.speed - config.brake).max(0.0);
        } else {
            self.speed *= config.drag;
        }

        // Steering authority only once the car is rolling
        let mut lateral_input = 0.0;
        let mut target_rotation = 0.0;
        if self.speed > config.steer_min_speed {
            if input.steer_left {
                lateral_input = -1.0;
                target_rotation = config.steer_rotation;
            }
            if input.steer_right {
                lateral_input = 1.0;
                target_rotation = -config.steer_rotation;
            }
        }

        // Curves push the car outward; steering pulls it back
        let road_push = -curvature * (self.speed / config.push_divisor);
        let player_pull = lateral_input * (self.speed / config.pull_divisor);
        self.lateral_offset += road_push + player_pull;

        if self.lateral_offset.abs() >= config.road_limit {
            self.speed *= config.offroad_penalty;
            self.lateral_offset = self
                .lateral_offset
                .clamp(-config.road_limit, config.road_limit);
        }

        self.speed = self.speed.clamp(0.0, config.max_speed);
        self.distance_traveled += self.speed as f64;

        self.yaw = self.yaw.lerp(target_rotation, config.rotation_smoothing);
        self.roll = self.roll.lerp(
            -target_rotation * config.roll_factor,
            config.rotation_smoothing,
        );
    }
}
