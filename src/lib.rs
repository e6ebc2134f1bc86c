//! Endless Drive - an endless, procedurally generated night drive.
//!
//! The track is generated in eased chunks ahead of the car, the car is
//! simulated on a fixed tick, and each frame a window of the track is
//! projected into fixed-size instance pools for rendering.

pub mod camera;
pub mod constants;
pub mod game_state;
pub mod procgen;
pub mod render;
pub mod simulation;
pub mod ui;
