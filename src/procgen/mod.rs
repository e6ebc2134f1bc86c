//! Procedural track generation.
//!
//! - Segment store with wrap-around addressing
//! - Chunked, eased curvature generation with a difficulty ramp

use bevy::prelude::*;

pub mod segments;
pub mod track_generator;

pub use segments::{wrap_index, Segment, SegmentStore};
pub use track_generator::{TrackGenConfig, TrackGenerator};

pub struct ProcgenPlugin;

impl Plugin for ProcgenPlugin {
    fn build(&self, app: &mut App) {
        // The store must be seeded during Startup, before the first tick reads it
        app.add_plugins(track_generator::TrackGeneratorPlugin);
    }
}
