//! Segment store: the append-only backing sequence of the endless track.
//!
//! The track is logically infinite but physically finite. Every consumer
//! addresses it through [`wrap_index`], so any integer index (including
//! negative ones near the start of a run) resolves to a stored segment.

use bevy::prelude::*;

/// Segments per color band (road surface alternates every three tiles).
const BAND_WIDTH: usize = 3;

/// A single fixed-length piece of road.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    /// Signed curvature contribution (0 = straight).
    pub curvature: f32,
    /// Alternating surface shade, 0 or 1.
    pub color_band: u8,
}

impl Segment {
    /// Band for the segment at `global_index` in generation order.
    pub fn band_for(global_index: usize) -> u8 {
        ((global_index / BAND_WIDTH) % 2) as u8
    }
}

/// Resolve any logical index into `0..len`.
///
/// Panics when `len == 0`: reading an unseeded store is a programming error.
pub fn wrap_index(index: i64, len: usize) -> usize {
    assert!(len > 0, "segment store must be seeded before it is read");
    index.rem_euclid(len as i64) as usize
}

/// Ordered, append-only segment storage.
#[derive(Resource, Default)]
pub struct SegmentStore {
    segments: Vec<Segment>,
}

impl SegmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Append a segment. Existing segments are never touched.
    pub fn append(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    /// Append a segment with the given curvature, banded by its global index.
    pub fn push_curvature(&mut self, curvature: f32) {
        let color_band = self.next_color_band();
        self.append(Segment {
            curvature,
            color_band,
        });
    }

    /// Band the next appended segment will receive.
    pub fn next_color_band(&self) -> u8 {
        Segment::band_for(self.segments.len())
    }

    /// Segment at `logical_index`, wrapped modulo the current length.
    pub fn get(&self, logical_index: i64) -> Segment {
        self.segments[self.resolve(logical_index)]
    }

    /// Physical slot for `logical_index`.
    pub fn resolve(&self, logical_index: i64) -> usize {
        wrap_index(logical_index, self.segments.len())
    }

    /// Segments not yet reached by a vehicle sitting on `current_index`.
    pub fn lookahead(&self, current_index: i64) -> i64 {
        self.segments.len() as i64 - current_index
    }

    pub fn iter(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter()
    }
}
