//! Fixed-capacity instance pools with an explicit commit step.
//!
//! The projection writes a frame through a [`PoolWriter`] borrowed from the
//! pool. Nothing it writes is visible until [`PoolWriter::commit`] copies the
//! dirty range into the front buffer. Renderers only ever see the front
//! buffer, through [`CommittedFrame`], so they cannot observe a frame that
//! is half written.

use std::ops::Range;

use bevy::prelude::*;
use bytemuck::{Pod, Zeroable};

/// Per-instance data sent to GPU.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct InstanceData {
    pub position_scale: [f32; 4], // xyz = position, w = scale
    pub color: [f32; 4],          // linear rgba
}

impl InstanceData {
    pub fn new(position: Vec3, scale: f32, color: Color) -> Self {
        let rgba = color.to_linear().to_f32_array();
        Self {
            position_scale: [position.x, position.y, position.z, scale],
            color: rgba,
        }
    }

    pub fn position(&self) -> Vec3 {
        Vec3::new(
            self.position_scale[0],
            self.position_scale[1],
            self.position_scale[2],
        )
    }

    pub fn scale(&self) -> f32 {
        self.position_scale[3]
    }
}

/// A pool of instance slots whose size is fixed at construction.
pub struct InstancePool {
    front: Box<[InstanceData]>,
    back: Box<[InstanceData]>,
    dirty: Range<usize>,
    generation: u64,
}

impl InstancePool {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            front: vec![InstanceData::zeroed(); capacity].into_boxed_slice(),
            back: vec![InstanceData::zeroed(); capacity].into_boxed_slice(),
            dirty: 0..0,
            generation: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.front.len()
    }

    /// Start writing the next frame. Exclusive until committed or dropped.
    pub fn begin_frame(&mut self) -> PoolWriter<'_> {
        PoolWriter {
            pool: self,
            dirty: None,
        }
    }

    /// The last committed frame. Generation 0 means nothing was committed yet.
    pub fn committed(&self) -> CommittedFrame<'_> {
        CommittedFrame {
            slots: &self.front,
            dirty: self.dirty.clone(),
            generation: self.generation,
        }
    }
}

/// Write access to a pool's back buffer for one frame.
pub struct PoolWriter<'a> {
    pool: &'a mut InstancePool,
    dirty: Option<Range<usize>>,
}

impl PoolWriter<'_> {
    pub fn capacity(&self) -> usize {
        self.pool.back.len()
    }

    /// Write one slot. Panics if `index` is outside the pool.
    pub fn write(&mut self, index: usize, data: InstanceData) {
        self.pool.back[index] = data;
        self.dirty = Some(match self.dirty.take() {
            Some(range) => range.start.min(index)..range.end.max(index + 1),
            None => index..index + 1,
        });
    }

    /// Publish everything written so far and return the published range.
    pub fn commit(self) -> Range<usize> {
        let range = self.dirty.unwrap_or(0..0);
        let pool = self.pool;
        pool.front[range.clone()].copy_from_slice(&pool.back[range.clone()]);
        pool.dirty = range.clone();
        pool.generation += 1;
        range
    }
}

/// Read-only view of a committed frame.
pub struct CommittedFrame<'a> {
    slots: &'a [InstanceData],
    dirty: Range<usize>,
    generation: u64,
}

impl<'a> CommittedFrame<'a> {
    pub fn slots(&self) -> &'a [InstanceData] {
        self.slots
    }

    /// Slots changed by the most recent commit.
    pub fn dirty(&self) -> Range<usize> {
        self.dirty.clone()
    }

    pub fn dirty_slots(&self) -> &'a [InstanceData] {
        &self.slots[self.dirty.clone()]
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Raw bytes of the committed slots, ready for a GPU buffer upload.
    pub fn as_bytes(&self) -> &'a [u8] {
        bytemuck::cast_slice(self.slots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(x: f32) -> InstanceData {
        InstanceData::new(Vec3::new(x, 0.0, 0.0), 1.0, Color::WHITE)
    }

    #[test]
    fn writes_are_invisible_until_commit() {
        let mut pool = InstancePool::with_capacity(4);
        {
            let mut writer = pool.begin_frame();
            writer.write(1, at(5.0));
            // Dropped without committing
        }
        assert_eq!(pool.committed().generation(), 0);
        assert_eq!(pool.committed().slots()[1], InstanceData::zeroed());

        let mut writer = pool.begin_frame();
        writer.write(2, at(7.0));
        let range = writer.commit();
        assert_eq!(range, 2..3);

        let frame = pool.committed();
        assert_eq!(frame.generation(), 1);
        assert_eq!(frame.slots()[2].position().x, 7.0);
        // The abandoned write never reaches the front buffer
        assert_eq!(frame.slots()[1], InstanceData::zeroed());
    }

    #[test]
    fn dirty_range_spans_all_writes() {
        let mut pool = InstancePool::with_capacity(10);
        let mut writer = pool.begin_frame();
        writer.write(6, at(1.0));
        writer.write(2, at(2.0));
        writer.write(4, at(3.0));
        assert_eq!(writer.commit(), 2..7);
        assert_eq!(pool.committed().dirty_slots().len(), 5);
    }

    #[test]
    fn empty_commit_publishes_nothing() {
        let mut pool = InstancePool::with_capacity(3);
        let range = pool.begin_frame().commit();
        assert!(range.is_empty());
        assert_eq!(pool.committed().generation(), 1);
    }

    #[test]
    fn capacity_never_changes() {
        let mut pool = InstancePool::with_capacity(8);
        for frame in 0..5 {
            let mut writer = pool.begin_frame();
            for i in 0..writer.capacity() {
                writer.write(i, at(frame as f32));
            }
            writer.commit();
            assert_eq!(pool.capacity(), 8);
        }
        assert_eq!(pool.committed().as_bytes().len(), 8 * 32);
    }

    #[test]
    #[should_panic]
    fn writing_past_capacity_panics() {
        let mut pool = InstancePool::with_capacity(2);
        pool.begin_frame().write(2, at(0.0));
    }
}
