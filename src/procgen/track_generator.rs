//! Chunked procedural track generation.
//!
//! The track is grown ahead of the vehicle one chunk at a time. A chunk is
//! either straight or a single eased turn whose intensity scales with a
//! slowly rising difficulty. Every chunk starts and ends at zero curvature
//! so neighbouring chunks join without a steering jolt.

use std::ops::Range;

use bevy::prelude::*;
use rand::{rngs::StdRng, Rng, SeedableRng};

use super::segments::SegmentStore;
use crate::game_state::GameState;

/// Environment variable that pins the track seed for reproducible runs.
pub const TRACK_SEED_ENV: &str = "TRACK_SEED";

/// Settings for chunk synthesis and the lookahead buffer.
#[derive(Resource, Clone, Debug)]
pub struct TrackGenConfig {
    /// Chunk length range, in segments.
    pub chunk_length: Range<usize>,
    /// Chance that a chunk is straight.
    pub straight_probability: f64,
    /// Base turn intensity range before the difficulty multiplier.
    pub intensity: Range<f32>,
    /// Difficulty multiplier for the first curved chunk.
    pub difficulty_start: f32,
    /// Added to the difficulty after every curved chunk.
    pub difficulty_step: f32,
    /// Segments spent easing in and out of a turn.
    pub ease_length: usize,
    /// Straight run the vehicle starts on.
    pub seed_chunk_length: usize,
    /// Refill when fewer than this many segments remain ahead.
    pub lookahead_threshold: usize,
    /// A refill grows the track to this many segments past the vehicle.
    pub buffer_ahead: usize,
    /// Hard cap on stored segments; past it the track loops.
    pub max_segments: usize,
    /// Fixed RNG seed, or `None` for a fresh track every run.
    pub seed: Option<u64>,
}

impl Default for TrackGenConfig {
    fn default() -> Self {
        Self {
            chunk_length: 200..500,
            straight_probability: 0.3,
            intensity: 2.0..5.0,
            difficulty_start: 1.0,
            difficulty_step: 0.01,
            ease_length: 50,
            seed_chunk_length: 500,
            lookahead_threshold: 5_000,
            buffer_ahead: 20_000,
            max_segments: 1_000_000,
            seed: None,
        }
    }
}

impl TrackGenConfig {
    /// Default config, with the seed taken from `TRACK_SEED` when it parses.
    pub fn from_env() -> Self {
        let seed = match std::env::var(TRACK_SEED_ENV) {
            Ok(raw) => match raw.trim().parse::<u64>() {
                Ok(seed) => Some(seed),
                Err(_) => {
                    warn!("Ignoring {TRACK_SEED_ENV}={raw:?}: not an unsigned integer");
                    None
                }
            },
            Err(_) => None,
        };
        Self {
            seed,
            ..default()
        }
    }
}

/// What a single synthesized chunk turned out to be.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ChunkKind {
    Straight,
    Turn { curvature: f32 },
}

/// Stateful chunk generator. Difficulty and the RNG are its only state.
#[derive(Resource)]
pub struct TrackGenerator {
    config: TrackGenConfig,
    rng: StdRng,
    difficulty: f32,
    chunks: u64,
    capped: bool,
}

impl TrackGenerator {
    pub fn new(config: TrackGenConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            difficulty: config.difficulty_start,
            config,
            rng,
            chunks: 0,
            capped: false,
        }
    }

    pub fn config(&self) -> &TrackGenConfig {
        &self.config
    }

    pub fn difficulty(&self) -> f32 {
        self.difficulty
    }

    /// Total chunks synthesized so far (the seed chunk included).
    pub fn chunks_generated(&self) -> u64 {
        self.chunks
    }

    /// Lay down the straight starting run and fill the initial buffer.
    pub fn seed_store(&mut self, store: &mut SegmentStore) {
        add_chunk(
            store,
            self.config.seed_chunk_length,
            0.0,
            self.config.ease_length,
        );
        self.chunks += 1;
        self.fill_to(store, self.config.buffer_ahead);
    }

    /// Top the store up when the vehicle at `current_index` is running out
    /// of road. Returns the number of segments appended.
    pub fn ensure_lookahead(&mut self, store: &mut SegmentStore, current_index: i64) -> usize {
        if store.lookahead(current_index) >= self.config.lookahead_threshold as i64 {
            return 0;
        }
        let target = current_index.max(0) as usize + self.config.buffer_ahead;
        let appended = self.fill_to(store, target);
        if appended > 0 {
            debug!(
                "Track extended by {} segments ({} total, difficulty {:.2})",
                appended,
                store.len(),
                self.difficulty
            );
        }
        appended
    }

    /// Whether the store has reached the generation cap.
    pub fn is_capped(&self, store: &SegmentStore) -> bool {
        store.len() + self.config.chunk_length.end > self.config.max_segments
    }

    fn fill_to(&mut self, store: &mut SegmentStore, target: usize) -> usize {
        let before = store.len();
        while store.len() < target && !self.is_capped(store) {
            self.synthesize_chunk(store);
        }
        if !self.capped && self.is_capped(store) {
            self.capped = true;
            info!(
                "Track reached its {} segment cap; the road now loops",
                store.len()
            );
        }
        store.len() - before
    }

    /// Generate one chunk and append it to the store.
    pub fn synthesize_chunk(&mut self, store: &mut SegmentStore) -> ChunkKind {
        let len = self.rng.gen_range(self.config.chunk_length.clone());
        let kind = if self.rng.gen_bool(self.config.straight_probability) {
            ChunkKind::Straight
        } else {
            let direction = if self.rng.gen_bool(0.5) { 1.0 } else { -1.0 };
            let intensity = self.rng.gen_range(self.config.intensity.clone()) * self.difficulty;
            self.difficulty += self.config.difficulty_step;
            ChunkKind::Turn {
                curvature: direction * intensity,
            }
        };

        let curve = match kind {
            ChunkKind::Straight => 0.0,
            ChunkKind::Turn { curvature } => curvature,
        };
        add_chunk(store, len, curve, self.config.ease_length);
        self.chunks += 1;
        kind
    }
}

/// Ease profile for unit `i` of a `len`-unit chunk: ramps 0 → 1 over the
/// first `ease` units and 1 → 0 over the last `ease` units.
pub fn ease_factor(i: usize, len: usize, ease: usize) -> f32 {
    if ease == 0 {
        return 1.0;
    }
    let from_edge = i.min(len.saturating_sub(1 + i));
    (from_edge as f32 / ease as f32).min(1.0)
}

/// Append an eased chunk of `len` segments with peak curvature `curve`.
pub fn add_chunk(store: &mut SegmentStore, len: usize, curve: f32, ease: usize) {
    for i in 0..len {
        store.push_curvature(curve * ease_factor(i, len, ease));
    }
}

pub struct TrackGeneratorPlugin;

impl Plugin for TrackGeneratorPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SegmentStore>()
            .add_systems(Startup, seed_track);
    }
}

fn seed_track(
    mut commands: Commands,
    config: Option<Res<TrackGenConfig>>,
    mut store: ResMut<SegmentStore>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    let config = config.map(|c| c.clone()).unwrap_or_default();
    match config.seed {
        Some(seed) => info!("Seeding track with fixed seed {}", seed),
        None => info!("Seeding track from entropy"),
    }

    let mut generator = TrackGenerator::new(config);
    generator.seed_store(&mut store);
    info!(
        "Track seeded: {} segments in {} chunks",
        store.len(),
        generator.chunks_generated()
    );

    commands.insert_resource(generator);
    next_state.set(GameState::Driving);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(seed: u64) -> TrackGenConfig {
        TrackGenConfig {
            seed: Some(seed),
            ..default()
        }
    }

    /// Split a freshly generated store back into its chunks by replaying
    /// the generator with the same seed.
    fn chunk_bounds(seed: u64, chunks: usize) -> (SegmentStore, Vec<Range<usize>>) {
        let mut generator = TrackGenerator::new(seeded(seed));
        let mut store = SegmentStore::new();
        let mut bounds = Vec::new();
        for _ in 0..chunks {
            let start = store.len();
            generator.synthesize_chunk(&mut store);
            bounds.push(start..store.len());
        }
        (store, bounds)
    }

    #[test]
    fn same_seed_same_track() {
        let mut a = SegmentStore::new();
        let mut b = SegmentStore::new();
        TrackGenerator::new(seeded(7)).seed_store(&mut a);
        TrackGenerator::new(seeded(7)).seed_store(&mut b);

        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.curvature.to_bits(), y.curvature.to_bits());
            assert_eq!(x.color_band, y.color_band);
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = SegmentStore::new();
        let mut b = SegmentStore::new();
        TrackGenerator::new(seeded(1)).seed_store(&mut a);
        TrackGenerator::new(seeded(2)).seed_store(&mut b);
        assert!(a.iter().zip(b.iter()).any(|(x, y)| x != y));
    }

    #[test]
    fn chunks_ease_in_and_out() {
        let (store, bounds) = chunk_bounds(11, 60);
        for range in bounds {
            let curves: Vec<f32> = range
                .clone()
                .map(|i| store.get(i as i64).curvature.abs())
                .collect();
            assert_eq!(curves[0], 0.0);
            assert_eq!(*curves.last().unwrap(), 0.0);

            for pair in curves[..50].windows(2) {
                assert!(pair[1] >= pair[0]);
            }
            let tail = &curves[curves.len() - 50..];
            for pair in tail.windows(2) {
                assert!(pair[1] <= pair[0]);
            }
        }
    }

    #[test]
    fn chunk_lengths_stay_in_range() {
        let (_, bounds) = chunk_bounds(3, 200);
        for range in bounds {
            assert!((200..500).contains(&range.len()));
        }
    }

    #[test]
    fn difficulty_rises_only_on_turns() {
        let mut generator = TrackGenerator::new(seeded(5));
        let mut store = SegmentStore::new();
        let mut turns = 0;
        for _ in 0..100 {
            let before = generator.difficulty();
            match generator.synthesize_chunk(&mut store) {
                ChunkKind::Straight => assert_eq!(generator.difficulty(), before),
                ChunkKind::Turn { curvature } => {
                    turns += 1;
                    assert!(generator.difficulty() > before);
                    assert!(curvature.abs() >= 2.0 * before);
                    assert!(curvature.abs() <= 5.0 * before);
                }
            }
        }
        assert!(turns > 0);
        let expected = 1.0 + turns as f32 * 0.01;
        assert!((generator.difficulty() - expected).abs() < 1e-4);
    }

    #[test]
    fn straight_chunks_are_flat() {
        let mut store = SegmentStore::new();
        add_chunk(&mut store, 300, 0.0, 50);
        assert!(store.iter().all(|s| s.curvature == 0.0));
    }

    #[test]
    fn ease_reaches_full_intensity_mid_chunk() {
        let mut store = SegmentStore::new();
        add_chunk(&mut store, 300, 4.0, 50);
        assert_eq!(store.get(150).curvature, 4.0);
        assert_eq!(store.get(25).curvature, 2.0);
    }

    #[test]
    fn seeded_store_starts_straight() {
        let mut store = SegmentStore::new();
        let mut generator = TrackGenerator::new(seeded(9));
        generator.seed_store(&mut store);
        assert!(store.len() >= 20_000);
        assert!((0..500).all(|i| store.get(i).curvature == 0.0));
    }

    #[test]
    fn lookahead_refills_below_threshold() {
        let mut store = SegmentStore::new();
        let mut generator = TrackGenerator::new(seeded(4));
        generator.seed_store(&mut store);
        let len = store.len() as i64;

        assert_eq!(generator.ensure_lookahead(&mut store, 0), 0);

        let index = len - 4_000;
        let appended = generator.ensure_lookahead(&mut store, index);
        assert!(appended > 0);
        assert!(store.len() as i64 >= index + 20_000);
        assert!(store.lookahead(index) >= 5_000);
    }

    #[test]
    fn generation_stops_at_cap() {
        let config = TrackGenConfig {
            max_segments: 30_000,
            ..seeded(8)
        };
        let mut store = SegmentStore::new();
        let mut generator = TrackGenerator::new(config);
        generator.seed_store(&mut store);

        for index in (0..200_000).step_by(1_000) {
            generator.ensure_lookahead(&mut store, index);
            assert!(store.len() <= 30_000);
        }
        assert!(generator.is_capped(&store));
    }
}
