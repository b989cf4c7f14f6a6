use glam::IVec3;
use std::collections::BTreeMap;
use std::sync::Arc;
use voxelview_common::{Block, ChunkCoord, DEFAULT_PREGEN_SIZE};

use crate::chunk::{Chunk, block_to_chunk};

/// An event record produced by every mutation to the world.
///
/// Chunks are never edited or removed, so generation is the only event. The
/// game loop drains these to decide when the chunk mesh must be rebuilt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorldEvent {
    ChunkGenerated { coord: ChunkCoord },
}

/// Errors from world construction and pregeneration.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    #[error("pregeneration size must be positive, odd and addressable on every axis, got {0}")]
    InvalidPregenSize(IVec3),
    #[error("failed to spawn pregeneration thread: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("pregeneration thread panicked")]
    PregenPanicked,
}

/// Inclusive box of chunk coordinates centered on the origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PregenBounds {
    min: ChunkCoord,
    max: ChunkCoord,
}

impl PregenBounds {
    /// Bounds spanning `size` chunks per axis. Each component must be odd so
    /// the box has a center chunk, and the total chunk count must fit `usize`.
    pub fn from_size(size: IVec3) -> Result<Self, WorldError> {
        if size.cmple(IVec3::ZERO).any() || (size % 2).cmpeq(IVec3::ZERO).any() {
            return Err(WorldError::InvalidPregenSize(size));
        }
        if Self::volume(size).is_none() {
            return Err(WorldError::InvalidPregenSize(size));
        }
        let half = (size - IVec3::ONE) / 2;
        Ok(Self {
            min: (-half).into(),
            max: half.into(),
        })
    }

    pub fn min(&self) -> ChunkCoord {
        self.min
    }

    pub fn max(&self) -> ChunkCoord {
        self.max
    }

    pub fn size(&self) -> IVec3 {
        self.max.as_ivec3() - self.min.as_ivec3() + IVec3::ONE
    }

    fn volume(size: IVec3) -> Option<usize> {
        let [x, y, z] = size.to_array().map(|s| usize::try_from(s).ok());
        x?.checked_mul(y?)?.checked_mul(z?)
    }

    /// Number of chunks in the box. Construction guarantees this fits.
    pub fn len(&self) -> usize {
        Self::volume(self.size()).unwrap_or(usize::MAX)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, coord: ChunkCoord) -> bool {
        let c = coord.as_ivec3();
        c.cmpge(self.min.as_ivec3()).all() && c.cmple(self.max.as_ivec3()).all()
    }

    /// Every coordinate in the box: Y outermost, then X, then Z.
    pub fn coords(&self) -> impl Iterator<Item = ChunkCoord> + use<> {
        let (min, max) = (self.min, self.max);
        (min.y..=max.y).flat_map(move |y| {
            (min.x..=max.x)
                .flat_map(move |x| (min.z..=max.z).map(move |z| ChunkCoord::new(x, y, z)))
        })
    }
}

impl Default for PregenBounds {
    fn default() -> Self {
        let half = (DEFAULT_PREGEN_SIZE - IVec3::ONE) / 2;
        Self {
            min: (-half).into(),
            max: half.into(),
        }
    }
}

/// The voxel world: a sparse map from chunk coordinates to chunks.
///
/// Uses BTreeMap so iteration follows `ChunkCoord` order (Y, X, Z).
/// Chunks are shared behind `Arc` so readers can hold one without keeping
/// the world locked.
#[derive(Debug, Default)]
pub struct World {
    chunks: BTreeMap<ChunkCoord, Arc<Chunk>>,
    /// Append-only log of chunk creations.
    event_log: Vec<WorldEvent>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.chunks.contains_key(&coord)
    }

    pub fn get(&self, coord: ChunkCoord) -> Option<&Arc<Chunk>> {
        self.chunks.get(&coord)
    }

    /// All chunks in coordinate order.
    pub fn chunks(&self) -> impl Iterator<Item = &Arc<Chunk>> {
        self.chunks.values()
    }

    /// Return the chunk at `coord`, creating it first if needed.
    pub fn get_or_create(&mut self, coord: ChunkCoord) -> Arc<Chunk> {
        if let Some(chunk) = self.chunks.get(&coord) {
            return Arc::clone(chunk);
        }
        let chunk = Arc::new(Chunk::new(coord));
        self.record_insert(Arc::clone(&chunk));
        chunk
    }

    /// Insert a chunk built elsewhere unless one already exists at its
    /// coordinate. Returns whether it was inserted.
    pub fn insert_if_absent(&mut self, chunk: Chunk) -> bool {
        if self.chunks.contains_key(&chunk.coord()) {
            return false;
        }
        self.record_insert(Arc::new(chunk));
        true
    }

    fn record_insert(&mut self, chunk: Arc<Chunk>) {
        let coord = chunk.coord();
        tracing::debug!(%coord, "generated chunk");
        self.chunks.insert(coord, chunk);
        self.event_log.push(WorldEvent::ChunkGenerated { coord });
    }

    /// Create every chunk inside `bounds`. Returns how many were new.
    pub fn pregenerate(&mut self, bounds: &PregenBounds) -> usize {
        let _span = tracing::info_span!("pregenerate").entered();
        tracing::info!(min = %bounds.min(), max = %bounds.max(), "world pregeneration bounds");
        let before = self.chunks.len();
        for coord in bounds.coords() {
            self.get_or_create(coord);
        }
        let created = self.chunks.len() - before;
        tracing::info!(created, total = self.chunks.len(), "chunks pregenerated");
        created
    }

    /// Block at an integer world position, if its chunk exists.
    pub fn block_at(&self, world: IVec3) -> Option<Block> {
        let chunk = self.chunks.get(&block_to_chunk(world))?;
        chunk.block(chunk.block_to_local(world)?)
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.event_log)
    }

    /// Read-only access to the event log.
    pub fn events(&self) -> &[WorldEvent] {
        &self.event_log
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_starts_empty() {
        let w = World::new();
        assert_eq!(w.chunk_count(), 0);
        assert!(w.events().is_empty());
    }

    #[test]
    fn get_or_create_is_idempotent() {
        let mut w = World::new();
        let a = w.get_or_create(ChunkCoord::new(1, 2, 3));
        let b = w.get_or_create(ChunkCoord::new(1, 2, 3));
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(w.chunk_count(), 1);
        assert_eq!(w.events().len(), 1);
    }

    #[test]
    fn insert_if_absent_keeps_existing_chunk() {
        let mut w = World::new();
        let first = w.get_or_create(ChunkCoord::ORIGIN);
        assert!(!w.insert_if_absent(Chunk::filled(ChunkCoord::ORIGIN, Block::AIR)));
        assert!(Arc::ptr_eq(&first, w.get(ChunkCoord::ORIGIN).unwrap()));
        assert!(w.insert_if_absent(Chunk::new(ChunkCoord::new(0, 1, 0))));
        assert_eq!(w.chunk_count(), 2);
    }

    #[test]
    fn default_bounds_are_three_cubed() {
        let b = PregenBounds::default();
        assert_eq!(b.min(), ChunkCoord::new(-1, -1, -1));
        assert_eq!(b.max(), ChunkCoord::new(1, 1, 1));
        assert_eq!(b.len(), 27);
        assert_eq!(b, PregenBounds::from_size(IVec3::splat(3)).unwrap());
    }

    #[test]
    fn bounds_reject_even_and_non_positive_sizes() {
        assert!(PregenBounds::from_size(IVec3::new(3, 2, 3)).is_err());
        assert!(PregenBounds::from_size(IVec3::new(0, 1, 1)).is_err());
        assert!(PregenBounds::from_size(IVec3::new(-3, 1, 1)).is_err());
        assert!(matches!(
            PregenBounds::from_size(IVec3::new(1, 4, 1)),
            Err(WorldError::InvalidPregenSize(_))
        ));
    }

    #[test]
    fn bounds_reject_sizes_whose_volume_overflows() {
        let size = IVec3::splat(3_000_001);
        assert!(matches!(
            PregenBounds::from_size(size),
            Err(WorldError::InvalidPregenSize(s)) if s == size
        ));
        let ok = PregenBounds::from_size(IVec3::new(3_000_001, 1, 1)).unwrap();
        assert_eq!(ok.len(), 3_000_001);
    }

    #[test]
    fn block_at_is_exact_beyond_f32_precision() {
        let mut w = World::new();
        let chunk = w.get_or_create(ChunkCoord::new(524_288, 0, 0));
        assert_eq!(chunk.origin().x, 16_777_200);
        assert_eq!(w.block_at(IVec3::new(16_777_231, 0, 0)), Some(Block::solid(1)));
        assert!(w.block_at(IVec3::new(16_777_232, 0, 0)).is_none());
    }

    #[test]
    fn bounds_with_uneven_axes() {
        let b = PregenBounds::from_size(IVec3::new(5, 1, 3)).unwrap();
        assert_eq!(b.min(), ChunkCoord::new(-2, 0, -1));
        assert_eq!(b.max(), ChunkCoord::new(2, 0, 1));
        assert_eq!(b.coords().count(), 15);
        assert!(b.contains(ChunkCoord::new(2, 0, -1)));
        assert!(!b.contains(ChunkCoord::new(0, 1, 0)));
    }

    #[test]
    fn bounds_iterate_y_then_x_then_z() {
        let b = PregenBounds::default();
        let coords: Vec<ChunkCoord> = b.coords().collect();
        assert_eq!(coords[0], ChunkCoord::new(-1, -1, -1));
        assert_eq!(coords[1], ChunkCoord::new(-1, -1, 0));
        assert_eq!(coords[3], ChunkCoord::new(0, -1, -1));
        assert_eq!(coords[9], ChunkCoord::new(-1, 0, -1));
        let mut sorted = coords.clone();
        sorted.sort();
        assert_eq!(coords, sorted);
    }

    #[test]
    fn pregenerate_fills_bounds_once() {
        let mut w = World::new();
        let bounds = PregenBounds::default();
        assert_eq!(w.pregenerate(&bounds), 27);
        assert_eq!(w.chunk_count(), 27);
        assert_eq!(w.pregenerate(&bounds), 0);
        assert_eq!(w.events().len(), 27);
        for coord in bounds.coords() {
            assert!(w.contains(coord));
        }
    }

    #[test]
    fn pregenerate_skips_existing_chunks() {
        let mut w = World::new();
        w.get_or_create(ChunkCoord::ORIGIN);
        assert_eq!(w.pregenerate(&PregenBounds::default()), 26);
    }

    #[test]
    fn block_at_resolves_through_chunks() {
        let mut w = World::new();
        assert!(w.block_at(IVec3::ZERO).is_none());
        w.get_or_create(ChunkCoord::ORIGIN);
        assert_eq!(w.block_at(IVec3::ZERO), Some(Block::solid(1)));
        assert_eq!(w.block_at(IVec3::splat(-16)), Some(Block::solid(1)));
        assert!(w.block_at(IVec3::new(16, 0, 0)).is_none());
    }

    #[test]
    fn drain_events_clears_log() {
        let mut w = World::new();
        w.get_or_create(ChunkCoord::ORIGIN);
        let events = w.drain_events();
        assert_eq!(
            events,
            vec![WorldEvent::ChunkGenerated {
                coord: ChunkCoord::ORIGIN
            }]
        );
        assert!(w.events().is_empty());
    }

    #[test]
    fn chunks_iterate_in_coord_order() {
        let mut w = World::new();
        w.get_or_create(ChunkCoord::new(0, 1, 0));
        w.get_or_create(ChunkCoord::new(5, 0, 0));
        w.get_or_create(ChunkCoord::new(0, 0, 0));
        let coords: Vec<ChunkCoord> = w.chunks().map(|c| c.coord()).collect();
        assert_eq!(
            coords,
            vec![
                ChunkCoord::new(0, 0, 0),
                ChunkCoord::new(5, 0, 0),
                ChunkCoord::new(0, 1, 0),
            ]
        );
    }
}
