use glam::IVec3;
use serde::Serialize;
use voxelview_common::{Block, CHUNK_VOLUME, ChunkCoord};
use voxelview_world::World;

/// World inspector for developer tooling.
///
/// Read-only queries against the world for the overlay and the CLI.
pub struct WorldInspector;

impl WorldInspector {
    /// Produce a summary of the world state.
    pub fn summary(world: &World) -> WorldSummary {
        let mut bounds: Option<(IVec3, IVec3)> = None;
        let mut solid_blocks = 0;
        for chunk in world.chunks() {
            let c = chunk.coord().as_ivec3();
            bounds = Some(match bounds {
                Some((lo, hi)) => (lo.min(c), hi.max(c)),
                None => (c, c),
            });
            solid_blocks += chunk.solid_count();
        }
        WorldSummary {
            chunk_count: world.chunk_count(),
            block_count: world.chunk_count() * CHUNK_VOLUME,
            solid_blocks,
            min_chunk: bounds.map(|(lo, _)| lo.to_array()),
            max_chunk: bounds.map(|(_, hi)| hi.to_array()),
            pending_events: world.events().len(),
        }
    }

    pub fn inspect_chunk(world: &World, coord: ChunkCoord) -> Option<ChunkInfo> {
        world.get(coord).map(|chunk| ChunkInfo {
            coord,
            origin: chunk.origin().to_array(),
            solid_blocks: chunk.solid_count(),
            dominant: chunk.dominant_block(),
        })
    }

    /// All chunk coordinates in iteration order.
    pub fn list_chunks(world: &World) -> Vec<ChunkCoord> {
        world.chunks().map(|c| c.coord()).collect()
    }
}

/// Summary of world state for the inspector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorldSummary {
    pub chunk_count: usize,
    pub block_count: usize,
    pub solid_blocks: usize,
    pub min_chunk: Option<[i32; 3]>,
    pub max_chunk: Option<[i32; 3]>,
    pub pending_events: usize,
}

impl std::fmt::Display for WorldSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "World: chunks={} blocks={} solid={} pending_events={}",
            self.chunk_count, self.block_count, self.solid_blocks, self.pending_events
        )?;
        if let (Some(lo), Some(hi)) = (self.min_chunk, self.max_chunk) {
            write!(
                f,
                " span=({}, {}, {})..=({}, {}, {})",
                lo[0], lo[1], lo[2], hi[0], hi[1], hi[2]
            )?;
        }
        Ok(())
    }
}

/// Detailed info about a single chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkInfo {
    pub coord: ChunkCoord,
    pub origin: [i32; 3],
    pub solid_blocks: usize,
    pub dominant: Block,
}

impl std::fmt::Display for ChunkInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Chunk {} origin=({}, {}, {}) solid={} block={}",
            self.coord,
            self.origin[0],
            self.origin[1],
            self.origin[2],
            self.solid_blocks,
            self.dominant.id(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxelview_world::PregenBounds;

    fn pregenerated() -> World {
        let mut world = World::new();
        world.pregenerate(&PregenBounds::default());
        world
    }

    #[test]
    fn summary_empty_world() {
        let summary = WorldInspector::summary(&World::new());
        assert_eq!(summary.chunk_count, 0);
        assert_eq!(summary.block_count, 0);
        assert_eq!(summary.min_chunk, None);
    }

    #[test]
    fn summary_after_pregeneration() {
        let summary = WorldInspector::summary(&pregenerated());
        assert_eq!(summary.chunk_count, 27);
        assert_eq!(summary.block_count, 27 * CHUNK_VOLUME);
        assert_eq!(summary.solid_blocks, 27 * CHUNK_VOLUME);
        assert_eq!(summary.min_chunk, Some([-1, -1, -1]));
        assert_eq!(summary.max_chunk, Some([1, 1, 1]));
        assert_eq!(summary.pending_events, 27);
    }

    #[test]
    fn inspect_chunk_found() {
        let world = pregenerated();
        let info = WorldInspector::inspect_chunk(&world, ChunkCoord::ORIGIN).unwrap();
        assert_eq!(info.origin, [-16, -16, -16]);
        assert_eq!(info.dominant, Block::solid(1));
    }

    #[test]
    fn inspect_chunk_not_found() {
        let world = pregenerated();
        assert!(WorldInspector::inspect_chunk(&world, ChunkCoord::new(5, 0, 0)).is_none());
    }

    #[test]
    fn list_chunks_in_order() {
        let world = pregenerated();
        let coords = WorldInspector::list_chunks(&world);
        assert_eq!(coords.len(), 27);
        assert_eq!(coords[0], ChunkCoord::new(-1, -1, -1));
        assert!(coords.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn summary_display() {
        let s = format!("{}", WorldInspector::summary(&pregenerated()));
        assert!(s.contains("chunks=27"));
        assert!(s.contains("span=(-1, -1, -1)..=(1, 1, 1)"));
    }

    #[test]
    fn summary_serializes() {
        let json = serde_json::to_value(WorldInspector::summary(&World::new())).unwrap();
        assert_eq!(json["chunk_count"], 0);
        assert!(json["min_chunk"].is_null());
    }
}
