//! World model: a sparse map from chunk coordinates to fixed-size voxel grids.
//!
//! # Invariants
//! - Chunks are created on first access and never removed or mutated.
//! - Every chunk creation is recorded in the world event log.
//! - Pregeneration bounds are odd-sized and centered on the origin.

pub mod chunk;
pub mod pregen;
pub mod world;

pub use chunk::{Chunk, block_to_chunk, chunk_center, world_to_chunk};
pub use pregen::{PregenHandle, SharedWorld, spawn_pregeneration};
pub use world::{PregenBounds, World, WorldError, WorldEvent};

pub fn crate_info() -> &'static str {
    "voxelview-world v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("world"));
    }
}
