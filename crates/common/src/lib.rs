//! Shared types for the voxel viewer: blocks, chunk coordinates, draw modes
//! and the YAML-backed viewer configuration.
//!
//! # Invariants
//! - `Block` and `ChunkCoord` are plain `Copy` values; no crate here owns
//!   world state.

pub mod config;
pub mod types;

pub use config::{CameraConfig, ConfigError, ViewerConfig, WindowConfig, WorldConfig};
pub use types::{
    Block, CHUNK_SIZE, CHUNK_SIZE_I32, CHUNK_VOLUME, ChunkCoord, DEFAULT_PREGEN_SIZE,
    MoveDirection, PrimitiveKind,
};
