//! Developer tooling: world inspector and frame timing.
//!
//! # Invariants
//! - Tools only read the world; they never create or change chunks.

mod frame_timer;
mod inspector;

pub use frame_timer::FrameTimer;
pub use inspector::{ChunkInfo, WorldInspector, WorldSummary};

pub fn crate_info() -> &'static str {
    "voxelview-tools v0.1.0"
}
