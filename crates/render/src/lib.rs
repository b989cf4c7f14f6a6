//! Rendering: camera, backend-agnostic graphics interface and meshing.
//!
//! # Invariants
//! - Rendering never mutates the world; meshes are derived from a read of it.
//! - Camera pitch stays within ±89 degrees and speed never goes negative.
//! - Every backend validates calls the same way: draws need a bound program
//!   and may not read past the uploaded vertices.
//! - Uniform buffers follow the WGSL uniform address-space layout.

mod backend;
mod camera;
mod mesh;
mod recording;
mod scene;
mod uniform;

pub use backend::{
    BackendError, FramebufferHandle, GraphicsBackend, ProgramDesc, ProgramHandle, ShaderSources,
    Vertex, check_framebuffer_size, check_sources, check_vertex_count,
};
pub use camera::Camera;
pub use mesh::{ChunkMesher, CubeFace, FACE_TABLE, VERTICES_PER_CUBE, block_color};
pub use recording::{BackendCall, RecordingBackend};
pub use scene::{CAMERA_PROJECTION, CAMERA_VIEW, MODEL_VIEW, VoxelScene};
pub use uniform::{UniformBlock, UniformKind, UniformValue};

pub fn crate_info() -> &'static str {
    "voxelview-render v0.1.0"
}
