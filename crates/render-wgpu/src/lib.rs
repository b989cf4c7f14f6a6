//! wgpu render backend for the voxel viewer.
//!
//! Implements `GraphicsBackend` on top of wgpu: scene draws go into an
//! offscreen color + depth framebuffer which is then blitted to the window
//! surface.
//!
//! # Invariants
//! - Each queued draw sees the uniform values current at the time it was
//!   queued.
//! - Framebuffer color and depth textures always share one size.

mod framebuffer;
mod gpu;
mod shaders;

pub use framebuffer::{COLOR_FORMAT, DEPTH_FORMAT, FramebufferTexture};
pub use gpu::WgpuBackend;
pub use shaders::{BLIT_SHADER, VOXEL_SHADER};
