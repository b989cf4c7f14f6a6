use bytemuck::{Pod, Zeroable};
use voxelview_common::PrimitiveKind;

use crate::uniform::{UniformKind, UniformValue};

/// Opaque handle to a compiled shader program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramHandle(pub u32);

/// Opaque handle to an offscreen color + depth render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FramebufferHandle(pub u32);

/// Per-vertex data consumed by every program.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

/// Shader stage sources for one program.
#[derive(Debug, Clone, Default)]
pub struct ShaderSources {
    pub vertex: String,
    pub fragment: String,
    pub geometry: Option<String>,
    pub compute: Option<String>,
}

impl ShaderSources {
    pub fn new(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
            ..Default::default()
        }
    }

    /// Both stages from one source module, as WGSL allows.
    pub fn single_module(source: &str) -> Self {
        Self::new(source, source)
    }
}

/// Everything a backend needs to know about a program besides its sources.
#[derive(Debug, Clone, Default)]
pub struct ProgramDesc {
    pub label: String,
    /// Uniforms in the order the shader declares them.
    pub uniforms: Vec<(String, UniformKind)>,
}

impl ProgramDesc {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            uniforms: Vec::new(),
        }
    }

    pub fn uniform(mut self, name: impl Into<String>, kind: UniformKind) -> Self {
        self.uniforms.push((name.into(), kind));
        self
    }
}

/// Errors from graphics backend calls.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("unknown program {0:?}")]
    UnknownProgram(ProgramHandle),
    #[error("unknown framebuffer {0:?}")]
    UnknownFramebuffer(FramebufferHandle),
    #[error("program '{program}' has no uniform named '{name}'")]
    UnknownUniform { program: String, name: String },
    #[error("program '{program}' declares uniform '{name}' twice")]
    DuplicateUniform { program: String, name: String },
    #[error("uniform '{name}' is {expected:?} but got {found:?}")]
    UniformTypeMismatch {
        name: String,
        expected: UniformKind,
        found: UniformKind,
    },
    #[error("program {0:?} is not bound")]
    ProgramNotBound(ProgramHandle),
    #[error("draw requested {requested} vertices but only {available} are uploaded")]
    VertexCountOutOfRange { requested: u32, available: u32 },
    #[error("invalid framebuffer size {width}x{height}")]
    InvalidFramebufferSize { width: u32, height: u32 },
    #[error("shader compilation failed: {0}")]
    Compile(String),
    #[error("unsupported by this backend: {0}")]
    Unsupported(String),
}

/// The graphics API surface the viewer depends on.
///
/// Every call maps onto one graphics-API entry point. Implementations keep
/// the handles they hand out valid for their own lifetime.
pub trait GraphicsBackend {
    /// Compile and link a program.
    fn compile(
        &mut self,
        program: &ProgramDesc,
        sources: &ShaderSources,
    ) -> Result<ProgramHandle, BackendError>;

    /// Make `program` the active program.
    fn bind(&mut self, program: ProgramHandle) -> Result<(), BackendError>;

    fn set_uniform(
        &mut self,
        program: ProgramHandle,
        name: &str,
        value: UniformValue,
    ) -> Result<(), BackendError>;

    /// Replace the program's vertex buffer.
    fn set_vertex_data(
        &mut self,
        program: ProgramHandle,
        vertices: &[Vertex],
    ) -> Result<(), BackendError>;

    /// Draw the first `vertex_count` uploaded vertices. The program must be
    /// bound.
    fn draw_arrays(
        &mut self,
        program: ProgramHandle,
        kind: PrimitiveKind,
        vertex_count: u32,
    ) -> Result<(), BackendError>;

    fn create_framebuffer_texture(
        &mut self,
        width: u32,
        height: u32,
    ) -> Result<FramebufferHandle, BackendError>;

    fn resize_framebuffer_texture(
        &mut self,
        framebuffer: FramebufferHandle,
        width: u32,
        height: u32,
    ) -> Result<(), BackendError>;
}

/// Reject zero-sized render targets.
pub fn check_framebuffer_size(width: u32, height: u32) -> Result<(), BackendError> {
    if width == 0 || height == 0 {
        return Err(BackendError::InvalidFramebufferSize { width, height });
    }
    Ok(())
}

/// Reject draws that read past the uploaded vertices.
pub fn check_vertex_count(requested: u32, available: usize) -> Result<(), BackendError> {
    let available = u32::try_from(available).unwrap_or(u32::MAX);
    if requested > available {
        return Err(BackendError::VertexCountOutOfRange {
            requested,
            available,
        });
    }
    Ok(())
}

/// Reject programs missing a required stage.
pub fn check_sources(label: &str, sources: &ShaderSources) -> Result<(), BackendError> {
    if sources.vertex.trim().is_empty() || sources.fragment.trim().is_empty() {
        return Err(BackendError::Compile(format!(
            "program '{label}' needs both vertex and fragment sources"
        )));
    }
    Ok(())
}
