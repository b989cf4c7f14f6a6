use voxelview_common::PrimitiveKind;

use crate::backend::{
    BackendError, FramebufferHandle, GraphicsBackend, ProgramDesc, ProgramHandle, ShaderSources,
    Vertex, check_framebuffer_size, check_sources, check_vertex_count,
};
use crate::uniform::{UniformBlock, UniformValue};

/// One call made against a [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Compile {
        program: ProgramHandle,
        label: String,
    },
    Bind(ProgramHandle),
    SetUniform {
        program: ProgramHandle,
        name: String,
        value: UniformValue,
    },
    SetVertexData {
        program: ProgramHandle,
        count: usize,
    },
    DrawArrays {
        program: ProgramHandle,
        kind: PrimitiveKind,
        vertex_count: u32,
    },
    CreateFramebuffer {
        framebuffer: FramebufferHandle,
        width: u32,
        height: u32,
    },
    ResizeFramebuffer {
        framebuffer: FramebufferHandle,
        width: u32,
        height: u32,
    },
}

#[derive(Debug)]
struct RecordedProgram {
    uniforms: UniformBlock,
    vertices: Vec<Vertex>,
}

/// Backend that validates calls like a GPU backend would and records them
/// instead of drawing. Used headless: in tests and for CLI dry runs.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    programs: Vec<RecordedProgram>,
    framebuffers: Vec<(u32, u32)>,
    bound: Option<ProgramHandle>,
    calls: Vec<BackendCall>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<BackendCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn bound(&self) -> Option<ProgramHandle> {
        self.bound
    }

    pub fn draw_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, BackendCall::DrawArrays { .. }))
            .count()
    }

    /// Current uniform buffer contents of a program.
    pub fn uniform_bytes(&self, program: ProgramHandle) -> Option<&[u8]> {
        self.programs
            .get(program.0 as usize)
            .map(|p| p.uniforms.bytes())
    }

    pub fn vertices(&self, program: ProgramHandle) -> Option<&[Vertex]> {
        self.programs
            .get(program.0 as usize)
            .map(|p| p.vertices.as_slice())
    }

    pub fn framebuffer_size(&self, framebuffer: FramebufferHandle) -> Option<(u32, u32)> {
        self.framebuffers.get(framebuffer.0 as usize).copied()
    }

    fn program_mut(&mut self, program: ProgramHandle) -> Result<&mut RecordedProgram, BackendError> {
        self.programs
            .get_mut(program.0 as usize)
            .ok_or(BackendError::UnknownProgram(program))
    }
}

impl GraphicsBackend for RecordingBackend {
    fn compile(
        &mut self,
        program: &ProgramDesc,
        sources: &ShaderSources,
    ) -> Result<ProgramHandle, BackendError> {
        check_sources(&program.label, sources)?;
        let uniforms = UniformBlock::new(&program.label, &program.uniforms)?;
        let handle = ProgramHandle(self.programs.len() as u32);
        self.programs.push(RecordedProgram {
            uniforms,
            vertices: Vec::new(),
        });
        self.calls.push(BackendCall::Compile {
            program: handle,
            label: program.label.clone(),
        });
        Ok(handle)
    }

    fn bind(&mut self, program: ProgramHandle) -> Result<(), BackendError> {
        self.program_mut(program)?;
        self.bound = Some(program);
        self.calls.push(BackendCall::Bind(program));
        Ok(())
    }

    fn set_uniform(
        &mut self,
        program: ProgramHandle,
        name: &str,
        value: UniformValue,
    ) -> Result<(), BackendError> {
        self.program_mut(program)?.uniforms.set(name, value)?;
        self.calls.push(BackendCall::SetUniform {
            program,
            name: name.to_string(),
            value,
        });
        Ok(())
    }

    fn set_vertex_data(
        &mut self,
        program: ProgramHandle,
        vertices: &[Vertex],
    ) -> Result<(), BackendError> {
        self.program_mut(program)?.vertices = vertices.to_vec();
        self.calls.push(BackendCall::SetVertexData {
            program,
            count: vertices.len(),
        });
        Ok(())
    }

    fn draw_arrays(
        &mut self,
        program: ProgramHandle,
        kind: PrimitiveKind,
        vertex_count: u32,
    ) -> Result<(), BackendError> {
        let available = self.program_mut(program)?.vertices.len();
        if self.bound != Some(program) {
            return Err(BackendError::ProgramNotBound(program));
        }
        check_vertex_count(vertex_count, available)?;
        self.calls.push(BackendCall::DrawArrays {
            program,
            kind,
            vertex_count,
        });
        Ok(())
    }

    fn create_framebuffer_texture(
        &mut self,
        width: u32,
        height: u32,
    ) -> Result<FramebufferHandle, BackendError> {
        check_framebuffer_size(width, height)?;
        let framebuffer = FramebufferHandle(self.framebuffers.len() as u32);
        self.framebuffers.push((width, height));
        self.calls.push(BackendCall::CreateFramebuffer {
            framebuffer,
            width,
            height,
        });
        Ok(framebuffer)
    }

    fn resize_framebuffer_texture(
        &mut self,
        framebuffer: FramebufferHandle,
        width: u32,
        height: u32,
    ) -> Result<(), BackendError> {
        check_framebuffer_size(width, height)?;
        let slot = self
            .framebuffers
            .get_mut(framebuffer.0 as usize)
            .ok_or(BackendError::UnknownFramebuffer(framebuffer))?;
        *slot = (width, height);
        self.calls.push(BackendCall::ResizeFramebuffer {
            framebuffer,
            width,
            height,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uniform::UniformKind;
    use glam::Mat4;

    fn compile_basic(backend: &mut RecordingBackend) -> ProgramHandle {
        let desc = ProgramDesc::new("basic").uniform("cameraView", UniformKind::Mat4);
        backend
            .compile(&desc, &ShaderSources::single_module("src"))
            .unwrap()
    }

    fn tri() -> Vec<Vertex> {
        vec![
            Vertex {
                position: [0.0, 0.0, 0.0],
                color: [1.0, 0.0, 0.0],
            };
            3
        ]
    }

    #[test]
    fn compile_returns_distinct_handles() {
        let mut backend = RecordingBackend::new();
        let a = compile_basic(&mut backend);
        let b = compile_basic(&mut backend);
        assert_ne!(a, b);
        assert_eq!(backend.calls().len(), 2);
    }

    #[test]
    fn draw_requires_binding() {
        let mut backend = RecordingBackend::new();
        let p = compile_basic(&mut backend);
        backend.set_vertex_data(p, &tri()).unwrap();
        let err = backend
            .draw_arrays(p, PrimitiveKind::Triangles, 3)
            .unwrap_err();
        assert!(matches!(err, BackendError::ProgramNotBound(_)));

        backend.bind(p).unwrap();
        backend.draw_arrays(p, PrimitiveKind::Triangles, 3).unwrap();
        assert_eq!(backend.draw_count(), 1);
    }

    #[test]
    fn draw_cannot_exceed_upload() {
        let mut backend = RecordingBackend::new();
        let p = compile_basic(&mut backend);
        backend.bind(p).unwrap();
        backend.set_vertex_data(p, &tri()).unwrap();
        let err = backend.draw_arrays(p, PrimitiveKind::Points, 4).unwrap_err();
        assert!(matches!(err, BackendError::VertexCountOutOfRange { .. }));
    }

    #[test]
    fn unknown_program_rejected() {
        let mut backend = RecordingBackend::new();
        let err = backend.bind(ProgramHandle(7)).unwrap_err();
        assert!(matches!(err, BackendError::UnknownProgram(ProgramHandle(7))));
    }

    #[test]
    fn uniforms_are_validated_and_stored() {
        let mut backend = RecordingBackend::new();
        let p = compile_basic(&mut backend);
        let m = Mat4::from_scale(glam::Vec3::splat(2.0));
        backend.set_uniform(p, "cameraView", m.into()).unwrap();
        let bytes = backend.uniform_bytes(p).unwrap();
        assert_eq!(f32::from_le_bytes(bytes[0..4].try_into().unwrap()), 2.0);

        assert!(backend.set_uniform(p, "nope", m.into()).is_err());
        assert!(backend.set_uniform(p, "cameraView", 1.0_f32.into()).is_err());
    }

    #[test]
    fn framebuffers_track_size() {
        let mut backend = RecordingBackend::new();
        let fb = backend.create_framebuffer_texture(640, 480).unwrap();
        assert_eq!(backend.framebuffer_size(fb), Some((640, 480)));
        backend.resize_framebuffer_texture(fb, 800, 600).unwrap();
        assert_eq!(backend.framebuffer_size(fb), Some((800, 600)));
        assert!(backend.create_framebuffer_texture(0, 10).is_err());
        assert!(
            backend
                .resize_framebuffer_texture(FramebufferHandle(3), 1, 1)
                .is_err()
        );
    }
}
