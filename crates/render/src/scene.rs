use glam::Mat4;
use voxelview_common::PrimitiveKind;

use crate::backend::{
    BackendError, GraphicsBackend, ProgramDesc, ProgramHandle, ShaderSources, Vertex,
};
use crate::camera::Camera;
use crate::uniform::UniformKind;

pub const MODEL_VIEW: &str = "modelView";
pub const CAMERA_VIEW: &str = "cameraView";
pub const CAMERA_PROJECTION: &str = "cameraProjection";

/// The voxel program plus the state needed to draw the world with it.
#[derive(Debug)]
pub struct VoxelScene {
    program: ProgramHandle,
    primitive: PrimitiveKind,
    vertex_count: u32,
}

impl VoxelScene {
    /// Uniform layout shared by every backend's voxel shader.
    pub fn program_desc() -> ProgramDesc {
        ProgramDesc::new("voxel")
            .uniform(MODEL_VIEW, UniformKind::Mat4)
            .uniform(CAMERA_VIEW, UniformKind::Mat4)
            .uniform(CAMERA_PROJECTION, UniformKind::Mat4)
    }

    /// Compile the voxel program and upload the camera's current matrices.
    pub fn new<B: GraphicsBackend>(
        backend: &mut B,
        sources: &ShaderSources,
        camera: &mut Camera,
    ) -> Result<Self, BackendError> {
        let program = backend.compile(&Self::program_desc(), sources)?;
        backend.bind(program)?;
        backend.set_uniform(program, MODEL_VIEW, Mat4::IDENTITY.into())?;
        backend.set_uniform(program, CAMERA_VIEW, camera.view_matrix().into())?;
        backend.set_uniform(program, CAMERA_PROJECTION, camera.projection_matrix().into())?;
        camera.take_view_changed();
        camera.take_projection_changed();
        tracing::info!(?program, "voxel scene ready");
        Ok(Self {
            program,
            primitive: PrimitiveKind::default(),
            vertex_count: 0,
        })
    }

    pub fn program(&self) -> ProgramHandle {
        self.program
    }

    pub fn primitive(&self) -> PrimitiveKind {
        self.primitive
    }

    pub fn set_primitive(&mut self, primitive: PrimitiveKind) {
        if self.primitive != primitive {
            tracing::debug!(?primitive, "draw mode changed");
        }
        self.primitive = primitive;
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn upload_mesh<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        vertices: &[Vertex],
    ) -> Result<(), BackendError> {
        let count = u32::try_from(vertices.len())
            .map_err(|_| BackendError::Unsupported("more than u32::MAX vertices".into()))?;
        backend.set_vertex_data(self.program, vertices)?;
        self.vertex_count = count;
        Ok(())
    }

    /// Draw the uploaded mesh. Matrices are only re-sent when the camera
    /// reports a change; an empty mesh skips the draw call.
    pub fn draw<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        camera: &mut Camera,
    ) -> Result<(), BackendError> {
        backend.bind(self.program)?;
        if camera.take_view_changed() {
            backend.set_uniform(self.program, CAMERA_VIEW, camera.view_matrix().into())?;
        }
        if camera.take_projection_changed() {
            backend.set_uniform(
                self.program,
                CAMERA_PROJECTION,
                camera.projection_matrix().into(),
            )?;
        }
        if self.vertex_count == 0 {
            return Ok(());
        }
        backend.draw_arrays(self.program, self.primitive, self.vertex_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::ChunkMesher;
    use crate::recording::{BackendCall, RecordingBackend};
    use glam::Vec3;
    use voxelview_world::{PregenBounds, World};

    fn setup() -> (RecordingBackend, Camera, VoxelScene) {
        let mut backend = RecordingBackend::new();
        let mut camera = Camera::new(Vec3::new(0.0, 0.0, 80.0), 16.0 / 9.0);
        let scene = VoxelScene::new(
            &mut backend,
            &ShaderSources::single_module("voxel"),
            &mut camera,
        )
        .unwrap();
        backend.take_calls();
        (backend, camera, scene)
    }

    fn uniform_names(calls: &[BackendCall]) -> Vec<&str> {
        calls
            .iter()
            .filter_map(|c| match c {
                BackendCall::SetUniform { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn new_uploads_all_matrices() {
        let mut backend = RecordingBackend::new();
        let mut camera = Camera::default();
        VoxelScene::new(&mut backend, &ShaderSources::single_module("v"), &mut camera).unwrap();
        assert_eq!(
            uniform_names(backend.calls()),
            vec![MODEL_VIEW, CAMERA_VIEW, CAMERA_PROJECTION]
        );
    }

    #[test]
    fn empty_mesh_skips_draw() {
        let (mut backend, mut camera, mut scene) = setup();
        scene.draw(&mut backend, &mut camera).unwrap();
        assert_eq!(backend.draw_count(), 0);
    }

    #[test]
    fn draws_uploaded_mesh_with_primitive() {
        let (mut backend, mut camera, mut scene) = setup();
        let mut world = World::new();
        world.pregenerate(&PregenBounds::default());
        let verts = ChunkMesher::default().mesh_world(&world);
        scene.upload_mesh(&mut backend, &verts).unwrap();
        scene.set_primitive(PrimitiveKind::Lines);
        scene.draw(&mut backend, &mut camera).unwrap();

        let last = backend.calls().last().unwrap().clone();
        assert_eq!(
            last,
            BackendCall::DrawArrays {
                program: scene.program(),
                kind: PrimitiveKind::Lines,
                vertex_count: verts.len() as u32,
            }
        );
    }

    #[test]
    fn unchanged_camera_sends_no_uniforms() {
        let (mut backend, mut camera, mut scene) = setup();
        scene.draw(&mut backend, &mut camera).unwrap();
        assert!(uniform_names(backend.calls()).is_empty());
    }

    #[test]
    fn camera_motion_refreshes_view_only() {
        let (mut backend, mut camera, mut scene) = setup();
        camera.forward(1.0);
        scene.draw(&mut backend, &mut camera).unwrap();
        assert_eq!(uniform_names(backend.calls()), vec![CAMERA_VIEW]);
    }

    #[test]
    fn resize_refreshes_projection() {
        let (mut backend, mut camera, mut scene) = setup();
        camera.set_aspect(1.0);
        scene.draw(&mut backend, &mut camera).unwrap();
        assert_eq!(uniform_names(backend.calls()), vec![CAMERA_PROJECTION]);
    }
}
