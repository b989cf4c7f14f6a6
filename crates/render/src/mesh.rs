use glam::Vec3;
use voxelview_common::{Block, CHUNK_SIZE};
use voxelview_world::{Chunk, World, chunk_center};

use crate::backend::Vertex;

/// Vertices emitted for one meshed chunk.
pub const VERTICES_PER_CUBE: usize = 36;

/// One face of the `[-1, 1]³` cube. Corners wind counter-clockwise when
/// seen from outside.
#[derive(Debug, Clone, Copy)]
pub struct CubeFace {
    pub normal: Vec3,
    /// Brightness multiplier so faces stay distinguishable without lighting.
    pub shade: f32,
    pub corners: [Vec3; 4],
}

impl CubeFace {
    /// The face as two triangles.
    pub fn triangles(&self) -> [Vec3; 6] {
        let [a, b, c, d] = self.corners;
        [a, b, c, c, d, a]
    }
}

const fn v(x: f32, y: f32, z: f32) -> Vec3 {
    Vec3::new(x, y, z)
}

#[rustfmt::skip]
pub const FACE_TABLE: [CubeFace; 6] = [
    // +Z
    CubeFace { normal: Vec3::Z, shade: 0.85,
        corners: [v(-1.0, -1.0,  1.0), v( 1.0, -1.0,  1.0), v( 1.0,  1.0,  1.0), v(-1.0,  1.0,  1.0)] },
    // -Z
    CubeFace { normal: Vec3::NEG_Z, shade: 0.85,
        corners: [v( 1.0, -1.0, -1.0), v(-1.0, -1.0, -1.0), v(-1.0,  1.0, -1.0), v( 1.0,  1.0, -1.0)] },
    // +X
    CubeFace { normal: Vec3::X, shade: 0.7,
        corners: [v( 1.0, -1.0,  1.0), v( 1.0, -1.0, -1.0), v( 1.0,  1.0, -1.0), v( 1.0,  1.0,  1.0)] },
    // -X
    CubeFace { normal: Vec3::NEG_X, shade: 0.7,
        corners: [v(-1.0, -1.0, -1.0), v(-1.0, -1.0,  1.0), v(-1.0,  1.0,  1.0), v(-1.0,  1.0, -1.0)] },
    // +Y
    CubeFace { normal: Vec3::Y, shade: 1.0,
        corners: [v(-1.0,  1.0,  1.0), v( 1.0,  1.0,  1.0), v( 1.0,  1.0, -1.0), v(-1.0,  1.0, -1.0)] },
    // -Y
    CubeFace { normal: Vec3::NEG_Y, shade: 0.5,
        corners: [v(-1.0, -1.0, -1.0), v( 1.0, -1.0, -1.0), v( 1.0, -1.0,  1.0), v(-1.0, -1.0,  1.0)] },
];

/// Base color for a block id.
pub fn block_color(block: Block) -> Vec3 {
    const PALETTE: [Vec3; 4] = [
        Vec3::new(0.36, 0.62, 0.29),
        Vec3::new(0.55, 0.41, 0.26),
        Vec3::new(0.52, 0.52, 0.55),
        Vec3::new(0.86, 0.80, 0.55),
    ];
    if block.is_air() {
        return Vec3::ZERO;
    }
    PALETTE[(block.id().saturating_sub(1) as usize) % PALETTE.len()]
}

/// Turns chunks into cube vertices: one cube per non-empty chunk.
#[derive(Debug, Clone, Copy)]
pub struct ChunkMesher {
    /// Fraction of the chunk extent left empty between neighbouring cubes,
    /// in `[0, 1)`.
    pub gap: f32,
}

impl Default for ChunkMesher {
    fn default() -> Self {
        Self { gap: 0.05 }
    }
}

impl ChunkMesher {
    pub fn new(gap: f32) -> Self {
        Self {
            gap: gap.clamp(0.0, 0.95),
        }
    }

    /// Cube vertices for one chunk. Empty chunks produce nothing.
    pub fn mesh_chunk(&self, chunk: &Chunk, out: &mut Vec<Vertex>) {
        let block = chunk.dominant_block();
        if block.is_air() {
            return;
        }
        let center = chunk_center(chunk.coord());
        let half = CHUNK_SIZE as f32 * 0.5 * (1.0 - self.gap);
        let base = block_color(block);

        out.reserve(VERTICES_PER_CUBE);
        for face in &FACE_TABLE {
            let color = (base * face.shade).to_array();
            for corner in face.triangles() {
                out.push(Vertex {
                    position: (center + corner * half).to_array(),
                    color,
                });
            }
        }
    }

    pub fn mesh_world(&self, world: &World) -> Vec<Vertex> {
        let mut out = Vec::with_capacity(world.chunk_count() * VERTICES_PER_CUBE);
        for chunk in world.chunks() {
            self.mesh_chunk(chunk, &mut out);
        }
        tracing::debug!(
            chunks = world.chunk_count(),
            vertices = out.len(),
            "meshed world"
        );
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxelview_common::ChunkCoord;
    use voxelview_world::PregenBounds;

    #[test]
    fn faces_wind_counter_clockwise_outward() {
        for face in &FACE_TABLE {
            let t = face.triangles();
            for tri in t.chunks(3) {
                let n = (tri[1] - tri[0]).cross(tri[2] - tri[0]);
                assert!(n.dot(face.normal) > 0.0, "face {:?}", face.normal);
            }
            for c in face.corners {
                assert_eq!(c.dot(face.normal), 1.0);
            }
        }
    }

    #[test]
    fn empty_world_has_no_vertices() {
        assert!(ChunkMesher::default().mesh_world(&World::new()).is_empty());
    }

    #[test]
    fn air_chunk_is_skipped() {
        let mut out = Vec::new();
        let chunk = Chunk::filled(ChunkCoord::ORIGIN, Block::AIR);
        ChunkMesher::default().mesh_chunk(&chunk, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn one_cube_per_chunk() {
        let mut world = World::new();
        world.pregenerate(&PregenBounds::default());
        let verts = ChunkMesher::default().mesh_world(&world);
        assert_eq!(verts.len(), 27 * VERTICES_PER_CUBE);
    }

    #[test]
    fn cube_is_centered_and_scaled() {
        let mut out = Vec::new();
        let chunk = Chunk::new(ChunkCoord::new(1, 0, 0));
        ChunkMesher::new(0.0).mesh_chunk(&chunk, &mut out);
        let xs: Vec<f32> = out.iter().map(|v| v.position[0]).collect();
        let min = xs.iter().cloned().fold(f32::INFINITY, f32::min);
        let max = xs.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        assert_eq!(min, 16.0);
        assert_eq!(max, 48.0);
    }

    #[test]
    fn air_has_no_color() {
        assert_eq!(block_color(Block::AIR), Vec3::ZERO);
        assert_ne!(block_color(Block::solid(1)), Vec3::ZERO);
    }
}
