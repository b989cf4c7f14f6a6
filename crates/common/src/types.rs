use glam::IVec3;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Blocks per chunk edge.
pub const CHUNK_SIZE: usize = 32;
pub const CHUNK_SIZE_I32: i32 = CHUNK_SIZE as i32;
/// Blocks per chunk.
pub const CHUNK_VOLUME: usize = CHUNK_SIZE * CHUNK_SIZE * CHUNK_SIZE;

/// Chunks pregenerated along each axis when nothing else is configured.
pub const DEFAULT_PREGEN_SIZE: IVec3 = IVec3::new(3, 3, 3);

/// Smallest voxel unit: a material id plus an air flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Block {
    id: u16,
    air: bool,
}

impl Block {
    pub const AIR: Block = Block { id: 0, air: true };

    pub const fn new(id: u16, air: bool) -> Self {
        Self { id, air }
    }

    /// A non-air block with the given material id.
    pub const fn solid(id: u16) -> Self {
        Self { id, air: false }
    }

    pub const fn id(&self) -> u16 {
        self.id
    }

    pub const fn is_air(&self) -> bool {
        self.air
    }
}

impl Default for Block {
    fn default() -> Self {
        Self::AIR
    }
}

/// Integer coordinate of a chunk in the chunk grid.
///
/// Ordered Y first, then X, then Z, which is the order pregeneration walks
/// its bounds in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl ChunkCoord {
    pub const ORIGIN: ChunkCoord = ChunkCoord { x: 0, y: 0, z: 0 };

    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn as_ivec3(self) -> IVec3 {
        IVec3::new(self.x, self.y, self.z)
    }
}

impl From<IVec3> for ChunkCoord {
    fn from(v: IVec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<ChunkCoord> for IVec3 {
    fn from(c: ChunkCoord) -> Self {
        c.as_ivec3()
    }
}

impl Ord for ChunkCoord {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.y, self.x, self.z).cmp(&(other.y, other.x, other.z))
    }
}

impl PartialOrd for ChunkCoord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// How `draw_arrays` assembles vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PrimitiveKind {
    #[default]
    Triangles,
    Lines,
    Points,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 3] = [Self::Triangles, Self::Lines, Self::Points];
}

/// Axis a movement impulse is applied along, relative to the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveDirection {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_block_is_air() {
        let b = Block::default();
        assert!(b.is_air());
        assert_eq!(b, Block::AIR);
    }

    #[test]
    fn solid_block_is_not_air() {
        let b = Block::solid(1);
        assert_eq!(b.id(), 1);
        assert!(!b.is_air());
    }

    #[test]
    fn chunk_volume_matches_size() {
        assert_eq!(CHUNK_VOLUME, 32 * 32 * 32);
    }

    #[test]
    fn chunk_coord_orders_y_then_x_then_z() {
        let mut coords = vec![
            ChunkCoord::new(1, 0, 0),
            ChunkCoord::new(0, 1, 0),
            ChunkCoord::new(0, 0, 1),
            ChunkCoord::new(-1, 0, 0),
        ];
        coords.sort();
        assert_eq!(
            coords,
            vec![
                ChunkCoord::new(-1, 0, 0),
                ChunkCoord::new(0, 0, 1),
                ChunkCoord::new(1, 0, 0),
                ChunkCoord::new(0, 1, 0),
            ]
        );
    }

    #[test]
    fn chunk_coord_ivec3_conversion() {
        let c = ChunkCoord::from(IVec3::new(-2, 5, 7));
        assert_eq!(c, ChunkCoord::new(-2, 5, 7));
        assert_eq!(IVec3::from(c), IVec3::new(-2, 5, 7));
        assert_eq!(c.to_string(), "(-2, 5, 7)");
    }
}
