use glam::{I64Vec3, IVec3, UVec3, Vec3};
use std::collections::BTreeMap;
use std::fmt;
use voxelview_common::{Block, CHUNK_SIZE, CHUNK_SIZE_I32, CHUNK_VOLUME, ChunkCoord};

const HALF_CHUNK: i32 = CHUNK_SIZE_I32 / 2;

/// A fixed-size cube of blocks addressed by its chunk coordinate.
///
/// Chunk `c` covers world block coordinates `[c*S - S/2, c*S + S/2)` on each
/// axis, so chunk (0, 0, 0) is centered on the world origin.
pub struct Chunk {
    coord: ChunkCoord,
    /// X-fastest, then Y, then Z.
    blocks: Box<[Block]>,
}

impl Chunk {
    /// Create a chunk filled with solid blocks of id 1.
    pub fn new(coord: ChunkCoord) -> Self {
        Self::filled(coord, Block::solid(1))
    }

    pub fn filled(coord: ChunkCoord, block: Block) -> Self {
        Self {
            coord,
            blocks: vec![block; CHUNK_VOLUME].into_boxed_slice(),
        }
    }

    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// World position of local block (0, 0, 0).
    pub fn origin(&self) -> IVec3 {
        self.coord.as_ivec3() * CHUNK_SIZE_I32 - IVec3::splat(HALF_CHUNK)
    }

    #[inline]
    fn index(local: UVec3) -> usize {
        let s = CHUNK_SIZE;
        local.x as usize + local.y as usize * s + local.z as usize * s * s
    }

    #[inline]
    fn in_bounds(local: UVec3) -> bool {
        local.cmplt(UVec3::splat(CHUNK_SIZE as u32)).all()
    }

    /// Block at local coordinates, or `None` outside `0..CHUNK_SIZE`.
    pub fn block(&self, local: UVec3) -> Option<Block> {
        Self::in_bounds(local).then(|| self.blocks[Self::index(local)])
    }

    /// Local coordinates of the block containing `world`, or `None` when the
    /// point belongs to another chunk.
    pub fn world_to_local(&self, world: Vec3) -> Option<UVec3> {
        self.block_to_local(world.floor().as_ivec3())
    }

    /// Local coordinates of an integer world block position, or `None` when
    /// the block belongs to another chunk.
    pub fn block_to_local(&self, block: IVec3) -> Option<UVec3> {
        let local = block.as_i64vec3() - self.origin().as_i64vec3();
        if local.cmplt(I64Vec3::ZERO).any() || local.cmpge(I64Vec3::splat(CHUNK_SIZE as i64)).any()
        {
            return None;
        }
        Some(local.as_uvec3())
    }

    pub fn local_to_world(&self, local: UVec3) -> IVec3 {
        self.origin() + local.as_ivec3()
    }

    /// All blocks with their local coordinates, X fastest.
    pub fn blocks(&self) -> impl Iterator<Item = (UVec3, Block)> + '_ {
        let s = CHUNK_SIZE;
        self.blocks.iter().enumerate().map(move |(i, b)| {
            let local = UVec3::new((i % s) as u32, ((i / s) % s) as u32, (i / (s * s)) as u32);
            (local, *b)
        })
    }

    pub fn solid_count(&self) -> usize {
        self.blocks.iter().filter(|b| !b.is_air()).count()
    }

    /// Most common non-air block, or air for an empty chunk.
    pub fn dominant_block(&self) -> Block {
        let mut counts: BTreeMap<Block, usize> = BTreeMap::new();
        for b in self.blocks.iter().filter(|b| !b.is_air()) {
            *counts.entry(*b).or_default() += 1;
        }
        counts
            .into_iter()
            .max_by_key(|(_, n)| *n)
            .map(|(b, _)| b)
            .unwrap_or(Block::AIR)
    }
}

impl fmt::Debug for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chunk")
            .field("coord", &self.coord)
            .field("origin", &self.origin())
            .finish_non_exhaustive()
    }
}

/// Chunk coordinate containing a world position. The position is floored to
/// its block first so the result always agrees with [`Chunk::world_to_local`].
pub fn world_to_chunk(world: Vec3) -> ChunkCoord {
    block_to_chunk(world.floor().as_ivec3())
}

/// Chunk coordinate containing an integer world block position.
pub fn block_to_chunk(block: IVec3) -> ChunkCoord {
    // i64 so blocks near i32::MAX don't overflow when shifted by half a chunk.
    ((block.as_i64vec3() + I64Vec3::splat(HALF_CHUNK as i64))
        .div_euclid(I64Vec3::splat(CHUNK_SIZE as i64)))
    .as_ivec3()
    .into()
}

/// World-space center of a chunk.
pub fn chunk_center(coord: ChunkCoord) -> Vec3 {
    coord.as_ivec3().as_vec3() * CHUNK_SIZE as f32
}
