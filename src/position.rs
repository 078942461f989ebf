use crate::error::RegionError;
use crate::filter::{AxisRange, Rectangle};
use std::path::Path;
use std::str::FromStr;

/// Chunks along one side of a region.
pub const REGION_SIDE_CHUNKS: i32 = 32;
/// Blocks along one side of a chunk.
pub const CHUNK_SIDE_BLOCKS: i32 = 16;
/// Blocks along one side of a region.
pub const REGION_SIDE_BLOCKS: i32 = REGION_SIDE_CHUNKS * CHUNK_SIDE_BLOCKS;
/// Region file extension.
pub const REGION_FILE_EXTENSION: &str = "mca";

#[derive(Debug, Ord, PartialOrd, Eq, PartialEq, Copy, Clone, Hash)]
pub struct BlockPosition {
    pub x: i32,
    pub z: i32,
}

impl BlockPosition {
    pub fn new(x: i32, z: i32) -> BlockPosition {
        BlockPosition { x, z }
    }

    pub fn chunk_position(&self) -> ChunkPosition {
        ChunkPosition::new(self.x >> 4, self.z >> 4)
    }
}

#[derive(Debug, Ord, PartialOrd, Eq, PartialEq, Copy, Clone, Hash)]
pub struct ChunkPosition {
    pub x: i32,
    pub z: i32,
}

impl ChunkPosition {
    pub fn new(x: i32, z: i32) -> ChunkPosition {
        ChunkPosition { x, z }
    }

    /// North-west corner of the chunk.
    pub fn block_position(&self) -> BlockPosition {
        BlockPosition::new(self.x * CHUNK_SIDE_BLOCKS, self.z * CHUNK_SIDE_BLOCKS)
    }

    pub fn region_position(&self) -> RegionPosition {
        RegionPosition::from_chunk_position(self.x, self.z)
    }

    pub fn region_chunk_position(&self) -> RegionChunkPosition {
        RegionChunkPosition::from_chunk_position(self.x, self.z)
    }

    /// Slot in the region header tables.
    pub fn slot_index(&self) -> usize {
        self.region_chunk_position().slot_index()
    }
}

#[derive(Debug, Ord, PartialOrd, Eq, PartialEq, Copy, Clone, Hash)]
pub struct RegionPosition {
    pub x: i32,
    pub z: i32,
}

impl RegionPosition {
    pub fn new(x: i32, z: i32) -> RegionPosition {
        RegionPosition { x, z }
    }

    pub fn from_chunk_position(chunk_x: i32, chunk_z: i32) -> RegionPosition {
        let x = chunk_x >> 5;
        let z = chunk_z >> 5;

        RegionPosition::new(x, z)
    }

    /// Block coordinates of the region origin.
    pub fn block_origin(&self) -> BlockPosition {
        BlockPosition::new(self.x * REGION_SIDE_BLOCKS, self.z * REGION_SIDE_BLOCKS)
    }

    /// Rectangle covered by the region, in blocks.
    pub fn block_bounds(&self) -> Rectangle {
        let origin = self.block_origin();

        Rectangle::new(
            AxisRange::bounded(origin.x, origin.x + REGION_SIDE_BLOCKS - 1),
            AxisRange::bounded(origin.z, origin.z + REGION_SIDE_BLOCKS - 1),
        )
    }

    /// Absolute chunk position of a slot inside this region.
    pub fn chunk_position(&self, slot_index: usize) -> ChunkPosition {
        let local = RegionChunkPosition::from_slot_index(slot_index);

        ChunkPosition::new(
            self.x * REGION_SIDE_CHUNKS + local.x as i32,
            self.z * REGION_SIDE_CHUNKS + local.z as i32,
        )
    }

    pub fn file_name(&self) -> String {
        format!("r.{}.{}.{}", self.x, self.z, REGION_FILE_EXTENSION)
    }

    pub fn from_file_name(path: &Path) -> Result<RegionPosition, RegionError> {
        // we can use lossy because of the bound check later
        let file_name = path.file_name().unwrap_or_default().to_string_lossy();
        let parts: Vec<_> = file_name.split('.').collect();

        let (x, z) = parse_coords(&parts).ok_or_else(|| RegionError::InvalidFileName {
            file_name: file_name.to_string(),
        })?;

        Ok(RegionPosition::new(x, z))
    }
}

fn parse_coords(parts: &[&str]) -> Option<(i32, i32)> {
    let incorrect_format =
        parts.len() != 4 || parts[0] != "r" || parts[3] != REGION_FILE_EXTENSION;

    if incorrect_format {
        return None;
    }

    Some((i32::from_str(parts[1]).ok()?, i32::from_str(parts[2]).ok()?))
}

#[derive(Debug, Ord, PartialOrd, Eq, PartialEq, Copy, Clone)]
pub struct RegionChunkPosition {
    pub x: u8,
    pub z: u8,
}

impl RegionChunkPosition {
    pub fn new(x: u8, z: u8) -> RegionChunkPosition {
        debug_assert!(32 > x, "Region chunk x coordinate out of bounds");
        debug_assert!(32 > z, "Region chunk z coordinate out of bounds");

        RegionChunkPosition { x, z }
    }

    pub fn from_chunk_position(chunk_x: i32, chunk_z: i32) -> RegionChunkPosition {
        let x = (chunk_x & 31) as u8;
        let z = (chunk_z & 31) as u8;

        RegionChunkPosition::new(x, z)
    }

    pub fn from_slot_index(slot_index: usize) -> RegionChunkPosition {
        debug_assert!(1024 > slot_index, "Slot index out of bounds");

        RegionChunkPosition::new((slot_index % 32) as u8, (slot_index / 32) as u8)
    }

    pub fn slot_index(&self) -> usize {
        self.x as usize + self.z as usize * 32
    }
}
