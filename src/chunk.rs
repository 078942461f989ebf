use crate::document::decode_document;
use crate::error::DecodeError;
use crate::position::{ChunkPosition, RegionChunkPosition};
use nbt::CompoundTag;

/// Region sector length in bytes.
pub const REGION_SECTOR_BYTES_LENGTH: usize = 4096;
/// Bytes of the length prefix in front of every chunk payload.
pub const CHUNK_LENGTH_PREFIX_BYTES: usize = 4;

/// Compression scheme used for chunk.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum CompressionScheme {
    Gzip = 1,
    /// In practice, you will only ever encounter chunks compressed using zlib.
    Zlib = 2,
    Uncompressed = 3,
}

impl CompressionScheme {
    pub fn from_tag(tag: u8) -> Option<CompressionScheme> {
        match tag {
            1 => Some(CompressionScheme::Gzip),
            2 => Some(CompressionScheme::Zlib),
            3 => Some(CompressionScheme::Uncompressed),
            _ => None,
        }
    }

    pub fn tag(self) -> u8 {
        self as u8
    }
}

/// One chunk slot worth of data, as stored in a region.
///
/// The payload starts with the compression scheme tag and is kept exactly as
/// read, so copying a record never touches the compressed document.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ChunkRecord {
    slot: usize,
    timestamp: i32,
    payload: Vec<u8>,
}

impl ChunkRecord {
    pub fn new(slot: usize, timestamp: i32, payload: Vec<u8>) -> Self {
        debug_assert!(1024 > slot, "Slot index out of bounds");

        ChunkRecord {
            slot,
            timestamp,
            payload,
        }
    }

    pub fn at(position: ChunkPosition, timestamp: i32, payload: Vec<u8>) -> Self {
        ChunkRecord::new(position.slot_index(), timestamp, payload)
    }

    /// Builds a payload from a compression scheme and compressed bytes.
    pub fn with_scheme(slot: usize, timestamp: i32, scheme: CompressionScheme, data: &[u8]) -> Self {
        let mut payload = Vec::with_capacity(data.len() + 1);
        payload.push(scheme.tag());
        payload.extend_from_slice(data);

        ChunkRecord::new(slot, timestamp, payload)
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn local_position(&self) -> RegionChunkPosition {
        RegionChunkPosition::from_slot_index(self.slot)
    }

    /// Last modification in Unix seconds, 0 if unknown.
    pub fn timestamp(&self) -> i32 {
        self.timestamp
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Length on disk including the length prefix.
    pub fn encoded_len(&self) -> usize {
        CHUNK_LENGTH_PREFIX_BYTES + self.payload.len()
    }

    pub fn sector_count(&self) -> usize {
        (self.encoded_len() + REGION_SECTOR_BYTES_LENGTH - 1) / REGION_SECTOR_BYTES_LENGTH
    }

    pub fn compression_scheme(&self) -> Result<CompressionScheme, DecodeError> {
        let tag = *self.payload.first().ok_or(DecodeError::EmptyPayload)?;

        CompressionScheme::from_tag(tag).ok_or(DecodeError::UnsupportedCompressionScheme {
            compression_scheme: tag,
        })
    }

    /// Decodes the document with the scheme named by the payload tag.
    pub fn decode(&self) -> Result<CompoundTag, DecodeError> {
        let scheme = self.compression_scheme()?;

        decode_document(&self.payload[1..], Some(scheme))
    }
}
