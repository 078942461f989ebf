use crate::chunk::CompressionScheme;
use crate::error::DecodeError;
use flate2::read::{GzDecoder, ZlibDecoder};
use log::debug;
use nbt::decode::read_compound_tag;
use nbt::CompoundTag;
use std::borrow::Cow;
use std::io;
use std::io::Read;

/// Schemes tried in order when the caller has no hint.
const FALLBACK_SCHEMES: [CompressionScheme; 3] = [
    CompressionScheme::Uncompressed,
    CompressionScheme::Zlib,
    CompressionScheme::Gzip,
];

/// Blocks in one section layer (16×16).
pub const SECTION_LAYER_BLOCKS: usize = 256;
/// Block layers in one section.
pub const SECTION_HEIGHT: i32 = 16;

/// Decodes an NBT document.
///
/// With a hint only that scheme is tried, otherwise every scheme of the
/// fallback order is attempted until one yields a document.
pub fn decode_document(
    data: &[u8],
    hint: Option<CompressionScheme>,
) -> Result<CompoundTag, DecodeError> {
    if let Some(scheme) = hint {
        return decode_with(data, scheme);
    }

    let mut attempts = Vec::with_capacity(FALLBACK_SCHEMES.len());

    for &scheme in FALLBACK_SCHEMES.iter() {
        match decode_with(data, scheme) {
            Ok(compound_tag) => return Ok(compound_tag),
            Err(decode_error) => {
                debug!(target: "anvil-world", "Document is not {:?}: {}", scheme, decode_error);
                attempts.push(decode_error);
            }
        }
    }

    Err(DecodeError::NoSchemeMatched { attempts })
}

fn decode_with(data: &[u8], scheme: CompressionScheme) -> Result<CompoundTag, DecodeError> {
    let decompressed = decompress(data, scheme)
        .map_err(|io_error| DecodeError::DecompressError { scheme, io_error })?;
    let mut reader: &[u8] = &decompressed;

    read_compound_tag(&mut reader).map_err(|tag_decode_error| DecodeError::TagDecodeError {
        scheme,
        tag_decode_error,
    })
}

fn decompress(data: &[u8], scheme: CompressionScheme) -> Result<Cow<'_, [u8]>, io::Error> {
    let mut buffer = Vec::new();

    match scheme {
        CompressionScheme::Uncompressed => return Ok(Cow::Borrowed(data)),
        CompressionScheme::Zlib => ZlibDecoder::new(data).read_to_end(&mut buffer)?,
        CompressionScheme::Gzip => GzDecoder::new(data).read_to_end(&mut buffer)?,
    };

    Ok(Cow::Owned(buffer))
}

/// Vertical slice of a chunk.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Section {
    /// Section index, the section spans blocks `y * 16..=y * 16 + 15`.
    pub y: i32,
    /// Block ids in YZX order.
    pub blocks: Vec<u8>,
}

impl Section {
    pub fn new(y: i32, blocks: Vec<u8>) -> Self {
        Section { y, blocks }
    }

    pub fn min_block_y(&self) -> i32 {
        self.y * SECTION_HEIGHT
    }

    pub fn max_block_y(&self) -> i32 {
        self.min_block_y() + SECTION_HEIGHT - 1
    }
}

/// Decoded chunk content the walkers read from.
pub trait ChunkDocument {
    fn sections(&self) -> Result<Vec<Section>, DecodeError>;
}

/// Legacy chunk layout, `Level.Sections[]` holding `Y` and `Blocks`.
impl ChunkDocument for CompoundTag {
    fn sections(&self) -> Result<Vec<Section>, DecodeError> {
        let level = self
            .get_compound_tag("Level")
            .map_err(|_| DecodeError::MissingTag { name: "Level" })?;
        let sections = level
            .get_compound_tag_vec("Sections")
            .map_err(|_| DecodeError::MissingTag { name: "Sections" })?;

        sections
            .into_iter()
            .map(|section| {
                let y = section
                    .get_i8("Y")
                    .map_err(|_| DecodeError::MissingTag { name: "Y" })?;
                let blocks = section
                    .get_i8_vec("Blocks")
                    .map_err(|_| DecodeError::MissingTag { name: "Blocks" })?;

                Ok(Section::new(
                    y as i32,
                    blocks.iter().map(|&block| block as u8).collect(),
                ))
            })
            .collect()
    }
}


#[cfg(test)]
mod tests {
    use crate::chunk::CompressionScheme;
    use crate::document::fixtures::{gzip, legacy_chunk_nbt, legacy_chunk_record, zlib};
    use crate::document::{decode_document, ChunkDocument, Section};
    use crate::error::DecodeError;
    use nbt::CompoundTag;

    fn stone_sections() -> Vec<(i8, Vec<u8>)> {
        vec![(0, vec![1; 4096]), (3, vec![0; 4096])]
    }

    #[test]
    fn test_decode_with_hint() {
        let nbt = legacy_chunk_nbt(&stone_sections());

        let document = decode_document(&zlib(&nbt), Some(CompressionScheme::Zlib)).unwrap();
        let sections = document.sections().unwrap();

        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0], Section::new(0, vec![1; 4096]));
        assert_eq!(sections[1].y, 3);
        assert_eq!(sections[1].min_block_y(), 48);
        assert_eq!(sections[1].max_block_y(), 63);
    }

    #[test]
    fn test_decode_fallback_order() {
        let nbt = legacy_chunk_nbt(&stone_sections());

        for data in vec![nbt.clone(), zlib(&nbt), gzip(&nbt)] {
            let document = decode_document(&data, None).unwrap();
            assert_eq!(document.sections().unwrap().len(), 2);
        }
    }

    #[test]
    fn test_decode_wrong_hint_fails() {
        let nbt = legacy_chunk_nbt(&stone_sections());

        match decode_document(&gzip(&nbt), Some(CompressionScheme::Zlib)) {
            Err(DecodeError::DecompressError {
                scheme: CompressionScheme::Zlib,
                ..
            }) => {}
            other => panic!("Expected `DecompressError` but got `{:?}`", other),
        }
    }

    #[test]
    fn test_decode_garbage_tries_every_scheme() {
        match decode_document(&[0xde, 0xad, 0xbe, 0xef], None) {
            Err(DecodeError::NoSchemeMatched { attempts }) => assert_eq!(attempts.len(), 3),
            other => panic!("Expected `NoSchemeMatched` but got `{:?}`", other),
        }
    }

    #[test]
    fn test_record_decode_uses_tag() {
        let record = legacy_chunk_record(7, 1, &stone_sections());
        let document = record.decode().unwrap();

        assert_eq!(document.sections().unwrap()[0].blocks.len(), 4096);
    }

    #[test]
    fn test_sections_missing_level() {
        match CompoundTag::new().sections() {
            Err(DecodeError::MissingTag { name: "Level" }) => {}
            other => panic!("Expected `MissingTag` but got `{:?}`", other),
        }
    }
}
