use crate::chunk::CompressionScheme;
use nbt::decode::TagDecodeError;
use std::path::PathBuf;
use std::{error::Error, fmt::Display, io};

/// Possible errors while reading or writing a region.
#[derive(Debug)]
pub enum RegionError {
    /// File name does not follow `r.<x>.<z>.mca`.
    InvalidFileName { file_name: String },
    /// Source is shorter than the two header sectors.
    HeaderTruncated {
        /// Source length.
        length: u64,
    },
    /// Chunk length overlaps the sectors allocated for it, or an occupied
    /// slot has no sectors at all.
    ///
    /// This should not occur under normal conditions.
    ///
    /// Region file are corrupted.
    LengthExceedsMaximum {
        /// Slot of the chunk.
        slot: usize,
        /// Chunk length.
        length: i32,
        /// Chunk maximum expected length.
        maximum_length: u32,
    },
    /// Chunk needs more sectors than the one byte sector count can hold.
    ChunkTooLarge {
        /// Encoded chunk length, including length prefix.
        length: usize,
    },
    /// Region grew past the 24 bit sector offset space.
    SectorOffsetOverflow { sector: u64 },
    /// I/O Error which happened while were reading or writing region.
    IOError { io_error: io::Error },
}

impl From<io::Error> for RegionError {
    fn from(io_error: io::Error) -> Self {
        RegionError::IOError { io_error }
    }
}

impl Error for RegionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RegionError::IOError { io_error } => Some(io_error),
            _ => None,
        }
    }
}

impl Display for RegionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use RegionError::*;
        match self {
            InvalidFileName { file_name } => {
                write!(f, "Not a region file name: {}", file_name)
            }
            HeaderTruncated { length } => {
                write!(f, "Region header truncated, source is {} bytes", length)
            }
            LengthExceedsMaximum {
                slot,
                length,
                maximum_length,
            } => write!(
                f,
                "Chunk {} length of {} exceeds maximum ({})",
                slot, length, maximum_length
            ),
            ChunkTooLarge { length } => {
                write!(f, "Chunk length of {} exceeds maximum (1mb)", length)
            }
            SectorOffsetOverflow { sector } => {
                write!(f, "Sector {} does not fit in region header", sector)
            }
            IOError { .. } => write!(f, "IO Error"),
        }
    }
}

/// Possible errors while decoding chunk document.
#[derive(Debug)]
pub enum DecodeError {
    /// Chunk payload has no compression scheme byte.
    EmptyPayload,
    /// Currently are only 3 types of compression: Gzip, Zlib and none.
    ///
    /// Region file are corrupted or was introduced new compression type.
    UnsupportedCompressionScheme {
        /// Compression scheme type id.
        compression_scheme: u8,
    },
    /// Payload could not be decompressed with the scheme.
    DecompressError {
        scheme: CompressionScheme,
        io_error: io::Error,
    },
    /// Error while decoding binary data to NBT tag.
    TagDecodeError {
        scheme: CompressionScheme,
        tag_decode_error: TagDecodeError,
    },
    /// Every fallback scheme was tried.
    NoSchemeMatched { attempts: Vec<DecodeError> },
    /// Document lacks a tag the chunk layout requires.
    MissingTag { name: &'static str },
}

impl Error for DecodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DecodeError::DecompressError { io_error, .. } => Some(io_error),
            DecodeError::TagDecodeError {
                tag_decode_error, ..
            } => Some(tag_decode_error),
            DecodeError::NoSchemeMatched { attempts } => {
                attempts.last().map(|e| e as &(dyn Error + 'static))
            }
            _ => None,
        }
    }
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::EmptyPayload => write!(f, "Chunk payload is empty"),
            DecodeError::UnsupportedCompressionScheme { compression_scheme } => {
                write!(f, "Unsupported compression scheme: {}", compression_scheme)
            }
            DecodeError::DecompressError { scheme, .. } => {
                write!(f, "Failed to decompress {:?} data", scheme)
            }
            DecodeError::TagDecodeError { scheme, .. } => {
                write!(f, "Failed to decode nbt from {:?} data", scheme)
            }
            DecodeError::NoSchemeMatched { attempts } => {
                write!(f, "No compression scheme matched (")?;
                for (index, attempt) in attempts.iter().enumerate() {
                    if index > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{}", attempt)?;
                }
                write!(f, ")")
            }
            DecodeError::MissingTag { name } => {
                write!(f, "Chunk document has no `{}` tag", name)
            }
        }
    }
}

/// Possible errors while loading a request.
#[derive(Debug)]
pub enum ConfigError {
    ReadError { path: PathBuf, io_error: io::Error },
    ParseError { serde_error: serde_json::Error },
    MissingField { field: &'static str },
    /// Range with more than two endpoints.
    InvalidRange { field: &'static str, endpoints: Vec<i32> },
    /// Count rule with neither or both of `include` and `exclude`.
    InvalidRule { name: String },
    /// Both `filter` and `keep`/`remove` were given.
    ConflictingFilters,
    NoFilterRules,
    NoCountRules,
    DestinationNotDirectory { path: PathBuf },
    DestinationNotEmpty { path: PathBuf },
    IOError { path: PathBuf, io_error: io::Error },
}

impl From<serde_json::Error> for ConfigError {
    fn from(serde_error: serde_json::Error) -> Self {
        ConfigError::ParseError { serde_error }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        use ConfigError::*;
        match self {
            ReadError { io_error, .. } | IOError { io_error, .. } => Some(io_error),
            ParseError { serde_error } => Some(serde_error),
            _ => None,
        }
    }
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use ConfigError::*;
        match self {
            ReadError { path, .. } => write!(f, "Failed to read config {}", path.display()),
            ParseError { .. } => write!(f, "Failed to parse config"),
            MissingField { field } => write!(f, "Config field `{}` is required", field),
            InvalidRange { field, endpoints } => write!(
                f,
                "Range `{}` takes at most two endpoints, got {:?}",
                field, endpoints
            ),
            InvalidRule { name } => write!(
                f,
                "Count rule `{}` needs exactly one of `include` or `exclude`",
                name
            ),
            ConflictingFilters => write!(f, "Use either `filter` or `keep`/`remove`, not both"),
            NoFilterRules => write!(f, "Config has no filter rules"),
            NoCountRules => write!(f, "Config has no count rules"),
            DestinationNotDirectory { path } => {
                write!(f, "Destination {} is not a directory", path.display())
            }
            DestinationNotEmpty { path } => {
                write!(f, "Destination {} is not empty", path.display())
            }
            IOError { path, .. } => write!(f, "IO Error at {}", path.display()),
        }
    }
}

/// Possible errors while walking a world.
#[derive(Debug)]
pub enum WalkError {
    /// World folder could not be listed.
    ReadDirError { path: PathBuf, io_error: io::Error },
    /// Region could not be opened, read or written.
    RegionError {
        path: PathBuf,
        region_error: RegionError,
    },
    /// Chunk document could not be decoded.
    DecodeError {
        path: PathBuf,
        slot: usize,
        decode_error: DecodeError,
    },
}

impl WalkError {
    pub(crate) fn region(path: impl Into<PathBuf>) -> impl FnOnce(RegionError) -> WalkError {
        let path = path.into();
        move |region_error| WalkError::RegionError { path, region_error }
    }
}

impl Error for WalkError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            WalkError::ReadDirError { io_error, .. } => Some(io_error),
            WalkError::RegionError { region_error, .. } => Some(region_error),
            WalkError::DecodeError { decode_error, .. } => Some(decode_error),
        }
    }
}

impl Display for WalkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WalkError::ReadDirError { path, .. } => write!(f, "Failed to list {}", path.display()),
            WalkError::RegionError { path, region_error } => {
                write!(f, "Region {}: {}", path.display(), region_error)
            }
            WalkError::DecodeError {
                path,
                slot,
                decode_error,
            } => write!(f, "Chunk {} in {}: {}", slot, path.display(), decode_error),
        }
    }
}
