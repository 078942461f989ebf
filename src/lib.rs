//! Anvil region worlds: region file codec, rectangle filters and walkers that
//! clone or count the filtered chunks of a world.

pub mod chunk;
pub mod cloner;
pub mod config;
pub mod counter;
pub mod document;
pub mod error;
pub mod filter;
pub mod position;
pub mod region;
pub mod walker;

pub use crate::chunk::{ChunkRecord, CompressionScheme};
pub use crate::cloner::{clone_world, CloneSummary, WorldCloner};
pub use crate::config::WorldConfig;
pub use crate::counter::{count_blocks, BlockCounter, BlockCounts, CountRule, CountRuleKind};
pub use crate::document::{decode_document, ChunkDocument, Section};
pub use crate::error::{ConfigError, DecodeError, RegionError, WalkError};
pub use crate::filter::{AxisRange, FilterRule, Rectangle, RuleKind, SelectionMask, SpatialFilter};
pub use crate::position::{BlockPosition, ChunkPosition, RegionChunkPosition, RegionPosition};
pub use crate::region::Region;
pub use crate::walker::{ChunkVisitor, WorldWalker};
