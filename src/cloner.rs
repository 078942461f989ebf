//! Copies the selected part of a world into a new folder.

use crate::error::{ConfigError, WalkError};
use crate::filter::SpatialFilter;
use crate::region::Region;
use crate::walker::{ChunkVisitor, WorldWalker};
use log::{debug, info};
use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};

/// What a clone wrote.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct CloneSummary {
    /// Regions created in the destination.
    pub regions: usize,
    /// Chunks copied.
    pub chunks: usize,
}

/// Appends selected chunk records verbatim to fresh destination regions.
///
/// A destination region is only created once its first chunk is selected,
/// so regions without selected chunks have no counterpart in the clone.
pub struct WorldCloner {
    destination: PathBuf,
    current: Option<(PathBuf, Region<File>)>,
}

impl WorldCloner {
    /// Prepares `destination`, which must be missing or an empty folder.
    pub fn new<P: Into<PathBuf>>(destination: P) -> Result<WorldCloner, ConfigError> {
        let destination = destination.into();
        let io_error = |io_error| ConfigError::IOError {
            path: destination.clone(),
            io_error,
        };

        if destination.exists() {
            if !destination.is_dir() {
                return Err(ConfigError::DestinationNotDirectory { path: destination });
            }

            if fs::read_dir(&destination).map_err(io_error)?.next().is_some() {
                return Err(ConfigError::DestinationNotEmpty { path: destination });
            }
        } else {
            fs::create_dir_all(&destination).map_err(io_error)?;
        }

        Ok(WorldCloner {
            destination,
            current: None,
        })
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }
}

impl ChunkVisitor for WorldCloner {
    type Accumulator = CloneSummary;

    fn visit_chunk(
        &mut self,
        region: &mut Region<File>,
        path: &Path,
        slot: usize,
        mut summary: CloneSummary,
    ) -> Result<CloneSummary, WalkError> {
        let record = match region.read_chunk(slot).map_err(WalkError::region(path))? {
            Some(record) => record,
            None => return Ok(summary),
        };

        if self.current.is_none() {
            let destination_path = self.destination.join(region.position().file_name());

            debug!(target: "anvil-world", "Creating {}", destination_path.display());

            let destination_region =
                Region::create(&destination_path).map_err(WalkError::region(&destination_path))?;

            self.current = Some((destination_path, destination_region));
            summary.regions += 1;
        }

        if let Some((destination_path, destination_region)) = self.current.as_mut() {
            destination_region
                .append_chunk(&record)
                .map_err(WalkError::region(destination_path.as_path()))?;
            summary.chunks += 1;
        }

        Ok(summary)
    }

    fn finish_region(&mut self, _region: &Region<File>, _path: &Path) -> Result<(), WalkError> {
        if let Some((destination_path, mut destination_region)) = self.current.take() {
            destination_region
                .flush_header()
                .map_err(WalkError::region(&destination_path))?;
        }

        Ok(())
    }
}

/// Clones every chunk the filter selects in `world` into `cloner`'s folder.
pub fn clone_world(
    world: &WorldWalker,
    filter: &SpatialFilter,
    cloner: &mut WorldCloner,
) -> Result<CloneSummary, WalkError> {
    let summary = world.walk(filter, CloneSummary::default(), cloner)?;

    info!(
        target: "anvil-world",
        "Cloned {} chunks in {} regions from {} to {}",
        summary.chunks,
        summary.regions,
        world.folder_path().display(),
        cloner.destination().display()
    );

    Ok(summary)
}
