use crate::chunk::ChunkRecord;
use crate::error::WalkError;
use crate::filter::SpatialFilter;
use crate::position::{ChunkPosition, RegionPosition};
use crate::region::{Region, REGION_CHUNKS};
use log::debug;
use std::fs::{read_dir, File};
use std::path::{Path, PathBuf};

/// Receives every selected chunk of a walk.
///
/// The accumulator is moved through each call and handed back to the caller
/// of [`WorldWalker::walk`] once every region was visited.
pub trait ChunkVisitor {
    type Accumulator;

    fn visit_chunk(
        &mut self,
        region: &mut Region<File>,
        path: &Path,
        slot: usize,
        accumulator: Self::Accumulator,
    ) -> Result<Self::Accumulator, WalkError>;

    /// Called after the last selected chunk of a region.
    fn finish_region(&mut self, _region: &Region<File>, _path: &Path) -> Result<(), WalkError> {
        Ok(())
    }
}

/// Folder of region files.
pub struct WorldWalker {
    /// Folder where region files located.
    folder_path: PathBuf,
}

impl WorldWalker {
    pub fn new<P: Into<PathBuf>>(folder: P) -> WorldWalker {
        WorldWalker {
            folder_path: folder.into(),
        }
    }

    pub fn folder_path(&self) -> &Path {
        &self.folder_path
    }

    /// Region files of the folder ordered by position.
    ///
    /// Entries which are not named like a region file are skipped.
    pub fn region_files(&self) -> Result<Vec<(RegionPosition, PathBuf)>, WalkError> {
        let read_dir_error = |io_error| WalkError::ReadDirError {
            path: self.folder_path.clone(),
            io_error,
        };

        let mut regions = Vec::new();

        for entry in read_dir(&self.folder_path).map_err(read_dir_error)? {
            let path = entry.map_err(read_dir_error)?.path();

            match RegionPosition::from_file_name(&path) {
                Ok(position) => regions.push((position, path)),
                Err(_) => debug!(target: "anvil-world", "Skipping {}", path.display()),
            }
        }

        regions.sort();

        Ok(regions)
    }

    pub fn region_path(&self, position: RegionPosition) -> PathBuf {
        self.folder_path.join(position.file_name())
    }

    /// Reads a single chunk, `None` if its region or slot is absent.
    pub fn read_chunk(&self, position: ChunkPosition) -> Result<Option<ChunkRecord>, WalkError> {
        let path = self.region_path(position.region_position());

        if !path.exists() {
            return Ok(None);
        }

        let mut region = Region::open(&path).map_err(WalkError::region(&path))?;

        region
            .read_chunk(position.slot_index())
            .map_err(WalkError::region(&path))
    }

    /// Visits every occupied chunk the filter selects, region by region in
    /// position order and slot by slot in index order.
    ///
    /// Regions the filter does not reach are never opened.
    pub fn walk<V: ChunkVisitor>(
        &self,
        filter: &SpatialFilter,
        initial: V::Accumulator,
        visitor: &mut V,
    ) -> Result<V::Accumulator, WalkError> {
        let mut accumulator = initial;

        for (position, path) in self.region_files()? {
            let region_filter = filter.intersect_with_rectangle(&position.block_bounds());

            if region_filter.is_empty() {
                debug!(
                    target: "anvil-world",
                    "Region x: {}, z: {} is outside of filter",
                    position.x, position.z
                );
                continue;
            }

            let mut region = Region::open(&path).map_err(WalkError::region(&path))?;
            let mask = region_filter.rasterize_region(position);

            debug!(
                target: "anvil-world",
                "Walking region x: {}, z: {} with {} selected chunks",
                position.x,
                position.z,
                mask.selected_count()
            );

            for slot in 0..REGION_CHUNKS {
                if !region.is_occupied(slot) || !mask.is_selected(slot) {
                    continue;
                }

                accumulator = visitor.visit_chunk(&mut region, &path, slot, accumulator)?;
            }

            visitor.finish_region(&region, &path)?;
        }

        Ok(accumulator)
    }
}
