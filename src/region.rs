use crate::chunk::{ChunkRecord, CHUNK_LENGTH_PREFIX_BYTES, REGION_SECTOR_BYTES_LENGTH};
use crate::error::RegionError;
use crate::position::{BlockPosition, RegionPosition};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use log::debug;
use std::fs::{File, OpenOptions};
use std::io;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Amount of chunks in region.
pub const REGION_CHUNKS: usize = 1024;
/// Length of chunks metadata in region.
const REGION_CHUNKS_METADATA_LENGTH: usize = 2 * REGION_CHUNKS;
/// Region header length in bytes.
pub const REGION_HEADER_BYTES_LENGTH: u64 = 8 * REGION_CHUNKS as u64;
/// Sectors taken by the header tables.
const REGION_HEADER_SECTORS: u32 = 2;
/// Largest sector index the 3 byte offset can address.
const MAXIMUM_SECTOR_OFFSET: u64 = 0xFF_FFFF;
/// Largest sector count the 1 byte count can hold.
const MAXIMUM_SECTOR_COUNT: usize = 0xFF;

/// Region represents a 32x32 group of chunks.
///
/// Chunks are only ever appended after the last used sector. The header
/// tables are kept in memory and written back by [`Region::flush_header`].
pub struct Region<S> {
    /// Region coordinates.
    position: RegionPosition,
    /// Source in which region are stored.
    source: S,
    /// Array of chunks metadata.
    chunks_metadata: [ChunkMetadata; REGION_CHUNKS],
    /// First sector after all chunk data.
    cursor: u32,
}

impl<S> Region<S> {
    pub fn position(&self) -> RegionPosition {
        self.position
    }

    /// Region origin in block coordinates.
    pub fn base(&self) -> BlockPosition {
        self.position.block_origin()
    }

    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    pub fn is_occupied(&self, slot: usize) -> bool {
        !self.metadata(slot).is_empty()
    }

    pub fn sector_offset(&self, slot: usize) -> u32 {
        self.metadata(slot).start_sector_index
    }

    pub fn sector_count(&self, slot: usize) -> u8 {
        self.metadata(slot).sectors
    }

    pub fn timestamp(&self, slot: usize) -> i32 {
        self.metadata(slot).last_modified_timestamp
    }

    /// Occupied slots in index order.
    pub fn occupied_slots(&self) -> impl Iterator<Item = usize> + '_ {
        (0..REGION_CHUNKS).filter(move |&slot| self.is_occupied(slot))
    }

    pub fn into_inner(self) -> S {
        self.source
    }

    fn metadata(&self, slot: usize) -> ChunkMetadata {
        debug_assert!(REGION_CHUNKS > slot, "Slot index out of bounds");

        self.chunks_metadata[slot]
    }
}

impl Region<File> {
    /// Opens an existing region file for reading.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, RegionError> {
        let path = path.as_ref();
        let position = RegionPosition::from_file_name(path)?;
        let file = File::open(path)?;

        Region::load(position, file)
    }

    /// Creates an empty region file, truncating any existing one.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, RegionError> {
        let path = path.as_ref();
        let position = RegionPosition::from_file_name(path)?;

        let file = OpenOptions::new()
            .write(true)
            .read(true)
            .create(true)
            .truncate(true)
            .open(path)?;

        Region::create_in(position, file)
    }
}

impl<S: Read + Seek> Region<S> {
    pub fn load(position: RegionPosition, mut source: S) -> Result<Self, RegionError> {
        let source_len = source.len()?;

        if REGION_HEADER_BYTES_LENGTH > source_len {
            return Err(RegionError::HeaderTruncated { length: source_len });
        }

        source.seek(SeekFrom::Start(0))?;
        let chunks_metadata = Self::read_header(&mut source)?;
        let cursor = next_free_sector(&chunks_metadata);

        debug!(
            target: "anvil-world",
            "Loaded region x: {}, z: {} with next free sector {}",
            position.x, position.z, cursor
        );

        let region = Region {
            position,
            source,
            chunks_metadata,
            cursor,
        };

        Ok(region)
    }

    /// Reads raw chunk record, `None` if the slot is empty.
    pub fn read_chunk(&mut self, slot: usize) -> Result<Option<ChunkRecord>, RegionError> {
        let metadata = self.metadata(slot);

        if metadata.is_empty() {
            return Ok(None);
        }

        // Occupied slot without sectors has no room even for the length prefix.
        if metadata.sectors == 0 {
            return Err(RegionError::LengthExceedsMaximum {
                slot,
                length: 0,
                maximum_length: 0,
            });
        }

        let seek_offset = metadata.start_sector_index as u64 * REGION_SECTOR_BYTES_LENGTH as u64;
        let maximum_length = (metadata.sectors as usize * REGION_SECTOR_BYTES_LENGTH
            - CHUNK_LENGTH_PREFIX_BYTES) as u32;

        self.source.seek(SeekFrom::Start(seek_offset))?;
        let length = self.source.read_i32::<BigEndian>()?;

        if length < 0 || length as u32 > maximum_length {
            return Err(RegionError::LengthExceedsMaximum {
                slot,
                length,
                maximum_length,
            });
        }

        let mut payload = vec![0u8; length as usize];
        self.source.read_exact(&mut payload)?;

        Ok(Some(ChunkRecord::new(
            slot,
            metadata.last_modified_timestamp,
            payload,
        )))
    }

    /// First 8KB of source are header of 1024 offsets and 1024 timestamps.
    fn read_header(source: &mut S) -> Result<[ChunkMetadata; REGION_CHUNKS], io::Error> {
        let mut chunks_metadata = [ChunkMetadata::default(); REGION_CHUNKS];
        let mut values = [0u32; REGION_CHUNKS_METADATA_LENGTH];

        for value in values.iter_mut() {
            *value = source.read_u32::<BigEndian>()?;
        }

        for (index, metadata) in chunks_metadata.iter_mut().enumerate() {
            let offset = values[index];
            let last_modified_timestamp = values[REGION_CHUNKS + index] as i32;

            let start_sector_index = offset >> 8;
            let sectors = (offset & 0xFF) as u8;

            *metadata = ChunkMetadata::new(start_sector_index, sectors, last_modified_timestamp);
        }

        Ok(chunks_metadata)
    }
}

impl<S: Write + Seek> Region<S> {
    /// Starts an empty region in `source` with zeroed header tables.
    pub fn create_in(position: RegionPosition, source: S) -> Result<Self, RegionError> {
        let mut region = Region {
            position,
            source,
            chunks_metadata: [ChunkMetadata::default(); REGION_CHUNKS],
            cursor: REGION_HEADER_SECTORS,
        };

        region.flush_header()?;

        Ok(region)
    }

    /// Writes record after the last used sector and points its slot there.
    ///
    /// Sectors previously used by the slot are not reclaimed.
    pub fn append_chunk(&mut self, record: &ChunkRecord) -> Result<(), RegionError> {
        let sectors = record.sector_count();

        if sectors > MAXIMUM_SECTOR_COUNT {
            return Err(RegionError::ChunkTooLarge {
                length: record.encoded_len(),
            });
        }

        let next_cursor = self.cursor as u64 + sectors as u64;

        if next_cursor > MAXIMUM_SECTOR_OFFSET {
            return Err(RegionError::SectorOffsetOverflow {
                sector: next_cursor,
            });
        }

        let seek_offset = self.cursor as u64 * REGION_SECTOR_BYTES_LENGTH as u64;

        self.source.seek(SeekFrom::Start(seek_offset))?;
        self.source
            .write_i32::<BigEndian>(record.payload().len() as i32)?;
        self.source.write_all(record.payload())?;

        // Padding to align sector.
        let padding_len = sectors * REGION_SECTOR_BYTES_LENGTH - record.encoded_len();

        if padding_len > 0 {
            self.source.write_all(&vec![0; padding_len])?;
        }

        debug!(
            target: "anvil-world",
            "Region x: {}, z: {} slot {} placed at sectors {}..{}",
            self.position.x,
            self.position.z,
            record.slot(),
            self.cursor,
            next_cursor
        );

        debug_assert!(REGION_CHUNKS > record.slot(), "Slot index out of bounds");

        self.chunks_metadata[record.slot()] =
            ChunkMetadata::new(self.cursor, sectors as u8, record.timestamp());
        self.cursor = next_cursor as u32;

        Ok(())
    }

    /// Writes both header tables to the first two sectors.
    pub fn flush_header(&mut self) -> Result<(), RegionError> {
        let mut buffer = Vec::with_capacity(REGION_HEADER_BYTES_LENGTH as usize);

        for metadata in self.chunks_metadata.iter() {
            buffer.write_u32::<BigEndian>((metadata.start_sector_index << 8) | metadata.sectors as u32)?;
        }

        for metadata in self.chunks_metadata.iter() {
            buffer.write_i32::<BigEndian>(metadata.last_modified_timestamp)?;
        }

        self.source.seek(SeekFrom::Start(0))?;
        self.source.write_all(&buffer)?;
        self.source.flush()?;

        Ok(())
    }
}

/// First sector not covered by the header or by any chunk.
fn next_free_sector(chunks_metadata: &[ChunkMetadata]) -> u32 {
    chunks_metadata
        .iter()
        .map(|metadata| metadata.start_sector_index + metadata.sectors as u32)
        .fold(REGION_HEADER_SECTORS, u32::max)
}

/// Chunk metadata are stored in header.
#[derive(Copy, Clone, Default, Debug, Eq, PartialEq)]
struct ChunkMetadata {
    /// Sector index from which starts chunk data.
    start_sector_index: u32,
    /// Amount of sectors used to store chunk.
    sectors: u8,
    /// Last time in seconds when chunk was modified.
    last_modified_timestamp: i32,
}

impl ChunkMetadata {
    fn new(start_sector_index: u32, sectors: u8, last_modified_timestamp: i32) -> Self {
        ChunkMetadata {
            start_sector_index,
            sectors,
            last_modified_timestamp,
        }
    }

    fn is_empty(&self) -> bool {
        self.start_sector_index == 0
    }
}

/// Trait adds additional helper methods for `Seek`.
trait SeekExt {
    fn len(&mut self) -> Result<u64, io::Error>;
}

impl<S: Seek> SeekExt for S {
    fn len(&mut self) -> Result<u64, io::Error> {
        let old_pos = self.seek(SeekFrom::Current(0))?;
        let len = self.seek(SeekFrom::End(0))?;

        if old_pos != len {
            self.seek(SeekFrom::Start(old_pos))?;
        }

        Ok(len)
    }
}

#[cfg(test)]
mod tests {
    use crate::chunk::ChunkRecord;
    use crate::error::RegionError;
    use crate::position::RegionPosition;
    use crate::region::{
        next_free_sector, ChunkMetadata, Region, SeekExt, REGION_CHUNKS,
        REGION_HEADER_BYTES_LENGTH,
    };
    use byteorder::{BigEndian, WriteBytesExt};
    use std::io::Cursor;
    use tempfile::tempdir;

    fn empty_region() -> Region<Cursor<Vec<u8>>> {
        Region::create_in(RegionPosition::new(1, 1), Cursor::new(Vec::new())).unwrap()
    }

    fn reload(region: Region<Cursor<Vec<u8>>>) -> Region<Cursor<Vec<u8>>> {
        let position = region.position();
        Region::load(position, region.into_inner()).unwrap()
    }

    #[test]
    fn test_empty_header_write() {
        let mut region = empty_region();

        assert_eq!(region.source.len().unwrap(), REGION_HEADER_BYTES_LENGTH);
        assert_eq!(region.cursor(), 2);
        assert_eq!(region.occupied_slots().count(), 0);
    }

    #[test]
    fn test_load_truncated_header() {
        let cursor = Cursor::new(vec![0; 8191]);

        match Region::load(RegionPosition::new(0, 0), cursor) {
            Err(RegionError::HeaderTruncated { length: 8191 }) => {}
            Err(e) => panic!("Expected `HeaderTruncated` but got `{:?}`", e),
            Ok(_) => panic!("Expected `HeaderTruncated` but region loaded"),
        }
    }

    #[test]
    fn test_header_read() {
        let mut header = Vec::new();

        for index in 0..REGION_CHUNKS as u32 {
            let offset = if index == 256 { (61 << 8) | 2 } else { 0 };
            header.write_u32::<BigEndian>(offset).unwrap();
        }

        for index in 0..REGION_CHUNKS as i32 {
            header.write_i32::<BigEndian>(if index == 256 { 1570215508 } else { 0 }).unwrap();
        }

        let region = Region::load(RegionPosition::new(0, 0), Cursor::new(header)).unwrap();

        assert_eq!(region.chunks_metadata[256], ChunkMetadata::new(61, 2, 1570215508));
        assert_eq!(region.occupied_slots().collect::<Vec<_>>(), vec![256]);
        assert_eq!(region.cursor(), 63);
    }

    #[test]
    fn test_read_chunk_not_found() {
        let mut region = empty_region();

        assert!(region.read_chunk(14 + 12 * 32).unwrap().is_none());
    }

    #[test]
    fn test_round_trip() {
        let mut region = empty_region();
        let records = vec![
            ChunkRecord::new(0, 1570215508, vec![2, 1, 2, 3]),
            ChunkRecord::new(1023, -5, vec![2; 5000]),
            ChunkRecord::new(500, 0, vec![3; 4092]),
        ];

        for record in &records {
            region.append_chunk(record).unwrap();
        }
        region.flush_header().unwrap();

        let mut reloaded = reload(region);

        assert_eq!(reloaded.occupied_slots().collect::<Vec<_>>(), vec![0, 500, 1023]);
        assert_eq!(reloaded.cursor(), 2 + 1 + 2 + 1);

        for record in &records {
            let read = reloaded.read_chunk(record.slot()).unwrap().unwrap();
            assert_eq!(&read, record);
        }

        assert_eq!(reloaded.sector_offset(0), 2);
        assert_eq!(reloaded.sector_offset(1023), 3);
        assert_eq!(reloaded.sector_count(1023), 2);
        assert_eq!(reloaded.sector_offset(500), 5);
        assert_eq!(reloaded.timestamp(1023), -5);
    }

    #[test]
    fn test_append_pads_to_sector_boundary() {
        let mut region = empty_region();

        region.append_chunk(&ChunkRecord::new(3, 0, vec![2; 10])).unwrap();
        assert_eq!(region.source.len().unwrap(), 3 * 4096);

        region.append_chunk(&ChunkRecord::new(4, 0, vec![2; 4093])).unwrap();
        assert_eq!(region.source.len().unwrap(), 5 * 4096);
        assert_eq!(region.cursor(), 5);
    }

    #[test]
    fn test_append_never_reuses_sectors() {
        let mut region = empty_region();

        region.append_chunk(&ChunkRecord::new(7, 1, vec![2; 10])).unwrap();
        region.append_chunk(&ChunkRecord::new(7, 2, vec![2; 20])).unwrap();
        region.flush_header().unwrap();

        let mut reloaded = reload(region);

        assert_eq!(reloaded.sector_offset(7), 3);
        assert_eq!(reloaded.cursor(), 4);
        assert_eq!(reloaded.read_chunk(7).unwrap().unwrap().payload().len(), 20);
        assert_eq!(reloaded.timestamp(7), 2);
    }

    #[test]
    fn test_header_not_visible_before_flush() {
        let mut region = empty_region();

        region.append_chunk(&ChunkRecord::new(7, 1, vec![2; 10])).unwrap();

        let reloaded = reload(region);
        assert_eq!(reloaded.occupied_slots().count(), 0);
    }

    #[test]
    fn test_append_chunk_too_large() {
        let mut region = empty_region();
        let record = ChunkRecord::new(0, 0, vec![0; 256 * 4096]);

        match region.append_chunk(&record) {
            Err(RegionError::ChunkTooLarge { length }) => assert_eq!(length, 256 * 4096 + 4),
            other => panic!("Expected `ChunkTooLarge` but got `{:?}`", other),
        }
    }

    #[test]
    fn test_read_chunk_length_exceeds_maximum() {
        let mut region = empty_region();

        region.append_chunk(&ChunkRecord::new(0, 0, vec![2; 10])).unwrap();
        region.flush_header().unwrap();

        let mut source = region.into_inner();
        source.set_position(2 * 4096);
        source.write_i32::<BigEndian>(5000).unwrap();

        let mut region = Region::load(RegionPosition::new(1, 1), source).unwrap();

        match region.read_chunk(0) {
            Err(RegionError::LengthExceedsMaximum {
                slot: 0,
                length: 5000,
                maximum_length: 4092,
            }) => {}
            other => panic!("Expected `LengthExceedsMaximum` but got `{:?}`", other),
        }
    }

    #[test]
    fn test_read_chunk_zero_sector_count() {
        let mut header = Vec::new();

        for index in 0..REGION_CHUNKS as u32 {
            let offset = if index == 0 { 2 << 8 } else { 0 };
            header.write_u32::<BigEndian>(offset).unwrap();
        }

        for _ in 0..REGION_CHUNKS {
            header.write_i32::<BigEndian>(0).unwrap();
        }

        let mut region = Region::load(RegionPosition::new(0, 0), Cursor::new(header)).unwrap();

        assert!(region.is_occupied(0));
        assert_eq!(region.sector_count(0), 0);

        match region.read_chunk(0) {
            Err(RegionError::LengthExceedsMaximum {
                slot: 0,
                length: 0,
                maximum_length: 0,
            }) => {}
            other => panic!("Expected `LengthExceedsMaximum` but got `{:?}`", other),
        }
    }

    #[test]
    #[should_panic]
    fn test_slot_out_of_bounds() {
        empty_region().is_occupied(REGION_CHUNKS);
    }

    #[test]
    fn test_next_free_sector() {
        assert_eq!(next_free_sector(&[]), 2);
        assert_eq!(
            next_free_sector(&[ChunkMetadata::new(3, 3, 0), ChunkMetadata::new(8, 1, 0)]),
            9
        );
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("r.-1.2.mca");

        let mut region = Region::create(&path).unwrap();
        region.append_chunk(&ChunkRecord::new(33, 42, vec![2, 9, 9])).unwrap();
        region.flush_header().unwrap();
        drop(region);

        assert_eq!(std::fs::metadata(&path).unwrap().len(), 3 * 4096);

        let mut region = Region::open(&path).unwrap();

        assert_eq!(region.position(), RegionPosition::new(-1, 2));
        assert_eq!(region.base().x, -512);
        assert_eq!(
            region.read_chunk(33).unwrap(),
            Some(ChunkRecord::new(33, 42, vec![2, 9, 9]))
        );
    }

    #[test]
    fn test_open_invalid_file_name() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("level.dat");
        std::fs::write(&path, vec![0; 8192]).unwrap();

        match Region::open(&path) {
            Err(RegionError::InvalidFileName { .. }) => {}
            Err(e) => panic!("Expected `InvalidFileName` but got `{:?}`", e),
            Ok(_) => panic!("Expected `InvalidFileName` but region opened"),
        }
    }

    #[test]
    fn test_len() {
        let mut cursor = Cursor::new(vec![1, 2, 3, 4, 5]);
        let len = cursor.len().unwrap();

        assert_eq!(len, 5);
    }
}
