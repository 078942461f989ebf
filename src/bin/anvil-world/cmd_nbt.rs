use crate::util::{format_timestamp, open_output, parse_pair, parse_region_chunk};
use anyhow::{bail, Context, Result};
use anvil_world::{
    decode_document, BlockPosition, ChunkPosition, ChunkRecord, CompressionScheme, Region,
    RegionPosition, WorldWalker,
};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub fn exec(
    file: Option<PathBuf>,
    dir: Option<PathBuf>,
    chunk: Option<String>,
    block: Option<String>,
    compress: Option<String>,
    output: Option<PathBuf>,
) -> Result<()> {
    let mut out = open_output(output.as_deref())?;

    match (file, dir) {
        (Some(file), None) => match chunk {
            Some(chunk) => {
                let record = read_region_chunk(&file, &chunk)?;
                print_record(&mut out, &file, &record)?;
            }
            None => {
                let hint = parse_compression(compress.as_deref())?;
                let data =
                    fs::read(&file).with_context(|| format!("read {}", file.display()))?;
                let document = decode_document(&data, hint)?;

                writeln!(out, "File: {}", file.display())?;
                writeln!(out, "{:#?}", document)?;
            }
        },
        (None, Some(dir)) => {
            let position = match (chunk, block) {
                (Some(chunk), None) => {
                    let (x, z) = parse_pair(&chunk)?;
                    ChunkPosition::new(x, z)
                }
                (None, Some(block)) => {
                    let (x, z) = parse_pair(&block)?;
                    BlockPosition::new(x, z).chunk_position()
                }
                _ => bail!("--dir needs exactly one of --chunk or --block"),
            };

            let walker = WorldWalker::new(&dir);
            let path = walker.region_path(position.region_position());

            match walker.read_chunk(position)? {
                Some(record) => print_record(&mut out, &path, &record)?,
                None => bail!(
                    "chunk x: {}, z: {} is not stored in {}",
                    position.x,
                    position.z,
                    dir.display()
                ),
            }
        }
        _ => bail!("pass exactly one of --file or --dir"),
    }

    out.flush()?;
    Ok(())
}

fn read_region_chunk(file: &Path, chunk: &str) -> Result<ChunkRecord> {
    let local = parse_region_chunk(chunk)?;
    let mut region =
        Region::open(file).with_context(|| format!("open region {}", file.display()))?;

    match region.read_chunk(local.slot_index())? {
        Some(record) => Ok(record),
        None => bail!(
            "chunk ({}, {}) is not stored in {}",
            local.x,
            local.z,
            file.display()
        ),
    }
}

fn print_record(out: &mut dyn Write, path: &Path, record: &ChunkRecord) -> Result<()> {
    let local = record.local_position();
    let document = record.decode()?;

    writeln!(out, "File: {}", path.display())?;

    // The absolute coordinate is only known when the file is named like a region.
    if let Ok(region) = RegionPosition::from_file_name(path) {
        let position = region.chunk_position(record.slot());
        writeln!(out, "Chunk: ({}, {})", position.x, position.z)?;
    }

    writeln!(out, "Local: ({}, {})", local.x, local.z)?;
    writeln!(out, "Index: {}", record.slot())?;
    writeln!(out, "Modified: {}", format_timestamp(record.timestamp()))?;
    writeln!(out, "{:#?}", document)?;

    Ok(())
}

fn parse_compression(value: Option<&str>) -> Result<Option<CompressionScheme>> {
    let scheme = match value {
        None => None,
        Some("gzip") => Some(CompressionScheme::Gzip),
        Some("zlib") => Some(CompressionScheme::Zlib),
        Some("none") => Some(CompressionScheme::Uncompressed),
        Some(other) => bail!("unknown compression {:?}, use gzip, zlib or none", other),
    };

    Ok(scheme)
}
