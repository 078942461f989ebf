use anyhow::{anyhow, bail, Context, Result};
use anvil_world::{ChunkPosition, RegionChunkPosition};
use chrono::{Local, TimeZone};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Stdout, or a created file.
pub fn open_output(output: Option<&Path>) -> Result<Box<dyn Write>> {
    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("create output {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(io::stdout())),
    }
}

/// Parses "x,z".
pub fn parse_pair(value: &str) -> Result<(i32, i32)> {
    let parts: Vec<_> = value.split(',').map(str::trim).collect();

    if parts.len() != 2 {
        bail!("expected \"x,z\", got {:?}", value);
    }

    let x = parts[0].parse().with_context(|| format!("bad x in {:?}", value))?;
    let z = parts[1].parse().with_context(|| format!("bad z in {:?}", value))?;

    Ok((x, z))
}

/// Chunk inside a region, as "x,z" (taken modulo 32) or as slot index.
pub fn parse_region_chunk(value: &str) -> Result<RegionChunkPosition> {
    if !value.contains(',') {
        let slot: usize = value
            .trim()
            .parse()
            .with_context(|| format!("bad slot index {:?}", value))?;

        if slot >= 1024 {
            return Err(anyhow!("slot index {} out of range 0..1024", slot));
        }

        return Ok(RegionChunkPosition::from_slot_index(slot));
    }

    let (x, z) = parse_pair(value)?;

    Ok(ChunkPosition::new(x, z).region_chunk_position())
}

/// Local time of a region timestamp.
pub fn format_timestamp(timestamp: i32) -> String {
    match Local.timestamp_opt(timestamp as i64, 0).single() {
        Some(time) => time.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => timestamp.to_string(),
    }
}
