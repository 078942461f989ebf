use crate::util::{format_timestamp, open_output};
use anyhow::{Context, Result};
use anvil_world::{Region, RegionChunkPosition};
use std::io::Write;
use std::path::PathBuf;

pub fn exec(file: PathBuf, output: Option<PathBuf>) -> Result<()> {
    let region =
        Region::open(&file).with_context(|| format!("open region {}", file.display()))?;
    let mut out = open_output(output.as_deref())?;

    for slot in region.occupied_slots() {
        let local = RegionChunkPosition::from_slot_index(slot);

        writeln!(
            out,
            "{:4} ({:2},{:2}) => {}",
            slot,
            local.x,
            local.z,
            format_timestamp(region.timestamp(slot))
        )?;
    }

    out.flush()?;
    Ok(())
}
