use anyhow::{Context, Result};
use anvil_world::{count_blocks, WorldConfig, WorldWalker};
use std::path::PathBuf;

pub fn exec(config: PathBuf) -> Result<()> {
    let config = WorldConfig::from_file(&config)
        .with_context(|| format!("load config {}", config.display()))?;

    let mut counter = config.block_counter()?;
    let walker = WorldWalker::new(&config.source);
    let counts = count_blocks(&walker, &config.filter, &mut counter)?;

    print!("{}", counts.report(counter.rules()));

    Ok(())
}
