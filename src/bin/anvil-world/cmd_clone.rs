use anyhow::{Context, Result};
use anvil_world::{clone_world, WorldCloner, WorldConfig, WorldWalker};
use std::path::PathBuf;

pub fn exec(config: PathBuf) -> Result<()> {
    let config = WorldConfig::from_file(&config)
        .with_context(|| format!("load config {}", config.display()))?;

    let mut cloner = WorldCloner::new(config.clone_destination()?)?;
    let walker = WorldWalker::new(&config.source);
    let summary = clone_world(&walker, &config.filter, &mut cloner)?;

    println!(
        "cloned {} chunks in {} regions into {}",
        summary.chunks,
        summary.regions,
        cloner.destination().display()
    );

    Ok(())
}
