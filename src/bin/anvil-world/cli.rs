use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Inspect, clone and count Anvil region worlds
#[derive(Parser, Debug)]
#[command(name = "anvil-world", version, about = "Anvil region world tools")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Print a decoded chunk document
    ///
    /// With --file and --chunk reads one chunk of a region file, with --file
    /// alone decodes a standalone NBT file, with --dir reads the chunk at an
    /// absolute --chunk or --block coordinate of a region folder.
    Nbt {
        #[arg(short = 'F', long)]
        file: Option<PathBuf>,
        #[arg(short = 'D', long)]
        dir: Option<PathBuf>,
        /// Chunk as "x,z" or slot index (region files only)
        #[arg(short = 'c', long)]
        chunk: Option<String>,
        /// Block as "x,z"
        #[arg(short = 'b', long)]
        block: Option<String>,
        /// Compression of a standalone file: zlib, gzip or none
        #[arg(short = 'd', long)]
        compress: Option<String>,
        #[arg(short = 'O', long)]
        output: Option<PathBuf>,
    },
    /// List occupied chunks of a region file with their modification time
    ListChunks {
        #[arg(short = 'F', long)]
        file: PathBuf,
        #[arg(short = 'O', long)]
        output: Option<PathBuf>,
    },
    /// Copy the filtered chunks of a world into a new folder
    Clone {
        /// JSON request with src, dst and filter
        #[arg(short = 'C', long)]
        config: PathBuf,
    },
    /// Count blocks of the filtered chunks of a world
    Count {
        /// JSON request with src, filter, calc and optional y
        #[arg(short = 'C', long)]
        config: PathBuf,
    },
}
