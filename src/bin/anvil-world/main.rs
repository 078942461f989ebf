use anyhow::Result;
use clap::Parser;
use env_logger::{Builder, Env};
use log::error;

mod cli;
mod cmd_clone;
mod cmd_count;
mod cmd_list_chunks;
mod cmd_nbt;
mod util;

fn init_logger() {
    // RUST_LOG overrides the default level, e.g. RUST_LOG=debug.
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

fn main() {
    init_logger();

    if let Err(e) = run() {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = cli::Cli::parse();
    match cli.cmd {
        cli::Cmd::Nbt {
            file,
            dir,
            chunk,
            block,
            compress,
            output,
        } => cmd_nbt::exec(file, dir, chunk, block, compress, output),

        cli::Cmd::ListChunks { file, output } => cmd_list_chunks::exec(file, output),

        cli::Cmd::Clone { config } => cmd_clone::exec(config),

        cli::Cmd::Count { config } => cmd_count::exec(config),
    }
}
