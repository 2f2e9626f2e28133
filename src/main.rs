//! CLI entry point for the dungeon generator

use clap::Parser;
use dungeonweave::io::cli::{BatchRunner, Cli};

fn main() -> dungeonweave::Result<()> {
    let cli = Cli::parse();
    let default_filter = if cli.quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let mut runner = BatchRunner::new(cli);
    runner.run().map(|_| ())
}
