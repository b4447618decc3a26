//! linkaudit CLI — registry link freshness auditor.
//!
//! Probes every tracked URL, compares embedded fiscal-year markers to the
//! current cycle, and suggests replacements for stale or broken links.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
