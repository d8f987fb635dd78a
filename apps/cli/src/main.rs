//! CheckIO CLI: staff front-end for the asset directory.
//!
//! Look up employees and their checked-out hardware, check assets in and
//! out by tag, and manage the featured asset categories.

mod commands;
mod render;

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
