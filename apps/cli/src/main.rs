//! screenlens CLI: screenshot OCR, summary and entity enrichment.
//!
//! Runs the HTTP server or analyzes a local image file.

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
