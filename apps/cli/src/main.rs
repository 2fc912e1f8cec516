//! docquery CLI — documentation question answering from the terminal.
//!
//! Searches and reads documentation pages on demand and answers questions
//! grounded in what it retrieved.

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
