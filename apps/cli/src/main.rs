//! edugen CLI: grade-appropriate educational content from a topic.
//!
//! Drafts content with a hosted model, enriches it with web search results,
//! simplifies it into a fixed JSON schema and scores its readability.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    // A missing .env file is fine; keys may come from the environment.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
