use clap::Parser;

use headframe::cli::Cli;
use headframe::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    Cli::parse().execute().await?;
    Ok(())
}
