use anyhow::Result;
use bluebikes_processor::cli::{run, Cli};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    run(cli).await?;
    Ok(())
}
