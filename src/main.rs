use clap::Parser;
use load_profile_processor::cli::{run, Cli};
use load_profile_processor::error::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    run(cli).await
}
