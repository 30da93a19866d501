use clap::Parser;
use lease_ingest::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Ingest(args) => cli::ingest::run(args).await,
        Command::Remove(args) => cli::remove::run(args).await,
        Command::InitDb => cli::init_db::run().await,
    }
}
