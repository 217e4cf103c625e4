use anyhow::Result;
use clap::Parser;
use shopfloor_cli::commands;
use shopfloor_cli::config::{Cli, Command};
use shopfloor_store::{create_store, StoreConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let store_config = StoreConfig::from_env();
    let store = create_store(&store_config)?;
    info!(
        "store: {}",
        if store_config.is_s3() { "s3" } else { "local" }
    );

    match cli.command {
        Command::Open(args) => {
            if !commands::open(&args, store).await {
                std::process::exit(1);
            }
        }
        Command::Resolve {
            reference,
            filename,
        } => {
            let url = commands::resolve(store, &reference, filename.as_deref()).await?;
            println!("{url}");
        }
        Command::Upload {
            kind,
            parent_id,
            file,
        } => {
            let attachment = commands::upload(store.as_ref(), kind, &parent_id, &file).await?;
            println!("{}", serde_json::to_string_pretty(&attachment)?);
        }
    }
    Ok(())
}
