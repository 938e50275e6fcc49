use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tcf_tracker::config::AppConfig;
use tcf_tracker::Backend;

const USAGE: &str = "usage: tcf-tracker [export <file> | import <file>]";

enum Command {
    Status,
    Export(PathBuf),
    Import(PathBuf),
}

fn parse_args(args: &[String]) -> Result<Command> {
    match args {
        [] => Ok(Command::Status),
        [cmd, path] if cmd == "export" => Ok(Command::Export(PathBuf::from(path))),
        [cmd, path] if cmd == "import" => Ok(Command::Import(PathBuf::from(path))),
        _ => bail!(USAGE),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = parse_args(&args)?;

    let config = AppConfig::load()?;
    info!("Using data directory {}", config.data_directory.display());

    let backend = Backend::open(&config).await?;
    backend.initialize().await;

    match command {
        Command::Status => {}
        Command::Export(path) => {
            let document = backend.backup_service.export_data().await?;
            std::fs::write(&path, document)
                .with_context(|| format!("Failed to write backup to {:?}", path))?;
            info!("Backup written to {}", path.display());
        }
        Command::Import(path) => {
            let document = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read backup from {:?}", path))?;
            if !backend.backup_service.import_data(&document).await {
                warn!("Backup {} was not restored", path.display());
                bail!("Invalid backup file: {}", path.display());
            }
            info!("Backup restored from {}", path.display());
            backend.initialize().await;
        }
    }

    Ok(())
}
