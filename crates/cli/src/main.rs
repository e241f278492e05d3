mod cli;
mod commands;
mod config;
mod logging;

use clap::Parser;
use std::time::Duration;
use tracing::error;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands};
use crate::commands::{encode_command, inspect_command, transport_command};
use crate::config::TransportConfig;

#[tokio::main]
async fn main() {
    let file_layer = match logging::create_log_file() {
        Ok(log_file) => Some(
            fmt::layer()
                .with_writer(log_file)
                .with_target(false)
                .with_thread_ids(false)
                .with_level(true)
                .with_filter(EnvFilter::new("debug")),
        ),
        Err(e) => {
            eprintln!("Failed to create log file: {e}");
            None
        }
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_level(true)
                .with_filter(
                    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
                ),
        )
        .with(file_layer)
        .init();

    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Cli::parse();
    match args.cmd {
        Commands::Transport {
            descriptor,
            target,
            source,
            store,
            resource_types,
            stages,
            stage_timeout,
            timeout,
            scratch_dir,
            output_path,
        } => {
            let config = TransportConfig {
                descriptor,
                target,
                source,
                store,
                resource_types,
                stages,
                stage_timeout: Duration::from_secs(stage_timeout),
                timeout: timeout.map(Duration::from_secs),
                scratch_dir,
                output_path,
            };
            transport_command(config).await?;
        }
        Commands::Encode {
            descriptor,
            resource,
            blob,
            output_path,
        } => {
            encode_command(&descriptor, &resource, blob.as_deref(), &output_path).await?;
        }
        Commands::Inspect { message } => {
            inspect_command(&message).await?;
        }
    }
    Ok(())
}
