mod cli;
mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mediaflow_core::{
    load_config, load_config_from_env, validate_config, ConfigError, FfprobeProber,
};

use cli::{Cli, Command};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = match load_config(&cli.config) {
        Ok(config) => {
            info!("Loaded configuration from {:?}", cli.config);
            config
        }
        Err(ConfigError::FileNotFound(_)) => {
            info!("No configuration at {:?}, using defaults", cli.config);
            load_config_from_env().context("Failed to read environment configuration")?
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to load config from {:?}", cli.config))
        }
    };
    validate_config(&config).context("Configuration validation failed")?;

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping");
            ctrl_c.cancel();
        }
    });

    let prober = FfprobeProber::from_config(&config);

    match cli.command {
        Command::Probe { input, json } => commands::probe(&prober, &input, json, &cancel).await,
        Command::Convert {
            input,
            output,
            video_codec,
            audio_codec,
            overwrite,
            dry_run,
        } => {
            let options = commands::ConvertOptions {
                input,
                output,
                video_codec,
                audio_codec,
                overwrite,
                dry_run,
            };
            commands::convert(&config, &prober, options, &cancel).await
        }
        Command::Run { arguments } => {
            commands::run_raw(&config, &shell_words::join(&arguments), &cancel).await
        }
    }
}
