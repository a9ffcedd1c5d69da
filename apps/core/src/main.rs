// Psychiatrist chatbot - terminal front end.
// Reads messages from stdin and prints the chatbot's replies.

use anyhow::Context;
use chatbot_core::config::LogFormat;
use chatbot_core::{AppConfig, Chatbot};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info};
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const APP_NAME: &str = "chatbot-core";

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(JsonStorageLayer)
            .with(BunyanFormattingLayer::new(APP_NAME.into(), std::io::stderr))
            .init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to read configuration")?;
    init_tracing(config.log_format);

    info!("Starting {} with data from {}", APP_NAME, config.data_dir.display());
    let chatbot = Chatbot::from_config(&config).context("failed to start the chatbot")?;

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        stdout.write_all(b"You: ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let message = line.trim();
        if message.is_empty() {
            continue;
        }
        if matches!(message, "quit" | "exit") {
            break;
        }

        match chatbot.respond(message).await {
            Ok(reply) => {
                stdout
                    .write_all(format!("Psychiatrist: {}\n\n", reply).as_bytes())
                    .await?;
            }
            Err(e) => {
                error!("Failed to answer: {}", e);
                stdout
                    .write_all(b"Psychiatrist: Something went wrong on my side. Please try again.\n\n")
                    .await?;
            }
        }
    }

    info!("Session closed");
    Ok(())
}
