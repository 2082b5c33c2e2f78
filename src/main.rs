use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use taxi_intake::bot::IntakeBot;
use taxi_intake::channels::{Channel, CliChannel, TelegramChannel};
use taxi_intake::config::{BotConfig, ChannelKind};
use taxi_intake::error::ConfigError;
use taxi_intake::records::{JsonFileStore, RecordStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = BotConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!("  export TAXI_BOT_TOKEN=123456:ABC... TAXI_OPERATOR_ID=<telegram user id>");
        eprintln!("  or TAXI_CHANNEL=cli for a local session");
        std::process::exit(1);
    });

    // Initialize tracing; the guard flushes the file sink on exit
    let (file_layer, _log_guard) = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "taxi-intake.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(file_layer)
        .init();

    eprintln!("🚖 Taxi intake v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Data: {}", config.data_dir.display());
    eprintln!("   Operator: {}", config.operator_id);

    let channel: Arc<dyn Channel> = match config.channel {
        ChannelKind::Telegram => {
            let token = config
                .bot_token
                .clone()
                .ok_or_else(|| ConfigError::MissingEnvVar("TAXI_BOT_TOKEN".into()))?;
            eprintln!("   Channel: telegram (poll {}s)", config.poll_timeout.as_secs());
            Arc::new(TelegramChannel::new(
                token,
                config.poll_timeout,
                config.request_timeout,
            )?)
        }
        ChannelKind::Cli => {
            eprintln!("   Channel: cli");
            Arc::new(CliChannel::new(taxi_intake::config::CLI_LOCAL_USER))
        }
    };

    let store: Arc<dyn RecordStore> = Arc::new(JsonFileStore::new(&config.data_dir));

    let bot = Arc::new(IntakeBot::new(
        channel,
        store,
        config.operator_id,
        config.recent_requests,
    ));

    tokio::select! {
        result = bot.run() => result.context("intake bot stopped")?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted, shutting down");
        }
    }

    Ok(())
}
