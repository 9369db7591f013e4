mod config;
mod sink;

use std::{path::PathBuf, sync::Arc};

use {
    clap::{Parser, Subcommand},
    secrecy::ExposeSecret,
    tgbridge_telegram::TelegramAccount,
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use crate::{config::BridgeConfig, sink::JsonLinesSink};

#[derive(Parser)]
#[command(
    name = "tgbridge",
    version,
    about = "tgbridge: Telegram bot bridge that speaks canonical rich messages"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file (defaults to ./tgbridge.toml, then the user config dir).
    #[arg(long, global = true, env = "TGBRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Bot token (overrides the config file).
    #[arg(long, global = true, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll Telegram and print host events as JSON lines (default).
    Run,
    /// Validate the configuration and print it with the token redacted.
    CheckConfig,
}

/// Logs go to stderr; stdout carries the event stream.
fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn require_token(config: &BridgeConfig) -> anyhow::Result<()> {
    if config.telegram.token.expose_secret().is_empty() {
        anyhow::bail!(
            "no telegram bot token: set [telegram].token in {}, pass --token, or export TELEGRAM_BOT_TOKEN",
            config::CONFIG_FILENAME
        );
    }
    Ok(())
}

async fn run(config: BridgeConfig) -> anyhow::Result<()> {
    require_token(&config)?;
    let account = TelegramAccount::new(config.account_id, config.telegram)?;
    let cancel = account.start(Arc::new(JsonLinesSink::stdout())).await?;

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result?;
            info!(account_id = account.account_id(), "interrupt received, shutting down");
        },
        () = cancel.cancelled() => {
            anyhow::bail!("telegram polling stopped: another instance is using this bot token");
        },
    }
    account.stop();
    Ok(())
}

fn check_config(config: &BridgeConfig, source: Option<&PathBuf>) -> anyhow::Result<()> {
    match source {
        Some(path) => println!("config: {}", path.display()),
        None => println!("config: <defaults>"),
    }
    println!("{config:#?}");
    require_token(config)?;
    if config.telegram.request_timeout_secs <= u64::from(config.telegram.poll_timeout_secs) {
        println!(
            "note: request_timeout_secs is raised to {} to outlast the long poll",
            config.telegram.effective_request_timeout_secs()
        );
    }
    println!("ok");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "tgbridge starting");

    let (config, source) = config::resolve(cli.config.as_deref(), cli.token.clone())?;

    match cli.command {
        None | Some(Commands::Run) => run(config).await,
        Some(Commands::CheckConfig) => check_config(&config, source.as_ref()),
    }
}
