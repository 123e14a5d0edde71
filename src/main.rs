use anyhow::Context;
use tracing_subscriber::EnvFilter;

mod cli;
use cli::{Command, USAGE, parse_cli, run_command};

use graph_cal_bridge::{SyncEngine, storage::config::Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    setup_logging();

    let command = match parse_cli(std::env::args().skip(1)) {
        Ok(Command::Help) => {
            println!("{USAGE}");
            return Ok(());
        }
        Ok(command) => command,
        Err(err) => {
            eprintln!("Error: {}", err);
            eprintln!("{USAGE}");
            std::process::exit(2);
        }
    };

    let config = Config::load_or_create().context("Failed to load configuration")?;
    let engine = SyncEngine::from_config(&config).context("Invalid configuration")?;

    if let Err(e) = run_command(command, &engine).await {
        tracing::error!("Command failed: {:#}", e);
        return Err(e);
    }

    Ok(())
}

fn setup_logging() {
    let log_dir = Config::config_dir();

    std::fs::create_dir_all(&log_dir).ok();

    let file_appender = tracing_appender::rolling::daily(log_dir, "graph-cal-bridge.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(false)
        .init();

    std::mem::forget(_guard);

    tracing::info!("graph-cal-bridge started");
}
