use std::process::ExitCode;

use clap::Parser;
use cloud_edge::cli::{Cli, Command};
use tracing_subscriber::EnvFilter;

/// Initialize tracing on stderr; `RUST_LOG` wins over `--log-level`.
fn init_logger(level: &str) {
    let level = match level.to_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "info" => "info",
        "warn" | "warning" => "warn",
        "error" => "error",
        _ => "info",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(&cli.log_level);

    let result = match cli.command {
        Command::Apply(args) => cloud_edge::apply::run(args).await,
        Command::Top(args) => cloud_edge::top::run(args).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
