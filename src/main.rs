//! Umoyo — healthcare consultation backend entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Load config
//!   3. Resolve effective log level (CLI `-v` flags > env > config)
//!   4. Init logger once
//!   5. Open the SQLite store (creating the work dir)
//!   6. Build the response engine (remote provider only with an API key)
//!   7. Spawn Ctrl-C → shutdown signal watcher
//!   8. Serve the HTTP API until shutdown

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use umoyo_bot::advisor::ResponseEngine;
use umoyo_bot::server::{self, ApiState};
use umoyo_bot::storage::Store;
use umoyo_bot::{bootstrap, config, error};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), error::AppError> {
    // Load .env if present — ignore errors (file is optional).
    let _ = dotenvy::dotenv();

    let args = parse_cli_args();

    let config = config::load(args.config_path.as_deref())?;

    let effective_log_level = args.log_level.unwrap_or(config.log_level.as_str());
    let force_cli_level = args.log_level.is_some();

    bootstrap::logger::init(effective_log_level, force_cli_level)?;

    info!(
        service = %config.service_name,
        work_dir = %config.work_dir.display(),
        configured_log_level = %config.log_level,
        effective_log_level = %effective_log_level,
        "config loaded"
    );

    std::fs::create_dir_all(&config.work_dir)?;

    let db_file = config.db_file();
    let store = Store::open(&db_file)
        .map_err(|e| error::AppError::Storage(e.to_string()))?;
    info!(db = %db_file.display(), "storage ready");

    let engine = ResponseEngine::new(&config.llm, config.llm_api_key.clone())
        .map_err(|e| error::AppError::Config(e.to_string()))?;
    if engine.remote_enabled() {
        info!(
            api_url = %config.llm.api_url,
            timeout_seconds = config.llm.timeout_seconds,
            "remote response provider enabled"
        );
    } else {
        info!("no LLM_API_KEY set — rule-based replies only");
    }

    // Shared shutdown token — Ctrl-C cancels it, the server drains and exits.
    let shutdown = CancellationToken::new();
    let ctrlc_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received — initiating shutdown");
            ctrlc_token.cancel();
        }
    });

    let state = ApiState::new(
        Arc::new(store),
        Arc::new(engine),
        &config.advisor.default_location,
    );
    let router = server::build_router(state, config.http.cors_any_origin);

    server::run(&config.http.bind, router, shutdown).await
}

struct CliArgs {
    log_level: Option<&'static str>,
    config_path: Option<String>,
}

fn parse_cli_args() -> CliArgs {
    let mut verbosity = 0u8;
    let mut config_path = None;

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        if arg == "--" {
            break;
        }

        match arg.as_str() {
            "-h" | "--help" => {
                println!("Usage: umoyo-bot [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -h, --help                 Print help");
                println!("  -f, --config <PATH>        Path to configuration file (default: config/default.toml)");
                println!("  -v, -vv, -vvv, -vvvv       Increase logging verbosity");
                std::process::exit(0);
            }
            "-f" | "--config" => {
                if let Some(path) = iter.next() {
                    config_path = Some(path);
                } else {
                    eprintln!("error: -f/--config requires a path argument");
                    std::process::exit(1);
                }
            }
            "--verbose" => verbosity = verbosity.saturating_add(1),
            a if a.starts_with('-') && a.len() > 1 && a.chars().skip(1).all(|c| c == 'v') => {
                verbosity = verbosity.saturating_add((a.len() - 1) as u8);
            }
            _ => {}
        }
    }

    // Each -v raises verbosity one tier from the config default:
    //   -v      → warn   (suppress info noise, show warnings+errors only)
    //   -vv     → info   (normal operational output — the typical default)
    //   -vvv    → debug  (flow-level diagnostics: rule topics, request sizes)
    //   -vvvv+  → trace  (full payload dumps, very verbose)
    let log_level = match verbosity {
        0 => None,
        1 => Some("warn"),
        2 => Some("info"),
        3 => Some("debug"),
        _ => Some("trace"),
    };

    CliArgs {
        log_level,
        config_path,
    }
}
