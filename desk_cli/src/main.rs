//! Desk CLI: logging setup, config loading, command dispatch.

mod cli;
mod error_fmt;
mod run;

use std::path::Path;

use clap::Parser;
use desk_config::Config;
use desk_core::Height;
use eyre::WrapErr;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};

fn main() {
    let _ = color_eyre::install();
    let args = Cli::parse();
    let _ = JSON_MODE.set(args.json);
    let json = args.json;

    if let Err(err) = run_cli(args) {
        if json {
            let payload = serde_json::json!({
                "ok": false,
                "error": err.to_string(),
                "detail": error_fmt::humanize(&err),
            });
            eprintln!("{payload}");
        } else {
            eprintln!("{}", error_fmt::humanize(&err));
        }
        std::process::exit(error_fmt::exit_code_for_error(&err));
    }
}

fn run_cli(args: Cli) -> eyre::Result<()> {
    let cfg = load_config(&args.config)?;
    init_logging(&cfg.logging, &args.log_level, args.json)?;
    cfg.validate().wrap_err("invalid configuration")?;

    match args.cmd {
        Commands::Move { to, stand, sit } => {
            let target_in = if stand {
                cfg.desk.standing_height_in
            } else if sit {
                cfg.desk.sitting_height_in
            } else if let Some(inches) = to {
                inches
            } else {
                eyre::bail!("pass --to <inches>, --stand, or --sit");
            };
            run::run_move(&cfg, Height::from_inches(target_in), args.json)
        }
        Commands::Watch => run::run_watch(&cfg),
        Commands::SelfCheck => run::run_self_check(&cfg, args.json),
    }
}

/// Absent config files fall back to defaults so `self-check` works out of
/// the box.
fn load_config(path: &Path) -> eyre::Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("reading config {}", path.display()))?;
    desk_config::load_toml(&text).wrap_err_with(|| format!("parsing config {}", path.display()))
}

fn init_logging(logging: &desk_config::Logging, cli_level: &str, json: bool) -> eyre::Result<()> {
    // Precedence: RUST_LOG, then an explicit --log-level, then the config.
    let level = if cli_level != "info" {
        cli_level.to_string()
    } else {
        logging.level.clone().unwrap_or_else(|| "info".to_string())
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if let Some(file) = &logging.file {
        let path = Path::new(file);
        let directory = path.parent().filter(|p| !p.as_os_str().is_empty());
        let prefix = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_else(|| "desk.log".to_string());
        let directory = directory.unwrap_or_else(|| Path::new("."));

        let appender = match logging.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::daily(directory, prefix),
            Some("hourly") => tracing_appender::rolling::hourly(directory, prefix),
            _ => tracing_appender::rolling::never(directory, prefix),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_ansi(false)
            .init();
    } else if json {
        // Keep stdout clean for the structured results.
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}
