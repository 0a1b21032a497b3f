mod cli;
mod error_fmt;
mod project;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::WrapErr;
use exloop_core::isf::{resolve_isf, save_isf};
use exloop_core::prefs::FilePreferenceStore;
use serde_json::json;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::{Cli, Commands, FILE_GUARD, IsfAction, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};
use crate::project::{ReplayPlan, load_history, run_project};

fn main() {
    let _ = color_eyre::install();
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(err) = run(cli) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&err));
        } else {
            eprintln!("{}", humanize(&err));
        }
        std::process::exit(exit_code_for_error(&err));
    }
}

fn run(cli: Cli) -> eyre::Result<()> {
    let cfg = load_config(&cli.config)?;
    init_logging(&cfg.logging, cli.log_level.as_deref(), cli.json);
    tracing::debug!(config = %cli.config.display(), "config loaded");

    match cli.cmd {
        Commands::Project {
            glucose,
            insulin_history,
            kcal,
            pause_after,
            end_after,
        } => {
            let history = load_history(insulin_history.as_deref())?;
            let shutdown = Arc::new(AtomicBool::new(false));
            {
                let flag = shutdown.clone();
                if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed)) {
                    tracing::warn!(error = %e, "Ctrl-C handler not installed");
                }
            }
            let plan = ReplayPlan {
                glucose,
                history: &history,
                kcal: &kcal,
                pause_after,
                end_after,
            };
            run_project(&cfg, &plan, cli.json, shutdown)?;
        }
        Commands::Isf { action } => {
            let prefs = FilePreferenceStore::open(&cfg.preferences.file)?;
            match action {
                IsfAction::Show => {
                    let isf = resolve_isf(&prefs, cfg.dosing.default_isf);
                    if cli.json {
                        println!(
                            "{}",
                            json!({ "isf": isf.value, "source": format!("{:?}", isf.source) })
                        );
                    } else {
                        println!("ISF: {} mg/dL per U ({:?})", isf.value, isf.source);
                    }
                }
                IsfAction::Set { value } => {
                    save_isf(&prefs, value)?;
                    if cli.json {
                        println!("{}", json!({ "isf": value, "saved": true }));
                    } else {
                        println!("ISF set to {value} mg/dL per U");
                    }
                }
            }
        }
        Commands::SelfCheck => {
            let prefs = FilePreferenceStore::open(&cfg.preferences.file)?;
            let isf = resolve_isf(&prefs, cfg.dosing.default_isf);
            if cli.json {
                println!(
                    "{}",
                    json!({ "ok": true, "isf": isf.value, "preferences": prefs.path().display().to_string() })
                );
            } else {
                println!("OK (ISF {} from {:?})", isf.value, isf.source);
            }
        }
    }
    Ok(())
}

fn load_config(path: &Path) -> eyre::Result<exloop_config::Config> {
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("read config {}", path.display()))?;
    let cfg = exloop_config::load_toml(&text).map_err(eyre::Report::new)?;
    cfg.validate()?;
    Ok(cfg)
}

/// Console layer on stderr plus an optional JSON-lines file layer.
///
/// `RUST_LOG` wins over `--log-level`, which wins over `logging.level`.
fn init_logging(cfg: &exloop_config::Logging, cli_level: Option<&str>, json: bool) {
    let level = cli_level
        .or(cfg.level.as_deref())
        .unwrap_or("info")
        .to_string();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let mut f = EnvFilter::new("warn");
        for krate in ["exloop_core", "exloop_cli"] {
            if let Ok(d) = format!("{krate}={level}").parse() {
                f = f.add_directive(d);
            }
        }
        f
    });

    let console = if json {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed()
    };

    let file_layer = cfg.file.as_deref().map(|file| {
        let path = Path::new(file);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let name = path
            .file_name()
            .map_or_else(|| "exloop.log".into(), |n| n.to_string_lossy().into_owned());
        let appender = match cfg.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::daily(dir, name),
            Some("hourly") => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        fmt::layer()
            .json()
            .with_ansi(false)
            .with_writer(writer)
            .boxed()
    });

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .try_init();
}
