// src/lib.rs

pub mod classify;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod watch;

use tracing::{debug, info};

use crate::classify::Bogofilter;
use crate::cli::CliArgs;
use crate::config::loader::load_raw_or_default;
use crate::config::model::ConfigFile;
use crate::engine::{Dispatcher, PathRules};
use crate::errors::Result;
use crate::watch::WatchManager;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (file, defaults, `--root` override)
/// - the inotify watch manager
/// - path rules and the bogofilter classifier
/// - SIGINT / SIGTERM handling
pub async fn run(args: CliArgs) -> Result<()> {
    let mut raw = load_raw_or_default(args.config.as_deref())?;
    if let Some(root) = args.root {
        raw.override_root(root);
    }
    let cfg = ConfigFile::try_from(raw)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let rules = PathRules::from_config(&cfg)?;
    let classifier = Bogofilter::new(&cfg.classifier.program, cfg.classifier.args.clone());
    let manager = WatchManager::open(&cfg.watch_settings())?;

    info!(
        root = %cfg.watch.root.display(),
        program = %cfg.classifier.program,
        "maildirlearn starting"
    );

    let dispatcher = Dispatcher::new(manager, rules, classifier);
    dispatcher.run_until(shutdown_signal()).await
}

/// Resolves on the first SIGINT or SIGTERM.
///
/// If a handler cannot be installed the error is logged and that signal is
/// simply not observed.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => info!("SIGINT received"),
        _ = terminate => info!("SIGTERM received"),
    }
}

/// Print the effective configuration without touching the filesystem.
fn print_dry_run(cfg: &ConfigFile) {
    println!("maildirlearn dry-run");
    println!("  watch.root = {}", cfg.watch.root.display());
    println!("  watch.registry_capacity = {}", cfg.watch.registry_capacity);
    println!("  watch.max_path_len = {}", cfg.watch.max_path_len);
    println!("  watch.read_buffer_size = {}", cfg.watch.read_buffer_size);
    println!();
    println!("rules:");
    println!("  exclude: {}", cfg.rules.exclude);
    println!("  spam:    {}", cfg.rules.spam);
    println!();
    println!("classifier:");
    println!("  program: {}", cfg.classifier.program);
    if !cfg.classifier.args.is_empty() {
        println!("  args: {:?}", cfg.classifier.args);
    }

    debug!("dry-run complete (nothing watched)");
}
