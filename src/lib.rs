// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod error_log;
pub mod errors;
pub mod exec;
pub mod files;
pub mod fs;
pub mod logging;
pub mod retry;
pub mod types;

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::model::ConfigFile;
use crate::config::source::{ConfigSource, FileConfigSource};
use crate::engine::{LANE_PRIORITY, Scheduler, partition, validate_priority_table};
use crate::error_log::ErrorLog;
use crate::exec::{Dispatcher, ProcessWorkerBackend};
use crate::fs::RealFileSystem;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config source (re-read every tick)
/// - error log
/// - dispatcher with the process worker backend
/// - scheduler tick loop
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    validate_priority_table(&LANE_PRIORITY)?;

    let source = Arc::new(FileConfigSource::new(&args.config));
    let cfg = source.load()?;

    if args.dry_run {
        print_dry_run(&cfg)?;
        return Ok(());
    }

    // The error log location is fixed for the lifetime of the process.
    let errors = ErrorLog::json_lines(&cfg.config.error_log);
    info!(
        config = %args.config,
        error_log = ?cfg.config.error_log,
        interval = ?cfg.check_interval(),
        "lanekeeper started"
    );

    let dispatcher = Dispatcher::new(
        Arc::new(RealFileSystem),
        Arc::new(ProcessWorkerBackend::new()),
        source.clone(),
        errors,
    );
    let mut scheduler = Scheduler::new(source, Arc::new(dispatcher))?;

    if args.once {
        let report = scheduler.run_once().await?;
        debug!(?report, "single tick done");
        return Ok(());
    }

    let shutdown = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    scheduler.run(shutdown).await?;
    info!("lanekeeper stopped");
    Ok(())
}

/// Print lanes, their tasks in dispatch order and the worker commands.
fn print_dry_run(cfg: &ConfigFile) -> Result<()> {
    println!("lanekeeper dry-run");
    println!("  config.pause = {}", cfg.config.pause);
    println!("  config.check_interval = {}s", cfg.config.check_interval);
    println!("  retry = {} x {}ms", cfg.retry.max_retries, cfg.retry.delay_ms);
    println!();

    println!("workers:");
    for (kind, worker) in [
        ("transform", &cfg.worker.transform),
        ("merge", &cfg.worker.merge),
        ("upload", &cfg.worker.upload),
    ] {
        if let Some(w) = worker {
            println!("  - {kind}: {}", w.cmd);
            if w.disable_on_failure {
                println!("      disable_on_failure: true");
            }
        }
    }
    println!();

    for (lane, batch) in partition(&cfg.task)? {
        println!("lane {lane} ({} tasks):", batch.len());
        for entry in batch {
            let task = &entry.task;
            let common = task.common();
            println!("  - #{} {}", entry.index, task.category());
            println!("      destination: {}", task.destination().display());
            if !common.source_folders.is_empty() {
                println!("      source_folders: {:?}", common.source_folders);
            }
            println!("      include_ext: {:?}", common.include_ext);
            if !common.includes.is_empty() {
                println!("      includes: {:?}", common.includes);
            }
            if !common.exceptions.is_empty() {
                println!("      exceptions: {:?}", common.exceptions);
            }
            if common.skip {
                println!("      skip: true");
            }
        }
    }

    debug!("dry-run complete (no execution)");
    Ok(())
}
