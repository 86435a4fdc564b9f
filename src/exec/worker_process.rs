// src/exec/worker_process.rs

//! Single worker process run.

use std::process::Stdio;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::errors::{LanekeeperError, Result};
use crate::exec::backend::WorkerOutcome;
use crate::exec::job::JobDescriptor;

pub const JOB_KIND_ENV: &str = "LANEKEEPER_JOB_KIND";
pub const TASK_INDEX_ENV: &str = "LANEKEEPER_TASK_INDEX";

/// Start `cmd` through the shell, write the descriptor to its stdin, stream
/// its output into the log and wait for it to exit.
///
/// The child is killed if this future is dropped before it finishes.
pub async fn run_worker_process(cmd: &str, job: JobDescriptor) -> Result<WorkerOutcome> {
    let kind = job.kind;
    let category = kind.category();
    let task_index = job.task_index;
    let payload = job.to_json()?;

    info!(kind = %kind, task_index, cmd = %cmd, files = job.files.len(), "starting worker process");

    // Build a shell command appropriate for the platform.
    let mut command = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd);
        c
    };

    command
        .env(JOB_KIND_ENV, kind.as_str())
        .env(TASK_INDEX_ENV, task_index.to_string())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = command.spawn().map_err(|err| LanekeeperError::WorkerSpawn {
        category,
        message: format!("{cmd}: {err}"),
    })?;

    if let Some(stdout) = child.stdout.take() {
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                info!(kind = %kind, task_index, "worker: {}", line);
            }
        });
    }

    // Always consume stderr so buffers don't fill; log at debug.
    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(kind = %kind, task_index, "worker stderr: {}", line);
            }
        });
    }

    if let Some(mut stdin) = child.stdin.take() {
        let write = async {
            stdin.write_all(payload.as_bytes()).await?;
            stdin.write_all(b"\n").await?;
            stdin.shutdown().await
        };
        // A worker that exits without reading its input is judged by its exit
        // code, not by the broken pipe.
        if let Err(err) = write.await {
            warn!(kind = %kind, task_index, error = %err, "could not deliver job descriptor");
        }
    }

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for {kind} worker of task #{task_index}"))?;

    let code = status.code().unwrap_or(-1);
    info!(
        kind = %kind,
        task_index,
        exit_code = code,
        success = status.success(),
        "worker process exited"
    );

    Ok(if status.success() {
        WorkerOutcome::Success
    } else {
        WorkerOutcome::Failed(code)
    })
}
