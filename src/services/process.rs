use std::{
    ffi::OsString,
    path::Path,
    process::{ExitStatus, Stdio},
    time::Duration,
};

use thiserror::Error;
use tokio::{
    io::{AsyncRead, AsyncReadExt},
    process::{Child, ChildStderr, ChildStdout, Command},
};
use tracing::warn;

use crate::application::error::ApplicationError;

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} timed out after {timeout:?}")]
    Timeout { program: String, timeout: Duration },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("{program} exceeded the {limit} byte output limit")]
    OutputTooLarge { program: String, limit: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ProcessError> for ApplicationError {
    fn from(error: ProcessError) -> Self {
        ApplicationError::ProcessingError(error.to_string())
    }
}

/// Runs `program` to completion within `timeout`. The child is killed if the
/// deadline passes or as soon as its stdout plus stderr exceed `max_output` bytes.
pub async fn run_bounded(
    program: &Path,
    args: &[OsString],
    timeout: Duration,
    max_output: u64,
) -> Result<(), ProcessError> {
    let name = program.display().to_string();

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| ProcessError::Spawn {
            program: name.clone(),
            source,
        })?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| std::io::Error::other("stdout was not captured"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| std::io::Error::other("stderr was not captured"))?;

    let outcome = tokio::time::timeout(
        timeout,
        collect_bounded(&mut child, stdout, stderr, max_output),
    )
    .await;

    let (status, stderr) = match outcome {
        Ok(Ok(Some(finished))) => finished,
        Ok(Ok(None)) => {
            stop(&mut child, &name).await;
            return Err(ProcessError::OutputTooLarge {
                program: name,
                limit: max_output,
            });
        }
        Ok(Err(e)) => {
            stop(&mut child, &name).await;
            return Err(e.into());
        }
        Err(_) => {
            stop(&mut child, &name).await;
            return Err(ProcessError::Timeout {
                program: name,
                timeout,
            });
        }
    };

    if !status.success() {
        let stderr = String::from_utf8_lossy(&stderr);
        return Err(ProcessError::Failed {
            program: name,
            status: status.to_string(),
            stderr: stderr.trim().chars().take(512).collect(),
        });
    }

    Ok(())
}

/// Drains the streams, then waits for exit. `None` when the output limit was hit.
async fn collect_bounded(
    child: &mut Child,
    stdout: ChildStdout,
    stderr: ChildStderr,
    max_output: u64,
) -> std::io::Result<Option<(ExitStatus, Vec<u8>)>> {
    let Some(stderr) = drain_bounded(stdout, stderr, max_output).await? else {
        return Ok(None);
    };
    let status = child.wait().await?;
    Ok(Some((status, stderr)))
}

async fn stop(child: &mut Child, name: &str) {
    if let Err(e) = child.kill().await {
        warn!("Failed to kill {}: {}", name, e);
    }
}

/// Reads both streams until they close. Returns the captured stderr, or `None`
/// once more than `limit` bytes have arrived in total.
async fn drain_bounded<O, E>(
    mut stdout: O,
    mut stderr: E,
    limit: u64,
) -> std::io::Result<Option<Vec<u8>>>
where
    O: AsyncRead + Unpin,
    E: AsyncRead + Unpin,
{
    let mut out_buf = [0u8; 8192];
    let mut err_buf = [0u8; 8192];
    let mut captured = Vec::new();
    let mut total: u64 = 0;
    let (mut out_open, mut err_open) = (true, true);

    while out_open || err_open {
        tokio::select! {
            read = stdout.read(&mut out_buf), if out_open => {
                let n = read?;
                out_open = n > 0;
                total += n as u64;
            }
            read = stderr.read(&mut err_buf), if err_open => {
                let n = read?;
                err_open = n > 0;
                total += n as u64;
                captured.extend_from_slice(&err_buf[..n]);
            }
        }

        if total > limit {
            return Ok(None);
        }
    }

    Ok(Some(captured))
}
