//! # Shell Execution
//!
//! Runs a command through `sh -c` with a wall-clock limit, streaming output
//! lines to an observer as they arrive.

use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::debug;

/// Wall-clock limit for `/run`
pub const RUN_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of running a shell command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellOutcome {
    /// Exit status zero
    Completed { output: String },
    /// Non-zero exit or killed by a signal (`code` is `None` then)
    Failed { output: String, code: Option<i32> },
    /// The shell could not be started
    SpawnFailed(String),
    /// Killed after exceeding the limit; output is discarded
    TimedOut(Duration),
}

impl ShellOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ShellOutcome::Completed { .. })
    }

    /// Text recorded for this outcome
    pub fn describe(&self) -> String {
        match self {
            ShellOutcome::Completed { output } => output.clone(),
            ShellOutcome::Failed { output, code } => {
                let status = exit_status(*code);
                if output.is_empty() {
                    status
                } else {
                    format!("{}\n{}", output, status)
                }
            }
            ShellOutcome::SpawnFailed(reason) => format!("failed to start: {}", reason),
            ShellOutcome::TimedOut(limit) => {
                if limit.subsec_millis() == 0 {
                    format!("command timed out after {}s", limit.as_secs())
                } else {
                    format!("command timed out after {:.1}s", limit.as_secs_f64())
                }
            }
        }
    }
}

/// `exit status N`, or the signal case when there is no code
pub fn exit_status(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit status {}", code),
        None => "terminated by signal".to_string(),
    }
}

/// Run `command` under `sh -c`, killing it once `limit` elapses.
///
/// Stdout and stderr lines are forwarded to `observer` in arrival order.
pub async fn run_shell(
    command: &str,
    limit: Duration,
    mut observer: Option<&mut (dyn FnMut(&str) + Send)>,
) -> ShellOutcome {
    debug!("Executing command: {}", command);

    let mut child = match Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
    {
        Ok(child) => child,
        Err(e) => return ShellOutcome::SpawnFailed(e.to_string()),
    };

    let (tx, mut rx) = mpsc::unbounded_channel();
    if let Some(stdout) = child.stdout.take() {
        tokio::spawn(forward_lines(stdout, tx.clone()));
    }
    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(forward_lines(stderr, tx.clone()));
    }
    drop(tx);

    let streamed = async {
        let mut lines = Vec::new();
        while let Some(line) = rx.recv().await {
            if let Some(observe) = observer.as_deref_mut() {
                observe(&line);
            }
            lines.push(line);
        }
        let status = child.wait().await;
        (lines, status)
    };
    let result = tokio::time::timeout(limit, streamed).await;

    match result {
        Ok((lines, Ok(status))) => {
            let output = lines.join("\n");
            if status.success() {
                ShellOutcome::Completed { output }
            } else {
                ShellOutcome::Failed {
                    output,
                    code: status.code(),
                }
            }
        }
        Ok((_, Err(e))) => ShellOutcome::SpawnFailed(e.to_string()),
        Err(_) => {
            if let Err(e) = child.kill().await {
                debug!("Failed to kill timed out command: {}", e);
            }
            ShellOutcome::TimedOut(limit)
        }
    }
}

async fn forward_lines<R>(reader: R, tx: mpsc::UnboundedSender<String>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if tx.send(line).is_err() {
            break;
        }
    }
}
