//! Process sandbox for untrusted submissions.
//!
//! Each invocation gets an exclusive scratch directory, an optional bounded
//! build step, and a run step with stdin piped in and the per-language
//! wall-clock timeout enforced. The child runs as the leader of its own
//! process group so that a timeout can terminate everything it spawned.
//!
//! Build failures, runtime failures, and timeouts are reported in the
//! [`ExecutionResult`], never raised: the grading path folds them into
//! failed test cases.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tempfile::tempdir;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;
use util::languages::{CommandSpec, Language};

pub mod execution_config;
pub use execution_config::ExecutionConfig;

/// One code attempt for one question. Ephemeral; not persisted beyond
/// grading.
#[derive(Debug, Clone)]
pub struct Submission {
    pub language: Language,
    pub source: String,
}

/// Outcome of running a submission against one test-case input.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was killed by a signal (including timeout).
    pub exit_code: Option<i32>,
    pub duration: Duration,
    pub timed_out: bool,
    pub build_failed: bool,
}

impl ExecutionResult {
    /// True when the run step finished normally with a zero exit.
    pub fn ran_cleanly(&self) -> bool {
        !self.build_failed && !self.timed_out && self.exit_code == Some(0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    #[error("submission source is empty")]
    EmptySubmission,
    #[error("sandbox I/O failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },
}

/// Compiles (if the language needs it) and runs `submission`, piping
/// `stdin_data` to the program and capturing its output.
///
/// Every exit path removes the scratch directory, and no child process
/// survives the call: on timeout the whole process group is SIGKILLed
/// before returning. A build-step timeout is reported as a build failure;
/// `timed_out` refers to the run step only.
pub async fn execute(
    submission: &Submission,
    stdin_data: &str,
    config: &ExecutionConfig,
) -> Result<ExecutionResult, SandboxError> {
    if submission.source.trim().is_empty() {
        return Err(SandboxError::EmptySubmission);
    }

    let spec = submission.language.spec();
    let scratch = tempdir()?;
    tokio::fs::write(
        scratch.path().join(spec.source_file),
        submission.source.as_bytes(),
    )
    .await?;

    let started = Instant::now();

    if let Some(build) = &spec.build {
        let outcome = run_command(
            build,
            scratch.path(),
            None,
            config.build_timeout(),
            config.max_output_bytes,
        )
        .await?;
        if outcome.timed_out || outcome.exit_code != Some(0) {
            let stderr = if outcome.timed_out {
                "build step exceeded its time limit".to_string()
            } else {
                outcome.stderr
            };
            debug!(language = %submission.language, "build step failed");
            return Ok(ExecutionResult {
                stdout: String::new(),
                stderr,
                exit_code: outcome.exit_code,
                duration: started.elapsed(),
                timed_out: false,
                build_failed: true,
            });
        }
    }

    let outcome = run_command(
        &spec.run,
        scratch.path(),
        Some(stdin_data),
        spec.run_timeout,
        config.max_output_bytes,
    )
    .await?;

    Ok(ExecutionResult {
        stdout: outcome.stdout,
        stderr: outcome.stderr,
        exit_code: outcome.exit_code,
        duration: started.elapsed(),
        timed_out: outcome.timed_out,
        build_failed: false,
    })
}

struct CommandOutcome {
    stdout: String,
    stderr: String,
    exit_code: Option<i32>,
    timed_out: bool,
}

async fn run_command(
    spec: &CommandSpec,
    dir: &Path,
    stdin_data: Option<&str>,
    limit: Duration,
    max_output_bytes: usize,
) -> Result<CommandOutcome, SandboxError> {
    // Binaries produced by the build step live in the scratch dir; resolve
    // them against it rather than trusting child-side cwd resolution.
    let program = match spec.program.strip_prefix("./") {
        Some(rest) => dir.join(rest),
        None => PathBuf::from(spec.program),
    };

    let mut cmd = Command::new(&program);
    cmd.args(spec.args)
        .current_dir(dir)
        .stdin(if stdin_data.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .process_group(0);

    let mut child = cmd.spawn().map_err(|source| SandboxError::Spawn {
        command: spec.program.to_string(),
        source,
    })?;

    if let Some(data) = stdin_data {
        if let Some(mut stdin) = child.stdin.take() {
            let data = data.to_owned();
            tokio::spawn(async move {
                let _ = stdin.write_all(data.as_bytes()).await;
                let _ = stdin.shutdown().await;
            });
        }
    }

    // Drain the pipes concurrently with wait(); a full pipe would otherwise
    // deadlock the child.
    let stdout_task = tokio::spawn(slurp(child.stdout.take()));
    let stderr_task = tokio::spawn(slurp(child.stderr.take()));

    match timeout(limit, child.wait()).await {
        Ok(Ok(status)) => {
            let stdout = stdout_task.await.unwrap_or_default();
            let stderr = stderr_task.await.unwrap_or_default();
            Ok(CommandOutcome {
                stdout: truncate_output(String::from_utf8_lossy(&stdout).into_owned(), max_output_bytes),
                stderr: truncate_output(String::from_utf8_lossy(&stderr).into_owned(), max_output_bytes),
                exit_code: status.code(),
                timed_out: false,
            })
        }
        Ok(Err(e)) => Err(e.into()),
        Err(_elapsed) => {
            kill_process_group(child.id());
            let _ = child.wait().await;
            Ok(CommandOutcome {
                stdout: String::new(),
                stderr: String::new(),
                exit_code: None,
                timed_out: true,
            })
        }
    }
}

async fn slurp<R: AsyncRead + Unpin>(pipe: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_end(&mut buf).await;
    }
    buf
}

/// SIGKILL the child's whole process group. `process_group(0)` made the
/// child its group leader, so anything it spawned goes with it.
fn kill_process_group(pid: Option<u32>) {
    if let Some(pid) = pid {
        unsafe {
            libc::kill(-(pid as i32), libc::SIGKILL);
        }
    }
}

fn truncate_output(mut s: String, max: usize) -> String {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    s.truncate(end);
    s.push_str("\n[output truncated]");
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_empty_submission() {
        let submission = Submission {
            language: Language::Python,
            source: "   \n\t".into(),
        };
        let err = execute(&submission, "", &ExecutionConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SandboxError::EmptySubmission));
    }

    #[test]
    fn truncate_output_keeps_short_strings() {
        assert_eq!(truncate_output("hello".into(), 16), "hello");
    }

    #[test]
    fn truncate_output_caps_long_strings() {
        let out = truncate_output("abcdef".repeat(100), 60);
        assert!(out.starts_with("abcdef"));
        assert!(out.ends_with("[output truncated]"));
    }

    #[test]
    fn truncate_output_respects_char_boundaries() {
        // 'é' is two bytes; cutting at byte 1 would split it.
        let out = truncate_output("éé".into(), 1);
        assert!(out.ends_with("[output truncated]"));
    }

    #[test]
    fn kill_process_group_ignores_missing_pid() {
        kill_process_group(None);
    }
}
