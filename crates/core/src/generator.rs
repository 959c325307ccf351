//! External generator invocation.
//!
//! The generator is an opaque executable: it is handed a job's input
//! and output directories as its final two arguments, reads images from
//! the former, writes the artifact into the latter, and signals success
//! with exit code 0. Everything about locating its runtime (home
//! directory, activation of its own environment) is configuration
//! established once at startup, not per-job logic.

use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::error::JobError;

/// Maximum stdout or stderr size captured per stream (10 MiB).
///
/// Output beyond this is truncated to keep a chatty generator from
/// exhausting memory.
const MAX_OUTPUT_BYTES: usize = 10 * 1024 * 1024;

/// Process-wide invocation configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Program to execute (name resolved via `PATH`, or absolute path).
    pub program: String,
    /// Fixed leading arguments placed before the two directory paths.
    pub base_args: Vec<String>,
    /// Environment variables injected into the child process.
    pub env: Vec<(String, String)>,
    /// Wall-clock limit for one invocation.
    pub timeout: Duration,
}

/// Captured result of a successful (exit 0) invocation.
#[derive(Debug)]
pub struct GeneratorOutput {
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
}

/// Run the external generator against one job's directories and wait
/// for it to exit.
///
/// - Non-zero exit maps to [`JobError::GenerationFailed`] carrying the
///   captured stderr.
/// - Timeout expiry or `cancel` firing kills the child (via
///   `kill_on_drop`) and maps to [`JobError::GenerationTimedOut`].
pub async fn invoke(
    config: &GeneratorConfig,
    input_dir: &Path,
    output_dir: &Path,
    cancel: &CancellationToken,
) -> Result<GeneratorOutput, JobError> {
    let mut cmd = Command::new(&config.program);
    cmd.args(&config.base_args)
        .arg(input_dir)
        .arg(output_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        // Dropping the child (timeout, cancellation) kills the process.
        .kill_on_drop(true);

    for (key, value) in &config.env {
        cmd.env(key, value);
    }

    let start = Instant::now();
    let mut child = cmd.spawn()?;

    // Read stdout/stderr in spawned tasks so `child.wait()` (which
    // borrows `&mut child`) can run concurrently with the capture.
    let stdout_handle = child.stdout.take();
    let stderr_handle = child.stderr.take();
    let stdout_task = tokio::spawn(async move { read_stream(stdout_handle).await });
    let stderr_task = tokio::spawn(async move { read_stream(stderr_handle).await });

    let status = tokio::select! {
        wait = tokio::time::timeout(config.timeout, child.wait()) => {
            match wait {
                Ok(Ok(status)) => status,
                Ok(Err(e)) => return Err(JobError::Io(e)),
                Err(_elapsed) => {
                    // `child` is dropped here, killing the process.
                    return Err(JobError::GenerationTimedOut {
                        elapsed_ms: start.elapsed().as_millis() as u64,
                    });
                }
            }
        }
        () = cancel.cancelled() => {
            return Err(JobError::GenerationTimedOut {
                elapsed_ms: start.elapsed().as_millis() as u64,
            });
        }
    };

    let duration_ms = start.elapsed().as_millis() as u64;
    let stdout = String::from_utf8_lossy(&stdout_task.await.unwrap_or_default()).into_owned();
    let stderr = String::from_utf8_lossy(&stderr_task.await.unwrap_or_default()).into_owned();
    let exit_code = status.code().unwrap_or(-1);

    if !status.success() {
        return Err(JobError::GenerationFailed { exit_code, stderr });
    }

    Ok(GeneratorOutput {
        stdout,
        stderr,
        duration_ms,
    })
}

/// Read an entire output stream into a buffer, capped at [`MAX_OUTPUT_BYTES`].
async fn read_stream<R: AsyncRead + Unpin>(handle: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut h) = handle {
        let _ = (&mut h)
            .take(MAX_OUTPUT_BYTES as u64)
            .read_to_end(&mut buf)
            .await;
    }
    buf
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::error::JobError;

    fn sh(script: &str, timeout: Duration) -> GeneratorConfig {
        GeneratorConfig {
            program: "sh".to_string(),
            base_args: vec!["-c".to_string(), script.to_string(), "sh".to_string()],
            env: vec![("GEN_TEST_VAR".to_string(), "set".to_string())],
            timeout,
        }
    }

    #[tokio::test]
    async fn zero_exit_yields_captured_streams() {
        let tmp = tempfile::tempdir().unwrap();
        // With `sh -c script name $1 $2`, $1 is the input dir and $2 the output dir.
        let config = sh("echo \"in=$1\"; echo oops >&2", Duration::from_secs(5));
        let cancel = CancellationToken::new();

        let out = invoke(&config, tmp.path(), tmp.path(), &cancel)
            .await
            .unwrap();
        assert!(out.stdout.contains("in="));
        assert!(out.stderr.contains("oops"));
    }

    #[tokio::test]
    async fn nonzero_exit_carries_stderr() {
        let tmp = tempfile::tempdir().unwrap();
        let config = sh("echo 'model blew up' >&2; exit 2", Duration::from_secs(5));
        let cancel = CancellationToken::new();

        let err = invoke(&config, tmp.path(), tmp.path(), &cancel)
            .await
            .unwrap_err();
        assert_matches!(err, JobError::GenerationFailed { exit_code: 2, ref stderr }
            if stderr.contains("model blew up"));
    }

    #[tokio::test]
    async fn env_is_injected_into_the_child() {
        let tmp = tempfile::tempdir().unwrap();
        let config = sh("printf '%s' \"$GEN_TEST_VAR\"", Duration::from_secs(5));
        let cancel = CancellationToken::new();

        let out = invoke(&config, tmp.path(), tmp.path(), &cancel)
            .await
            .unwrap();
        assert_eq!(out.stdout, "set");
    }

    #[tokio::test]
    async fn directories_are_passed_as_trailing_arguments() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("in");
        let output = tmp.path().join("out");
        tokio::fs::create_dir_all(&input).await.unwrap();
        tokio::fs::create_dir_all(&output).await.unwrap();

        let config = sh("touch \"$2/model.ply\"", Duration::from_secs(5));
        let cancel = CancellationToken::new();

        invoke(&config, &input, &output, &cancel).await.unwrap();
        assert!(output.join("model.ply").is_file());
    }

    #[tokio::test]
    async fn timeout_kills_the_child() {
        let tmp = tempfile::tempdir().unwrap();
        let config = sh("sleep 30", Duration::from_millis(100));
        let cancel = CancellationToken::new();

        let start = Instant::now();
        let err = invoke(&config, tmp.path(), tmp.path(), &cancel)
            .await
            .unwrap_err();
        assert_matches!(err, JobError::GenerationTimedOut { .. });
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn cancellation_kills_the_child() {
        let tmp = tempfile::tempdir().unwrap();
        let config = sh("sleep 30", Duration::from_secs(60));
        let cancel = CancellationToken::new();

        let token = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            token.cancel();
        });

        let err = invoke(&config, tmp.path(), tmp.path(), &cancel)
            .await
            .unwrap_err();
        assert_matches!(err, JobError::GenerationTimedOut { .. });
    }

    #[tokio::test]
    async fn missing_program_is_an_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let config = GeneratorConfig {
            program: "plyforge-no-such-binary".to_string(),
            base_args: vec![],
            env: vec![],
            timeout: Duration::from_secs(1),
        };
        let cancel = CancellationToken::new();

        let err = invoke(&config, tmp.path(), tmp.path(), &cancel)
            .await
            .unwrap_err();
        assert_matches!(err, JobError::Io(_));
    }
}
