//! External compiler, checker and runner
//!
//! Each call spawns one process. Compile and check capture output and are
//! bounded by the configured timeout; run inherits the terminal and waits
//! for the program to finish. Nothing is retried.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::process::Command;

use crate::error::ToolchainError;
use crate::models::config::ToolchainConfig;

/// Extension given to compiler output next to the source file
pub const OUTPUT_EXTENSION: &str = "out";

/// Result of a successful tool invocation
#[derive(Debug, Clone, Serialize)]
pub struct ToolOutput {
    pub tool: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<i32>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stdout: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stderr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<PathBuf>,
}

#[async_trait]
pub trait ToolchainService: Send + Sync {
    async fn compile(&self, path: &Path) -> Result<ToolOutput, ToolchainError>;
    async fn check(&self, path: &Path) -> Result<ToolOutput, ToolchainError>;
    async fn run(&self, path: &Path) -> Result<ToolOutput, ToolchainError>;
}

pub fn output_path(source: &Path) -> PathBuf {
    source.with_extension(OUTPUT_EXTENSION)
}

/// Write an in-memory buffer to disk ahead of a tool invocation
pub async fn save_buffer(tool: &str, path: &Path, text: &str) -> Result<(), ToolchainError> {
    tokio::fs::write(path, text)
        .await
        .map_err(|source| ToolchainError::Save {
            tool: tool.to_string(),
            path: path.display().to_string(),
            source,
        })
}

pub struct DefaultToolchainService {
    config: ToolchainConfig,
    timeout: Duration,
}

impl DefaultToolchainService {
    pub fn new(config: ToolchainConfig) -> Self {
        let timeout = Duration::from_secs(config.timeout_secs);
        Self { config, timeout }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn config(&self) -> &ToolchainConfig {
        &self.config
    }

    async fn capture(&self, tool: &str, args: &[&OsStr]) -> Result<ToolOutput, ToolchainError> {
        tracing::debug!("Running {} {:?}", tool, args);

        let child = Command::new(tool)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ToolchainError::Spawn {
                command: tool.to_string(),
                source,
            })?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| ToolchainError::Timeout {
                tool: tool.to_string(),
                timeout: self.timeout,
            })?
            .map_err(|source| ToolchainError::Spawn {
                command: tool.to_string(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !stderr.trim().is_empty() {
            return Err(ToolchainError::failed(tool, stderr.trim_end()));
        }
        if !output.status.success() {
            return Err(ToolchainError::failed(tool, output.status.to_string()));
        }

        Ok(ToolOutput {
            tool: tool.to_string(),
            status_code: output.status.code(),
            stdout,
            stderr,
            artifact: None,
        })
    }
}

#[async_trait]
impl ToolchainService for DefaultToolchainService {
    async fn compile(&self, path: &Path) -> Result<ToolOutput, ToolchainError> {
        let out = output_path(path);
        let mut result = self
            .capture(
                &self.config.compiler,
                &[
                    path.as_os_str(),
                    OsStr::new(&self.config.output_flag),
                    out.as_os_str(),
                ],
            )
            .await?;
        result.artifact = Some(out);
        Ok(result)
    }

    async fn check(&self, path: &Path) -> Result<ToolOutput, ToolchainError> {
        self.capture(
            self.config.checker(),
            &[path.as_os_str(), OsStr::new(&self.config.check_flag)],
        )
        .await
    }

    async fn run(&self, path: &Path) -> Result<ToolOutput, ToolchainError> {
        let runner = &self.config.runner;
        tracing::debug!("Launching {} {:?}", runner, path);

        let status = Command::new(runner)
            .arg(path)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|source| ToolchainError::Spawn {
                command: runner.clone(),
                source,
            })?;

        Ok(ToolOutput {
            tool: runner.clone(),
            status_code: status.code(),
            stdout: String::new(),
            stderr: String::new(),
            artifact: None,
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // The scripts double as "source files": `sh <file> <flags>` executes them.
    fn service(timeout: Duration) -> DefaultToolchainService {
        DefaultToolchainService::new(ToolchainConfig {
            compiler: "sh".to_string(),
            runner: "sh".to_string(),
            ..Default::default()
        })
        .with_timeout(timeout)
    }

    async fn script(dir: &TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        tokio::fs::write(&path, body).await.unwrap();
        path
    }

    #[tokio::test]
    async fn test_compile_success_reports_artifact() {
        let temp = TempDir::new().unwrap();
        let src = script(&temp, "ok.ln", "echo built \"$2\"\n").await;

        let out = service(Duration::from_secs(10)).compile(&src).await.unwrap();
        assert_eq!(out.status_code, Some(0));
        assert_eq!(out.artifact, Some(temp.path().join("ok.out")));
        assert!(out.stdout.contains("ok.out"));
    }

    #[tokio::test]
    async fn test_stderr_is_failure_verbatim() {
        let temp = TempDir::new().unwrap();
        let src = script(&temp, "warn.ln", "echo 'main.ln:3: bad token' >&2\n").await;

        let err = service(Duration::from_secs(10)).check(&src).await.unwrap_err();
        assert_eq!(err.to_string(), "sh failed: main.ln:3: bad token");
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_failure() {
        let temp = TempDir::new().unwrap();
        let src = script(&temp, "exit.ln", "exit 3\n").await;

        let err = service(Duration::from_secs(10)).check(&src).await.unwrap_err();
        assert!(matches!(err, ToolchainError::Failed { ref message, .. } if message.contains('3')));
    }

    #[tokio::test]
    async fn test_timeout() {
        let temp = TempDir::new().unwrap();
        let src = script(&temp, "slow.ln", "sleep 5\n").await;

        let err = service(Duration::from_millis(100)).compile(&src).await.unwrap_err();
        assert!(matches!(err, ToolchainError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let svc = DefaultToolchainService::new(ToolchainConfig {
            compiler: "lantern-no-such-compiler".to_string(),
            ..Default::default()
        });
        let err = svc.compile(Path::new("x.ln")).await.unwrap_err();
        assert!(matches!(err, ToolchainError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_run_returns_exit_code() {
        let temp = TempDir::new().unwrap();
        let src = script(&temp, "prog.ln", "exit 4\n").await;

        let out = service(Duration::from_secs(10)).run(&src).await.unwrap();
        assert_eq!(out.status_code, Some(4));
    }

    #[tokio::test]
    async fn test_save_buffer_failure() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("missing-dir").join("a.ln");
        let err = save_buffer("lanternc", &path, "x;").await.unwrap_err();
        assert!(matches!(err, ToolchainError::Save { .. }));
    }
}
