//! Git process invocation
//!
//! Every mirror operation goes through a `GitTransport`, so the freshness and
//! locking logic in `mirror` never depends on a real `git` binary being
//! installed. `SystemGit` is the production transport.

use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use thiserror::Error;
use tracing::trace;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

/// Failure of a single git invocation
#[derive(Debug, Error)]
pub enum GitError {
    /// The process could not be started
    #[error("failed to run git: {0}")]
    Spawn(#[source] std::io::Error),

    /// The process ran and exited unsuccessfully
    #[error("git {command} exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },
}

/// Runs one git command and returns its captured stdout
#[async_trait]
pub trait GitTransport: Send + Sync + fmt::Debug {
    /// Run `git <args>`; when `work_tree` is given the process runs inside it
    async fn run(&self, args: &[String], work_tree: Option<&Path>) -> Result<Vec<u8>, GitError>;
}

/// Transport that shells out to the system `git` binary
#[derive(Debug, Clone)]
pub struct SystemGit {
    program: PathBuf,
}

impl SystemGit {
    /// Use `git` from `PATH`
    pub fn new() -> Self {
        Self::with_program("git")
    }

    /// Use a specific git executable
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for SystemGit {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GitTransport for SystemGit {
    async fn run(&self, args: &[String], work_tree: Option<&Path>) -> Result<Vec<u8>, GitError> {
        trace!(?args, "running git");

        let mut command = tokio::process::Command::new(&self.program);
        command
            .args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .kill_on_drop(true);
        if let Some(dir) = work_tree {
            command.current_dir(dir);
        }

        let output = command.output().await.map_err(GitError::Spawn)?;
        if output.status.success() {
            Ok(output.stdout)
        } else {
            Err(GitError::Failed {
                command: subcommand(args).to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

/// First argument that is not a `--git-dir`/`--work-tree` option
pub(crate) fn subcommand(args: &[String]) -> &str {
    args.iter()
        .map(String::as_str)
        .find(|arg| !arg.starts_with("--git-dir=") && !arg.starts_with("--work-tree="))
        .unwrap_or("")
}
