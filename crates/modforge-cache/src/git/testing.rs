//! In-memory git transport for tests
//!
//! `FakeGit` models one remote repository and the bare mirror cloned from it.
//! Clones and fetches copy the remote's tag list into the mirror, so a failed
//! fetch visibly leaves the mirror's tags untouched.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::{subcommand, GitError, GitTransport};

type Files = HashMap<String, Vec<u8>>;

#[derive(Debug, Default)]
struct FakeState {
    /// Remote tags in creation order, with each tag's files
    remote: Vec<(String, Files)>,
    /// Tags the mirror has seen, `None` until the first clone
    mirrored: Option<Vec<(String, Files)>>,
    unavailable: bool,
}

/// Fake transport that answers the commands the mirror issues
#[derive(Debug, Default)]
pub struct FakeGit {
    state: Mutex<FakeState>,
    latency: Option<Duration>,
    clones: AtomicUsize,
    fetches: AtomicUsize,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeGit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a remote tag whose tree holds `files`
    pub fn with_tag(self, tag: &str, files: &[(&str, &str)]) -> Self {
        self.add_tag(tag, files);
        self
    }

    /// Delay every command, to widen race windows
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Add a tag to the remote after construction
    pub fn add_tag(&self, tag: &str, files: &[(&str, &str)]) {
        let files = files
            .iter()
            .map(|(path, content)| (path.to_string(), content.as_bytes().to_vec()))
            .collect();
        self.state().remote.push((tag.to_string(), files));
    }

    /// Remove a tag from the remote
    pub fn remove_tag(&self, tag: &str) {
        self.state().remote.retain(|(name, _)| name != tag);
    }

    /// Make clone and fetch fail until switched back
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state().unavailable = unavailable;
    }

    pub fn clone_count(&self) -> usize {
        self.clones.load(Ordering::SeqCst)
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Number of commands of any kind
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of commands that were ever running at once
    pub fn max_concurrent_calls(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn execute(&self, args: &[String], work_tree: Option<&Path>) -> Result<Vec<u8>, GitError> {
        let command = subcommand(args).to_string();
        let rest: Vec<&str> = args
            .iter()
            .map(String::as_str)
            .skip_while(|arg| *arg != command)
            .skip(1)
            .collect();
        let mut state = self.state();

        match command.as_str() {
            "clone" => {
                self.clones.fetch_add(1, Ordering::SeqCst);
                if state.unavailable {
                    return Err(failed("clone", "could not read from remote repository"));
                }
                let dest = rest.last().map(PathBuf::from).ok_or_else(|| failed("clone", "no destination"))?;
                std::fs::create_dir_all(&dest).map_err(GitError::Spawn)?;
                state.mirrored = Some(state.remote.clone());
                Ok(Vec::new())
            },
            "fetch" => {
                self.fetches.fetch_add(1, Ordering::SeqCst);
                if state.unavailable {
                    return Err(failed("fetch", "could not read from remote repository"));
                }
                state.mirrored = Some(state.remote.clone());
                Ok(Vec::new())
            },
            "tag" => {
                let tags: Vec<&str> = mirrored(&state).iter().map(|(tag, _)| tag.as_str()).collect();
                let mut out = tags.join("\n");
                if !out.is_empty() {
                    out.push('\n');
                }
                Ok(out.into_bytes())
            },
            "show" => {
                let spec = rest.last().copied().unwrap_or("");
                let (tag, path) = spec
                    .strip_prefix("refs/tags/")
                    .and_then(|s| s.split_once(':'))
                    .ok_or_else(|| failed("show", "bad revision"))?;
                lookup(&state, tag)
                    .and_then(|files| files.get(path).cloned())
                    .ok_or_else(|| failed("show", "path does not exist"))
            },
            "checkout" => {
                let tag = rest
                    .last()
                    .and_then(|r| r.strip_prefix("refs/tags/"))
                    .ok_or_else(|| failed("checkout", "bad revision"))?;
                let dir = work_tree.ok_or_else(|| failed("checkout", "no work tree"))?;
                let files = lookup(&state, tag).ok_or_else(|| failed("checkout", "unknown revision"))?;
                for (path, content) in files {
                    let target = dir.join(path);
                    if let Some(parent) = target.parent() {
                        std::fs::create_dir_all(parent).map_err(GitError::Spawn)?;
                    }
                    std::fs::write(&target, content).map_err(GitError::Spawn)?;
                }
                Ok(Vec::new())
            },
            other => Err(failed(other, "unsupported by FakeGit")),
        }
    }
}

fn mirrored(state: &FakeState) -> &[(String, Files)] {
    state.mirrored.as_deref().unwrap_or(&[])
}

fn lookup<'a>(state: &'a FakeState, tag: &str) -> Option<&'a Files> {
    mirrored(state).iter().find(|(name, _)| name == tag).map(|(_, files)| files)
}

fn failed(command: &str, stderr: &str) -> GitError {
    GitError::Failed {
        command: command.to_string(),
        status: "exit status: 128".to_string(),
        stderr: stderr.to_string(),
    }
}

#[async_trait]
impl GitTransport for FakeGit {
    async fn run(&self, args: &[String], work_tree: Option<&Path>) -> Result<Vec<u8>, GitError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let result = self.execute(args, work_tree);

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
