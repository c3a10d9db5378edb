use crate::CoreError;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VcsError {
    #[error("failed to run '{command}': {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },
    #[error("'{command}' exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },
}

/// The external version-control collaborator used by `release`.
///
/// Each method is one opaque step that either succeeds or fails as a whole.
pub trait VcsBackend {
    fn name(&self) -> &str;

    fn stage(&self, paths: &[PathBuf]) -> Result<(), VcsError>;

    fn commit(&self, message: &str) -> Result<(), VcsError>;

    fn push(&self, remote: Option<&str>, branch: Option<&str>) -> Result<(), VcsError>;
}

/// Shells out to `git` in the project directory.
pub struct GitBackend {
    workdir: PathBuf,
}

impl GitBackend {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn run(&self, args: &[&str]) -> Result<(), VcsError> {
        let command = format!("git {}", args.join(" "));
        tracing::debug!("running {command} in {}", self.workdir.display());
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .output()
            .map_err(|e| VcsError::Spawn {
                command: command.clone(),
                source: e,
            })?;
        if output.status.success() {
            Ok(())
        } else {
            Err(VcsError::Failed {
                command,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            })
        }
    }
}

impl VcsBackend for GitBackend {
    fn name(&self) -> &'static str {
        "git"
    }

    fn stage(&self, paths: &[PathBuf]) -> Result<(), VcsError> {
        // Pathspecs are resolved against the workdir git runs in.
        let rendered: Vec<String> = paths
            .iter()
            .map(|p| {
                p.strip_prefix(&self.workdir)
                    .unwrap_or(p)
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        let mut args = vec!["add", "--"];
        args.extend(rendered.iter().map(String::as_str));
        self.run(&args)
    }

    fn commit(&self, message: &str) -> Result<(), VcsError> {
        self.run(&["commit", "-m", message])
    }

    fn push(&self, remote: Option<&str>, branch: Option<&str>) -> Result<(), VcsError> {
        let mut args = vec!["push"];
        args.extend(remote);
        args.extend(branch);
        self.run(&args)
    }
}

/// Pick a backend by its configured name.
pub fn select_backend(name: &str, workdir: &Path) -> Result<Box<dyn VcsBackend>, CoreError> {
    match name {
        "git" => Ok(Box::new(GitBackend::new(workdir))),
        "mock" => Ok(Box::new(crate::mock::MockVcs::new())),
        other => Err(CoreError::BackendUnavailable(other.to_owned())),
    }
}
