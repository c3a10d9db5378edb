use crate::release::ReleaseState;
use crate::vcs::{VcsBackend, VcsError};
use std::path::PathBuf;
use std::sync::Mutex;

/// In-memory version-control backend. Records every call and can be told to
/// fail one step.
#[derive(Default)]
pub struct MockVcs {
    fail_at: Option<ReleaseState>,
    calls: Mutex<Vec<String>>,
}

impl MockVcs {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn failing_at(step: ReleaseState) -> Self {
        Self {
            fail_at: Some(step),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Calls made so far, as `git`-style command lines.
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    fn record(&self, step: ReleaseState, command: String) -> Result<(), VcsError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(command.clone());
        }
        if self.fail_at == Some(step) {
            return Err(VcsError::Failed {
                command,
                status: "exit status: 1".to_owned(),
                stderr: format!("mock failure at {step}"),
            });
        }
        Ok(())
    }
}

impl VcsBackend for MockVcs {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn stage(&self, paths: &[PathBuf]) -> Result<(), VcsError> {
        let files: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
        self.record(
            ReleaseState::StageFiles,
            format!("add -- {}", files.join(" ")),
        )
    }

    fn commit(&self, message: &str) -> Result<(), VcsError> {
        self.record(ReleaseState::Commit, format!("commit -m {message}"))
    }

    fn push(&self, remote: Option<&str>, branch: Option<&str>) -> Result<(), VcsError> {
        let mut command = "push".to_owned();
        for part in remote.into_iter().chain(branch) {
            command.push(' ');
            command.push_str(part);
        }
        self.record(ReleaseState::Push, command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_calls_in_order() {
        let vcs = MockVcs::new();
        vcs.stage(&[PathBuf::from("sw.js")]).unwrap();
        vcs.commit("release 1").unwrap();
        vcs.push(Some("origin"), Some("main")).unwrap();
        assert_eq!(
            vcs.calls(),
            vec!["add -- sw.js", "commit -m release 1", "push origin main"]
        );
    }

    #[test]
    fn fails_only_the_configured_step() {
        let vcs = MockVcs::failing_at(ReleaseState::Push);
        assert!(vcs.commit("m").is_ok());
        assert!(vcs.push(None, None).is_err());
    }
}
