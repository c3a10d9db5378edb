use crate::vcs::VcsBackend;
use crate::CoreError;
use cacheseal_schema::{read_version, Config};
use cacheseal_store::{inject_version, InjectReport};
use serde::Serialize;
use std::fmt;

/// States of the release sequence. The only path forward is
/// Start → InjectVersion → StageFiles → Commit → Push → Done; any step may
/// instead drop to Aborted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseState {
    Start,
    InjectVersion,
    StageFiles,
    Commit,
    Push,
    Done,
    Aborted,
}

impl fmt::Display for ReleaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Start => "start",
            Self::InjectVersion => "inject-version",
            Self::StageFiles => "stage",
            Self::Commit => "commit",
            Self::Push => "push",
            Self::Done => "done",
            Self::Aborted => "aborted",
        };
        f.write_str(s)
    }
}

pub fn validate_transition(from: ReleaseState, to: ReleaseState) -> Result<(), CoreError> {
    use ReleaseState::{Aborted, Commit, Done, InjectVersion, Push, StageFiles, Start};

    let valid = matches!(
        (from, to),
        (Start, InjectVersion)
            | (InjectVersion, StageFiles)
            | (StageFiles, Commit)
            | (Commit, Push)
            | (Push, Done)
            | (Start | InjectVersion | StageFiles | Commit | Push, Aborted)
    );

    if valid {
        Ok(())
    } else {
        Err(CoreError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ReleaseReport {
    pub version: String,
    pub commit_message: String,
    pub inject: InjectReport,
    /// Steps that completed, in order.
    pub steps: Vec<ReleaseState>,
}

/// Drives one release through the state machine.
///
/// Nothing already applied is rolled back on failure: a commit failure
/// after a successful stage leaves the files staged.
pub struct ReleaseSequencer<'a> {
    config: &'a Config,
    vcs: &'a dyn VcsBackend,
    state: ReleaseState,
    completed: Vec<ReleaseState>,
}

impl<'a> ReleaseSequencer<'a> {
    pub fn new(config: &'a Config, vcs: &'a dyn VcsBackend) -> Self {
        Self {
            config,
            vcs,
            state: ReleaseState::Start,
            completed: Vec::new(),
        }
    }

    pub fn state(&self) -> ReleaseState {
        self.state
    }

    fn advance(&mut self, to: ReleaseState) -> Result<(), CoreError> {
        validate_transition(self.state, to)?;
        tracing::debug!("release: {} -> {to}", self.state);
        self.state = to;
        Ok(())
    }

    /// Enter `step`, run `f`, and record the step as completed. On error the
    /// sequencer moves to Aborted and the error is wrapped with the step.
    fn step<T>(
        &mut self,
        step: ReleaseState,
        f: impl FnOnce(&Self) -> Result<T, CoreError>,
    ) -> Result<T, CoreError> {
        self.advance(step)?;
        match f(self) {
            Ok(value) => {
                tracing::info!("release step {step} succeeded");
                self.completed.push(step);
                Ok(value)
            }
            Err(e) => {
                tracing::error!("release step {step} failed: {e}");
                self.advance(ReleaseState::Aborted)?;
                Err(CoreError::Aborted {
                    step,
                    source: Box::new(e),
                })
            }
        }
    }

    pub fn run(mut self) -> Result<ReleaseReport, CoreError> {
        let (version, inject) = self.step(ReleaseState::InjectVersion, |s| {
            let version = read_version(&s.config.package_manifest)?;
            let report = inject_version(&version, &s.config.version_targets)?;
            Ok((version, report))
        })?;

        let paths = self.config.stage_paths();
        self.step(ReleaseState::StageFiles, |s| Ok(s.vcs.stage(&paths)?))?;

        let commit_message = self.config.commit_message(&version);
        self.step(ReleaseState::Commit, |s| Ok(s.vcs.commit(&commit_message)?))?;

        let config = self.config;
        let remote = config.release.remote.as_deref();
        let branch = config.release.branch.as_deref();
        self.step(ReleaseState::Push, |s| Ok(s.vcs.push(remote, branch)?))?;

        self.advance(ReleaseState::Done)?;
        Ok(ReleaseReport {
            version,
            commit_message,
            inject,
            steps: self.completed,
        })
    }
}
