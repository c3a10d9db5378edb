//! Orchestration for the cacheseal integrity pipeline.
//!
//! This crate ties configuration and the store operations together behind
//! `Pipeline`, the single API the CLI talks to, and implements the release
//! sequence: a linear state machine that injects the package version and then
//! hands staging, commit, and push to a `VcsBackend` (`git` or an in-memory
//! mock), aborting on the first failing step.

pub mod mock;
pub mod pipeline;
pub mod release;
pub mod vcs;

pub use mock::MockVcs;
pub use pipeline::Pipeline;
pub use release::{validate_transition, ReleaseReport, ReleaseSequencer, ReleaseState};
pub use vcs::{select_backend, GitBackend, VcsBackend, VcsError};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("config error: {0}")]
    Config(#[from] cacheseal_schema::ConfigError),
    #[error("store error: {0}")]
    Store(#[from] cacheseal_store::StoreError),
    #[error("version control error: {0}")]
    Vcs(#[from] VcsError),
    #[error("version control backend '{0}' is not available")]
    BackendUnavailable(String),
    #[error("invalid release transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },
    #[error("release aborted at {step}: {source}")]
    Aborted {
        step: ReleaseState,
        source: Box<CoreError>,
    },
}
