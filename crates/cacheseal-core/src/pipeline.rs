use crate::release::{ReleaseReport, ReleaseSequencer};
use crate::vcs::{select_backend, VcsBackend};
use crate::CoreError;
use cacheseal_schema::{load_config, read_version, Config};
use cacheseal_store::{
    inject_version, update_hashes, verify_hashes, InjectReport, UpdateReport, VerifyReport,
};
use std::path::Path;

/// Entry point for every command. Holds one validated configuration so that
/// update, verify, and release all see the same artifact list.
pub struct Pipeline {
    config: Config,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn load(config_path: &Path) -> Result<Self, CoreError> {
        Ok(Self::new(load_config(config_path)?))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn version(&self) -> Result<String, CoreError> {
        Ok(read_version(&self.config.package_manifest)?)
    }

    pub fn inject_version(&self) -> Result<InjectReport, CoreError> {
        let version = self.version()?;
        Ok(inject_version(&version, &self.config.version_targets)?)
    }

    pub fn update_hashes(&self) -> Result<UpdateReport, CoreError> {
        Ok(update_hashes(
            &self.config.host_artifact,
            &self.config.marker,
            &self.config.artifacts,
        )?)
    }

    pub fn verify_hashes(&self) -> Result<VerifyReport, CoreError> {
        Ok(verify_hashes(
            &self.config.host_artifact,
            &self.config.marker,
            &self.config.artifacts,
        )?)
    }

    /// Backend named by `release.backend`, rooted at the project directory.
    pub fn vcs_backend(&self) -> Result<Box<dyn VcsBackend>, CoreError> {
        select_backend(&self.config.release.backend, &self.config.root)
    }

    pub fn release(&self, vcs: &dyn VcsBackend) -> Result<ReleaseReport, CoreError> {
        ReleaseSequencer::new(&self.config, vcs).run()
    }
}
