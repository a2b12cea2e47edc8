use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::{PolicyConfig, PolicyError};

/// Where the active policy came from, reported at startup and by the CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicySource {
    File(PathBuf),
    BuiltIn,
}

/// File-backed policy persistence for the store console.
#[derive(Debug, Clone)]
pub struct PolicyStore {
    path: PathBuf,
}

impl PolicyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<PolicyConfig, PolicyError> {
        let raw = fs::read_to_string(&self.path).map_err(|source| self.io_error(source))?;
        PolicyConfig::from_yaml_str(&raw)
    }

    /// Falls back to [`PolicyConfig::standard`] only when the file is absent; a file that
    /// exists but fails validation is still an error.
    pub fn load_or_default(&self) -> Result<(PolicyConfig, PolicySource), PolicyError> {
        if !self.path.exists() {
            warn!(path = %self.path.display(), "policy file missing; using built-in policy");
            return Ok((PolicyConfig::standard(), PolicySource::BuiltIn));
        }

        let policy = self.load()?;
        Ok((policy, PolicySource::File(self.path.clone())))
    }

    /// Validate `raw` and write it verbatim, creating the parent directory if needed.
    pub fn save_yaml(&self, raw: &str) -> Result<PolicyConfig, PolicyError> {
        let policy = PolicyConfig::from_yaml_str(raw)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
            }
        }
        fs::write(&self.path, raw).map_err(|source| self.io_error(source))?;

        info!(path = %self.path.display(), "policy saved");
        Ok(policy)
    }

    fn io_error(&self, source: std::io::Error) -> PolicyError {
        PolicyError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}
