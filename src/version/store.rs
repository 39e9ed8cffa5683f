use crate::config::{Config, DEFAULT_VERSION};
use crate::error::{Result, WardenError};
use crate::version::{env_file, metadata};
use std::path::{Path, PathBuf};

/// Reads and writes the persisted version and keeps its mirrors in sync
///
/// The version file is the source of truth. The metadata file's `version`
/// field and the env file's version key mirror it. Every write is a
/// whole-file read-transform-write with last-writer-wins semantics.
#[derive(Debug, Clone)]
pub struct VersionStore {
    version_file: PathBuf,
    metadata_file: PathBuf,
    env_file: PathBuf,
    version_key: String,
}

impl VersionStore {
    pub fn new<P1, P2, P3>(
        version_file: P1,
        metadata_file: P2,
        env_file: P3,
        version_key: &str,
    ) -> Self
    where
        P1: AsRef<Path>,
        P2: AsRef<Path>,
        P3: AsRef<Path>,
    {
        Self {
            version_file: version_file.as_ref().to_path_buf(),
            metadata_file: metadata_file.as_ref().to_path_buf(),
            env_file: env_file.as_ref().to_path_buf(),
            version_key: version_key.to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.version_file(),
            config.metadata_file(),
            config.env_file(),
            &config.files.version_key,
        )
    }

    pub fn version_file(&self) -> &Path {
        &self.version_file
    }

    pub fn env_file(&self) -> &Path {
        &self.env_file
    }

    /// Version recorded in the metadata file, or the built-in default
    pub fn metadata_version(&self) -> String {
        metadata::read_version(&self.metadata_file).unwrap_or_else(|e| {
            tracing::debug!("Falling back to default version: {}", e);
            DEFAULT_VERSION.to_string()
        })
    }

    /// Read the persisted version
    ///
    /// A missing or blank version file falls back to the metadata version.
    pub fn read_persisted(&self) -> Result<String> {
        if !self.version_file.exists() {
            return Ok(self.metadata_version());
        }

        let contents = std::fs::read_to_string(&self.version_file).map_err(|e| {
            WardenError::VersionFileError(format!(
                "Failed to read {}: {}",
                self.version_file.display(),
                e
            ))
        })?;

        let version = contents.trim();
        if version.is_empty() {
            Ok(self.metadata_version())
        } else {
            Ok(version.to_string())
        }
    }

    /// Overwrite the version file with exactly `version`
    pub fn write_persisted(&self, version: &str) -> Result<()> {
        std::fs::write(&self.version_file, version).map_err(|e| {
            WardenError::VersionFileError(format!(
                "Failed to write {}: {}",
                self.version_file.display(),
                e
            ))
        })
    }

    /// Set the version key in the env file
    ///
    /// Returns `Ok(false)` without touching anything when the env file does
    /// not exist.
    pub fn sync_environment(&self, version: &str) -> Result<bool> {
        if !self.env_file.exists() {
            return Ok(false);
        }

        let contents = std::fs::read_to_string(&self.env_file).map_err(|e| {
            WardenError::EnvFileError(format!("Failed to read {}: {}", self.env_file.display(), e))
        })?;

        let updated = env_file::set_value(&contents, &self.version_key, version);

        std::fs::write(&self.env_file, updated).map_err(|e| {
            WardenError::EnvFileError(format!(
                "Failed to write {}: {}",
                self.env_file.display(),
                e
            ))
        })?;

        Ok(true)
    }

    /// Set the metadata file's `version` field
    pub fn sync_metadata(&self, version: &str) -> Result<()> {
        metadata::write_version(&self.metadata_file, version)
    }

    /// Version currently recorded in the env file, if any
    pub fn environment_version(&self) -> Result<Option<String>> {
        if !self.env_file.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&self.env_file)?;
        Ok(env_file::get_value(&contents, &self.version_key))
    }
}
