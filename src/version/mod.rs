// Version module - Persisted version value and the files that mirror it

pub mod env_file;
pub mod metadata;
mod store;

pub use store::VersionStore;

use crate::error::{Result, WardenError};
use regex::Regex;
use std::sync::LazyLock;

static VERSION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\d+\.\d+").expect("valid version pattern"));

/// Check an operator-supplied version string
///
/// Only the `major.minor.patch` prefix is enforced, so pre-release and build
/// suffixes such as `2.3.4-beta` are accepted.
pub fn validate_version(version: &str) -> Result<()> {
    if VERSION_PATTERN.is_match(version) {
        Ok(())
    } else {
        Err(WardenError::InvalidVersion(version.to_string()))
    }
}
