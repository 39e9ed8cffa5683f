use thiserror::Error;

/// Main error type for the warden supervisor
#[derive(Debug, Error)]
pub enum WardenError {
    // Process-related errors
    #[error("Failed to spawn process: {0}")]
    SpawnError(String),

    #[error("Failed to stop process {0}: {1}")]
    StopError(u32, String),

    #[error("Signal error: {0}")]
    SignalError(String),

    // Version and project file errors
    #[error("Invalid version '{0}': expected format x.y.z")]
    InvalidVersion(String),

    #[error("Version file error: {0}")]
    VersionFileError(String),

    #[error("Metadata file error: {0}")]
    MetadataError(String),

    #[error("Environment file error: {0}")]
    EnvFileError(String),

    // Release errors
    #[error("Backup failed: {0}")]
    BackupError(String),

    #[error("Rebuild failed: {0}")]
    RebuildError(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Configuration validation failed: {0}")]
    ConfigValidationError(String),

    // Operator input errors
    #[error("Missing required argument: {0}")]
    MissingArgument(String),

    #[error("Health probe error: {0}")]
    ProbeError(String),

    // IO errors (automatically converted from std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for warden operations
pub type Result<T> = std::result::Result<T, WardenError>;
