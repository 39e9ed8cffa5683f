use crate::error::{Result, WardenError};
use crate::version::{env_file, metadata};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the optional configuration file looked up in the project directory
pub const CONFIG_FILE_NAME: &str = "warden.toml";

/// Version reported when neither the version file nor the metadata file has one
pub const DEFAULT_VERSION: &str = "0.0.1";

/// Environment variables that override the file configuration
pub const ENV_HOST: &str = "FRONTEND_HOST";
pub const ENV_PORT: &str = "FRONTEND_PORT";
pub const ENV_INTERVAL: &str = "HEALTH_CHECK_INTERVAL";

/// Complete supervisor configuration, resolved once at startup
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Root of the supervised project; relative file paths resolve against it
    #[serde(skip)]
    pub project_dir: PathBuf,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub supervision: SupervisionConfig,

    #[serde(default)]
    pub commands: CommandConfig,

    #[serde(default)]
    pub files: FileConfig,
}

/// Where the child's health endpoint lives
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Timeout for a single health probe (in seconds)
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,
}

/// Timing and failure policy of the supervision loop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisionConfig {
    /// Delay between two ticks (in seconds)
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Consecutive unhealthy probes that trigger a restart
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// Grace period between SIGTERM and SIGKILL (in seconds)
    #[serde(default = "default_stop_timeout")]
    pub stop_timeout_secs: u64,

    /// Pause between stop and start during a restart (in seconds)
    #[serde(default = "default_restart_delay")]
    pub restart_delay_secs: u64,
}

/// Shell commands run for the child and for rebuilds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandConfig {
    #[serde(default = "default_start_command")]
    pub start: String,

    #[serde(default = "default_build_command")]
    pub build: String,
}

/// On-disk files shared between the supervisor and the operator commands
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default = "default_version_file")]
    pub version_file: PathBuf,

    #[serde(default = "default_metadata_file")]
    pub metadata_file: PathBuf,

    #[serde(default = "default_env_file")]
    pub env_file: PathBuf,

    #[serde(default = "default_sample_env_file")]
    pub sample_env_file: PathBuf,

    #[serde(default = "default_endpoints_file")]
    pub endpoints_file: PathBuf,

    #[serde(default = "default_backup_dir")]
    pub backup_dir: PathBuf,

    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    /// Environment file key that carries the version
    #[serde(default = "default_version_key")]
    pub version_key: String,

    /// Path components never included in a backup archive
    #[serde(default = "default_backup_excludes")]
    pub backup_excludes: Vec<String>,
}

// Default value functions for serde
fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_probe_timeout() -> u64 {
    5
}

fn default_poll_interval() -> u64 {
    60
}

fn default_failure_threshold() -> u32 {
    3
}

fn default_stop_timeout() -> u64 {
    5
}

fn default_restart_delay() -> u64 {
    2
}

fn default_start_command() -> String {
    "npm start".to_string()
}

fn default_build_command() -> String {
    "npm run build".to_string()
}

fn default_version_file() -> PathBuf {
    PathBuf::from(".version")
}

fn default_metadata_file() -> PathBuf {
    PathBuf::from("package.json")
}

fn default_env_file() -> PathBuf {
    PathBuf::from(".env")
}

fn default_sample_env_file() -> PathBuf {
    PathBuf::from("sample.env")
}

fn default_endpoints_file() -> PathBuf {
    PathBuf::from("api-endpoints.txt")
}

fn default_backup_dir() -> PathBuf {
    PathBuf::from("backups")
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_version_key() -> String {
    "REACT_APP_VERSION".to_string()
}

fn default_backup_excludes() -> Vec<String> {
    vec![
        "node_modules".to_string(),
        "build".to_string(),
        "backups".to_string(),
    ]
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            probe_timeout_secs: default_probe_timeout(),
        }
    }
}

impl Default for SupervisionConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            failure_threshold: default_failure_threshold(),
            stop_timeout_secs: default_stop_timeout(),
            restart_delay_secs: default_restart_delay(),
        }
    }
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            start: default_start_command(),
            build: default_build_command(),
        }
    }
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            version_file: default_version_file(),
            metadata_file: default_metadata_file(),
            env_file: default_env_file(),
            sample_env_file: default_sample_env_file(),
            endpoints_file: default_endpoints_file(),
            backup_dir: default_backup_dir(),
            log_dir: default_log_dir(),
            version_key: default_version_key(),
            backup_excludes: default_backup_excludes(),
        }
    }
}

impl Config {
    /// Built-in defaults rooted at `project_dir`
    pub fn with_project_dir<P: AsRef<Path>>(project_dir: P) -> Self {
        Self {
            project_dir: project_dir.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Resolve the configuration for a project directory
    ///
    /// Defaults, then `warden.toml` (if present), then the process environment.
    pub fn load<P: AsRef<Path>>(project_dir: P) -> Result<Self> {
        let project_dir = project_dir.as_ref();
        let config_path = project_dir.join(CONFIG_FILE_NAME);

        let mut config = if config_path.exists() {
            Self::from_file(&config_path)?
        } else {
            Self::default()
        };
        config.project_dir = project_dir.to_path_buf();

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// Parse a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| WardenError::ConfigError(format!("Failed to read config file: {}", e)))?;

        Self::parse_toml(&contents)
    }

    fn parse_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| WardenError::InvalidConfig(format!("Failed to parse TOML: {}", e)))
    }

    /// Apply `FRONTEND_HOST`, `FRONTEND_PORT` and `HEALTH_CHECK_INTERVAL`
    ///
    /// `lookup` abstracts the environment so callers can feed fixed values.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(ENV_HOST) {
            self.server.host = host;
        }

        if let Some(port) = lookup(ENV_PORT) {
            self.server.port = port.trim().parse().map_err(|_| {
                WardenError::InvalidConfig(format!("{} is not a valid port: {}", ENV_PORT, port))
            })?;
        }

        if let Some(interval) = lookup(ENV_INTERVAL) {
            self.supervision.poll_interval_secs = interval.trim().parse().map_err(|_| {
                WardenError::InvalidConfig(format!(
                    "{} is not a number of seconds: {}",
                    ENV_INTERVAL, interval
                ))
            })?;
        }

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.host.trim().is_empty() {
            return Err(WardenError::ConfigValidationError(
                "host must not be empty".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(WardenError::ConfigValidationError(
                "port must be between 1 and 65535".to_string(),
            ));
        }

        if self.server.probe_timeout_secs == 0 {
            return Err(WardenError::ConfigValidationError(
                "probe_timeout_secs must be at least 1".to_string(),
            ));
        }

        if self.supervision.poll_interval_secs == 0 {
            return Err(WardenError::ConfigValidationError(
                "poll_interval_secs must be at least 1".to_string(),
            ));
        }

        if self.supervision.failure_threshold == 0 {
            return Err(WardenError::ConfigValidationError(
                "failure_threshold must be at least 1".to_string(),
            ));
        }

        if self.commands.start.trim().is_empty() {
            return Err(WardenError::ConfigValidationError(
                "start command must not be empty".to_string(),
            ));
        }

        if self.files.version_key.trim().is_empty() || self.files.version_key.contains('=') {
            return Err(WardenError::ConfigValidationError(format!(
                "invalid version_key: '{}'",
                self.files.version_key
            )));
        }

        Ok(())
    }

    /// Resolve a configured path against the project directory
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_dir.join(path)
        }
    }

    pub fn version_file(&self) -> PathBuf {
        self.resolve(&self.files.version_file)
    }

    pub fn metadata_file(&self) -> PathBuf {
        self.resolve(&self.files.metadata_file)
    }

    pub fn env_file(&self) -> PathBuf {
        self.resolve(&self.files.env_file)
    }

    pub fn sample_env_file(&self) -> PathBuf {
        self.resolve(&self.files.sample_env_file)
    }

    pub fn endpoints_file(&self) -> PathBuf {
        self.resolve(&self.files.endpoints_file)
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.resolve(&self.files.backup_dir)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.resolve(&self.files.log_dir)
    }

    /// URL probed by the health check
    pub fn health_url(&self) -> String {
        format!("http://{}:{}/", self.server.host, self.server.port)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.server.probe_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.supervision.poll_interval_secs)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.supervision.stop_timeout_secs)
    }

    pub fn restart_delay(&self) -> Duration {
        Duration::from_secs(self.supervision.restart_delay_secs)
    }

    /// Prepare the project directory before any command runs
    ///
    /// Creates the backup directory, seeds the version file from the metadata
    /// version and derives the env file from the sample env file when missing.
    pub fn prepare_workspace(&self) -> Result<()> {
        std::fs::create_dir_all(self.backup_dir()).map_err(|e| {
            WardenError::ConfigError(format!(
                "Failed to create backup directory {}: {}",
                self.backup_dir().display(),
                e
            ))
        })?;

        let version = metadata::read_version(&self.metadata_file())
            .unwrap_or_else(|_| DEFAULT_VERSION.to_string());

        let version_file = self.version_file();
        if !version_file.exists() {
            std::fs::write(&version_file, &version).map_err(|e| {
                WardenError::VersionFileError(format!(
                    "Failed to create {}: {}",
                    version_file.display(),
                    e
                ))
            })?;
        }

        let env_path = self.env_file();
        let sample_path = self.sample_env_file();
        if !env_path.exists() && sample_path.exists() {
            let sample = std::fs::read_to_string(&sample_path)?;
            let seeded = env_file::seed_from_sample(&sample, &self.files.version_key, &version);
            std::fs::write(&env_path, seeded).map_err(|e| {
                WardenError::EnvFileError(format!(
                    "Failed to create {}: {}",
                    env_path.display(),
                    e
                ))
            })?;
            tracing::info!(version = %version, "Created env file from sample");
        }

        Ok(())
    }
}
