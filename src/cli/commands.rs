// Command handlers behind the CLI subcommands

use crate::cli::output;
use crate::config::Config;
use crate::error::{Result, WardenError};
use crate::health::HealthProbe;
use crate::supervisor::Supervisor;
use crate::version::{env_file, validate_version, VersionStore};
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;

/// Run the supervisor until SIGINT or SIGTERM
///
/// The loop runs on its own task; this task only waits for the signal and
/// then cancels the loop, which stops the child before returning.
pub async fn start_supervisor(config: &Config) -> Result<()> {
    let mut supervisor = Supervisor::from_config(config)?;
    let cancel = CancellationToken::new();

    let loop_cancel = cancel.clone();
    let handle = tokio::spawn(async move { supervisor.run(loop_cancel).await });

    wait_for_shutdown_signal().await?;
    cancel.cancel();

    handle
        .await
        .map_err(|e| WardenError::Other(format!("Supervisor task failed: {}", e)))?
}

/// Resolve on the first SIGTERM or SIGINT
async fn wait_for_shutdown_signal() -> Result<()> {
    let mut sigterm = signal(SignalKind::terminate()).map_err(|e| {
        WardenError::SignalError(format!("Failed to install SIGTERM handler: {}", e))
    })?;
    let mut sigint = signal(SignalKind::interrupt()).map_err(|e| {
        WardenError::SignalError(format!("Failed to install SIGINT handler: {}", e))
    })?;

    tokio::select! {
        _ = sigterm.recv() => tracing::info!("Received SIGTERM"),
        _ = sigint.recv() => tracing::info!("Received SIGINT"),
    }

    Ok(())
}

/// Probe the server once and print the result
///
/// Returns whether the server is healthy.
pub async fn check_status(config: &Config) -> Result<bool> {
    let probe = HealthProbe::from_config(config)?;
    let version = VersionStore::from_config(config).read_persisted()?;

    let pb = output::create_progress_bar(&format!("Checking {}", probe.url()));
    let status = probe.check().await;
    output::finish_progress(pb);

    println!("{}", output::render_status(&status, &version));
    Ok(status.is_healthy())
}

/// Version recorded in the metadata file
pub fn current_version(config: &Config) -> String {
    VersionStore::from_config(config).metadata_version()
}

/// Outcome of a version request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRequest {
    pub version: String,
    pub env_sync: EnvSync,
}

/// What happened to the env file during a version request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvSync {
    Updated,
    Missing,
    Failed(String),
}

/// Check a version argument without touching any file
pub fn parse_requested_version(version: Option<&str>) -> Result<&str> {
    let version = version
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            WardenError::MissingArgument("version (usage: warden patch x.y.z)".to_string())
        })?;

    validate_version(version)?;
    Ok(version)
}

/// Request a version change from outside the supervisor
///
/// Writes the version file (the running supervisor picks the change up on
/// its next tick) and updates the env file when it exists. Nothing is
/// written unless `version` is present and well formed.
pub fn request_version(config: &Config, version: Option<&str>) -> Result<VersionRequest> {
    let version = parse_requested_version(version)?;
    let store = VersionStore::from_config(config);

    store.write_persisted(version)?;

    let env_sync = match store.sync_environment(version) {
        Ok(true) => EnvSync::Updated,
        Ok(false) => EnvSync::Missing,
        Err(e) => EnvSync::Failed(e.to_string()),
    };

    Ok(VersionRequest {
        version: version.to_string(),
        env_sync,
    })
}

/// `patch` command: request a version change and report it on stdout
pub fn patch_version(config: &Config, version: Option<&str>) -> Result<()> {
    let request = request_version(config, version)?;

    output::print_success_msg(&format!(
        "Version file updated to {}. The supervisor will apply the change.",
        request.version
    ));
    match request.env_sync {
        EnvSync::Updated => output::print_success_msg("Updated version in env file"),
        EnvSync::Missing => {}
        EnvSync::Failed(e) => output::print_warning(&format!("Could not update env file: {}", e)),
    }

    Ok(())
}

/// Create the default env file
///
/// Returns false, leaving the file untouched, when it already exists.
pub fn create_env_file(config: &Config) -> Result<bool> {
    let path = config.env_file();
    if path.exists() {
        output::print_info(&format!("Env file already exists at {}", path.display()));
        return Ok(false);
    }

    let version = current_version(config);
    let contents = env_file::default_contents(&config.files.version_key, &version);

    std::fs::write(&path, contents).map_err(|e| {
        WardenError::EnvFileError(format!("Failed to create {}: {}", path.display(), e))
    })?;

    output::print_success_msg(&format!("Created env file with version {}", version));
    Ok(true)
}

/// Print the API endpoints listing
pub fn show_endpoints(config: &Config) -> Result<()> {
    let path = config.endpoints_file();
    if !path.exists() {
        output::print_warning("API endpoints file not found.");
        return Ok(());
    }

    let content = std::fs::read_to_string(&path)?;
    output::print_endpoints(&content);
    Ok(())
}
