use crate::error::{Result, WardenError};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::{Child, Command};

/// File names for the child's captured output inside the log directory
pub const STDOUT_LOG: &str = "child-out.log";
pub const STDERR_LOG: &str = "child-err.log";

/// Everything needed to launch the child
#[derive(Debug, Clone)]
pub struct SpawnOptions {
    /// Shell command line, run with `sh -c`
    pub command: String,

    /// Working directory of the child
    pub cwd: PathBuf,

    /// Directory receiving stdout/stderr; output is discarded when `None`
    pub log_dir: Option<PathBuf>,
}

/// Metadata returned when spawning a process
#[derive(Debug)]
pub struct SpawnedProcess {
    /// The child process handle
    pub child: Child,

    /// Process ID assigned by the OS
    pub pid: u32,

    /// Process group led by the child
    pub pgid: i32,

    /// Command line the child was started with
    pub command: String,
}

/// Spawn the child in a new process group
///
/// The child leads its own group, so terminal signals aimed at the supervisor
/// do not reach it and the whole tree can be signalled at once with `killpg`.
/// The call returns as soon as the process exists.
pub async fn spawn_process(options: &SpawnOptions) -> Result<SpawnedProcess> {
    if options.command.trim().is_empty() {
        return Err(WardenError::SpawnError("Empty start command".to_string()));
    }

    if !options.cwd.is_dir() {
        return Err(WardenError::SpawnError(format!(
            "Working directory does not exist: {}",
            options.cwd.display()
        )));
    }

    let mut command = Command::new("sh");
    command
        .arg("-c")
        .arg(&options.command)
        .current_dir(&options.cwd)
        .process_group(0)
        .stdin(Stdio::null());

    match options.log_dir {
        Some(ref log_dir) => {
            command.stdout(open_log(log_dir, STDOUT_LOG)?);
            command.stderr(open_log(log_dir, STDERR_LOG)?);
        }
        None => {
            command.stdout(Stdio::null());
            command.stderr(Stdio::null());
        }
    }

    let child = command.spawn().map_err(|e| {
        WardenError::SpawnError(format!("Failed to spawn '{}': {}", options.command, e))
    })?;

    let pid = child.id().ok_or_else(|| {
        WardenError::SpawnError(format!("Failed to get PID for '{}'", options.command))
    })?;

    let pgid = i32::try_from(pid)
        .map_err(|_| WardenError::SpawnError(format!("PID out of range: {}", pid)))?;

    Ok(SpawnedProcess {
        child,
        pid,
        pgid,
        command: options.command.clone(),
    })
}

/// Open a child output log in append mode
fn open_log(log_dir: &Path, name: &str) -> Result<Stdio> {
    std::fs::create_dir_all(log_dir).map_err(|e| {
        WardenError::SpawnError(format!(
            "Failed to create log directory {}: {}",
            log_dir.display(),
            e
        ))
    })?;

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join(name))
        .map_err(|e| WardenError::SpawnError(format!("Failed to open {}: {}", name, e)))?;

    Ok(Stdio::from(file))
}
