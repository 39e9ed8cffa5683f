// Integration tests for supervisor shutdown on cancellation

use nix::sys::signal::kill;
use nix::unistd::Pid;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use warden::health::HealthProbe;
use warden::process::{ProcessController, ProcessState, SpawnOptions};
use warden::release::ShellReleaseExecutor;
use warden::supervisor::Supervisor;
use warden::version::VersionStore;

fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

fn create_supervisor(root: &Path, command: &str, poll_interval: Duration) -> Supervisor {
    create_supervisor_with_build(root, command, "true", poll_interval)
}

fn create_supervisor_with_build(
    root: &Path,
    command: &str,
    build: &str,
    poll_interval: Duration,
) -> Supervisor {
    let probe = HealthProbe::new("127.0.0.1", closed_port(), Duration::from_secs(1)).unwrap();
    let controller = ProcessController::new(
        SpawnOptions {
            command: command.to_string(),
            cwd: root.to_path_buf(),
            log_dir: None,
        },
        Duration::from_secs(5),
        Duration::from_millis(0),
    );
    let store = VersionStore::new(
        root.join(".version"),
        root.join("package.json"),
        root.join(".env"),
        "REACT_APP_VERSION",
    );
    let executor = Arc::new(ShellReleaseExecutor::new(
        root.to_path_buf(),
        root.join("backups"),
        vec!["backups".to_string()],
        build.to_string(),
    ));

    Supervisor::new(probe, controller, store, executor, 3, poll_interval)
}

fn read_pid(path: &Path) -> Pid {
    let contents = fs::read_to_string(path).unwrap();
    Pid::from_raw(contents.trim().parse().unwrap())
}

#[tokio::test]
async fn test_cancel_during_sleep_stops_child() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let mut supervisor = create_supervisor(
        root,
        "echo $$ > child.pid; exec sleep 30",
        Duration::from_secs(60),
    );

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        trigger.cancel();
    });

    let start = Instant::now();
    supervisor.run(cancel).await.unwrap();
    let elapsed = start.elapsed();

    // Well under the 60s poll interval: the sleep was interrupted
    assert!(elapsed < Duration::from_secs(7));
    assert_eq!(supervisor.controller().state(), ProcessState::Stopped);
    assert_eq!(supervisor.controller().pid(), None);

    let pid = read_pid(&root.join("child.pid"));
    assert!(kill(pid, None).is_err());
}

#[tokio::test]
async fn test_cancel_before_first_sleep() {
    let temp_dir = TempDir::new().unwrap();
    let mut supervisor = create_supervisor(
        temp_dir.path(),
        "exec sleep 30",
        Duration::from_secs(60),
    );

    let cancel = CancellationToken::new();
    cancel.cancel();

    let start = Instant::now();
    supervisor.run(cancel).await.unwrap();

    assert!(start.elapsed() < Duration::from_secs(7));
    assert_eq!(supervisor.controller().state(), ProcessState::Stopped);
    assert_eq!(supervisor.health().consecutive_failures, 0);
}

#[tokio::test]
async fn test_shutdown_escalates_for_stubborn_child() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let mut supervisor = create_supervisor(
        root,
        "trap '' TERM; echo $$ > child.pid; while true; do sleep 1; done",
        Duration::from_secs(60),
    );

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        trigger.cancel();
    });

    let start = Instant::now();
    supervisor.run(cancel).await.unwrap();
    let elapsed = start.elapsed();

    // Grace period of 5s, then SIGKILL
    assert!(elapsed >= Duration::from_secs(5));
    assert!(elapsed < Duration::from_secs(9));
    assert_eq!(supervisor.controller().pid(), None);

    let pid = read_pid(&root.join("child.pid"));
    assert!(kill(pid, None).is_err());
}

#[tokio::test]
async fn test_failing_probes_restart_child_in_loop() {
    let temp_dir = TempDir::new().unwrap();
    let mut supervisor = create_supervisor(
        temp_dir.path(),
        "exec sleep 30",
        Duration::from_millis(50),
    );

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(400)).await;
        trigger.cancel();
    });

    supervisor.run(cancel).await.unwrap();

    assert!(supervisor.controller().restart_count() >= 1);
    assert_eq!(supervisor.controller().state(), ProcessState::Stopped);
}

#[tokio::test]
async fn test_cancel_during_rebuild_stops_child() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    fs::write(root.join("package.json"), "{\"version\": \"1.0.0\"}\n").unwrap();
    fs::write(root.join(".version"), "1.1.0").unwrap();

    let mut supervisor = create_supervisor_with_build(
        root,
        "echo $$ > child.pid; exec sleep 30",
        "sleep 30",
        Duration::from_secs(60),
    );

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(1000)).await;
        trigger.cancel();
    });

    let start = Instant::now();
    supervisor.run(cancel).await.unwrap();

    // Well under the 30s build: the rebuild was abandoned
    assert!(start.elapsed() < Duration::from_secs(8));
    assert_eq!(supervisor.current_version(), "1.1.0");
    assert_eq!(supervisor.controller().restart_count(), 0);
    assert_eq!(supervisor.controller().pid(), None);

    let pid = read_pid(&root.join("child.pid"));
    assert!(kill(pid, None).is_err());
}
