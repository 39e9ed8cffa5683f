use super::*;
use std::path::Path;
use tempfile::TempDir;

fn create_controller(command: &str, cwd: &Path, stop_timeout_secs: u64) -> ProcessController {
    let options = SpawnOptions {
        command: command.to_string(),
        cwd: cwd.to_path_buf(),
        log_dir: None,
    };
    ProcessController::new(
        options,
        Duration::from_secs(stop_timeout_secs),
        Duration::from_millis(0),
    )
}

fn pgid_of(pid: u32) -> Pid {
    Pid::from_raw(pid as i32)
}

#[tokio::test]
async fn test_controller_new() {
    let temp_dir = TempDir::new().unwrap();
    let controller = create_controller("exec sleep 30", temp_dir.path(), 2);

    assert_eq!(controller.state(), ProcessState::Stopped);
    assert_eq!(controller.pid(), None);
    assert_eq!(controller.restart_count(), 0);
    assert!(controller.last_restart().is_none());
}

#[tokio::test]
async fn test_start_and_stop() {
    let temp_dir = TempDir::new().unwrap();
    let mut controller = create_controller("exec sleep 30", temp_dir.path(), 2);

    let pid = controller.start().await.unwrap();
    assert_eq!(controller.state(), ProcessState::Running);
    assert_eq!(controller.pid(), Some(pid));
    assert!(group_alive(pgid_of(pid)));

    let start = std::time::Instant::now();
    controller.stop().await.unwrap();

    assert!(start.elapsed() < Duration::from_secs(2));
    assert_eq!(controller.state(), ProcessState::Stopped);
    assert_eq!(controller.pid(), None);
    assert!(!group_alive(pgid_of(pid)));
}

#[tokio::test]
async fn test_stop_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let mut controller = create_controller("exec sleep 30", temp_dir.path(), 2);

    assert!(controller.stop().await.is_ok());

    controller.start().await.unwrap();
    assert!(controller.stop().await.is_ok());
    assert!(controller.stop().await.is_ok());
    assert_eq!(controller.state(), ProcessState::Stopped);
}

#[tokio::test]
async fn test_stop_kills_descendants() {
    let temp_dir = TempDir::new().unwrap();
    let mut controller = create_controller(
        "(sleep 1; touch survived) & sleep 30 & wait",
        temp_dir.path(),
        2,
    );

    controller.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    controller.stop().await.unwrap();
    tokio::time::sleep(Duration::from_millis(1500)).await;

    assert!(!temp_dir.path().join("survived").exists());
}

#[tokio::test]
async fn test_stop_escalates_to_sigkill() {
    let temp_dir = TempDir::new().unwrap();
    let mut controller = create_controller("trap '' TERM; sleep 30", temp_dir.path(), 1);

    controller.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let start = std::time::Instant::now();
    controller.stop().await.unwrap();
    let elapsed = start.elapsed();

    assert!(elapsed >= Duration::from_millis(900));
    assert!(elapsed < Duration::from_secs(4));
    assert_eq!(controller.pid(), None);
    assert_eq!(controller.state(), ProcessState::Stopped);
}

#[tokio::test]
async fn test_stop_after_child_exited() {
    let temp_dir = TempDir::new().unwrap();
    let mut controller = create_controller("exit 3", temp_dir.path(), 2);

    controller.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert!(controller.stop().await.is_ok());
    assert_eq!(controller.state(), ProcessState::Stopped);
}

#[tokio::test]
async fn test_start_replaces_running_child() {
    let temp_dir = TempDir::new().unwrap();
    let mut controller = create_controller("exec sleep 30", temp_dir.path(), 2);

    let first = controller.start().await.unwrap();
    let second = controller.start().await.unwrap();

    assert_ne!(first, second);
    assert!(!group_alive(pgid_of(first)));
    assert_eq!(controller.pid(), Some(second));

    controller.stop().await.unwrap();
}

#[tokio::test]
async fn test_restart() {
    let temp_dir = TempDir::new().unwrap();
    let mut controller = create_controller("exec sleep 30", temp_dir.path(), 2);

    let first = controller.start().await.unwrap();
    let second = controller
        .restart(&CancellationToken::new())
        .await
        .unwrap()
        .unwrap();

    assert_ne!(first, second);
    assert_eq!(controller.state(), ProcessState::Running);
    assert_eq!(controller.restart_count(), 1);
    assert!(controller.last_restart().is_some());
    assert!(!group_alive(pgid_of(first)));

    controller.stop().await.unwrap();
}

#[tokio::test]
async fn test_restart_from_stopped() {
    let temp_dir = TempDir::new().unwrap();
    let mut controller = create_controller("exec sleep 30", temp_dir.path(), 2);

    let pid = controller
        .restart(&CancellationToken::new())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(controller.pid(), Some(pid));
    assert_eq!(controller.restart_count(), 1);

    controller.stop().await.unwrap();
}

#[tokio::test]
async fn test_start_failure_leaves_null_handle() {
    let mut controller = create_controller("sleep 30", Path::new("/nonexistent/directory"), 2);

    let result = controller.start().await;

    assert!(matches!(result, Err(WardenError::SpawnError(_))));
    assert_eq!(controller.state(), ProcessState::Stopped);
    assert_eq!(controller.pid(), None);
}

#[tokio::test]
async fn test_restart_delay_is_applied() {
    let temp_dir = TempDir::new().unwrap();
    let options = SpawnOptions {
        command: "exec sleep 30".to_string(),
        cwd: temp_dir.path().to_path_buf(),
        log_dir: None,
    };
    let mut controller =
        ProcessController::new(options, Duration::from_secs(2), Duration::from_millis(500));

    controller.start().await.unwrap();
    let start = std::time::Instant::now();
    controller.restart(&CancellationToken::new()).await.unwrap();

    assert!(start.elapsed() >= Duration::from_millis(500));

    controller.stop().await.unwrap();
}

#[tokio::test]
async fn test_restart_delay_interrupted_by_cancel() {
    let temp_dir = TempDir::new().unwrap();
    let options = SpawnOptions {
        command: "exec sleep 30".to_string(),
        cwd: temp_dir.path().to_path_buf(),
        log_dir: None,
    };
    let mut controller =
        ProcessController::new(options, Duration::from_secs(2), Duration::from_secs(30));

    let first = controller.start().await.unwrap();
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        trigger.cancel();
    });

    let start = std::time::Instant::now();
    let result = controller.restart(&cancel).await.unwrap();

    assert_eq!(result, None);
    assert!(start.elapsed() < Duration::from_secs(5));
    assert_eq!(controller.state(), ProcessState::Stopped);
    assert_eq!(controller.pid(), None);
    assert_eq!(controller.restart_count(), 0);
    assert!(!group_alive(pgid_of(first)));
}
