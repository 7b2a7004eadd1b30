pub mod hooks;

use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::Once;

use tempfile::TempDir;
use tracing_subscriber::{EnvFilter, fmt};

pub use hooks::{FailingHook, HookRecorder};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=hookcmd=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Run a future with a 5-second timeout.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(std::time::Duration::from_secs(5), f)
        .await
        .expect("Test timed out after 5 seconds")
}

/// Fresh temporary directory, removed when the guard drops.
pub fn scratch_dir() -> TempDir {
    tempfile::tempdir().expect("failed to create scratch dir")
}

/// Path inside `root` that does not exist yet, for listeners that create
/// their own directory.
pub fn missing_subdir(root: &TempDir, name: &str) -> PathBuf {
    let path = root.path().join(name);
    assert!(!path.exists(), "{} already exists", path.display());
    path
}

/// Whether `pid` names a live (or not yet reaped) process, via `kill -0`.
pub fn process_alive(pid: u32) -> bool {
    Command::new("kill")
        .args(["-0", &pid.to_string()])
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}
