#![allow(dead_code, unused_imports)]

pub use hookcmd_test_utils::{
    FailingHook, HookRecorder, init_tracing, missing_subdir, process_alive, scratch_dir,
    with_timeout,
};

use std::sync::{Arc, Mutex};

use hookcmd::{ProcessExecutor, Result, RunningProcess};

/// Configuring action that turns on output capture.
pub fn capture(executor: &mut ProcessExecutor) -> Result<()> {
    executor.read_output(true);
    Ok(())
}

/// `AfterStart` listener that remembers the pid, and the slot it writes to.
pub fn pid_slot() -> (
    Arc<Mutex<Option<u32>>>,
    impl Fn(&RunningProcess) -> Result<()> + Send + Sync + 'static,
) {
    let slot = Arc::new(Mutex::new(None));
    let writer = Arc::clone(&slot);
    let listener = move |p: &RunningProcess| -> Result<()> {
        *writer.lock().unwrap() = p.id();
        Ok(())
    };
    (slot, listener)
}
