//! Listeners for observing and disturbing executions in tests.

use std::sync::{Arc, Mutex};

use hookcmd::errors::CmdError;
use hookcmd::{
    AfterFinish, AfterStart, AfterStop, BeforeStart, Phase, ProcessExecutor, ProcessResult,
    Result, RunningProcess, StoppedProcess,
};

/// Records every hook it is invoked for, in order.
///
/// Clones share one log, so a recorder can be registered for several roles
/// (or under several labels via [`HookRecorder::labelled`]) and inspected
/// afterwards. Events look like `"after-finish exit=0"` or, when labelled,
/// `"outer:before-start"`.
#[derive(Debug, Clone, Default)]
pub struct HookRecorder {
    label: Option<String>,
    events: Arc<Mutex<Vec<String>>>,
}

impl HookRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A recorder writing into the same log under `label`.
    pub fn labelled(&self, label: &str) -> Self {
        Self {
            label: Some(label.to_string()),
            events: Arc::clone(&self.events),
        }
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().expect("recorder lock poisoned").clone()
    }

    /// Events with any label and detail stripped, e.g. `"after-stop"`.
    pub fn phases(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .map(|event| {
                let event = event.rsplit(':').next().unwrap_or_default().to_string();
                event.split(' ').next().unwrap_or_default().to_string()
            })
            .collect()
    }

    pub fn count(&self, phase: Phase) -> usize {
        let name = phase.to_string();
        self.phases().iter().filter(|p| **p == name).count()
    }

    fn record(&self, phase: Phase, detail: Option<String>) {
        let mut event = match &self.label {
            Some(label) => format!("{label}:{phase}"),
            None => phase.to_string(),
        };
        if let Some(detail) = detail {
            event.push(' ');
            event.push_str(&detail);
        }
        self.events
            .lock()
            .expect("recorder lock poisoned")
            .push(event);
    }
}

impl BeforeStart for HookRecorder {
    fn before_start(&self, _executor: &mut ProcessExecutor) -> Result<()> {
        self.record(Phase::BeforeStart, None);
        Ok(())
    }
}

impl AfterStart for HookRecorder {
    fn after_start(&self, _process: &RunningProcess) -> Result<()> {
        self.record(Phase::AfterStart, None);
        Ok(())
    }
}

impl AfterFinish for HookRecorder {
    fn after_finish(&self, result: &ProcessResult) -> Result<()> {
        self.record(
            Phase::AfterFinish,
            Some(format!("exit={}", result.exit_value())),
        );
        Ok(())
    }
}

impl AfterStop for HookRecorder {
    fn after_stop(&self, process: &StoppedProcess) -> Result<()> {
        self.record(
            Phase::AfterStop,
            Some(format!("started={}", process.has_started())),
        );
        Ok(())
    }
}

/// Fails when invoked in its chosen phase and does nothing otherwise.
///
/// `Phase::Configuring` and `Phase::BeforeStart` both trigger on
/// `before_start`, since configuring actions share that trait.
#[derive(Debug, Clone, Copy)]
pub struct FailingHook {
    phase: Phase,
}

impl FailingHook {
    pub fn new(phase: Phase) -> Self {
        Self { phase }
    }

    fn fail(&self) -> Result<()> {
        Err(CmdError::Aborted(format!("injected failure in {}", self.phase)))
    }
}

impl BeforeStart for FailingHook {
    fn before_start(&self, _executor: &mut ProcessExecutor) -> Result<()> {
        match self.phase {
            Phase::Configuring | Phase::BeforeStart => self.fail(),
            _ => Ok(()),
        }
    }
}

impl AfterStart for FailingHook {
    fn after_start(&self, _process: &RunningProcess) -> Result<()> {
        match self.phase {
            Phase::AfterStart => self.fail(),
            _ => Ok(()),
        }
    }
}

impl AfterFinish for FailingHook {
    fn after_finish(&self, _result: &ProcessResult) -> Result<()> {
        match self.phase {
            Phase::AfterFinish => self.fail(),
            _ => Ok(()),
        }
    }
}

impl AfterStop for FailingHook {
    fn after_stop(&self, _process: &StoppedProcess) -> Result<()> {
        match self.phase {
            Phase::AfterStop => self.fail(),
            _ => Ok(()),
        }
    }
}
