// src/cmd.rs

//! Fluent builder for [`Command`].

use std::fmt;
use std::sync::Arc;

use crate::command::Command;
use crate::exec::runner::Hooks;
use crate::listening::{AfterFinish, AfterStart, AfterStop, BeforeStart};

/// Accumulates configuring actions, listeners and an interpreter, then
/// materializes a [`Command`].
///
/// Every registration appends to the list of its role; lists keep
/// registration order and listeners run in that order.
///
/// ```
/// use hookcmd::Cmd;
///
/// let command = Cmd::new().interpreter("sh").command(["-c", "echo Hello;"]);
/// assert_eq!(command.command_line(), ["sh", "-c", "echo Hello;"]);
/// ```
#[derive(Clone, Default)]
pub struct Cmd {
    hooks: Hooks,
    interpreter: Option<String>,
}

impl Cmd {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an action applied to the fresh executor configuration before
    /// any `BeforeStart` listener runs.
    pub fn configuring(mut self, action: impl BeforeStart + 'static) -> Self {
        self.hooks.configuring.push(Arc::new(action));
        self
    }

    pub fn configuring_all<I>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = Box<dyn BeforeStart>>,
    {
        self.hooks.configuring.extend(actions.into_iter().map(Arc::from));
        self
    }

    pub fn listening_before_start(mut self, listener: impl BeforeStart + 'static) -> Self {
        self.hooks.before_start.push(Arc::new(listener));
        self
    }

    pub fn listening_before_start_all<I>(mut self, listeners: I) -> Self
    where
        I: IntoIterator<Item = Box<dyn BeforeStart>>,
    {
        self.hooks.before_start.extend(listeners.into_iter().map(Arc::from));
        self
    }

    pub fn listening_after_start(mut self, listener: impl AfterStart + 'static) -> Self {
        self.hooks.after_start.push(Arc::new(listener));
        self
    }

    pub fn listening_after_start_all<I>(mut self, listeners: I) -> Self
    where
        I: IntoIterator<Item = Box<dyn AfterStart>>,
    {
        self.hooks.after_start.extend(listeners.into_iter().map(Arc::from));
        self
    }

    pub fn listening_after_finish(mut self, listener: impl AfterFinish + 'static) -> Self {
        self.hooks.after_finish.push(Arc::new(listener));
        self
    }

    pub fn listening_after_finish_all<I>(mut self, listeners: I) -> Self
    where
        I: IntoIterator<Item = Box<dyn AfterFinish>>,
    {
        self.hooks.after_finish.extend(listeners.into_iter().map(Arc::from));
        self
    }

    pub fn listening_after_stop(mut self, listener: impl AfterStop + 'static) -> Self {
        self.hooks.after_stop.push(Arc::new(listener));
        self
    }

    pub fn listening_after_stop_all<I>(mut self, listeners: I) -> Self
    where
        I: IntoIterator<Item = Box<dyn AfterStop>>,
    {
        self.hooks.after_stop.extend(listeners.into_iter().map(Arc::from));
        self
    }

    /// Set the interpreter token prepended to the command. The last call
    /// wins.
    pub fn interpreter(mut self, interpreter: impl Into<String>) -> Self {
        self.interpreter = Some(interpreter.into());
        self
    }

    /// Materialize a [`Command`] from `tokens` and a snapshot of the current
    /// registrations.
    ///
    /// The builder is left untouched, so it can produce further independent
    /// commands.
    pub fn command<I, S>(&self, tokens: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Command::new(self.resolve(tokens), self.hooks.clone())
    }

    fn resolve<I, S>(&self, tokens: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.interpreter
            .iter()
            .cloned()
            .chain(tokens.into_iter().map(Into::into))
            .collect()
    }
}

impl fmt::Debug for Cmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cmd")
            .field("interpreter", &self.interpreter)
            .field("configuring", &self.hooks.configuring.len())
            .field("before_start", &self.hooks.before_start.len())
            .field("after_start", &self.hooks.after_start.len())
            .field("after_finish", &self.hooks.after_finish.len())
            .field("after_stop", &self.hooks.after_stop.len())
            .finish()
    }
}
