//! Code that runs around a command's handler.
//!
//! Pre-dispatch hooks run once the line has matched the command's
//! parameters. They see the matched [`Arguments`], may veto the command, and
//! may put per-line state into `ctx.extensions` for the handler (a cooldown
//! tracker, the resolved sender). Post-dispatch hooks see the handler's data
//! after it was serialized to JSON and return the value to report instead;
//! they are skipped when the handler produced no output.
//!
//! Hooks of one phase run in the order they were added.

use std::fmt;
use std::rc::Rc;

use serde_json::Value as Json;
use thiserror::Error;

use crate::context::CommandContext;
use crate::value::Arguments;

/// When a hook ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPhase {
    /// Before the handler
    PreDispatch,
    /// After the handler, on its data
    PostDispatch,
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HookPhase::PreDispatch => "pre-dispatch",
            HookPhase::PostDispatch => "post-dispatch",
        })
    }
}

/// A hook stopped the command.
#[derive(Debug, Error)]
#[error("{phase} hook stopped the command: {message}")]
pub struct HookError {
    pub phase: HookPhase,
    pub message: String,
    #[source]
    pub cause: Option<anyhow::Error>,
}

impl HookError {
    pub fn pre_dispatch(message: impl Into<String>) -> Self {
        Self::new(HookPhase::PreDispatch, message)
    }

    pub fn post_dispatch(message: impl Into<String>) -> Self {
        Self::new(HookPhase::PostDispatch, message)
    }

    fn new(phase: HookPhase, message: impl Into<String>) -> Self {
        Self {
            phase,
            message: message.into(),
            cause: None,
        }
    }

    /// Attaches the error that made the hook fail.
    pub fn caused_by(mut self, cause: impl Into<anyhow::Error>) -> Self {
        self.cause = Some(cause.into());
        self
    }
}

pub type PreDispatchFn = Rc<dyn Fn(&Arguments, &mut CommandContext) -> Result<(), HookError>>;

pub type PostDispatchFn = Rc<dyn Fn(&Arguments, &CommandContext, Json) -> Result<Json, HookError>>;

/// The hooks of one command.
#[derive(Clone, Default)]
pub struct Hooks {
    before: Vec<PreDispatchFn>,
    after: Vec<PostDispatchFn>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.before.is_empty() && self.after.is_empty()
    }

    /// Adds a hook that runs before the handler.
    ///
    /// ```rust
    /// use cmdtree::{HookError, Hooks};
    ///
    /// struct Cooldown { seconds: u32 }
    ///
    /// let hooks = Hooks::new().pre_dispatch(|_args, ctx| {
    ///     if ctx.extensions.contains::<Cooldown>() {
    ///         return Err(HookError::pre_dispatch("slow down"));
    ///     }
    ///     ctx.extensions.insert(Cooldown { seconds: 5 });
    ///     Ok(())
    /// });
    /// assert!(!hooks.is_empty());
    /// ```
    pub fn pre_dispatch<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Arguments, &mut CommandContext) -> Result<(), HookError> + 'static,
    {
        self.before.push(Rc::new(hook));
        self
    }

    /// Adds a hook that rewrites the handler's data.
    pub fn post_dispatch<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Arguments, &CommandContext, Json) -> Result<Json, HookError> + 'static,
    {
        self.after.push(Rc::new(hook));
        self
    }

    /// Runs the pre-dispatch hooks until one fails.
    pub fn run_pre_dispatch(
        &self,
        args: &Arguments,
        ctx: &mut CommandContext,
    ) -> Result<(), HookError> {
        self.before.iter().try_for_each(|hook| hook(args, ctx))
    }

    /// Threads `data` through the post-dispatch hooks.
    pub fn run_post_dispatch(
        &self,
        args: &Arguments,
        ctx: &CommandContext,
        data: Json,
    ) -> Result<Json, HookError> {
        self.after
            .iter()
            .try_fold(data, |data, hook| hook(args, ctx, data))
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Hooks {{ pre_dispatch: {}, post_dispatch: {} }}",
            self.before.len(),
            self.after.len()
        )
    }
}
