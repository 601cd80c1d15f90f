//! The code that runs when a line reaches a leaf command.
//!
//! A handler gets the matched [`Arguments`] and the [`CommandContext`] and
//! returns serializable data, or [`Output::Silent`]. Formatting is left to
//! the host. Once stored in the tree a handler is erased to a closure that
//! yields an [`Outcome`] holding the data as JSON.

use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;

use crate::context::CommandContext;
use crate::error::CommandError;
use crate::value::Arguments;

/// Data returned by a handler, or nothing to report.
#[derive(Debug)]
pub enum Output<T: Serialize> {
    /// Data for the host to render
    Render(T),
    /// The command completed without output
    Silent,
}

impl<T: Serialize> Output<T> {
    pub fn is_render(&self) -> bool {
        matches!(self, Output::Render(_))
    }

    pub fn is_silent(&self) -> bool {
        matches!(self, Output::Silent)
    }
}

pub type HandlerResult<T> = Result<Output<T>, anyhow::Error>;

/// Conversion into a [`HandlerResult`].
///
/// Lets handlers return a plain `Result<T, E>` (wrapped in
/// [`Output::Render`]) or an explicit [`HandlerResult<T>`] when they need
/// [`Output::Silent`].
///
/// ```rust
/// use cmdtree::{HandlerResult, IntoHandlerResult, Output};
///
/// let direct: Result<u32, anyhow::Error> = Ok(3);
/// assert!(matches!(direct.into_handler_result(), Ok(Output::Render(3))));
///
/// let explicit: HandlerResult<u32> = Ok(Output::Silent);
/// assert!(matches!(explicit.into_handler_result(), Ok(Output::Silent)));
/// ```
pub trait IntoHandlerResult<T: Serialize> {
    fn into_handler_result(self) -> HandlerResult<T>;
}

impl<T, E> IntoHandlerResult<T> for Result<T, E>
where
    T: Serialize,
    E: Into<anyhow::Error>,
{
    fn into_handler_result(self) -> HandlerResult<T> {
        self.map(Output::Render).map_err(Into::into)
    }
}

impl<T: Serialize> IntoHandlerResult<T> for HandlerResult<T> {
    fn into_handler_result(self) -> HandlerResult<T> {
        self
    }
}

/// Result of executing a command line.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The handler returned data, serialized to JSON
    Rendered(serde_json::Value),
    /// The handler completed without output
    Silent,
}

impl Outcome {
    pub fn is_rendered(&self) -> bool {
        matches!(self, Outcome::Rendered(_))
    }

    pub fn is_silent(&self) -> bool {
        matches!(self, Outcome::Silent)
    }

    /// The rendered data, if any.
    pub fn data(&self) -> Option<&serde_json::Value> {
        match self {
            Outcome::Rendered(value) => Some(value),
            Outcome::Silent => None,
        }
    }
}

/// A stateful leaf command.
///
/// Dispatch is single-threaded, so `handle` takes `&mut self` and may keep
/// state between lines without locking.
///
/// ```rust
/// use cmdtree::{Arguments, CommandContext, Handler, HandlerResult, Output};
///
/// struct Weather { storms: u32 }
///
/// impl Handler for Weather {
///     type Output = String;
///
///     fn handle(&mut self, args: &Arguments, _ctx: &CommandContext) -> HandlerResult<String> {
///         if args.flag("quiet") {
///             return Ok(Output::Silent);
///         }
///         self.storms += 1;
///         Ok(Output::Render(format!("storm #{}", self.storms)))
///     }
/// }
/// ```
pub trait Handler {
    type Output: Serialize;

    fn handle(&mut self, args: &Arguments, ctx: &CommandContext) -> HandlerResult<Self::Output>;
}

/// Adapter implementing [`Handler`] for `FnMut` closures.
///
/// The closure may return `Result<T, E>` (auto-wrapped) or
/// `HandlerResult<T>`.
pub struct FnHandler<F, T, R = HandlerResult<T>>
where
    T: Serialize,
{
    f: F,
    _phantom: std::marker::PhantomData<fn() -> (T, R)>,
}

impl<F, T, R> FnHandler<F, T, R>
where
    F: FnMut(&Arguments, &CommandContext) -> R,
    R: IntoHandlerResult<T>,
    T: Serialize,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<F, T, R> Handler for FnHandler<F, T, R>
where
    F: FnMut(&Arguments, &CommandContext) -> R,
    R: IntoHandlerResult<T>,
    T: Serialize,
{
    type Output = T;

    fn handle(&mut self, args: &Arguments, ctx: &CommandContext) -> HandlerResult<T> {
        (self.f)(args, ctx).into_handler_result()
    }
}

/// Type-erased handler stored in the command tree.
///
/// `Rc<RefCell<_>>` so one handler can be bound to several commands (for
/// example through a [`HandlerRegistry`](crate::HandlerRegistry)).
pub(crate) type HandlerFn =
    Rc<RefCell<dyn FnMut(&Arguments, &CommandContext) -> Result<Outcome, CommandError>>>;

/// Erases a handler's output type by serializing its data to JSON.
pub(crate) fn erase<H>(mut handler: H) -> HandlerFn
where
    H: Handler + 'static,
{
    Rc::new(RefCell::new(
        move |args: &Arguments, ctx: &CommandContext| -> Result<Outcome, CommandError> {
            match handler.handle(args, ctx)? {
                Output::Render(data) => {
                    let value = serde_json::to_value(&data).map_err(anyhow::Error::from)?;
                    Ok(Outcome::Rendered(value))
                }
                Output::Silent => Ok(Outcome::Silent),
            }
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{ParsedParameter, Value};
    use serde_json::json;

    fn args_with_count(count: i32) -> Arguments {
        Arguments::new(vec![ParsedParameter::new(
            "count",
            Value::new(count),
            Some(count.to_string()),
        )])
    }

    #[test]
    fn output_predicates() {
        let render: Output<String> = Output::Render("ok".into());
        assert!(render.is_render());
        assert!(!render.is_silent());
        assert!(Output::<String>::Silent.is_silent());
    }

    #[test]
    fn outcome_data() {
        let outcome = Outcome::Rendered(json!({"ok": true}));
        assert!(outcome.is_rendered());
        assert_eq!(outcome.data(), Some(&json!({"ok": true})));
        assert!(Outcome::Silent.data().is_none());
    }

    #[test]
    fn fn_handler_reads_arguments() {
        let mut handler = FnHandler::new(|args: &Arguments, _ctx: &CommandContext| {
            let count = args.get_required::<i32>("count")?;
            Ok::<_, anyhow::Error>(count * 2)
        });

        let ctx = CommandContext::default();
        match handler.handle(&args_with_count(21), &ctx) {
            Ok(Output::Render(n)) => assert_eq!(n, 42),
            other => panic!("Expected Output::Render, got {other:?}"),
        }
    }

    #[test]
    fn fn_handler_keeps_state() {
        let mut calls = 0u32;
        let mut handler = FnHandler::new(|_args: &Arguments, _ctx: &CommandContext| {
            calls += 1;
            Ok::<_, anyhow::Error>(calls)
        });

        let ctx = CommandContext::default();
        let _ = handler.handle(&Arguments::default(), &ctx);
        let result = handler.handle(&Arguments::default(), &ctx);
        assert!(matches!(result, Ok(Output::Render(2))));
    }

    #[test]
    fn erased_handler_serializes_output() {
        let handler = erase(FnHandler::new(|args: &Arguments, _ctx: &CommandContext| {
            Ok::<_, anyhow::Error>(json!({"count": args.get::<i32>("count")}))
        }));

        let ctx = CommandContext::default();
        let outcome = (&mut *handler.borrow_mut())(&args_with_count(5), &ctx).unwrap();
        assert_eq!(outcome, Outcome::Rendered(json!({"count": 5})));
    }

    #[test]
    fn erased_handler_silent_and_error() {
        let silent = erase(FnHandler::new(|_args: &Arguments, _ctx: &CommandContext| {
            Ok(Output::<()>::Silent)
        }));
        let ctx = CommandContext::default();
        let outcome = (&mut *silent.borrow_mut())(&Arguments::default(), &ctx).unwrap();
        assert!(outcome.is_silent());

        let failing = erase(FnHandler::new(|_args: &Arguments, _ctx: &CommandContext| {
            Err::<String, _>(anyhow::anyhow!("world is read-only"))
        }));
        let err = (&mut *failing.borrow_mut())(&Arguments::default(), &ctx).unwrap_err();
        assert!(matches!(err, CommandError::Handler(_)));
        assert_eq!(err.to_string(), "world is read-only");
    }
}
