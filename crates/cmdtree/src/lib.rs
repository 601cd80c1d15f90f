//! Hierarchical command parsing and dispatch for interactive consoles.
//!
//! `cmdtree` turns a line of text typed into a console (a game server
//! console, an admin shell, a chat bot) into a call of a registered handler.
//! Commands form a tree: `admin ban alex griefing` routes through `admin`
//! and `ban`, then matches `alex griefing` against the parameters `ban`
//! declares.
//!
//! # Features
//!
//! - **Tokenizer**: whitespace splitting with quoting and escapes
//! - **Parameters**: flags, named options, positionals, fixed choices and
//!   nested groups, matched in any order with backtracking
//! - **Value providers**: a per-type registry that reads, completes and
//!   defaults parameter values
//! - **Completion**: the same matching engine proposes the next token
//! - **Filters and hooks**: hide commands from callers, run code around
//!   handlers
//! - **Command files**: declare the tree in YAML and bind handlers by key
//!
//! # Quick start
//!
//! ```rust
//! use cmdtree::{Arguments, Command, CommandContext, Dispatcher, Parameter};
//! use serde_json::json;
//!
//! let mut dispatcher = Dispatcher::new();
//! dispatcher
//!     .add_command(
//!         Command::new("give")
//!             .describe("Give items to a player")
//!             .parameter(Parameter::positional::<String>("player"))
//!             .parameter(Parameter::positional::<i32>("amount").optional().default_literal("1"))
//!             .parameter(Parameter::flag("silent").short("s"))
//!             .handler(|args: &Arguments, _ctx: &CommandContext| {
//!                 Ok::<_, anyhow::Error>(json!({
//!                     "player": args.get_required::<String>("player")?,
//!                     "amount": args.get_required::<i32>("amount")?,
//!                     "silent": args.flag("silent"),
//!                 }))
//!             }),
//!     )
//!     .unwrap();
//!
//! let outcome = dispatcher.execute("give -s alex 5").unwrap();
//! assert_eq!(
//!     outcome.data(),
//!     Some(&json!({"player": "alex", "amount": 5, "silent": true}))
//! );
//!
//! assert_eq!(dispatcher.get_suggestions("gi"), vec!["give"]);
//! ```
//!
//! # Matching
//!
//! A [`ParameterGroup`] matches tokens in rounds. Each round collects the
//! parameters that could accept the current token, tries the most specific
//! first and backtracks to the next candidate when reading a value fails.
//! Flags and named parameters may appear anywhere; positionals are matched
//! in declaration order. A positional declared with
//! [`infinite`](Parameter::infinite) greed takes the rest of the line.
//!
//! # Module layout
//!
//! - [`tokenizer`]: line splitting
//! - [`CommandInvocation`]: the cursor over a tokenized line
//! - [`Parameter`], [`ParameterGroup`]: declarations and the matching engine
//! - [`ProviderManager`]: value readers per type
//! - [`Command`], [`Dispatcher`]: the command tree
//! - [`CommandManifest`]: YAML command files

mod command;
mod context;
mod dispatcher;
mod error;
mod filter;
mod group;
mod handler;
mod hooks;
mod invocation;
mod manifest;
mod parameter;
mod provider;
pub mod tokenizer;
mod value;

pub use command::{Command, CommandDescriptor, DispatcherCommand};
pub use context::{CommandContext, Extensions};
pub use dispatcher::{Dispatcher, ExceptionHandlerFn, FallbackFn};
pub use error::{CommandError, DeclarationError, FilterError, ReadError};
pub use filter::{require, require_extension, Filter};
pub use group::{ParameterGroup, ParameterGroupBuilder};
pub use handler::{FnHandler, Handler, HandlerResult, IntoHandlerResult, Outcome, Output};
pub use hooks::{HookError, HookPhase, Hooks, PostDispatchFn, PreDispatchFn};
pub use invocation::{CommandInvocation, Mark};
pub use manifest::{
    CommandEntry, CommandManifest, FlagEntry, GreedRaw, HandlerRegistry, ManifestError,
    ParameterEntry,
};
pub use parameter::{AssembleFn, DefaultValue, Greed, Parameter, ParameterKind};
pub use provider::{CompleteFn, DefaultFn, Provider, ProviderManager, ReadFn};
pub use tokenizer::{tokenize, tokenize_for_completion, Token, TokenKind};
pub use value::{Arguments, ParsedParameter, Value, ValueType};
