//! Console host for `cmdtree` command trees.
//!
//! Loads a YAML command file (or the built-in one), binds it to the
//! handlers in [`handlers`], and runs lines from the command line or
//! standard input through the dispatcher.

pub mod cli;
pub mod console;
pub mod handlers;
pub mod output;

pub use cli::Cli;
pub use console::{Console, DEFAULT_COMMANDS};
pub use output::{OutputMode, RenderError};
