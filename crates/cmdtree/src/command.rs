//! Command declarations and the nodes of the command tree.
//!
//! [`Command`] is the builder handed to
//! [`Dispatcher::add_command`](crate::Dispatcher::add_command); once
//! registered it becomes a [`DispatcherCommand`] node.
//!
//! ```
//! use cmdtree::{Arguments, Command, CommandContext, Parameter};
//!
//! let give = Command::new("give")
//!     .alias("g")
//!     .describe("Give items to a player")
//!     .parameter(Parameter::positional::<String>("player"))
//!     .parameter(Parameter::positional::<String>("item"))
//!     .parameter(Parameter::positional::<i32>("amount").optional().default_literal("1"))
//!     .handler(|args: &Arguments, _ctx: &CommandContext| {
//!         Ok::<_, anyhow::Error>(*args.get_required::<i32>("amount")?)
//!     });
//! assert_eq!(give.name(), "give");
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use generational_arena::Index;
use serde::Serialize;

use crate::context::CommandContext;
use crate::error::DeclarationError;
use crate::filter::Filter;
use crate::group::ParameterGroup;
use crate::handler::{erase, FnHandler, Handler, HandlerFn, IntoHandlerResult};
use crate::hooks::Hooks;
use crate::parameter::Parameter;
use crate::value::Arguments;

/// Builder for one command and its sub-commands.
pub struct Command {
    name: String,
    aliases: Vec<String>,
    description: Option<String>,
    parameters: Vec<Parameter>,
    handler: Option<HandlerFn>,
    filter: Option<Rc<dyn Filter>>,
    hooks: Hooks,
    subcommands: Vec<Command>,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            description: None,
            parameters: Vec::new(),
            handler: None,
            filter: None,
            hooks: Hooks::new(),
            subcommands: Vec::new(),
        }
    }

    /// Adds an alternative name.
    ///
    /// An alias starting with `/` is bound at the top level of the dispatcher
    /// instead of next to the command.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Sets a closure handler.
    pub fn handler<F, T, R>(self, f: F) -> Self
    where
        F: FnMut(&Arguments, &CommandContext) -> R + 'static,
        R: IntoHandlerResult<T> + 'static,
        T: Serialize + 'static,
    {
        self.handle_with(FnHandler::new(f))
    }

    /// Sets a [`Handler`] implementation.
    pub fn handle_with<H: Handler + 'static>(mut self, handler: H) -> Self {
        self.handler = Some(erase(handler));
        self
    }

    pub(crate) fn handler_fn(mut self, handler: HandlerFn) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Restricts who may run (and see) the command and its sub-commands.
    pub fn filter<F: Filter + 'static>(mut self, filter: F) -> Self {
        self.filter = Some(Rc::new(filter));
        self
    }

    pub fn hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn subcommand(mut self, command: Command) -> Self {
        self.subcommands.push(command);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Validates the whole declaration before anything is registered.
    pub(crate) fn prepare(self) -> Result<Prepared, DeclarationError> {
        validate_label(&self.name)?;
        for alias in &self.aliases {
            validate_label(alias.strip_prefix('/').unwrap_or(alias))?;
        }
        let parameters = ParameterGroup::builder().params(self.parameters).build()?;
        let children = self
            .subcommands
            .into_iter()
            .map(Command::prepare)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Prepared {
            node: DispatcherCommand {
                descriptor: CommandDescriptor {
                    name: self.name,
                    aliases: self.aliases,
                    description: self.description,
                },
                parameters,
                handler: self.handler,
                filter: self.filter,
                hooks: self.hooks,
                children: BTreeMap::new(),
                bindings: Vec::new(),
            },
            children,
        })
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("parameters", &self.parameters.len())
            .field("handler", &self.handler.is_some())
            .field("subcommands", &self.subcommands)
            .finish_non_exhaustive()
    }
}

fn validate_label(label: &str) -> Result<(), DeclarationError> {
    if label.is_empty() || label.chars().any(char::is_whitespace) {
        return Err(DeclarationError::InvalidCommandName(label.to_string()));
    }
    Ok(())
}

/// A validated command, ready to be inserted into the tree.
#[derive(Debug)]
pub(crate) struct Prepared {
    pub(crate) node: DispatcherCommand,
    pub(crate) children: Vec<Prepared>,
}

/// Name, aliases and description of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDescriptor {
    pub name: String,
    pub aliases: Vec<String>,
    pub description: Option<String>,
}

/// An edge from a node to a child, under the label it was registered with.
#[derive(Debug, Clone)]
pub(crate) struct Binding {
    pub(crate) label: String,
    pub(crate) node: Index,
}

/// A node of the command tree.
///
/// Nodes with a handler match their parameter group against the rest of the
/// line; nodes with children route on the next token first.
pub struct DispatcherCommand {
    pub(crate) descriptor: CommandDescriptor,
    pub(crate) parameters: ParameterGroup,
    pub(crate) handler: Option<HandlerFn>,
    pub(crate) filter: Option<Rc<dyn Filter>>,
    pub(crate) hooks: Hooks,
    /// Lowercased name or alias -> child
    pub(crate) children: BTreeMap<String, Binding>,
    /// Every (parent, key) this node is bound under
    pub(crate) bindings: Vec<(Index, String)>,
}

impl DispatcherCommand {
    pub(crate) fn root() -> Self {
        Self {
            descriptor: CommandDescriptor {
                name: String::new(),
                aliases: Vec::new(),
                description: None,
            },
            parameters: ParameterGroup::empty(),
            handler: None,
            filter: None,
            hooks: Hooks::new(),
            children: BTreeMap::new(),
            bindings: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.descriptor.aliases
    }

    pub fn description(&self) -> Option<&str> {
        self.descriptor.description.as_deref()
    }

    pub fn descriptor(&self) -> &CommandDescriptor {
        &self.descriptor
    }

    pub fn parameters(&self) -> &ParameterGroup {
        &self.parameters
    }

    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }

    /// Labels of the children, sorted case-insensitively.
    pub fn child_labels(&self) -> Vec<&str> {
        self.children
            .values()
            .map(|binding| binding.label.as_str())
            .collect()
    }

    pub(crate) fn child(&self, label: &str) -> Option<Index> {
        self.children
            .get(&label.to_lowercase())
            .map(|binding| binding.node)
    }
}

impl fmt::Debug for DispatcherCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatcherCommand")
            .field("descriptor", &self.descriptor)
            .field("parameters", &self.parameters)
            .field("handler", &self.handler.is_some())
            .field("filter", &self.filter.is_some())
            .field("hooks", &self.hooks)
            .field("children", &self.child_labels())
            .finish()
    }
}
