//! The command tree: registration, routing, execution and completion.
//!
//! # Execution
//!
//! ```text
//! line
//!   → tokenize
//!   → route: descend while the next token names a child (filters checked)
//!   → node with handler:  match parameters → pre-dispatch hooks → handler → post-dispatch hooks
//!     node without one:   fallback (default: CommandNotFound)
//!   → errors go through the exception handler (default: returned unchanged)
//! ```
//!
//! # Registration
//!
//! Names and aliases are matched case-insensitively. Registering under a key
//! that is already bound replaces the binding; a replaced command that is no
//! longer bound anywhere is dropped together with its sub-commands.
//!
//! ```
//! use cmdtree::{Arguments, Command, CommandContext, Dispatcher, Parameter};
//!
//! let mut dispatcher = Dispatcher::new();
//! dispatcher.add_command(
//!     Command::new("add")
//!         .parameter(Parameter::positional::<i32>("a"))
//!         .parameter(Parameter::positional::<i32>("b"))
//!         .handler(|args: &Arguments, _ctx: &CommandContext| {
//!             Ok::<_, anyhow::Error>(args.get_required::<i32>("a")? + args.get_required::<i32>("b")?)
//!         }),
//! )?;
//!
//! let outcome = dispatcher.execute("ADD 2 40")?;
//! assert_eq!(outcome.data(), Some(&serde_json::json!(42)));
//! assert_eq!(dispatcher.get_suggestions("a"), vec!["add".to_string()]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::fmt;
use std::rc::Rc;

use generational_arena::{Arena, Index};
use tracing::{debug, instrument, trace};

use crate::command::{Binding, Command, DispatcherCommand, Prepared};
use crate::context::{CommandContext, Extensions};
use crate::error::{CommandError, DeclarationError};
use crate::handler::Outcome;
use crate::invocation::CommandInvocation;
use crate::provider::{starts_with_ignore_case, ProviderManager};
use crate::value::Arguments;

pub type ExceptionHandlerFn =
    Rc<dyn Fn(CommandError, &CommandInvocation) -> Result<Outcome, CommandError>>;

pub type FallbackFn = Rc<dyn Fn(&CommandInvocation) -> Result<Outcome, CommandError>>;

/// Root of a command tree.
pub struct Dispatcher {
    nodes: Arena<DispatcherCommand>,
    root: Index,
    providers: Rc<ProviderManager>,
    app_state: Rc<Extensions>,
    exception_handler: ExceptionHandlerFn,
    fallback: FallbackFn,
}

impl Dispatcher {
    /// Creates an empty dispatcher with the built-in value providers.
    pub fn new() -> Self {
        Self::with_providers(ProviderManager::new())
    }

    pub fn with_providers(providers: ProviderManager) -> Self {
        let mut nodes = Arena::new();
        let root = nodes.insert(DispatcherCommand::root());
        Self {
            nodes,
            root,
            providers: Rc::new(providers),
            app_state: Rc::new(Extensions::new()),
            exception_handler: Rc::new(
                |err: CommandError, _inv: &CommandInvocation| -> Result<Outcome, CommandError> {
                    Err(err)
                },
            ),
            fallback: Rc::new(|inv: &CommandInvocation| -> Result<Outcome, CommandError> {
                let name = match inv.current_token() {
                    Some(token) => token.text.clone(),
                    None => inv.labels().join(" "),
                };
                Err(CommandError::CommandNotFound { name })
            }),
        }
    }

    /// Sets the state shared with every handler through
    /// [`CommandContext::app_state`].
    pub fn with_app_state(mut self, app_state: Extensions) -> Self {
        self.app_state = Rc::new(app_state);
        self
    }

    pub fn providers(&self) -> &ProviderManager {
        &self.providers
    }

    /// Mutable access to the provider registry, for registering custom types.
    pub fn providers_mut(&mut self) -> &mut ProviderManager {
        Rc::make_mut(&mut self.providers)
    }

    /// Installs the handler that receives every error raised by
    /// [`execute`](Self::execute). Returning `Err` declines (or replaces) the
    /// error.
    pub fn exception_handler<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(CommandError, &CommandInvocation) -> Result<Outcome, CommandError> + 'static,
    {
        self.exception_handler = Rc::new(handler);
        self
    }

    /// Installs what runs when routing stops at a node without a handler.
    pub fn fallback<F>(&mut self, fallback: F) -> &mut Self
    where
        F: Fn(&CommandInvocation) -> Result<Outcome, CommandError> + 'static,
    {
        self.fallback = Rc::new(fallback);
        self
    }

    /// Registers a top-level command.
    pub fn add_command(&mut self, command: Command) -> Result<(), DeclarationError> {
        let root = self.root;
        self.register(root, command)
    }

    /// Registers a command below the command at `parent` (a space-separated
    /// path of names or aliases).
    pub fn add_command_at(
        &mut self,
        parent: &str,
        command: Command,
    ) -> Result<(), DeclarationError> {
        let parent_index = self
            .resolve(parent)
            .map(|(index, _)| index)
            .ok_or_else(|| DeclarationError::UnknownParent(parent.to_string()))?;
        self.register(parent_index, command)
    }

    /// Registers several top-level commands. Nothing is registered if any of
    /// them is invalid.
    pub fn add_commands<I>(&mut self, commands: I) -> Result<(), DeclarationError>
    where
        I: IntoIterator<Item = Command>,
    {
        let prepared = commands
            .into_iter()
            .map(Command::prepare)
            .collect::<Result<Vec<_>, _>>()?;
        let root = self.root;
        for command in prepared {
            self.insert(root, command);
        }
        Ok(())
    }

    #[instrument(level = "debug", skip(self, command), fields(command = command.name()))]
    fn register(&mut self, parent: Index, command: Command) -> Result<(), DeclarationError> {
        let prepared = command.prepare()?;
        self.insert(parent, prepared);
        Ok(())
    }

    /// Inserts a prepared subtree under `parent`. Skipped when `parent` was
    /// freed earlier in the same registration, which happens when a
    /// sibling's `/alias` replaced it at the root.
    fn insert(&mut self, parent: Index, prepared: Prepared) -> Option<Index> {
        if !self.nodes.contains(parent) {
            debug!(command = prepared.node.name(), "parent was replaced, skipping");
            return None;
        }
        let Prepared { node, children } = prepared;
        let name = node.descriptor.name.clone();
        let aliases = node.descriptor.aliases.clone();
        let index = self.nodes.insert(node);

        self.bind(parent, &name, index);
        for alias in &aliases {
            match alias.strip_prefix('/') {
                Some(global) => {
                    let root = self.root;
                    self.bind(root, global, index);
                }
                None => self.bind(parent, alias, index),
            }
        }
        for child in children {
            self.insert(index, child);
        }
        Some(index)
    }

    fn bind(&mut self, parent: Index, label: &str, node: Index) {
        let key = label.to_lowercase();
        let binding = Binding {
            label: label.to_string(),
            node,
        };
        let previous = match self.nodes.get_mut(parent) {
            Some(parent_node) => parent_node.children.insert(key.clone(), binding),
            None => return,
        };

        match previous {
            Some(previous) if previous.node == node => {}
            previous => {
                if let Some(child) = self.nodes.get_mut(node) {
                    child.bindings.push((parent, key.clone()));
                }
                if let Some(previous) = previous {
                    debug!(label, "replacing existing binding");
                    self.unbind(previous.node, parent, &key);
                }
            }
        }
    }

    /// Forgets that `node` is bound under `key` in `parent`; frees it when no
    /// binding is left.
    fn unbind(&mut self, node: Index, parent: Index, key: &str) {
        let orphaned = match self.nodes.get_mut(node) {
            Some(child) => {
                child
                    .bindings
                    .retain(|(p, k)| !(*p == parent && k.as_str() == key));
                child.bindings.is_empty()
            }
            None => false,
        };
        if orphaned {
            self.free(node);
        }
    }

    fn free(&mut self, node: Index) {
        let Some(removed) = self.nodes.remove(node) else {
            return;
        };
        trace!(command = removed.name(), "freeing command");
        for (key, binding) in removed.children {
            self.unbind(binding.node, node, &key);
        }
    }

    /// Removes the command at `path` together with every other name and
    /// alias it is bound under. Returns false if nothing is registered there.
    pub fn remove_command(&mut self, path: &str) -> bool {
        let Some((index, _)) = self.resolve(path) else {
            return false;
        };
        if index == self.root {
            return false;
        }

        let bindings = self
            .nodes
            .get(index)
            .map(|node| node.bindings.clone())
            .unwrap_or_default();
        for (parent, key) in bindings {
            if let Some(parent_node) = self.nodes.get_mut(parent) {
                if parent_node
                    .children
                    .get(&key)
                    .is_some_and(|binding| binding.node == index)
                {
                    parent_node.children.remove(&key);
                }
            }
        }
        self.free(index);
        debug!(path, "removed command");
        true
    }

    /// Looks up a command by its space-separated path of names or aliases.
    pub fn get_command(&self, path: &str) -> Option<&DispatcherCommand> {
        let (index, _) = self.resolve(path)?;
        if index == self.root {
            return None;
        }
        self.nodes.get(index)
    }

    /// Walks `path` from the root; also returns the canonical names on the way.
    fn resolve(&self, path: &str) -> Option<(Index, Vec<String>)> {
        let mut index = self.root;
        let mut names = Vec::new();
        for label in path.split_whitespace() {
            index = self.nodes.get(index)?.child(label)?;
            names.push(self.nodes.get(index)?.name().to_string());
        }
        Some((index, names))
    }

    /// Number of live commands, including the root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Executes `line` with empty per-line state.
    pub fn execute(&self, line: &str) -> Result<Outcome, CommandError> {
        self.execute_with(line, Extensions::new())
    }

    /// Executes `line`; `extensions` becomes the per-line
    /// [`CommandContext::extensions`].
    #[instrument(level = "debug", skip(self, extensions))]
    pub fn execute_with(&self, line: &str, extensions: Extensions) -> Result<Outcome, CommandError> {
        let context = CommandContext::new(Rc::clone(&self.app_state), extensions);
        let mut inv = CommandInvocation::new(line, Rc::clone(&self.providers), context);
        match self.dispatch(&mut inv) {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                debug!(error = %err, "command failed");
                (self.exception_handler)(err, &inv)
            }
        }
    }

    fn dispatch(&self, inv: &mut CommandInvocation) -> Result<Outcome, CommandError> {
        let mut index = self.root;
        while let Some(child) = inv
            .current_token()
            .and_then(|token| self.nodes.get(index)?.child(token.as_str()))
        {
            let Some(node) = self.nodes.get(child) else {
                break;
            };
            if let Some(filter) = &node.filter {
                filter.run(inv)?;
            }
            inv.enter_subcommand();
            index = child;
        }

        let Some(node) = self.nodes.get(index) else {
            return (self.fallback)(inv);
        };
        let Some(handler) = &node.handler else {
            debug!(labels = ?inv.labels(), "no handler at routed command");
            return (self.fallback)(inv);
        };

        node.parameters.parse(inv)?;
        let args = Arguments::new(inv.take_parsed());
        let path = inv.labels().to_vec();
        inv.context_mut().command_path = path;
        debug!(command = node.name(), arguments = args.len(), "dispatching");

        node.hooks.run_pre_dispatch(&args, inv.context_mut())?;
        let outcome = {
            let mut handler = handler
                .try_borrow_mut()
                .map_err(|_| anyhow::anyhow!("handler of '{}' is already running", node.name()))?;
            (&mut *handler)(&args, inv.context())?
        };

        match outcome {
            Outcome::Rendered(data) => Ok(Outcome::Rendered(node.hooks.run_post_dispatch(
                &args,
                inv.context(),
                data,
            )?)),
            Outcome::Silent => Ok(Outcome::Silent),
        }
    }

    /// Completion candidates for the last token of `line`.
    pub fn get_suggestions(&self, line: &str) -> Vec<String> {
        self.get_suggestions_with(line, Extensions::new())
    }

    /// Like [`get_suggestions`](Self::get_suggestions), with per-line state
    /// for filters. Commands and parameters whose filter rejects are left out.
    #[instrument(level = "debug", skip(self, extensions))]
    pub fn get_suggestions_with(&self, line: &str, extensions: Extensions) -> Vec<String> {
        let context = CommandContext::new(Rc::clone(&self.app_state), extensions);
        let mut inv = CommandInvocation::for_completion(line, Rc::clone(&self.providers), context);
        let mut suggestions = Vec::new();
        let mut index = self.root;

        while let Some(node) = self.nodes.get(index) {
            match inv.remaining() {
                0 => {
                    suggestions.extend(self.visible_children(node, &inv, ""));
                    break;
                }
                1 => {
                    let prefix = inv.current_token().map_or("", |token| token.as_str());
                    suggestions.extend(self.visible_children(node, &inv, prefix));
                    if node.handler.is_some() {
                        node.parameters.suggest(&mut inv);
                        suggestions.extend(inv.take_suggestions());
                    }
                    break;
                }
                _ => {
                    let child = inv
                        .current_token()
                        .and_then(|token| node.child(token.as_str()))
                        .filter(|&child| self.is_visible(child, &inv));
                    match child {
                        Some(child) => {
                            inv.enter_subcommand();
                            index = child;
                        }
                        None => {
                            if node.handler.is_some() {
                                node.parameters.suggest(&mut inv);
                                suggestions.extend(inv.take_suggestions());
                            }
                            break;
                        }
                    }
                }
            }
        }

        let mut seen = std::collections::HashSet::new();
        suggestions.retain(|s| seen.insert(s.clone()));
        suggestions
    }

    fn is_visible(&self, index: Index, inv: &CommandInvocation) -> bool {
        match self.nodes.get(index) {
            Some(node) => node
                .filter
                .as_ref()
                .map_or(true, |filter| filter.run(inv).is_ok()),
            None => false,
        }
    }

    fn visible_children(
        &self,
        node: &DispatcherCommand,
        inv: &CommandInvocation,
        prefix: &str,
    ) -> Vec<String> {
        node.children
            .values()
            .filter(|binding| starts_with_ignore_case(&binding.label, prefix))
            .filter(|binding| self.is_visible(binding.node, inv))
            .map(|binding| binding.label.clone())
            .collect()
    }

    /// `path` followed by the command's usage string, or `None` if no command
    /// is registered there.
    pub fn usage(&self, path: &str) -> Option<String> {
        let (index, names) = self.resolve(path)?;
        if index == self.root {
            return None;
        }
        let node = self.nodes.get(index)?;
        Some(format_usage(&names.join(" "), &node.parameters.usage()))
    }

    /// One aligned line per command with a handler: usage, then description.
    ///
    /// Commands are listed under their canonical names, depth-first and
    /// alphabetically.
    pub fn help_lines(&self) -> Vec<String> {
        let mut entries = Vec::new();
        self.collect_help(self.root, &mut Vec::new(), &mut entries);

        let width = entries
            .iter()
            .map(|(usage, _)| usage.chars().count())
            .max()
            .unwrap_or(0);
        entries
            .into_iter()
            .map(|(usage, description)| match description {
                Some(description) => format!("{usage:<width$}  {description}"),
                None => usage,
            })
            .collect()
    }

    fn collect_help(
        &self,
        index: Index,
        path: &mut Vec<String>,
        entries: &mut Vec<(String, Option<String>)>,
    ) {
        let Some(node) = self.nodes.get(index) else {
            return;
        };
        for (key, binding) in &node.children {
            let Some(child) = self.nodes.get(binding.node) else {
                continue;
            };
            // Aliases point at nodes listed under their name already.
            if child.name().to_lowercase() != *key {
                continue;
            }
            path.push(child.name().to_string());
            if child.has_handler() {
                entries.push((
                    format_usage(&path.join(" "), &child.parameters.usage()),
                    child.description().map(str::to_string),
                ));
            }
            self.collect_help(binding.node, path, entries);
            path.pop();
        }
    }
}

fn format_usage(path: &str, parameters: &str) -> String {
    if parameters.is_empty() {
        path.to_string()
    } else {
        format!("{path} {parameters}")
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let root = self.nodes.get(self.root);
        f.debug_struct("Dispatcher")
            .field("commands", &root.map(DispatcherCommand::child_labels))
            .field("nodes", &self.nodes.len())
            .field("providers", &self.providers)
            .finish_non_exhaustive()
    }
}
