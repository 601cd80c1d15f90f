//! Declarative command files.
//!
//! A command tree can be described in YAML instead of builder calls.
//! Handlers are referenced by key and looked up in a [`HandlerRegistry`];
//! value types are referenced by the names registered with the
//! [`ProviderManager`] (`string`, `int`, `bool`, ...).
//!
//! ```yaml
//! commands:
//!   - name: give
//!     aliases: [g]
//!     description: Give items to a player
//!     handler: give
//!     parameters:
//!       - name: player
//!       - name: item
//!       - name: amount
//!         type: int
//!         required: false
//!         default: "1"
//!       - name: silent
//!         flag: { short: s, long: silent }
//!   - name: time
//!     children:
//!       - name: set
//!         handler: time_set
//!         parameters:
//!           - name: when
//!             choices: [day, night, noon]
//! ```
//!
//! Parameter fields:
//!
//! | field | meaning |
//! |-------|---------|
//! | `name` | argument name handlers look up |
//! | `type` | registered value type name, default `string` |
//! | `greed` | token count, or `infinite` |
//! | `required` | defaults to `true` except for flags |
//! | `default` | literal text, or `provider:<id>` for a registered default provider |
//! | `flag` / `named` / `choices` / `group` | at most one; none means positional |

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::command::Command;
use crate::context::CommandContext;
use crate::dispatcher::Dispatcher;
use crate::error::DeclarationError;
use crate::group::ParameterGroup;
use crate::handler::{erase, FnHandler, Handler, HandlerFn, IntoHandlerResult};
use crate::parameter::{DefaultValue, Greed, Parameter};
use crate::provider::ProviderManager;
use crate::value::Arguments;

const PROVIDER_PREFIX: &str = "provider:";

/// Errors raised while loading a command file.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("invalid command file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("parameter '{parameter}' has unknown type '{type_name}'")]
    UnknownType {
        parameter: String,
        type_name: String,
    },

    #[error("command '{command}' refers to unknown handler '{handler}'")]
    UnknownHandler { command: String, handler: String },

    #[error("parameter '{0}' declares more than one of flag, named, choices and group")]
    AmbiguousKind(String),

    #[error("parameter '{parameter}': {message}")]
    InvalidGreed { parameter: String, message: String },

    #[error(transparent)]
    Declaration(#[from] DeclarationError),
}

/// A whole command file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandManifest {
    #[serde(default)]
    pub commands: Vec<CommandEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Key into the [`HandlerRegistry`]. Commands without one only route.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handler: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ParameterEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<CommandEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterEntry {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub greed: Option<GreedRaw>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag: Option<FlagEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub named: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<Vec<ParameterEntry>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FlagEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long: Option<String>,
}

/// `greed` as written: a number or the word `infinite`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GreedRaw {
    Count(usize),
    Word(String),
}

impl TryFrom<GreedRaw> for Greed {
    type Error = String;

    fn try_from(raw: GreedRaw) -> Result<Self, Self::Error> {
        match raw {
            GreedRaw::Count(0) => Err("greed must be at least 1".to_string()),
            GreedRaw::Count(n) => Ok(Greed::Count(n)),
            GreedRaw::Word(word) if word.eq_ignore_ascii_case("infinite") => Ok(Greed::Infinite),
            GreedRaw::Word(word) => Err(format!(
                "invalid greed '{}'. Expected a positive number or 'infinite'.",
                word
            )),
        }
    }
}

/// Handlers that command files refer to by key.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, HandlerFn>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a closure handler under `key`.
    pub fn register<F, T, R>(&mut self, key: impl Into<String>, f: F) -> &mut Self
    where
        F: FnMut(&Arguments, &CommandContext) -> R + 'static,
        R: IntoHandlerResult<T> + 'static,
        T: Serialize + 'static,
    {
        self.register_handler(key, FnHandler::new(f))
    }

    /// Registers a [`Handler`] implementation under `key`.
    pub fn register_handler<H: Handler + 'static>(
        &mut self,
        key: impl Into<String>,
        handler: H,
    ) -> &mut Self {
        self.handlers.insert(key.into(), erase(handler));
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.handlers.contains_key(key)
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    fn get(&self, key: &str) -> Option<HandlerFn> {
        self.handlers.get(key).cloned()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.keys())
            .finish()
    }
}

impl CommandManifest {
    pub fn from_yaml(yaml: &str) -> Result<Self, ManifestError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Turns the entries into command builders.
    pub fn into_commands(
        self,
        providers: &ProviderManager,
        handlers: &HandlerRegistry,
    ) -> Result<Vec<Command>, ManifestError> {
        self.commands
            .into_iter()
            .map(|entry| entry.into_command(providers, handlers))
            .collect()
    }
}

impl CommandEntry {
    pub fn into_command(
        self,
        providers: &ProviderManager,
        handlers: &HandlerRegistry,
    ) -> Result<Command, ManifestError> {
        let mut command = Command::new(&self.name);
        for alias in self.aliases {
            command = command.alias(alias);
        }
        if let Some(description) = self.description {
            command = command.describe(description);
        }
        if let Some(key) = self.handler {
            let handler = handlers
                .get(&key)
                .ok_or_else(|| ManifestError::UnknownHandler {
                    command: self.name.clone(),
                    handler: key.clone(),
                })?;
            command = command.handler_fn(handler);
        }
        for parameter in self.parameters {
            command = command.parameter(parameter.into_parameter(providers)?);
        }
        for child in self.children {
            command = command.subcommand(child.into_command(providers, handlers)?);
        }
        Ok(command)
    }
}

impl ParameterEntry {
    pub fn into_parameter(self, providers: &ProviderManager) -> Result<Parameter, ManifestError> {
        let kinds = [
            self.flag.is_some(),
            self.named.is_some(),
            self.choices.is_some(),
            self.group.is_some(),
        ];
        if kinds.iter().filter(|&&declared| declared).count() > 1 {
            return Err(ManifestError::AmbiguousKind(self.name));
        }

        let value_type = || {
            let type_name = self.value_type.as_deref().unwrap_or("string");
            providers
                .type_named(type_name)
                .ok_or_else(|| ManifestError::UnknownType {
                    parameter: self.name.clone(),
                    type_name: type_name.to_string(),
                })
        };

        let mut parameter = if let Some(flag) = &self.flag {
            let mut parameter = Parameter::flag(&self.name);
            if let Some(short) = &flag.short {
                parameter = parameter.short(short);
            }
            if let Some(long) = &flag.long {
                parameter = parameter.long(long);
            }
            parameter
        } else if let Some(names) = &self.named {
            let names: Vec<&str> = names.iter().map(String::as_str).collect();
            Parameter::named_of(&self.name, &names, value_type()?)
        } else if let Some(choices) = &self.choices {
            Parameter::choices(&self.name, choices.iter().cloned())
        } else if let Some(entries) = &self.group {
            let nested = entries
                .iter()
                .cloned()
                .map(|entry| entry.into_parameter(providers))
                .collect::<Result<Vec<_>, _>>()?;
            Parameter::group(&self.name, ParameterGroup::builder().params(nested).build()?)
        } else {
            Parameter::positional_of(&self.name, value_type()?)
        };

        if let Some(raw) = self.greed.clone() {
            parameter = match Greed::try_from(raw) {
                Ok(Greed::Count(n)) => parameter.greed(n),
                Ok(Greed::Infinite) => parameter.infinite(),
                Err(message) => {
                    return Err(ManifestError::InvalidGreed {
                        parameter: self.name,
                        message,
                    })
                }
            };
        }
        match self.required {
            Some(true) => parameter = parameter.required(),
            Some(false) => parameter = parameter.optional(),
            None => {}
        }
        if let Some(default) = &self.default {
            let default = match default.strip_prefix(PROVIDER_PREFIX) {
                Some(id) => DefaultValue::Provider(id.to_string()),
                None => DefaultValue::Literal(default.clone()),
            };
            parameter = parameter.with_default(Some(default));
        }
        if let Some(description) = &self.description {
            parameter = parameter.describe(description);
        }
        Ok(parameter)
    }
}

impl Dispatcher {
    /// Registers every command of a YAML command file.
    ///
    /// Returns the number of top-level commands registered. Nothing is
    /// registered when the file has an error.
    pub fn load_yaml(
        &mut self,
        yaml: &str,
        handlers: &HandlerRegistry,
    ) -> Result<usize, ManifestError> {
        let commands = CommandManifest::from_yaml(yaml)?.into_commands(self.providers(), handlers)?;
        let count = commands.len();
        self.add_commands(commands)?;
        debug!(count, "loaded command file");
        Ok(count)
    }
}
