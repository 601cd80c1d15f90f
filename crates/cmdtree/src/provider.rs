//! Value providers: readers, completers and defaults keyed by value type.
//!
//! Every non-literal parameter value goes through the [`ProviderManager`]:
//!
//! - **reader**: converts command line text into a [`Value`]
//! - **completer**: proposes strings for a partially typed argument
//! - **default**: synthesizes a value for an omitted optional parameter
//!
//! Lookups fall back along declared assignable types: if no provider is
//! registered for a type, the providers of the types it was declared
//! assignable to are searched breadth-first. The resolution is cached.
//!
//! ```
//! use cmdtree::{ProviderManager, ValueType};
//!
//! let providers = ProviderManager::new();
//! assert_eq!(providers.type_named("int"), Some(ValueType::of::<i32>()));
//! ```

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use tracing::trace;

use crate::error::ReadError;
use crate::invocation::CommandInvocation;
use crate::value::{Value, ValueType};

pub type ReadFn = Rc<dyn Fn(&str, &CommandInvocation) -> Result<Value, ReadError>>;
pub type CompleteFn = Rc<dyn Fn(&str, &CommandInvocation) -> Vec<String>>;
pub type DefaultFn = Rc<dyn Fn(&CommandInvocation) -> Result<Value, ReadError>>;

/// Reader, completer and default for one value type.
#[derive(Clone)]
pub struct Provider {
    label: String,
    reader: ReadFn,
    completer: Option<CompleteFn>,
    default: Option<DefaultFn>,
}

impl Provider {
    /// Creates a provider; `label` names the type in error messages.
    pub fn new<F>(label: impl Into<String>, reader: F) -> Self
    where
        F: Fn(&str, &CommandInvocation) -> Result<Value, ReadError> + 'static,
    {
        Self {
            label: label.into(),
            reader: Rc::new(reader),
            completer: None,
            default: None,
        }
    }

    /// Creates a provider that reads values through [`FromStr`].
    pub fn parsed<T>(label: impl Into<String>) -> Self
    where
        T: FromStr + 'static,
        T::Err: fmt::Display,
    {
        let label = label.into();
        let expected = label.clone();
        Self::new(label, move |text: &str, _inv: &CommandInvocation| {
            text.parse::<T>()
                .map(Value::new)
                .map_err(|e| ReadError::new(text, expected.clone(), e.to_string()))
        })
    }

    pub fn with_completer<F>(mut self, completer: F) -> Self
    where
        F: Fn(&str, &CommandInvocation) -> Vec<String> + 'static,
    {
        self.completer = Some(Rc::new(completer));
        self
    }

    pub fn with_default<F>(mut self, default: F) -> Self
    where
        F: Fn(&CommandInvocation) -> Result<Value, ReadError> + 'static,
    {
        self.default = Some(Rc::new(default));
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("label", &self.label)
            .field("completer", &self.completer.is_some())
            .field("default", &self.default.is_some())
            .finish()
    }
}

/// Registry of [`Provider`]s.
#[derive(Clone)]
pub struct ProviderManager {
    providers: HashMap<ValueType, Provider>,
    names: HashMap<String, ValueType>,
    assignable: HashMap<ValueType, Vec<ValueType>>,
    named_defaults: HashMap<String, DefaultFn>,
    resolved: RefCell<HashMap<ValueType, Option<ValueType>>>,
}

impl ProviderManager {
    /// Creates a manager with providers for strings, booleans, characters and
    /// the common numeric types.
    ///
    /// | name | type |
    /// |------|------|
    /// | `string` | `String` |
    /// | `bool` | `bool` |
    /// | `char` | `char` |
    /// | `int` | `i32` |
    /// | `long` | `i64` |
    /// | `uint` | `u32` |
    /// | `float` | `f32` |
    /// | `double` | `f64` |
    pub fn new() -> Self {
        let mut manager = Self::empty();
        manager.register_named::<String>(
            "string",
            Provider::new("string", |text: &str, _inv: &CommandInvocation| {
                Ok(Value::new(text.to_string()))
            }),
        );
        manager.register_named::<bool>(
            "bool",
            Provider::new("boolean", read_bool).with_completer(|_prefix, _inv| {
                vec!["true".to_string(), "false".to_string()]
            }),
        );
        manager.register_named::<char>("char", Provider::parsed::<char>("character"));
        manager.register_named::<i32>("int", Provider::parsed::<i32>("integer"));
        manager.register_named::<i64>("long", Provider::parsed::<i64>("integer"));
        manager.register_named::<u32>("uint", Provider::parsed::<u32>("positive integer"));
        manager.register_named::<f32>("float", Provider::parsed::<f32>("number"));
        manager.register_named::<f64>("double", Provider::parsed::<f64>("number"));
        manager
    }

    /// Creates a manager without any providers.
    pub fn empty() -> Self {
        Self {
            providers: HashMap::new(),
            names: HashMap::new(),
            assignable: HashMap::new(),
            named_defaults: HashMap::new(),
            resolved: RefCell::new(HashMap::new()),
        }
    }

    /// Registers (or replaces) the provider for `T`.
    pub fn register<T: 'static>(&mut self, provider: Provider) -> &mut Self {
        self.register_type(ValueType::of::<T>(), provider)
    }

    /// Registers the provider for `T` and makes the type available under
    /// `name` for declarative command files.
    pub fn register_named<T: 'static>(&mut self, name: &str, provider: Provider) -> &mut Self {
        self.names.insert(name.to_lowercase(), ValueType::of::<T>());
        self.register::<T>(provider)
    }

    pub fn register_type(&mut self, value_type: ValueType, provider: Provider) -> &mut Self {
        self.providers.insert(value_type, provider);
        self.resolved.borrow_mut().clear();
        self
    }

    /// Declares that values of `sub` may be handled by the provider of `sup`
    /// when `sub` has none of its own.
    pub fn register_assignable(&mut self, sub: ValueType, sup: ValueType) -> &mut Self {
        self.assignable.entry(sub).or_default().push(sup);
        self.resolved.borrow_mut().clear();
        self
    }

    /// Registers a default provider that parameters refer to by `id`.
    pub fn register_default<F>(&mut self, id: &str, default: F) -> &mut Self
    where
        F: Fn(&CommandInvocation) -> Result<Value, ReadError> + 'static,
    {
        self.named_defaults.insert(id.to_string(), Rc::new(default));
        self
    }

    /// Looks up a value type by its registered name (case-insensitive).
    pub fn type_named(&self, name: &str) -> Option<ValueType> {
        self.names.get(&name.to_lowercase()).copied()
    }

    /// Resolves the provider for `value_type`, following assignable types.
    pub fn provider(&self, value_type: ValueType) -> Option<&Provider> {
        let resolved = self.resolve(value_type)?;
        self.providers.get(&resolved)
    }

    /// Reads `text` as a value of `value_type`.
    pub fn read(
        &self,
        value_type: ValueType,
        text: &str,
        inv: &CommandInvocation,
    ) -> Result<Value, ReadError> {
        match self.provider(value_type) {
            Some(provider) => (provider.reader)(text, inv),
            None => Err(ReadError::new(
                text,
                value_type.short_name(),
                "no reader registered for this type",
            )),
        }
    }

    /// Completion candidates for a partially typed value, filtered by
    /// `prefix` (case-insensitive).
    pub fn complete(
        &self,
        value_type: ValueType,
        prefix: &str,
        inv: &CommandInvocation,
    ) -> Vec<String> {
        let Some(completer) = self
            .provider(value_type)
            .and_then(|provider| provider.completer.as_ref())
        else {
            return Vec::new();
        };
        completer(prefix, inv)
            .into_iter()
            .filter(|candidate| starts_with_ignore_case(candidate, prefix))
            .collect()
    }

    /// The type-level default for `value_type`, if its provider has one.
    pub fn default_value(
        &self,
        value_type: ValueType,
        inv: &CommandInvocation,
    ) -> Option<Result<Value, ReadError>> {
        self.provider(value_type)
            .and_then(|provider| provider.default.as_ref())
            .map(|default| default(inv))
    }

    /// Runs the default provider registered under `id`.
    pub fn named_default(&self, id: &str, inv: &CommandInvocation) -> Result<Value, ReadError> {
        match self.named_defaults.get(id) {
            Some(default) => default(inv),
            None => Err(ReadError::new(
                id,
                "default provider",
                "no default provider registered under this id",
            )),
        }
    }

    fn resolve(&self, value_type: ValueType) -> Option<ValueType> {
        if let Some(cached) = self.resolved.borrow().get(&value_type) {
            return *cached;
        }

        let resolved = self.search(value_type);
        trace!(requested = %value_type, resolved = ?resolved, "resolved provider");
        self.resolved.borrow_mut().insert(value_type, resolved);
        resolved
    }

    fn search(&self, value_type: ValueType) -> Option<ValueType> {
        let mut queue = VecDeque::from([value_type]);
        let mut seen = HashSet::new();
        while let Some(candidate) = queue.pop_front() {
            if !seen.insert(candidate) {
                continue;
            }
            if self.providers.contains_key(&candidate) {
                return Some(candidate);
            }
            if let Some(supers) = self.assignable.get(&candidate) {
                queue.extend(supers.iter().copied());
            }
        }
        None
    }
}

impl Default for ProviderManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ProviderManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderManager")
            .field("providers", &self.providers.len())
            .field("names", &self.names.keys().collect::<Vec<_>>())
            .field("named_defaults", &self.named_defaults.len())
            .finish_non_exhaustive()
    }
}

fn read_bool(text: &str, _inv: &CommandInvocation) -> Result<Value, ReadError> {
    match text.to_lowercase().as_str() {
        "true" | "yes" | "on" => Ok(Value::new(true)),
        "false" | "no" | "off" => Ok(Value::new(false)),
        _ => Err(ReadError::new(text, "boolean", "expected true or false")),
    }
}

pub(crate) fn starts_with_ignore_case(candidate: &str, prefix: &str) -> bool {
    candidate.to_lowercase().starts_with(&prefix.to_lowercase())
}

pub(crate) fn eq_ignore_case(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}
