//! Type-erased parameter values.
//!
//! Parameters are declared with a [`ValueType`] and produce a [`Value`] once
//! their tokens have been read. Handlers get typed access back through
//! [`Arguments`], which keys parsed values by parameter name.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// Identifies the Rust type a parameter produces.
///
/// Equality and hashing only consider the [`TypeId`]; the name is kept for
/// diagnostics.
#[derive(Clone, Copy)]
pub struct ValueType {
    id: TypeId,
    name: &'static str,
}

impl ValueType {
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The full Rust type name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The type name without its module path (`alloc::string::String` -> `String`).
    pub fn short_name(&self) -> &'static str {
        let base = self.name.split('<').next().unwrap_or(self.name);
        base.rsplit("::").next().unwrap_or(base)
    }

    pub fn is<T: 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for ValueType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ValueType {}

impl Hash for ValueType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValueType({})", self.name)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// A parsed parameter value.
///
/// Cloning is cheap: the payload is reference counted.
#[derive(Clone)]
pub struct Value {
    inner: Rc<dyn Any>,
    value_type: ValueType,
}

impl Value {
    pub fn new<T: 'static>(value: T) -> Self {
        Self {
            inner: Rc::new(value),
            value_type: ValueType::of::<T>(),
        }
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn is<T: 'static>(&self) -> bool {
        self.inner.is::<T>()
    }

    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.inner.downcast_ref()
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Value")
            .field("type", &self.value_type.short_name())
            .finish_non_exhaustive()
    }
}

/// One matched parameter.
#[derive(Debug, Clone)]
pub struct ParsedParameter {
    /// Name of the parameter that produced the value, if any
    pub name: Option<String>,
    pub value: Value,
    /// The command line text the value was read from. `None` for composite
    /// values and for defaults synthesized by a provider.
    pub raw: Option<String>,
}

impl ParsedParameter {
    pub fn new(name: impl Into<String>, value: Value, raw: Option<String>) -> Self {
        Self {
            name: Some(name.into()),
            value,
            raw,
        }
    }
}

/// Parsed values of a command, keyed by parameter name.
///
/// This is what handlers receive, and also the composite value produced by
/// group parameters.
///
/// ```
/// use cmdtree::{Arguments, ParsedParameter, Value};
///
/// let args = Arguments::new(vec![
///     ParsedParameter::new("amount", Value::new(64i32), Some("64".into())),
///     ParsedParameter::new("force", Value::new(true), Some("-f".into())),
/// ]);
/// assert_eq!(args.get::<i32>("amount"), Some(&64));
/// assert!(args.flag("force"));
/// assert!(!args.flag("silent"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    entries: Vec<ParsedParameter>,
}

impl Arguments {
    pub fn new(entries: Vec<ParsedParameter>) -> Self {
        Self { entries }
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.entry(name).map(|entry| &entry.value)
    }

    /// Returns the value of `name` if it was matched (or defaulted) and has type `T`.
    pub fn get<T: 'static>(&self, name: &str) -> Option<&T> {
        self.value(name).and_then(Value::downcast_ref)
    }

    /// Like [`get`](Self::get), but reports a missing or mistyped value as an error.
    pub fn get_required<T: 'static>(&self, name: &str) -> Result<&T, anyhow::Error> {
        self.get::<T>(name).ok_or_else(|| {
            anyhow::anyhow!(
                "argument missing: '{}' of type {} not found",
                name,
                std::any::type_name::<T>()
            )
        })
    }

    /// Returns true if the flag `name` was given.
    pub fn flag(&self, name: &str) -> bool {
        self.get::<bool>(name).copied().unwrap_or(false)
    }

    /// The command line text `name` was read from.
    pub fn raw(&self, name: &str) -> Option<&str> {
        self.entry(name).and_then(|entry| entry.raw.as_deref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entry(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParsedParameter> {
        self.entries.iter()
    }

    pub fn into_inner(self) -> Vec<ParsedParameter> {
        self.entries
    }

    fn entry(&self, name: &str) -> Option<&ParsedParameter> {
        self.entries
            .iter()
            .find(|entry| entry.name.as_deref() == Some(name))
    }
}
