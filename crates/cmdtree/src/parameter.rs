//! Parameter declarations and their per-kind matching behavior.
//!
//! A [`Parameter`] is one of five kinds:
//!
//! | Kind | Matches | Value |
//! |------|---------|-------|
//! | [`Flag`](ParameterKind::Flag) | `-f`, `--force` (any number of dashes) | `true` |
//! | [`Named`](ParameterKind::Named) | `--name <value...>` | read by the type's provider |
//! | [`Positional`](ParameterKind::Positional) | the next `greed` tokens | read by the type's provider |
//! | [`FixedValue`](ParameterKind::FixedValue) | one literal of a closed set | the literal's value |
//! | [`Group`](ParameterKind::Group) | a nested [`ParameterGroup`] | [`Arguments`] or an assembled value |
//!
//! Each kind answers three questions for the matching loop in
//! [`ParameterGroup`]: can it start matching at the cursor
//! ([`is_possible`](Parameter::is_possible)), what does it consume
//! ([`parse`](Parameter::parse)), and what could complete the token being typed
//! ([`suggestions`](Parameter::suggestions)).
//!
//! ```
//! use cmdtree::{Parameter, ParameterGroup};
//!
//! let group = ParameterGroup::builder()
//!     .param(Parameter::positional::<String>("player"))
//!     .param(Parameter::positional::<i32>("amount").optional().default_literal("1"))
//!     .param(Parameter::flag("silent").short("s"))
//!     .build()?;
//! assert_eq!(group.usage(), "<player> [amount] [-s]");
//! # Ok::<(), cmdtree::DeclarationError>(())
//! ```

use std::fmt;
use std::rc::Rc;

use crate::error::{CommandError, DeclarationError, FilterError, ReadError};
use crate::filter::Filter;
use crate::group::ParameterGroup;
use crate::invocation::CommandInvocation;
use crate::provider::{eq_ignore_case, starts_with_ignore_case};
use crate::value::{Arguments, ParsedParameter, Value, ValueType};

/// How many tokens a parameter consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Greed {
    /// Exactly this many tokens (at least one)
    Count(usize),
    /// Everything up to the end of the line
    Infinite,
}

impl Greed {
    /// Fewest tokens a match needs.
    pub fn min_tokens(&self) -> usize {
        match self {
            Greed::Count(n) => *n,
            Greed::Infinite => 1,
        }
    }

    pub fn is_infinite(&self) -> bool {
        matches!(self, Greed::Infinite)
    }
}

impl Default for Greed {
    fn default() -> Self {
        Greed::Count(1)
    }
}

/// Where an omitted parameter's value comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultValue {
    /// Command line text, read through the parameter type's reader
    Literal(String),
    /// The default registered with the parameter type's provider
    TypeDefault,
    /// A default provider registered under this id
    Provider(String),
}

pub type AssembleFn = Rc<dyn Fn(&Arguments) -> Result<Value, ReadError>>;

#[derive(Clone)]
pub enum ParameterKind {
    Flag {
        short: Option<String>,
        long: Option<String>,
    },
    Named {
        names: Vec<String>,
    },
    Positional,
    FixedValue {
        choices: Vec<(String, Value)>,
    },
    Group {
        group: Box<ParameterGroup>,
        assemble: Option<AssembleFn>,
    },
}

impl fmt::Debug for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterKind::Flag { short, long } => f
                .debug_struct("Flag")
                .field("short", short)
                .field("long", long)
                .finish(),
            ParameterKind::Named { names } => f.debug_struct("Named").field("names", names).finish(),
            ParameterKind::Positional => f.write_str("Positional"),
            ParameterKind::FixedValue { choices } => f
                .debug_struct("FixedValue")
                .field(
                    "choices",
                    &choices.iter().map(|(literal, _)| literal).collect::<Vec<_>>(),
                )
                .finish(),
            ParameterKind::Group { group, assemble } => f
                .debug_struct("Group")
                .field("group", group)
                .field("assemble", &assemble.is_some())
                .finish(),
        }
    }
}

/// A declared command parameter.
#[derive(Clone)]
pub struct Parameter {
    name: String,
    description: Option<String>,
    value_type: ValueType,
    greed: Greed,
    required: bool,
    default: Option<DefaultValue>,
    filter: Option<Rc<dyn Filter>>,
    kind: ParameterKind,
}

impl Parameter {
    /// Creates a parameter of any kind. Non-flag parameters are required
    /// until [`optional`](Self::optional) is called.
    pub fn new(name: impl Into<String>, kind: ParameterKind, value_type: ValueType) -> Self {
        let required = !matches!(kind, ParameterKind::Flag { .. });
        Self {
            name: name.into(),
            description: None,
            value_type,
            greed: Greed::default(),
            required,
            default: None,
            filter: None,
            kind,
        }
    }

    /// A boolean switch. Give it names with [`short`](Self::short) and
    /// [`long`](Self::long).
    pub fn flag(name: impl Into<String>) -> Self {
        Self::new(
            name,
            ParameterKind::Flag {
                short: None,
                long: None,
            },
            ValueType::of::<bool>(),
        )
    }

    /// An option introduced by one of `names` (e.g. `["--name", "-n"]`).
    pub fn named<T: 'static>(name: impl Into<String>, names: &[&str]) -> Self {
        Self::named_of(name, names, ValueType::of::<T>())
    }

    pub fn named_of(name: impl Into<String>, names: &[&str], value_type: ValueType) -> Self {
        let names = names.iter().map(|n| n.to_string()).collect();
        Self::new(name, ParameterKind::Named { names }, value_type)
    }

    pub fn positional<T: 'static>(name: impl Into<String>) -> Self {
        Self::positional_of(name, ValueType::of::<T>())
    }

    pub fn positional_of(name: impl Into<String>, value_type: ValueType) -> Self {
        Self::new(name, ParameterKind::Positional, value_type)
    }

    /// A positional restricted to the given literals. It consumes exactly one
    /// token; any other greed fails validation.
    ///
    /// ```
    /// use cmdtree::Parameter;
    ///
    /// #[derive(Debug, Clone, Copy, PartialEq)]
    /// enum Mode { Survival, Creative }
    ///
    /// let mode = Parameter::fixed("mode", [("survival", Mode::Survival), ("creative", Mode::Creative)]);
    /// assert_eq!(mode.usage(), "<survival|creative>");
    /// ```
    pub fn fixed<T, I, S>(name: impl Into<String>, choices: I) -> Self
    where
        T: 'static,
        I: IntoIterator<Item = (S, T)>,
        S: Into<String>,
    {
        let choices = choices
            .into_iter()
            .map(|(literal, value)| (literal.into(), Value::new(value)))
            .collect();
        Self::new(
            name,
            ParameterKind::FixedValue { choices },
            ValueType::of::<T>(),
        )
    }

    /// A positional restricted to the given literals, each producing itself as
    /// a `String`.
    pub fn choices<I, S>(name: impl Into<String>, literals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::fixed(
            name,
            literals.into_iter().map(|literal| {
                let literal: String = literal.into();
                (literal.clone(), literal)
            }),
        )
    }

    /// A nested group of parameters matched as one value of type [`Arguments`].
    pub fn group(name: impl Into<String>, group: ParameterGroup) -> Self {
        Self::new(
            name,
            ParameterKind::Group {
                group: Box::new(group),
                assemble: None,
            },
            ValueType::of::<Arguments>(),
        )
    }

    pub fn short(mut self, short: &str) -> Self {
        if let ParameterKind::Flag { short: slot, .. } = &mut self.kind {
            *slot = Some(short.trim_start_matches('-').to_string());
        }
        self
    }

    pub fn long(mut self, long: &str) -> Self {
        if let ParameterKind::Flag { long: slot, .. } = &mut self.kind {
            *slot = Some(long.trim_start_matches('-').to_string());
        }
        self
    }

    /// Number of tokens consumed. Zero is raised to one.
    pub fn greed(mut self, tokens: usize) -> Self {
        self.greed = Greed::Count(tokens.max(1));
        self
    }

    /// Consume every remaining token.
    pub fn infinite(mut self) -> Self {
        self.greed = Greed::Infinite;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn default_literal(mut self, text: impl Into<String>) -> Self {
        self.default = Some(DefaultValue::Literal(text.into()));
        self
    }

    pub fn default_provider(mut self, id: impl Into<String>) -> Self {
        self.default = Some(DefaultValue::Provider(id.into()));
        self
    }

    pub fn type_default(mut self) -> Self {
        self.default = Some(DefaultValue::TypeDefault);
        self
    }

    pub fn with_default(mut self, default: Option<DefaultValue>) -> Self {
        self.default = default;
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn filter<F: Filter + 'static>(mut self, filter: F) -> Self {
        self.filter = Some(Rc::new(filter));
        self
    }

    /// Folds a group's matched fields into a custom value.
    ///
    /// No effect on other kinds.
    pub fn assemble<T, F>(mut self, assemble: F) -> Self
    where
        T: 'static,
        F: Fn(&Arguments) -> Result<T, ReadError> + 'static,
    {
        if let ParameterKind::Group { assemble: slot, .. } = &mut self.kind {
            *slot = Some(Rc::new(move |args: &Arguments| assemble(args).map(Value::new)));
            self.value_type = ValueType::of::<T>();
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn greed_kind(&self) -> Greed {
        self.greed
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn default_value(&self) -> Option<&DefaultValue> {
        self.default.as_ref()
    }

    pub fn kind(&self) -> &ParameterKind {
        &self.kind
    }

    pub fn is_flag(&self) -> bool {
        matches!(self.kind, ParameterKind::Flag { .. })
    }

    pub fn is_named(&self) -> bool {
        matches!(self.kind, ParameterKind::Named { .. })
    }

    /// Fewest tokens a match of this parameter spans.
    pub(crate) fn min_tokens(&self) -> usize {
        match &self.kind {
            ParameterKind::Flag { .. } => 0,
            ParameterKind::Named { .. } => self.greed.min_tokens() + 1,
            ParameterKind::Positional => self.greed.min_tokens(),
            ParameterKind::FixedValue { .. } => 1,
            ParameterKind::Group { group, .. } => group.min_tokens().max(1),
        }
    }

    /// Returns true for the positional that may absorb the rest of the line.
    pub(crate) fn is_greedy_tail(&self) -> bool {
        matches!(self.kind, ParameterKind::Positional) && self.greed.is_infinite()
    }

    /// Checks the declaration for authoring mistakes.
    pub fn validate(&self) -> Result<(), DeclarationError> {
        match &self.kind {
            ParameterKind::Flag { short, long } => {
                let blank = |name: &Option<String>| name.as_deref().map_or(true, str::is_empty);
                if blank(short) && blank(long) {
                    return Err(DeclarationError::FlagWithoutName(self.name.clone()));
                }
            }
            ParameterKind::Named { names } => {
                if names.iter().all(|n| n.trim().is_empty()) {
                    return Err(DeclarationError::NamedWithoutName(self.name.clone()));
                }
            }
            ParameterKind::FixedValue { choices } => {
                if choices.is_empty() {
                    return Err(DeclarationError::EmptyChoices(self.name.clone()));
                }
                if self.greed != Greed::Count(1) {
                    return Err(DeclarationError::FixedValueGreed(self.name.clone()));
                }
            }
            ParameterKind::Positional | ParameterKind::Group { .. } => {}
        }
        Ok(())
    }

    /// Lookahead: can this parameter start matching at the cursor?
    ///
    /// Does not move the cursor. The attached filter only runs when the
    /// parameter could structurally match.
    pub fn is_possible(&self, inv: &CommandInvocation) -> Result<bool, FilterError> {
        if !self.fits(inv) {
            return Ok(false);
        }
        self.check_filter(inv)?;
        Ok(true)
    }

    pub(crate) fn check_filter(&self, inv: &CommandInvocation) -> Result<(), FilterError> {
        match &self.filter {
            Some(filter) => filter.run(inv),
            None => Ok(()),
        }
    }

    fn fits(&self, inv: &CommandInvocation) -> bool {
        let Some(token) = inv.current_token() else {
            return false;
        };
        let remaining = inv.remaining();
        match &self.kind {
            ParameterKind::Flag { short, long } => self.matches_flag(token.as_str(), short, long),
            ParameterKind::Named { names } => {
                remaining >= self.min_tokens()
                    && names.iter().any(|n| eq_ignore_case(n, token.as_str()))
            }
            ParameterKind::Positional => remaining >= self.greed.min_tokens(),
            ParameterKind::FixedValue { choices } => choices
                .iter()
                .any(|(literal, _)| eq_ignore_case(literal, token.as_str())),
            // A partly typed group is still completed.
            ParameterKind::Group { .. } => inv.is_suggesting() || remaining >= self.min_tokens(),
        }
    }

    fn matches_flag(&self, token: &str, short: &Option<String>, long: &Option<String>) -> bool {
        if !token.starts_with('-') {
            return false;
        }
        let stripped = token.trim_start_matches('-');
        [short, long]
            .into_iter()
            .flatten()
            .any(|name| !name.is_empty() && eq_ignore_case(name, stripped))
    }

    /// Consumes this parameter's tokens and appends the result to `out`.
    ///
    /// Infinite positionals consume a single token here; the matching loop
    /// feeds them further tokens through [`append`](Self::append).
    pub fn parse(
        &self,
        inv: &mut CommandInvocation,
        out: &mut Vec<ParsedParameter>,
    ) -> Result<(), CommandError> {
        match &self.kind {
            ParameterKind::Flag { .. } => {
                let raw = inv.consume(1).map(|token| token.text);
                out.push(ParsedParameter::new(&self.name, Value::new(true), raw));
            }
            ParameterKind::Named { .. } => {
                inv.consume(1);
                let count = match self.greed {
                    Greed::Count(n) => n,
                    Greed::Infinite => inv.remaining(),
                };
                let text = inv.take_text(count);
                let value = self.read(&text, inv)?;
                out.push(ParsedParameter::new(&self.name, value, Some(text)));
            }
            ParameterKind::Positional => {
                let text = inv.take_text(self.greed.min_tokens());
                let value = self.read(&text, inv)?;
                out.push(ParsedParameter::new(&self.name, value, Some(text)));
            }
            ParameterKind::FixedValue { choices } => {
                let text = inv.take_text(1);
                let value = choices
                    .iter()
                    .find(|(literal, _)| eq_ignore_case(literal, &text))
                    .map(|(_, value)| value.clone())
                    .ok_or_else(|| {
                        ReadError::new(&text, self.expected(), "not one of the accepted values")
                    })?;
                out.push(ParsedParameter::new(&self.name, value, Some(text)));
            }
            ParameterKind::Group { group, assemble } => {
                let fields = Arguments::new(group.run_nested(inv)?);
                if inv.is_claimed() {
                    out.push(ParsedParameter::new(&self.name, Value::new(fields), None));
                    return Ok(());
                }
                let value = match assemble {
                    Some(assemble) => assemble(&fields)?,
                    None => Value::new(fields),
                };
                out.push(ParsedParameter::new(&self.name, value, None));
            }
        }
        Ok(())
    }

    /// Extends an infinite positional's match by one token and re-reads the
    /// joined text. `entry` is left untouched on failure.
    pub fn append(
        &self,
        inv: &mut CommandInvocation,
        entry: &mut ParsedParameter,
    ) -> Result<(), CommandError> {
        let Some(token) = inv.consume(1) else {
            return Ok(());
        };
        let raw = match entry.raw.as_deref() {
            Some(previous) => format!("{previous} {}", token.text),
            None => token.text,
        };
        entry.value = self.read(&raw, inv)?;
        entry.raw = Some(raw);
        Ok(())
    }

    fn read(&self, text: &str, inv: &CommandInvocation) -> Result<Value, ReadError> {
        inv.providers().read(self.value_type, text, inv)
    }

    fn expected(&self) -> String {
        match &self.kind {
            ParameterKind::FixedValue { choices } => choices
                .iter()
                .map(|(literal, _)| literal.as_str())
                .collect::<Vec<_>>()
                .join("|"),
            _ => self.value_type.short_name().to_string(),
        }
    }

    /// Completions for the token at the cursor, which is being typed.
    pub fn suggestions(&self, inv: &CommandInvocation) -> Vec<String> {
        let prefix = inv.current_token().map_or("", |token| token.as_str());
        match &self.kind {
            ParameterKind::Flag { short, long } => [short, long]
                .into_iter()
                .flatten()
                .map(|name| format!("-{name}"))
                .filter(|form| starts_with_ignore_case(form, prefix))
                .collect(),
            ParameterKind::Named { names } => names
                .iter()
                .filter(|name| starts_with_ignore_case(name, prefix))
                .cloned()
                .collect(),
            ParameterKind::Positional => inv.providers().complete(self.value_type, prefix, inv),
            ParameterKind::FixedValue { choices } => choices
                .iter()
                .map(|(literal, _)| literal)
                .filter(|literal| starts_with_ignore_case(literal, prefix))
                .cloned()
                .collect(),
            ParameterKind::Group { group, .. } => group.leading_suggestions(inv),
        }
    }

    /// Completions for a named parameter's value, which is the last token of
    /// the line.
    pub fn value_suggestions(&self, inv: &CommandInvocation) -> Vec<String> {
        let prefix = inv.last_token().map_or("", |token| token.as_str());
        inv.providers().complete(self.value_type, prefix, inv)
    }

    /// How many tokens a named parameter spans, name included, when it would
    /// end exactly at the line's last token. `None` for other kinds.
    pub(crate) fn named_window(&self, remaining: usize) -> Option<usize> {
        match (&self.kind, self.greed) {
            (ParameterKind::Named { .. }, Greed::Count(n)) => Some(n + 1),
            (ParameterKind::Named { .. }, Greed::Infinite) if remaining >= 2 => Some(remaining),
            _ => None,
        }
    }

    /// Synthesizes the value of an omitted parameter.
    ///
    /// `Ok(None)` means the parameter has no default.
    pub fn synthesize(
        &self,
        inv: &CommandInvocation,
    ) -> Result<Option<ParsedParameter>, CommandError> {
        let entry = match &self.default {
            Some(DefaultValue::Literal(text)) => Some(ParsedParameter::new(
                &self.name,
                self.read(text, inv)?,
                Some(text.clone()),
            )),
            Some(DefaultValue::Provider(id)) => Some(ParsedParameter::new(
                &self.name,
                inv.providers().named_default(id, inv)?,
                None,
            )),
            Some(DefaultValue::TypeDefault) => inv
                .providers()
                .default_value(self.value_type, inv)
                .transpose()?
                .map(|value| ParsedParameter::new(&self.name, value, None)),
            None => match &self.kind {
                ParameterKind::Group { group, assemble } if group.all_optional() => {
                    let fields = Arguments::new(group.defaults(inv)?);
                    let value = match assemble {
                        Some(assemble) => assemble(&fields)?,
                        None => Value::new(fields),
                    };
                    Some(ParsedParameter::new(&self.name, value, None))
                }
                _ => None,
            },
        };
        Ok(entry)
    }

    /// Usage fragment, e.g. `<target>`, `[amount]`, `<message...>`,
    /// `[--reason <reason>]`, `[-s]`, `<survival|creative>`.
    pub fn usage(&self) -> String {
        let wrap = |inner: String| {
            if self.required {
                format!("<{inner}>")
            } else {
                format!("[{inner}]")
            }
        };
        match &self.kind {
            ParameterKind::Flag { short, long } => {
                let name = short.as_ref().or(long.as_ref()).map_or("", String::as_str);
                format!("[-{name}]")
            }
            ParameterKind::Named { names } => {
                let name = names.first().map_or("", String::as_str);
                let value = if self.greed.is_infinite() {
                    format!("<{}...>", self.name)
                } else {
                    format!("<{}>", self.name)
                };
                if self.required {
                    format!("{name} {value}")
                } else {
                    format!("[{name} {value}]")
                }
            }
            ParameterKind::Positional if self.greed.is_infinite() => {
                wrap(format!("{}...", self.name))
            }
            ParameterKind::Positional => wrap(self.name.clone()),
            ParameterKind::FixedValue { .. } => wrap(self.expected()),
            ParameterKind::Group { group, .. } => {
                if self.required {
                    group.usage()
                } else {
                    format!("[{}]", group.usage())
                }
            }
        }
    }
}

impl fmt::Debug for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parameter")
            .field("name", &self.name)
            .field("value_type", &self.value_type)
            .field("greed", &self.greed)
            .field("required", &self.required)
            .field("default", &self.default)
            .field("filter", &self.filter.is_some())
            .field("kind", &self.kind)
            .finish()
    }
}
