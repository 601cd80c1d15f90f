//! The parameter matching engine.
//!
//! A [`ParameterGroup`] owns a command's parameters in three ordered lists
//! (flags, named, positional) and matches them against the remaining tokens
//! of an invocation, one parameter per round:
//!
//! 1. Collect the round's candidates: the active greedy tail, the head of the
//!    positional list, every remaining named parameter and every remaining
//!    flag that [could match](Parameter::is_possible) at the cursor.
//! 2. Try them in reverse (flags, then named, then positional). A candidate
//!    whose value cannot be read rewinds the cursor and the next one is
//!    tried; the first success ends the round.
//! 3. When no candidate succeeds the whole match fails.
//!
//! Once the line is consumed, unmatched parameters fall back to their
//! defaults, required ones without a default fail the match, and unmatched
//! flags read as `false`.
//!
//! Completion runs the same rounds. When only the token being typed is left,
//! the candidates' completions are collected instead of parsing it. A nested
//! group that still misses a required parameter claims that token, so the
//! enclosing group does not offer its own candidates there.
//!
//! ```
//! use std::rc::Rc;
//! use cmdtree::{Parameter, ParameterGroup, ProviderManager};
//!
//! let group = ParameterGroup::builder()
//!     .param(Parameter::positional::<String>("target"))
//!     .param(Parameter::positional::<String>("message").infinite())
//!     .build()?;
//!
//! let args = group.parse_line("alex see you later", Rc::new(ProviderManager::new()))?;
//! assert_eq!(args.get::<String>("target").map(String::as_str), Some("alex"));
//! assert_eq!(args.get::<String>("message").map(String::as_str), Some("see you later"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::context::CommandContext;
use crate::error::{CommandError, DeclarationError};
use crate::invocation::CommandInvocation;
use crate::parameter::Parameter;
use crate::provider::ProviderManager;
use crate::value::{Arguments, ParsedParameter, Value};

/// A command's parameters and the matching algorithm over them.
#[derive(Clone, Default)]
pub struct ParameterGroup {
    flags: Vec<Parameter>,
    named: Vec<Parameter>,
    positional: Vec<Parameter>,
}

/// Collects parameters in declaration order and validates them.
#[derive(Debug, Default)]
pub struct ParameterGroupBuilder {
    params: Vec<Parameter>,
}

impl ParameterGroupBuilder {
    pub fn param(mut self, param: Parameter) -> Self {
        self.params.push(param);
        self
    }

    pub fn params<I>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = Parameter>,
    {
        self.params.extend(params);
        self
    }

    /// Sorts the parameters into their lists.
    ///
    /// # Errors
    ///
    /// Fails on an invalid parameter, a duplicate name (case-insensitive), a
    /// second greedy tail, or a positional declared after the greedy tail.
    pub fn build(self) -> Result<ParameterGroup, DeclarationError> {
        let mut group = ParameterGroup::default();
        let mut seen = HashSet::new();
        let mut tail: Option<String> = None;

        for param in self.params {
            param.validate()?;
            if !seen.insert(param.name().to_lowercase()) {
                return Err(DeclarationError::DuplicateParameter(param.name().to_string()));
            }

            if param.is_flag() {
                group.flags.push(param);
            } else if param.is_named() {
                group.named.push(param);
            } else {
                if let Some(first) = &tail {
                    if param.is_greedy_tail() {
                        return Err(DeclarationError::MultipleInfinite {
                            first: first.clone(),
                            second: param.name().to_string(),
                        });
                    }
                    return Err(DeclarationError::InfiniteNotLast(first.clone()));
                }
                if param.is_greedy_tail() {
                    tail = Some(param.name().to_string());
                }
                group.positional.push(param);
            }
        }

        Ok(group)
    }
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    /// The greedy tail that already matched and keeps absorbing tokens
    Active,
    Positional(usize),
    Named(usize),
    Flag(usize),
}

/// Unmatched parameters of one matching run.
struct MatchState {
    flags: Vec<usize>,
    named: Vec<usize>,
    positional: VecDeque<usize>,
    /// (index into `positional`, index of its entry in the output)
    active: Option<(usize, usize)>,
}

impl MatchState {
    fn new(group: &ParameterGroup) -> Self {
        Self {
            flags: (0..group.flags.len()).collect(),
            named: (0..group.named.len()).collect(),
            positional: (0..group.positional.len()).collect(),
            active: None,
        }
    }

    fn is_exhausted(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty() && self.active.is_none()
    }

    /// Returns true while a parameter without a default is still unmatched.
    fn needs_more(&self, group: &ParameterGroup) -> bool {
        self.positional
            .iter()
            .map(|&index| &group.positional[index])
            .chain(self.named.iter().map(|&index| &group.named[index]))
            .any(|param| param.is_required() && param.default_value().is_none())
    }

    fn accept(&mut self, slot: Slot, group: &ParameterGroup, out_len: usize) {
        match slot {
            Slot::Active => {}
            Slot::Positional(index) => {
                self.positional.retain(|&i| i != index);
                if group.positional[index].is_greedy_tail() {
                    self.active = Some((index, out_len.saturating_sub(1)));
                }
            }
            Slot::Named(index) => self.named.retain(|&i| i != index),
            Slot::Flag(index) => self.flags.retain(|&i| i != index),
        }
    }
}

impl ParameterGroup {
    pub fn builder() -> ParameterGroupBuilder {
        ParameterGroupBuilder::default()
    }

    /// A group without parameters. It only accepts an empty remainder.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn flags(&self) -> &[Parameter] {
        &self.flags
    }

    pub fn named(&self) -> &[Parameter] {
        &self.named
    }

    pub fn positional(&self) -> &[Parameter] {
        &self.positional
    }

    /// All parameters: positional, then named, then flags.
    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.positional
            .iter()
            .chain(self.named.iter())
            .chain(self.flags.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty() && self.named.is_empty() && self.positional.is_empty()
    }

    /// Fewest tokens a complete match needs.
    pub fn min_tokens(&self) -> usize {
        self.positional
            .iter()
            .chain(self.named.iter())
            .filter(|param| param.is_required())
            .map(Parameter::min_tokens)
            .sum()
    }

    pub(crate) fn all_optional(&self) -> bool {
        self.positional
            .iter()
            .chain(self.named.iter())
            .all(|param| !param.is_required())
    }

    /// Usage string: positionals, then named, then flags.
    pub fn usage(&self) -> String {
        self.iter()
            .map(Parameter::usage)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Matches every remaining token of `inv` and stores the result in the
    /// invocation's [parsed accumulator](CommandInvocation::parsed).
    pub fn parse(&self, inv: &mut CommandInvocation) -> Result<(), CommandError> {
        let parsed = self.run(inv, false)?;
        inv.set_parsed(parsed);
        Ok(())
    }

    /// Runs a completion pass. Candidates are added to the invocation's
    /// suggestions; errors end the pass silently.
    pub fn suggest(&self, inv: &mut CommandInvocation) {
        if let Err(err) = self.run(inv, false) {
            trace!(error = %err, "suggestion pass ended early");
        }
    }

    /// Tokenizes and matches `line` on its own.
    pub fn parse_line(
        &self,
        line: &str,
        providers: Rc<ProviderManager>,
    ) -> Result<Arguments, CommandError> {
        let mut inv = CommandInvocation::new(line, providers, CommandContext::default());
        self.parse(&mut inv)?;
        Ok(Arguments::new(inv.take_parsed()))
    }

    /// Completions for the last token of `line`.
    pub fn suggest_line(&self, line: &str, providers: Rc<ProviderManager>) -> Vec<String> {
        let mut inv = CommandInvocation::for_completion(line, providers, CommandContext::default());
        self.suggest(&mut inv);
        inv.take_suggestions()
    }

    /// Matches as a nested group: stops as soon as nothing is left to match
    /// instead of rejecting the rest of the line.
    pub(crate) fn run_nested(
        &self,
        inv: &mut CommandInvocation,
    ) -> Result<Vec<ParsedParameter>, CommandError> {
        self.run(inv, true)
    }

    /// Completions the group offers for its first token.
    pub(crate) fn leading_suggestions(&self, inv: &CommandInvocation) -> Vec<String> {
        self.round_suggestions(&MatchState::new(self), inv)
    }

    /// Default entries for every parameter, as if none had matched.
    pub(crate) fn defaults(
        &self,
        inv: &CommandInvocation,
    ) -> Result<Vec<ParsedParameter>, CommandError> {
        let mut out = Vec::new();
        self.fill_defaults(&MatchState::new(self), inv, &mut out)?;
        Ok(out)
    }

    fn run(
        &self,
        inv: &mut CommandInvocation,
        nested: bool,
    ) -> Result<Vec<ParsedParameter>, CommandError> {
        let mut state = MatchState::new(self);
        let mut out = Vec::new();

        while !inv.is_consumed() {
            if nested && state.is_exhausted() {
                break;
            }

            if inv.is_suggesting() && inv.remaining() == 1 {
                let suggestions = self.round_suggestions(&state, inv);
                inv.add_suggestions(suggestions);
                if nested && state.needs_more(self) {
                    inv.claim_suggestions();
                }
                return Ok(out);
            }

            let candidates = self.candidates(&state, inv)?;
            let names: Vec<&str> = candidates
                .iter()
                .map(|&slot| self.slot_param(slot, &state).name())
                .collect();
            trace!(remaining = inv.remaining(), candidates = ?names, "matching round");
            if candidates.is_empty() && nested {
                break;
            }

            let mark = inv.mark();
            let len = out.len();
            let mut failure = None;
            let mut matched = None;

            for &slot in candidates.iter().rev() {
                let param = self.slot_param(slot, &state);

                if inv.is_suggesting() {
                    let remaining = inv.remaining();
                    if param.named_window(remaining) == Some(remaining) {
                        let suggestions = param.value_suggestions(inv);
                        inv.add_suggestions(suggestions);
                        if nested {
                            inv.claim_suggestions();
                        }
                        return Ok(out);
                    }
                }

                let result = match (slot, state.active) {
                    (Slot::Active, Some((_, entry))) => param.append(inv, &mut out[entry]),
                    _ => param.parse(inv, &mut out),
                };
                match result {
                    Ok(()) => {
                        matched = Some(slot);
                        break;
                    }
                    Err(err) if err.is_recoverable() => {
                        debug!(parameter = param.name(), error = %err, "candidate rejected, backtracking");
                        inv.reset(mark);
                        out.truncate(len);
                        failure = Some(err);
                    }
                    Err(err) => return Err(err),
                }
            }

            match matched {
                Some(_) if inv.is_claimed() => return Ok(out),
                Some(slot) => state.accept(slot, self, out.len()),
                None => {
                    return Err(failure.unwrap_or_else(|| CommandError::TooManyArguments {
                        unexpected: inv
                            .current_token()
                            .map(|token| token.text.clone())
                            .unwrap_or_default(),
                    }));
                }
            }
        }

        self.fill_defaults(&state, inv, &mut out)?;
        Ok(out)
    }

    fn slot_param(&self, slot: Slot, state: &MatchState) -> &Parameter {
        match slot {
            Slot::Active => {
                let index = state.active.map_or(0, |(index, _)| index);
                &self.positional[index]
            }
            Slot::Positional(index) => &self.positional[index],
            Slot::Named(index) => &self.named[index],
            Slot::Flag(index) => &self.flags[index],
        }
    }

    fn candidates(
        &self,
        state: &MatchState,
        inv: &CommandInvocation,
    ) -> Result<Vec<Slot>, CommandError> {
        let mut slots = Vec::new();
        if let Some((index, _)) = state.active {
            if eligible(&self.positional[index], inv)? {
                slots.push(Slot::Active);
            }
        }
        if let Some(&index) = state.positional.front() {
            if eligible(&self.positional[index], inv)? {
                slots.push(Slot::Positional(index));
            }
        }
        for &index in &state.named {
            if eligible(&self.named[index], inv)? {
                slots.push(Slot::Named(index));
            }
        }
        for &index in &state.flags {
            if eligible(&self.flags[index], inv)? {
                slots.push(Slot::Flag(index));
            }
        }
        Ok(slots)
    }

    /// Completions for the final, partially typed token.
    ///
    /// Every parameter that could still start here contributes, whether or
    /// not the partial token already matches it; filters still apply.
    fn round_suggestions(&self, state: &MatchState, inv: &CommandInvocation) -> Vec<String> {
        let active = state.active.map(|(index, _)| &self.positional[index]);
        let head = state.positional.front().map(|&index| &self.positional[index]);
        let named = state.named.iter().map(|&index| &self.named[index]);
        let flags = state.flags.iter().map(|&index| &self.flags[index]);

        active
            .into_iter()
            .chain(head)
            .chain(named)
            .chain(flags)
            .filter(|param| param.check_filter(inv).is_ok())
            .flat_map(|param| param.suggestions(inv))
            .collect()
    }

    fn fill_defaults(
        &self,
        state: &MatchState,
        inv: &CommandInvocation,
        out: &mut Vec<ParsedParameter>,
    ) -> Result<(), CommandError> {
        let suggesting = inv.is_suggesting();
        let unmatched = state
            .positional
            .iter()
            .map(|&index| &self.positional[index])
            .chain(state.named.iter().map(|&index| &self.named[index]));

        for param in unmatched {
            match param.synthesize(inv) {
                Ok(Some(entry)) => out.push(entry),
                Ok(None) if param.is_required() && !suggesting => {
                    return Err(CommandError::TooFewArguments {
                        missing: param.name().to_string(),
                    });
                }
                Ok(None) => {}
                Err(_) if suggesting => {}
                Err(err) => return Err(err),
            }
        }

        for &index in &state.flags {
            out.push(ParsedParameter::new(
                self.flags[index].name(),
                Value::new(false),
                None,
            ));
        }
        Ok(())
    }
}

/// Eligibility check. Filter rejections abort execution but only hide the
/// parameter during completion.
fn eligible(param: &Parameter, inv: &CommandInvocation) -> Result<bool, CommandError> {
    match param.is_possible(inv) {
        Ok(possible) => Ok(possible),
        Err(_) if inv.is_suggesting() => Ok(false),
        Err(err) => Err(err.into()),
    }
}

impl fmt::Debug for ParameterGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = |params: &[Parameter]| {
            params
                .iter()
                .map(|p| p.name().to_string())
                .collect::<Vec<_>>()
        };
        f.debug_struct("ParameterGroup")
            .field("flags", &names(&self.flags))
            .field("named", &names(&self.named))
            .field("positional", &names(&self.positional))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FilterError, ReadError};

    fn providers() -> Rc<ProviderManager> {
        Rc::new(ProviderManager::new())
    }

    fn text<'a>(args: &'a Arguments, name: &str) -> Option<&'a str> {
        args.get::<String>(name).map(String::as_str)
    }

    #[test]
    fn greedy_tail_takes_rest_of_line() {
        let group = ParameterGroup::builder()
            .param(Parameter::positional::<String>("first"))
            .param(Parameter::positional::<String>("second").infinite())
            .build()
            .unwrap();

        let args = group.parse_line("a b c d", providers()).unwrap();
        assert_eq!(text(&args, "first"), Some("a"));
        assert_eq!(text(&args, "second"), Some("b c d"));
        assert_eq!(args.raw("second"), Some("b c d"));
    }

    #[test]
    fn flag_wins_over_positional() {
        let group = ParameterGroup::builder()
            .param(Parameter::flag("force").short("f").long("force"))
            .param(Parameter::positional::<String>("target").optional())
            .build()
            .unwrap();

        let args = group.parse_line("-f hello", providers()).unwrap();
        assert!(args.flag("force"));
        assert_eq!(text(&args, "target"), Some("hello"));

        let args = group.parse_line("-f", providers()).unwrap();
        assert!(args.flag("force"));
        assert!(!args.contains("target"));

        let args = group.parse_line("hello", providers()).unwrap();
        assert_eq!(args.get::<bool>("force"), Some(&false));
    }

    #[test]
    fn too_few_and_too_many() {
        let group = ParameterGroup::builder()
            .param(Parameter::positional::<String>("a"))
            .param(Parameter::positional::<String>("b"))
            .build()
            .unwrap();

        let err = group.parse_line("a", providers()).unwrap_err();
        assert!(matches!(err, CommandError::TooFewArguments { ref missing } if missing == "b"));

        let err = group.parse_line("a b c", providers()).unwrap_err();
        assert!(matches!(err, CommandError::TooManyArguments { ref unexpected } if unexpected == "c"));
    }

    #[test]
    fn named_in_any_position() {
        let group = ParameterGroup::builder()
            .param(Parameter::positional::<String>("player"))
            .param(Parameter::named::<String>("reason", &["--reason", "-r"]).optional())
            .param(Parameter::positional::<i32>("minutes"))
            .build()
            .unwrap();

        let args = group.parse_line("--reason spam alex 10", providers()).unwrap();
        assert_eq!(text(&args, "player"), Some("alex"));
        assert_eq!(text(&args, "reason"), Some("spam"));
        assert_eq!(args.get::<i32>("minutes"), Some(&10));

        let args = group.parse_line("alex -r spam 10", providers()).unwrap();
        assert_eq!(text(&args, "reason"), Some("spam"));
    }

    #[test]
    fn unreadable_candidate_backtracks() {
        let group = ParameterGroup::builder()
            .param(Parameter::named::<i32>("count", &["--count"]).optional())
            .param(Parameter::positional::<String>("message").infinite())
            .build()
            .unwrap();

        let args = group.parse_line("--count many", providers()).unwrap();
        assert_eq!(text(&args, "message"), Some("--count many"));
        assert!(!args.contains("count"));

        let args = group.parse_line("--count 3 hi", providers()).unwrap();
        assert_eq!(args.get::<i32>("count"), Some(&3));
        assert_eq!(text(&args, "message"), Some("hi"));
    }

    #[test]
    fn read_error_surfaces_when_nothing_else_matches() {
        let group = ParameterGroup::builder()
            .param(Parameter::positional::<i32>("amount"))
            .build()
            .unwrap();

        let err = group.parse_line("lots", providers()).unwrap_err();
        assert!(matches!(err, CommandError::Parse(ref read) if read.input == "lots"));
    }

    #[test]
    fn flags_interleave_with_greedy_tail() {
        let group = ParameterGroup::builder()
            .param(Parameter::flag("silent").short("s"))
            .param(Parameter::positional::<String>("message").infinite())
            .build()
            .unwrap();

        let args = group.parse_line("hello -s world", providers()).unwrap();
        assert!(args.flag("silent"));
        assert_eq!(text(&args, "message"), Some("hello world"));
    }

    #[test]
    fn defaults_fill_unmatched() {
        let mut manager = ProviderManager::new();
        manager.register_default("spawn", |_inv| Ok(Value::new(String::from("world"))));
        let providers = Rc::new(manager);

        let group = ParameterGroup::builder()
            .param(Parameter::positional::<String>("item"))
            .param(Parameter::positional::<i32>("amount").optional().default_literal("1"))
            .param(Parameter::named::<String>("dimension", &["--in"]).default_provider("spawn"))
            .build()
            .unwrap();

        let args = group.parse_line("diamond", Rc::clone(&providers)).unwrap();
        assert_eq!(args.get::<i32>("amount"), Some(&1));
        assert_eq!(text(&args, "dimension"), Some("world"));
        assert_eq!(args.raw("dimension"), None);
    }

    #[test]
    fn nested_group_stops_when_complete() {
        let position = ParameterGroup::builder()
            .param(Parameter::positional::<i32>("x"))
            .param(Parameter::positional::<i32>("y"))
            .param(Parameter::positional::<i32>("z"))
            .build()
            .unwrap();
        let group = ParameterGroup::builder()
            .param(Parameter::group("to", position))
            .param(Parameter::positional::<String>("facing").optional())
            .build()
            .unwrap();

        let args = group.parse_line("1 64 -3 north", providers()).unwrap();
        let to = args.get::<Arguments>("to").unwrap();
        assert_eq!(to.get::<i32>("y"), Some(&64));
        assert_eq!(to.get::<i32>("z"), Some(&-3));
        assert_eq!(text(&args, "facing"), Some("north"));
        assert_eq!(group.usage(), "<x> <y> <z> [facing]");
    }

    fn heading_group() -> ParameterGroup {
        let to = ParameterGroup::builder()
            .param(Parameter::positional::<i32>("x"))
            .param(Parameter::choices("y", ["up", "down"]))
            .param(Parameter::choices("z", ["left", "right"]))
            .build()
            .unwrap();
        ParameterGroup::builder()
            .param(Parameter::group("to", to))
            .param(Parameter::choices("facing", ["north", "south"]).optional())
            .build()
            .unwrap()
    }

    #[test]
    fn completes_inside_nested_group() {
        let group = heading_group();
        let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        assert!(group.suggest_line("", providers()).is_empty());
        assert_eq!(group.suggest_line("1 ", providers()), strings(&["up", "down"]));
        assert_eq!(group.suggest_line("1 d", providers()), strings(&["down"]));
        assert_eq!(group.suggest_line("1 up ", providers()), strings(&["left", "right"]));
        assert_eq!(
            group.suggest_line("1 up left ", providers()),
            strings(&["north", "south"])
        );
        assert!(group.parse_line("1 up left north", providers()).is_ok());
    }

    #[test]
    fn satisfied_nested_group_shares_the_last_token() {
        let spot = ParameterGroup::builder()
            .param(Parameter::positional::<i32>("x"))
            .param(Parameter::choices("layer", ["top", "bottom"]).optional())
            .build()
            .unwrap();
        let group = ParameterGroup::builder()
            .param(Parameter::group("spot", spot))
            .param(Parameter::choices("facing", ["north", "south"]).optional())
            .build()
            .unwrap();

        assert_eq!(
            group.suggest_line("4 ", providers()),
            vec!["top", "bottom", "north", "south"]
        );
    }

    #[test]
    fn partial_nested_group_is_not_assembled_while_completing() {
        let pair = ParameterGroup::builder()
            .param(Parameter::positional::<i32>("min"))
            .param(Parameter::choices("unit", ["ticks", "seconds"]))
            .build()
            .unwrap();
        let group = ParameterGroup::builder()
            .param(Parameter::group("delay", pair).assemble(|args: &Arguments| {
                let unit = args
                    .get::<String>("unit")
                    .ok_or_else(|| ReadError::new("", "delay", "missing unit"))?;
                Ok(format!("{}{}", args.get::<i32>("min").copied().unwrap_or_default(), unit))
            }))
            .build()
            .unwrap();

        assert_eq!(group.suggest_line("5 s", providers()), vec!["seconds"]);
        let args = group.parse_line("5 ticks", providers()).unwrap();
        assert_eq!(text(&args, "delay"), Some("5ticks"));
    }

    #[test]
    fn filter_rejection_aborts_execution() {
        let group = ParameterGroup::builder()
            .param(Parameter::flag("op").long("op").filter(|_inv: &CommandInvocation| {
                Err::<(), _>(FilterError::new("operators only"))
            }))
            .param(Parameter::positional::<String>("target").optional())
            .build()
            .unwrap();

        let err = group.parse_line("--op", providers()).unwrap_err();
        assert!(err.is_permission());

        assert!(group.parse_line("alex", providers()).is_ok());
        assert!(group.suggest_line("-", providers()).is_empty());
    }

    #[test]
    fn suggests_named_from_partial_name() {
        let group = ParameterGroup::builder()
            .param(Parameter::named::<String>("name", &["--name"]))
            .build()
            .unwrap();

        let suggestions = group.suggest_line("--na", providers());
        assert!(suggestions.contains(&"--name".to_string()));
    }

    #[test]
    fn suggests_named_value() {
        let group = ParameterGroup::builder()
            .param(Parameter::named::<bool>("pvp", &["--pvp"]))
            .param(Parameter::flag("force").short("f"))
            .build()
            .unwrap();

        assert_eq!(group.suggest_line("--pvp t", providers()), vec!["true".to_string()]);
        assert_eq!(
            group.suggest_line("", providers()),
            vec!["--pvp".to_string(), "-f".to_string()]
        );
    }

    #[test]
    fn suggestions_follow_matched_prefix() {
        let group = ParameterGroup::builder()
            .param(Parameter::choices("weather", ["clear", "rain", "thunder"]))
            .param(Parameter::positional::<bool>("locked"))
            .build()
            .unwrap();

        assert_eq!(
            group.suggest_line("r", providers()),
            vec!["rain".to_string()]
        );
        assert_eq!(
            group.suggest_line("rain ", providers()),
            vec!["true".to_string(), "false".to_string()]
        );
        assert!(group.suggest_line("rain true ", providers()).is_empty());
    }

    #[test]
    fn build_rejects_bad_declarations() {
        let err = ParameterGroup::builder()
            .param(Parameter::positional::<String>("a").infinite())
            .param(Parameter::positional::<String>("b").infinite())
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            DeclarationError::MultipleInfinite {
                first: "a".into(),
                second: "b".into()
            }
        );

        let err = ParameterGroup::builder()
            .param(Parameter::positional::<String>("a").infinite())
            .param(Parameter::positional::<String>("b"))
            .build()
            .unwrap_err();
        assert_eq!(err, DeclarationError::InfiniteNotLast("a".into()));

        let err = ParameterGroup::builder()
            .param(Parameter::positional::<String>("Target"))
            .param(Parameter::named::<String>("target", &["-t"]))
            .build()
            .unwrap_err();
        assert_eq!(err, DeclarationError::DuplicateParameter("target".into()));
    }

    #[test]
    fn empty_group_accepts_empty_line_only() {
        let group = ParameterGroup::empty();
        assert!(group.parse_line("", providers()).unwrap().is_empty());
        assert!(group.parse_line("extra", providers()).is_err());
        assert_eq!(group.min_tokens(), 0);
    }
}
