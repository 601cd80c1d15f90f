//! The cursor over one command line.
//!
//! A [`CommandInvocation`] is created per executed (or completed) line and
//! shared by every level of the dispatch: routing into a sub-command and
//! matching parameters advance the same cursor.
//!
//! ```
//! use std::rc::Rc;
//! use cmdtree::{CommandContext, CommandInvocation, ProviderManager};
//!
//! let mut inv = CommandInvocation::new(
//!     "tp alex 0 64 0",
//!     Rc::new(ProviderManager::new()),
//!     CommandContext::default(),
//! );
//! assert_eq!(inv.enter_subcommand().as_deref(), Some("tp"));
//! let mark = inv.mark();
//! assert_eq!(inv.take_text(3), "alex 0 64");
//! inv.reset(mark);
//! assert_eq!(inv.remaining(), 4);
//! ```

use std::rc::Rc;

use crate::context::CommandContext;
use crate::provider::ProviderManager;
use crate::tokenizer::{tokenize, tokenize_for_completion, Token};
use crate::value::ParsedParameter;

/// A saved cursor position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark(usize);

#[derive(Debug)]
pub struct CommandInvocation {
    line: String,
    tokens: Rc<[Token]>,
    consumed: usize,
    labels: Vec<String>,
    parsed: Vec<ParsedParameter>,
    suggestions: Option<Vec<String>>,
    /// Set once a nested group has answered for the token being completed
    claimed: bool,
    context: CommandContext,
    providers: Rc<ProviderManager>,
}

impl CommandInvocation {
    /// Creates an invocation for executing `line`.
    pub fn new(
        line: impl Into<String>,
        providers: Rc<ProviderManager>,
        context: CommandContext,
    ) -> Self {
        let line = line.into();
        let tokens = tokenize(&line).into();
        Self::with_tokens(line, tokens, None, providers, context)
    }

    /// Creates an invocation for completing `line`.
    ///
    /// The line is tokenized with [`tokenize_for_completion`], so it always
    /// ends in the (possibly empty) token being completed.
    pub fn for_completion(
        line: impl Into<String>,
        providers: Rc<ProviderManager>,
        context: CommandContext,
    ) -> Self {
        let line = line.into();
        let tokens = tokenize_for_completion(&line).into();
        Self::with_tokens(line, tokens, Some(Vec::new()), providers, context)
    }

    fn with_tokens(
        line: String,
        tokens: Rc<[Token]>,
        suggestions: Option<Vec<String>>,
        providers: Rc<ProviderManager>,
        context: CommandContext,
    ) -> Self {
        Self {
            line,
            tokens,
            consumed: 0,
            labels: Vec::new(),
            parsed: Vec::new(),
            suggestions,
            claimed: false,
            context,
            providers,
        }
    }

    pub fn line(&self) -> &str {
        &self.line
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Number of tokens consumed so far.
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    pub fn remaining(&self) -> usize {
        self.tokens.len() - self.consumed
    }

    pub fn is_consumed(&self) -> bool {
        self.consumed >= self.tokens.len()
    }

    /// The token at the cursor, `None` once everything is consumed.
    pub fn current_token(&self) -> Option<&Token> {
        self.tokens.get(self.consumed)
    }

    /// The token `offset` positions after the cursor.
    pub fn peek(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.consumed + offset)
    }

    /// The final token of the line.
    pub fn last_token(&self) -> Option<&Token> {
        self.tokens.last()
    }

    /// Advances the cursor by `n` tokens (clamped to the end of the line) and
    /// returns the token that was current before advancing.
    pub fn consume(&mut self, n: usize) -> Option<Token> {
        let current = self.current_token().cloned();
        self.consumed = self.consumed.saturating_add(n).min(self.tokens.len());
        current
    }

    /// Consumes up to `n` tokens and returns their text joined by single spaces.
    pub fn take_text(&mut self, n: usize) -> String {
        let end = self.consumed.saturating_add(n).min(self.tokens.len());
        let text = self.tokens[self.consumed..end]
            .iter()
            .map(Token::as_str)
            .collect::<Vec<_>>()
            .join(" ");
        self.consumed = end;
        text
    }

    pub fn mark(&self) -> Mark {
        Mark(self.consumed)
    }

    /// Rewinds to `mark`. Marks ahead of the cursor are ignored.
    pub fn reset(&mut self, mark: Mark) {
        self.consumed = self.consumed.min(mark.0);
    }

    /// Consumes the current token as the name of a sub-command and records it
    /// in the label trail.
    pub fn enter_subcommand(&mut self) -> Option<String> {
        let label = self.consume(1)?.text;
        self.labels.push(label.clone());
        Some(label)
    }

    /// Names of the sub-commands descended into, as typed.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Returns true during a completion pass.
    pub fn is_suggesting(&self) -> bool {
        self.suggestions.is_some()
    }

    /// Records completion candidates. Ignored outside completion passes.
    pub fn add_suggestions<I>(&mut self, suggestions: I)
    where
        I: IntoIterator<Item = String>,
    {
        if let Some(collected) = self.suggestions.as_mut() {
            collected.extend(suggestions);
        }
    }

    /// Marks the token being completed as answered. Enclosing groups stop
    /// matching instead of adding their own candidates.
    pub(crate) fn claim_suggestions(&mut self) {
        if self.is_suggesting() {
            self.claimed = true;
        }
    }

    pub(crate) fn is_claimed(&self) -> bool {
        self.claimed
    }

    /// Drains the completion candidates gathered so far.
    pub fn take_suggestions(&mut self) -> Vec<String> {
        self.suggestions
            .as_mut()
            .map(std::mem::take)
            .unwrap_or_default()
    }

    /// Parameters matched by the command's parameter group.
    pub fn parsed(&self) -> &[ParsedParameter] {
        &self.parsed
    }

    pub(crate) fn set_parsed(&mut self, parsed: Vec<ParsedParameter>) {
        self.parsed = parsed;
    }

    pub fn take_parsed(&mut self) -> Vec<ParsedParameter> {
        std::mem::take(&mut self.parsed)
    }

    pub fn context(&self) -> &CommandContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut CommandContext {
        &mut self.context
    }

    pub fn providers(&self) -> &Rc<ProviderManager> {
        &self.providers
    }
}
