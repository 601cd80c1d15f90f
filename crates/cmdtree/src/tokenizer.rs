//! Quote-aware splitting of a command line into tokens.
//!
//! Rules:
//!
//! - Whitespace outside quotes delimits tokens and is dropped.
//! - A token starting with `'` or `"` is quoted and runs to the matching
//!   quote. Inside it, `\` followed by the quote character or another `\`
//!   yields that character; any other escape keeps its backslash.
//! - An unterminated quote is not an error: the quote character becomes an
//!   ordinary character of a plain token.
//! - A quoted segment directly followed by plain text yields two tokens.
//!
//! ```
//! use cmdtree::{tokenize, Token};
//!
//! let tokens = tokenize(r#"say "hello world" now"#);
//! assert_eq!(
//!     tokens,
//!     vec![Token::plain("say"), Token::quoted("hello world"), Token::plain("now")]
//! );
//! ```

use std::fmt;

/// How a token was written on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Plain,
    Quoted,
}

/// One delimited unit of a command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            kind: TokenKind::Plain,
            text: text.into(),
        }
    }

    pub fn quoted(text: impl Into<String>) -> Self {
        Self {
            kind: TokenKind::Quoted,
            text: text.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_quoted(&self) -> bool {
        self.kind == TokenKind::Quoted
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Splits a command line into tokens.
pub fn tokenize(line: &str) -> Vec<Token> {
    let chars: Vec<char> = line.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        let c = chars[pos];
        if c.is_whitespace() {
            pos += 1;
            continue;
        }

        if c == '"' || c == '\'' {
            if let Some((text, next)) = read_quoted(&chars, pos) {
                tokens.push(Token::quoted(text));
                pos = next;
                continue;
            }
        }

        let (text, next) = read_plain(&chars, pos);
        tokens.push(Token::plain(text));
        pos = next;
    }

    tokens
}

/// Splits a line that is being completed.
///
/// When the line is empty or ends in whitespace the user is about to type a
/// new argument, represented by a trailing empty token.
pub fn tokenize_for_completion(line: &str) -> Vec<Token> {
    let mut tokens = tokenize(line);
    if line.is_empty() || line.ends_with(char::is_whitespace) {
        tokens.push(Token::plain(""));
    }
    tokens
}

/// Reads a quoted token starting at `start` (the opening quote).
///
/// Returns `None` if the input ends before the quote closes.
fn read_quoted(chars: &[char], start: usize) -> Option<(String, usize)> {
    let quote = chars[start];
    let mut text = String::new();
    let mut pos = start + 1;

    while pos < chars.len() {
        match chars[pos] {
            '\\' if matches!(chars.get(pos + 1), Some(&next) if next == quote || next == '\\') => {
                text.push(chars[pos + 1]);
                pos += 2;
            }
            c if c == quote => return Some((text, pos + 1)),
            c => {
                text.push(c);
                pos += 1;
            }
        }
    }

    None
}

fn read_plain(chars: &[char], start: usize) -> (String, usize) {
    let end = chars[start..]
        .iter()
        .position(|c| c.is_whitespace())
        .map_or(chars.len(), |offset| start + offset);
    (chars[start..end].iter().collect(), end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(Token::as_str).collect()
    }

    #[test]
    fn splits_on_whitespace() {
        let tokens = tokenize("  give  steve\tdiamond 64 ");
        assert_eq!(texts(&tokens), vec!["give", "steve", "diamond", "64"]);
        assert!(tokens.iter().all(|t| t.kind == TokenKind::Plain));
    }

    #[test]
    fn double_quotes_group_words() {
        let tokens = tokenize("a \"b c\" d");
        assert_eq!(
            tokens,
            vec![Token::plain("a"), Token::quoted("b c"), Token::plain("d")]
        );
    }

    #[test]
    fn escaped_quote_inside_single_quotes() {
        let tokens = tokenize(r"'it\'s'");
        assert_eq!(tokens, vec![Token::quoted("it's")]);
    }

    #[test]
    fn escaped_backslash_is_unescaped() {
        let tokens = tokenize(r#""C:\\temp""#);
        assert_eq!(tokens, vec![Token::quoted(r"C:\temp")]);
    }

    #[test]
    fn other_escapes_keep_backslash() {
        let tokens = tokenize(r#""line\nbreak""#);
        assert_eq!(tokens, vec![Token::quoted(r"line\nbreak")]);
    }

    #[test]
    fn empty_line_has_no_tokens() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   ").is_empty());
    }

    #[test]
    fn unterminated_quote_falls_back_to_plain() {
        let tokens = tokenize("\"abc");
        assert_eq!(tokens, vec![Token::plain("\"abc")]);

        let tokens = tokenize("say 'hello world");
        assert_eq!(texts(&tokens), vec!["say", "'hello", "world"]);
        assert!(!tokens[1].is_quoted());
    }

    #[test]
    fn adjacent_quoted_and_plain_are_separate() {
        let tokens = tokenize("\"a\"b");
        assert_eq!(tokens, vec![Token::quoted("a"), Token::plain("b")]);
    }

    #[test]
    fn quote_inside_plain_token_is_literal() {
        let tokens = tokenize("don't stop");
        assert_eq!(texts(&tokens), vec!["don't", "stop"]);
    }

    #[test]
    fn explicit_empty_quotes_are_kept() {
        let tokens = tokenize("set motd \"\"");
        assert_eq!(tokens[2], Token::quoted(""));
    }

    #[test]
    fn completion_adds_trailing_empty_token() {
        assert_eq!(tokenize_for_completion(""), vec![Token::plain("")]);
        assert_eq!(
            texts(&tokenize_for_completion("tp ")),
            vec!["tp", ""]
        );
        assert_eq!(texts(&tokenize_for_completion("tp st")), vec!["tp", "st"]);
    }
}
