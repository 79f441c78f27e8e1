//! Atomic matchers: literal characters, literal strings, and anchored regexes.

use regex::Regex;

use crate::cursor::{Cursor, Parser};
use crate::diagnostic::MatchFailure;

const ANONYMOUS: &str = "<primitive>";

/// Matches a single literal character.
#[derive(Clone, Copy)]
pub struct CharLit {
    value: char,
}

impl Parser for CharLit {
    type Output = char;

    fn parse(&self, cursor: &Cursor) -> Result<char, MatchFailure> {
        match cursor.rest().chars().next() {
            Some(c) if c == self.value => {
                cursor.advance(c.len_utf8());
                Ok(c)
            }
            _ => Err(cursor.fail(ANONYMOUS, format!("expected '{}'", self.value))),
        }
    }
}

pub fn char(value: char) -> CharLit {
    CharLit { value }
}

/// Matches a literal string.
#[derive(Clone)]
pub struct StringLit {
    value: String,
}

impl Parser for StringLit {
    type Output = String;

    fn parse(&self, cursor: &Cursor) -> Result<String, MatchFailure> {
        if cursor.rest().starts_with(self.value.as_str()) {
            cursor.advance(self.value.len());
            Ok(self.value.clone())
        } else {
            Err(cursor.fail(ANONYMOUS, format!("expected \"{}\"", self.value)))
        }
    }
}

pub fn string(value: impl Into<String>) -> StringLit {
    StringLit {
        value: value.into(),
    }
}

/// Matches a regex, anchored at the cursor's current position (never scans
/// forward looking for a match further in the input).
#[derive(Clone)]
pub struct RegexLit {
    pattern: Regex,
    description: String,
}

impl Parser for RegexLit {
    type Output = String;

    fn parse(&self, cursor: &Cursor) -> Result<String, MatchFailure> {
        let rest = cursor.rest();
        match self.pattern.find(rest) {
            Some(m) if m.start() == 0 => {
                let text = m.as_str().to_string();
                cursor.advance(m.end());
                Ok(text)
            }
            _ => Err(cursor.fail(ANONYMOUS, format!("expected match for {}", self.description))),
        }
    }
}

/// Build a regex primitive. Panics if `pattern` does not compile; grammars are
/// expected to be built once, up front, so a malformed pattern is a
/// programmer error rather than a recoverable parse failure.
pub fn regex(pattern: &str) -> RegexLit {
    RegexLit {
        pattern: Regex::new(pattern)
            .unwrap_or_else(|e| panic!("invalid regex /{pattern}/: {e}")),
        description: format!("/{pattern}/"),
    }
}

/// Succeeds only if the cursor is at the end of the input.
#[derive(Clone, Copy)]
pub struct EndOfInput;

impl Parser for EndOfInput {
    type Output = ();

    fn parse(&self, cursor: &Cursor) -> Result<(), MatchFailure> {
        if cursor.is_empty() {
            Ok(())
        } else {
            Err(cursor.fail(ANONYMOUS, "expected end of input"))
        }
    }
}

pub fn end_of_input() -> EndOfInput {
    EndOfInput
}

/// Wraps `body` to also consume leading and trailing whitespace (`\s*`).
///
/// Kept for familiarity with grammars migrating from whitespace-sensitive
/// combinator libraries; prefer composing `regex(r"\s*")` explicitly around
/// significant tokens, since a blanket whitespace wrapper tends to hide where
/// whitespace is actually allowed in the grammar.
#[deprecated(note = "compose regex(r\"\\s*\") explicitly instead")]
pub fn padded<T>(body: impl Parser<Output = T>) -> impl Parser<Output = T> {
    let ws = regex(r"\s*");
    move |cursor: &Cursor| {
        ws.parse(cursor)?;
        let value = body.parse(cursor)?;
        ws.parse(cursor)?;
        Ok(value)
    }
}
