//! Failure records, causation chains, and the "deepest failure wins" ranking.
//!
//! Every primitive and combinator that fails produces a [`MatchFailure`]. Most
//! of these are recovered by backtracking (`ordered_choice`, `optional`, ...)
//! and never reach the caller — but they are still recorded in a shared
//! [`DiagnosticHeap`] so that if the whole parse fails, the most useful failure
//! (the one that got furthest into the input) can be reported, not just
//! whichever one happened to propagate out of the root rule.
//!
//! Line/column computation follows the same approach as other offset-tracking
//! parsers in this space: scan the consumed prefix for newlines rather than
//! keeping a running line counter, since it only runs on the (rare) failure path.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;
use std::rc::Rc;

/// The single error kind this crate produces: something expected at a
/// position did not match.
#[derive(Debug, Clone)]
pub struct MatchFailure {
    /// The innermost named rule whose body failed.
    pub rule: &'static str,
    /// Byte offset into the input where the failure occurred.
    pub pos: usize,
    /// 1-based line number.
    pub line: usize,
    /// 1-based column number.
    pub column: usize,
    /// The text of the line containing `pos`, for display.
    pub context: String,
    pub message: String,
    /// The failure that caused this one, if this is a wrapping failure.
    pub cause: Option<Rc<MatchFailure>>,
}

impl MatchFailure {
    pub fn new(
        rule: &'static str,
        pos: usize,
        input: &str,
        message: String,
        cause: Option<Rc<MatchFailure>>,
    ) -> Self {
        let (line, column, context) = compute_line_column(input, pos);
        Self {
            rule,
            pos,
            line,
            column,
            context,
            message,
            cause,
        }
    }
}

impl fmt::Display for MatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Error in rule '{}' at line {}:",
            self.rule, self.line
        )?;
        writeln!(f, "{}", self.context)?;
        writeln!(f, "{}^", " ".repeat(self.column.saturating_sub(1)))?;
        write!(f, "Error: {}", self.message)?;
        if let Some(cause) = &self.cause {
            write!(f, "\ncaused by: {cause}")?;
        }
        Ok(())
    }
}

impl std::error::Error for MatchFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause.as_deref().map(|c| c as &dyn std::error::Error)
    }
}

/// Scan `input` up to `pos` counting newlines, returning 1-based
/// `(line, column)` plus the text of the offending line.
fn compute_line_column(input: &str, pos: usize) -> (usize, usize, String) {
    let pos = pos.min(input.len());
    let mut line = 1;
    let mut line_start = 0;
    for (i, c) in input.char_indices() {
        if i >= pos {
            break;
        }
        if c == '\n' {
            line += 1;
            line_start = i + 1;
        }
    }
    let column = input[line_start..pos].chars().count() + 1;
    let line_end = input[line_start..]
        .find('\n')
        .map(|offset| line_start + offset)
        .unwrap_or(input.len());
    let context = input[line_start..line_end].to_string();
    (line, column, context)
}

/// Orders failures by how deep into the input they reached; the deepest
/// failure is the "greatest" one, so a plain max-heap surfaces it on `pop`.
#[derive(Debug, Clone)]
struct Ranked(MatchFailure);

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        self.0.pos == other.0.pos
    }
}
impl Eq for Ranked {}
impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.pos.cmp(&other.0.pos)
    }
}

/// Accumulates every failure raised during one `try_parse` call, so the
/// deepest one can be reported even if it was later recovered by backtracking.
#[derive(Clone)]
pub struct DiagnosticHeap {
    heap: Rc<RefCell<BinaryHeap<Ranked>>>,
    track: bool,
}

impl DiagnosticHeap {
    pub fn new(track: bool) -> Self {
        Self {
            heap: Rc::new(RefCell::new(BinaryHeap::new())),
            track,
        }
    }

    pub fn push(&self, failure: MatchFailure) {
        if self.track {
            self.heap.borrow_mut().push(Ranked(failure));
        }
    }

    /// The failure that reached furthest into the input, if any were recorded.
    pub fn best(&self) -> Option<MatchFailure> {
        self.heap.borrow().peek().map(|ranked| ranked.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_column_after_newline() {
        let input = "abc\ndef\nghi";
        let (line, column, context) = compute_line_column(input, 6);
        assert_eq!((line, column), (2, 3));
        assert_eq!(context, "def");
    }

    #[test]
    fn heap_reports_deepest_failure() {
        let heap = DiagnosticHeap::new(true);
        heap.push(MatchFailure::new("a", 1, "xxxxx", "shallow".into(), None));
        heap.push(MatchFailure::new("b", 4, "xxxxx", "deep".into(), None));
        heap.push(MatchFailure::new("c", 2, "xxxxx", "middle".into(), None));
        assert_eq!(heap.best().unwrap().message, "deep");
    }

    #[test]
    fn disabled_tracking_keeps_heap_empty() {
        let heap = DiagnosticHeap::new(false);
        heap.push(MatchFailure::new("a", 1, "xxxxx", "shallow".into(), None));
        assert!(heap.best().is_none());
    }
}
