#![doc=include_str!("../README.md")]

pub mod combinator;
pub mod cursor;
pub mod diagnostic;
pub mod left_recursion;
pub mod memo;
pub mod primitive;
pub mod rule;

use std::cell::Cell;
use std::rc::Rc;

pub use crate::cursor::{Cursor, Parser};
pub use crate::diagnostic::MatchFailure;
pub use crate::left_recursion::{memo_left, LeftMemo};
pub use crate::memo::{memoize, Memo};
pub use crate::rule::Recursive;

/// Knobs that affect how a grammar is driven, as opposed to what it matches.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Whether failures recovered by backtracking are still recorded for the
    /// final "deepest failure" report. Disable for a marginal speedup on
    /// grammars that only care about the happy path.
    pub track_diagnostics: bool,
    /// Red zone size (bytes) passed to `stacker::maybe_grow` around the root
    /// rule invocation.
    pub stack_probe_headroom: usize,
    /// Stack growth increment (bytes) passed to `stacker::maybe_grow`.
    pub stack_probe_growth: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            track_diagnostics: true,
            stack_probe_headroom: 32 * 1024,
            stack_probe_growth: 1024 * 1024,
        }
    }
}

/// The entry point for a grammar: a root rule plus the config to drive it with.
///
/// Construct once, call [`Grammar::try_parse`] as many times as needed. The
/// rule bodies' own `Memo` / `LeftMemo` tables are owned by the closures
/// composing the grammar and are *not* physically cleared between calls (the
/// driver has no way to reach into them), but each call is tagged with a
/// fresh epoch (see [`Cursor::epoch`]) that every memo table checks before
/// trusting a cached entry, so a table built for one input never leaks a
/// result into a parse of a different one. This gives the same externally
/// observable behaviour as clearing the tables at entry, at the cost of
/// letting them grow to the high-water mark across all calls rather than
/// being freed between them.
pub struct Grammar<T> {
    root: Recursive<T>,
    config: ParserConfig,
    epoch: Cell<u64>,
}

impl<T: Clone> Grammar<T> {
    pub fn new(root: Recursive<T>) -> Self {
        Self {
            root,
            config: ParserConfig::default(),
            epoch: Cell::new(0),
        }
    }

    pub fn with_config(root: Recursive<T>, config: ParserConfig) -> Self {
        Self {
            root,
            config,
            epoch: Cell::new(0),
        }
    }

    /// Parse `input` from the start. Returns the deepest diagnostic recorded
    /// during the attempt on failure, which is not necessarily the one the
    /// root rule itself raised.
    pub fn try_parse(&self, input: &str) -> Result<T, MatchFailure> {
        let epoch = self.epoch.get().wrapping_add(1);
        self.epoch.set(epoch);

        let cursor = Cursor::with_epoch(Rc::from(input), epoch, self.config.track_diagnostics);
        log::trace!("starting parse of {} bytes", input.len());

        let root = &self.root;
        let headroom = self.config.stack_probe_headroom;
        let growth = self.config.stack_probe_growth;
        let result = stacker::maybe_grow(headroom, growth, || root.parse(&cursor));

        match result {
            Ok(value) => Ok(value),
            Err(root_failure) => {
                let best = cursor.best_diagnostic().unwrap_or(root_failure);
                log::debug!("parse failed: {best}");
                Err(best)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combinator::{ordered_choice2, sequence};
    use crate::primitive::{char, end_of_input};

    #[test]
    fn try_parse_resets_between_calls() {
        let root: Recursive<char> = Recursive::declare("root");
        root.define(sequence(
            "root",
            ordered_choice2("root", char('a'), char('b')),
        ));
        let grammar = Grammar::new(root);

        assert_eq!(grammar.try_parse("a").unwrap(), 'a');
        assert_eq!(grammar.try_parse("b").unwrap(), 'b');
        assert!(grammar.try_parse("c").is_err());
    }

    #[test]
    fn empty_input_against_a_nonempty_root_fails() {
        let root: Recursive<char> = Recursive::declare("root");
        root.define(sequence("root", char('a')));
        let grammar = Grammar::new(root);

        let err = grammar.try_parse("").unwrap_err();
        assert_eq!(err.pos, 0);
    }

    #[test]
    fn a_long_lived_grammar_does_not_leak_memo_state_between_inputs() {
        use crate::left_recursion::{memo_left, LeftMemo};
        use std::rc::Rc as StdRc;

        // expr := expr '+' digit | digit, reused across three different
        // inputs on the same `Grammar`. If `memo_left`'s table were not
        // epoch-tagged, the second and third calls could replay the fixed
        // point computed for the first input's byte positions.
        let expr: Recursive<i64> = Recursive::declare("expr");
        let digit = crate::primitive::regex(r"[0-9]+");
        let memo: StdRc<LeftMemo<i64>> = StdRc::new(LeftMemo::default());
        let expr_for_body = expr.clone();
        expr.define(sequence("expr", move |cursor: &Cursor| {
            memo_left(cursor, &memo, "expr", |cursor| {
                let mark = cursor.save();
                let grown = (|| -> Result<i64, MatchFailure> {
                    let left = expr_for_body.parse(cursor)?;
                    crate::primitive::char('+').parse(cursor)?;
                    let right = digit.parse(cursor)?.parse::<i64>().unwrap();
                    Ok(left + right)
                })();
                match grown {
                    Ok(value) => Ok(value),
                    Err(_) => {
                        cursor.restore(mark);
                        Ok(digit.parse(cursor)?.parse::<i64>().unwrap())
                    }
                }
            })
        }));
        let grammar = Grammar::new(expr);

        assert_eq!(grammar.try_parse("1+2+3").unwrap(), 6);
        assert_eq!(grammar.try_parse("10+20").unwrap(), 30);
        assert_eq!(grammar.try_parse("1+2+3+4").unwrap(), 10);
    }

    #[test]
    fn end_of_input_is_enforced_explicitly_by_the_grammar() {
        let root: Recursive<()> = Recursive::declare("root");
        root.define(sequence(
            "root",
            move |cursor: &Cursor| {
                char('a').parse(cursor)?;
                end_of_input().parse(cursor)
            },
        ));
        let grammar = Grammar::new(root);

        assert!(grammar.try_parse("a").is_ok());
        assert!(grammar.try_parse("ab").is_err());
    }
}
