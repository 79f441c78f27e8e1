//! Combinators: `sequence`, `ordered_choice`, `optional`, `zero_or_more`,
//! `one_or_more`, `separated`.

use crate::cursor::{Cursor, Parser};
use crate::diagnostic::MatchFailure;

/// Applies `f` to a successful parse's value, leaving failures untouched.
/// This is how a primitive's matched text (always `char`, `String`, or
/// `String` for `char`/`string`/`regex` respectively) gets turned into a
/// user-chosen value type, per spec §4.2's "optional transform".
#[derive(Clone, Copy)]
pub struct Map<P, F> {
    parser: P,
    f: F,
}

impl<T, U, P: Parser<Output = T>, F: Fn(T) -> U> Parser for Map<P, F> {
    type Output = U;

    fn parse(&self, cursor: &Cursor) -> Result<U, MatchFailure> {
        self.parser.parse(cursor).map(&self.f)
    }
}

pub fn map<T, U>(parser: impl Parser<Output = T>, f: impl Fn(T) -> U) -> Map<impl Parser<Output = T>, impl Fn(T) -> U> {
    Map { parser, f }
}

/// Like [`map`], but `f` can itself fail (e.g. a numeric literal that
/// overflows its target type). `name` labels the failure the way a
/// `sequence`-wrapped rule would; on success, the cursor is left exactly
/// where the inner parser left it.
#[derive(Clone, Copy)]
pub struct TryMap<P, F> {
    name: &'static str,
    parser: P,
    f: F,
}

impl<T, U, P: Parser<Output = T>, F: Fn(T) -> Result<U, String>> Parser for TryMap<P, F> {
    type Output = U;

    fn parse(&self, cursor: &Cursor) -> Result<U, MatchFailure> {
        let mark = cursor.save();
        let value = self.parser.parse(cursor)?;
        match (self.f)(value) {
            Ok(mapped) => Ok(mapped),
            Err(message) => {
                cursor.restore(mark);
                Err(cursor.fail(self.name, message))
            }
        }
    }
}

pub fn try_map<T, U>(
    name: &'static str,
    parser: impl Parser<Output = T>,
    f: impl Fn(T) -> Result<U, String>,
) -> TryMap<impl Parser<Output = T>, impl Fn(T) -> Result<U, String>> {
    TryMap { name, parser, f }
}

/// Groups a rule body under `name` for diagnostics. If the body's failure
/// already carries this rule's name (it propagated untouched from a
/// sub-sequence for the same rule), it is re-raised unchanged; otherwise it is
/// wrapped so the rule that actually failed is visible in the diagnostic.
#[derive(Clone, Copy)]
pub struct Sequence<P> {
    name: &'static str,
    parser: P,
}

impl<T, P: Parser<Output = T>> Parser for Sequence<P> {
    type Output = T;

    fn parse(&self, cursor: &Cursor) -> Result<T, MatchFailure> {
        log::trace!("entering rule '{}' at {}", self.name, cursor.pos());
        let result = self.parser.parse(cursor).map_err(|failure| {
            if failure.rule == self.name {
                failure
            } else {
                cursor.wrap(self.name, "error parsing sequence", failure)
            }
        });
        match &result {
            Ok(_) => log::trace!("exiting rule '{}' at {}", self.name, cursor.pos()),
            Err(_) => log::trace!("exiting rule '{}' with failure at {}", self.name, cursor.pos()),
        }
        result
    }
}

pub fn sequence<T>(name: &'static str, parser: impl Parser<Output = T>) -> Sequence<impl Parser<Output = T>> {
    Sequence { name, parser }
}

/// First-match-wins choice between two alternatives.
#[derive(Clone, Copy)]
pub struct Choice2<P1, P2> {
    name: &'static str,
    first: P1,
    second: P2,
}

impl<T, P1: Parser<Output = T>, P2: Parser<Output = T>> Parser for Choice2<P1, P2> {
    type Output = T;

    fn parse(&self, cursor: &Cursor) -> Result<T, MatchFailure> {
        let mark = cursor.save();
        let first_failure = match self.first.parse(cursor) {
            Ok(value) => return Ok(value),
            Err(failure) => {
                cursor.restore(mark);
                failure
            }
        };
        match self.second.parse(cursor) {
            Ok(value) => Ok(value),
            Err(second_failure) => {
                cursor.restore(mark);
                let cause = if first_failure.pos >= second_failure.pos {
                    first_failure
                } else {
                    second_failure
                };
                Err(cursor.wrap(self.name, "no alternative matched", cause))
            }
        }
    }
}

pub fn ordered_choice2<T>(
    name: &'static str,
    first: impl Parser<Output = T>,
    second: impl Parser<Output = T>,
) -> Choice2<impl Parser<Output = T>, impl Parser<Output = T>> {
    Choice2 {
        name,
        first,
        second,
    }
}

/// First-match-wins choice over a dynamically sized list of alternatives.
///
/// Unlike a fixed-arity tuple of alternatives (useful when the grammar is
/// written out by hand, see [`ordered_choice2`]), this is the form grammars
/// built up at runtime reach for most often — e.g. a rule whose alternatives
/// are generated from a list of keywords.
pub struct OrderedChoice<T> {
    name: &'static str,
    alternatives: Vec<Box<dyn Parser<Output = T>>>,
}

impl<T> Parser for OrderedChoice<T> {
    type Output = T;

    fn parse(&self, cursor: &Cursor) -> Result<T, MatchFailure> {
        let mark = cursor.save();
        let mut deepest_cause: Option<MatchFailure> = None;
        for alt in &self.alternatives {
            match alt.parse(cursor) {
                Ok(value) => return Ok(value),
                Err(failure) => {
                    cursor.restore(mark);
                    deepest_cause = match deepest_cause {
                        Some(prev) if prev.pos >= failure.pos => Some(prev),
                        _ => Some(failure),
                    };
                }
            }
        }
        let cause = deepest_cause.unwrap_or_else(|| cursor.fail(self.name, "no alternatives"));
        Err(cursor.wrap(self.name, "no alternative matched", cause))
    }
}

pub fn ordered_choice<T>(name: &'static str, alternatives: Vec<Box<dyn Parser<Output = T>>>) -> OrderedChoice<T> {
    OrderedChoice { name, alternatives }
}

/// Tries `body`; returns `None` on failure without propagating it, restoring
/// the cursor to where it was before the attempt.
#[derive(Clone, Copy)]
pub struct Optional<P> {
    parser: P,
}

impl<T, P: Parser<Output = T>> Parser for Optional<P> {
    type Output = Option<T>;

    fn parse(&self, cursor: &Cursor) -> Result<Option<T>, MatchFailure> {
        let mark = cursor.save();
        match self.parser.parse(cursor) {
            Ok(value) => Ok(Some(value)),
            Err(_) => {
                cursor.restore(mark);
                Ok(None)
            }
        }
    }
}

pub fn optional<T>(parser: impl Parser<Output = T>) -> Optional<impl Parser<Output = T>> {
    Optional { parser }
}

/// Repeats `body` at least `min` times. Stops as soon as an iteration either
/// fails, or succeeds without consuming any input (the latter is the
/// termination guard required so that a body capable of matching the empty
/// string can never loop forever).
#[derive(Clone, Copy)]
pub struct Repeat<P> {
    name: &'static str,
    parser: P,
    min: usize,
}

impl<T, P: Parser<Output = T>> Parser for Repeat<P> {
    type Output = Vec<T>;

    fn parse(&self, cursor: &Cursor) -> Result<Vec<T>, MatchFailure> {
        let mut values = Vec::new();
        let mut first_failure = None;
        loop {
            let mark = cursor.save();
            match self.parser.parse(cursor) {
                Ok(value) => {
                    if cursor.pos() == mark {
                        // zero-width match inside a repetition: stop instead of looping forever
                        break;
                    }
                    values.push(value);
                }
                Err(failure) => {
                    cursor.restore(mark);
                    if first_failure.is_none() {
                        first_failure = Some(failure);
                    }
                    break;
                }
            }
        }
        if values.len() < self.min {
            let cause = first_failure.unwrap_or_else(|| cursor.fail(self.name, "no repetitions matched"));
            return Err(cursor.wrap(self.name, format!("expected at least {} repetitions", self.min), cause));
        }
        Ok(values)
    }
}

pub fn zero_or_more<T>(name: &'static str, parser: impl Parser<Output = T>) -> Repeat<impl Parser<Output = T>> {
    Repeat {
        name,
        parser,
        min: 0,
    }
}

pub fn one_or_more<T>(name: &'static str, parser: impl Parser<Output = T>) -> Repeat<impl Parser<Output = T>> {
    Repeat {
        name,
        parser,
        min: 1,
    }
}

/// Zero or more occurrences of `body` separated by `sep`. If `required` is
/// true, at least one `body` must match. `trailing` controls whether a final
/// separator with no following `body` is accepted (and consumed) or left
/// unconsumed for the caller to match instead.
pub struct Separated<S, P> {
    name: &'static str,
    sep: S,
    parser: P,
    required: bool,
    trailing: bool,
}

impl<T, U, S: Parser<Output = U>, P: Parser<Output = T>> Parser for Separated<S, P> {
    type Output = Vec<T>;

    fn parse(&self, cursor: &Cursor) -> Result<Vec<T>, MatchFailure> {
        let mut values = Vec::new();

        let first_mark = cursor.save();
        match self.parser.parse(cursor) {
            Ok(value) => values.push(value),
            Err(failure) => {
                cursor.restore(first_mark);
                if self.required {
                    return Err(cursor.wrap(self.name, "expected at least one element", failure));
                }
                return Ok(values);
            }
        }

        loop {
            let before_sep = cursor.save();
            if self.sep.parse(cursor).is_err() {
                cursor.restore(before_sep);
                break;
            }
            let before_item = cursor.save();
            match self.parser.parse(cursor) {
                Ok(value) => values.push(value),
                Err(_) => {
                    if self.trailing {
                        // keep the separator consumed, drop the failed item attempt
                        cursor.restore(before_item);
                    } else {
                        cursor.restore(before_sep);
                    }
                    break;
                }
            }
        }

        Ok(values)
    }
}

pub fn separated<T, U>(
    name: &'static str,
    sep: impl Parser<Output = U>,
    required: bool,
    trailing: bool,
    parser: impl Parser<Output = T>,
) -> Separated<impl Parser<Output = U>, impl Parser<Output = T>> {
    Separated {
        name,
        sep,
        parser,
        required,
        trailing,
    }
}
