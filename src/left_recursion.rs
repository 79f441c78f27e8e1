//! Seed-and-grow memoisation for left-recursive rules.
//!
//! Classical packrat parsing diverges on a rule that calls itself as its own
//! leftmost sub-parse (`expr := expr '+' term | term`): the first call into
//! `expr` immediately calls into `expr` again at the same position, forever.
//!
//! The fix used here seeds the memo table at that position with a failure,
//! then re-runs the rule body in a loop. Each iteration's self-reference hits
//! the memo table instead of recursing further, so it resolves to whatever
//! the *previous* iteration managed to parse — letting the parse grow one
//! layer to the left per iteration, until an iteration fails to grow the end
//! position any further, at which point the previous iteration's result is
//! the fixed point.

use std::cell::RefCell;

use rustc_hash::FxHashMap;

use crate::cursor::Cursor;
use crate::diagnostic::MatchFailure;

/// Memo table for a single left-recursive rule. Distinct from [`crate::memo::Memo`]
/// because an absent entry means something different here: "not yet seeded",
/// not "never attempted".
///
/// As with [`crate::memo::Memo`], entries are tagged with the cursor epoch
/// they were grown under so a table reused across `try_parse` calls on a
/// long-lived `Grammar` never replays a fixed point computed for a previous
/// input.
pub struct LeftMemo<T: Clone> {
    map: RefCell<FxHashMap<usize, (u64, Option<T>, usize)>>,
}

impl<T: Clone> Default for LeftMemo<T> {
    fn default() -> Self {
        Self {
            map: RefCell::new(FxHashMap::default()),
        }
    }
}

impl<T: Clone> LeftMemo<T> {
    fn get(&self, pos: usize, epoch: u64) -> Option<(Option<T>, usize)> {
        self.map
            .borrow()
            .get(&pos)
            .filter(|(recorded_epoch, _, _)| *recorded_epoch == epoch)
            .map(|(_, value, end)| (value.clone(), *end))
    }

    fn insert(&self, pos: usize, epoch: u64, entry: (Option<T>, usize)) {
        self.map.borrow_mut().insert(pos, (epoch, entry.0, entry.1));
    }
}

/// Drive the seed-and-grow fixed point for `rule` at the cursor's current
/// position. `body` may be invoked more than once at the same start position;
/// each invocation sees the previous iteration's result via `memo` when it
/// recurses into the same rule.
///
/// A rule wrapped in `memo_left` must not also be wrapped in
/// [`crate::memo::memoize`]: the two memo tables disagree on what an absent
/// entry means and combining them would corrupt the fixed point.
#[inline]
pub fn memo_left<T: Clone>(
    cursor: &Cursor,
    memo: &LeftMemo<T>,
    rule: &'static str,
    mut body: impl FnMut(&Cursor) -> Result<T, MatchFailure>,
) -> Result<T, MatchFailure> {
    let pos = cursor.pos();
    let epoch = cursor.epoch();

    if let Some((value, end)) = memo.get(pos, epoch) {
        cursor.seek(end);
        return match value {
            Some(value) => Ok(value),
            None => Err(cursor.fail(rule, "left-recursive rule has no seed yet at this position")),
        };
    }

    memo.insert(pos, epoch, (None, pos));
    let mut best: (Option<T>, usize) = (None, pos);

    loop {
        cursor.seek(pos);
        match body(cursor) {
            Ok(value) => {
                let end = cursor.pos();
                if end <= best.1 {
                    log::trace!("memoLeft '{rule}' stopped growing at {}", best.1);
                    break;
                }
                log::debug!("memoLeft '{rule}' grew from {} to {end}", best.1);
                best = (Some(value), end);
                memo.insert(pos, epoch, best.clone());
            }
            Err(_) => break,
        }
    }

    cursor.seek(best.1);
    match best.0 {
        Some(value) => Ok(value),
        None => Err(cursor.fail(rule, "left-recursive rule never matched")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combinator::{ordered_choice2, sequence};
    use crate::primitive::{char, regex};
    use crate::cursor::Parser;
    use crate::rule::Recursive;
    use std::rc::Rc;

    /// `expr := expr '+' digit | digit`, left-to-right, matching the spec's
    /// worked left-recursion example.
    fn build_left_recursive_sum() -> Recursive<i64> {
        let expr: Recursive<i64> = Recursive::declare("expr");
        let memo: Rc<LeftMemo<i64>> = Rc::new(LeftMemo::default());
        let digit = regex(r"[0-9]+");

        let expr_for_body = expr.clone();
        let memo_for_body = memo.clone();
        let body = move |cursor: &Cursor| {
            memo_left(cursor, &memo_for_body, "expr", |cursor| {
                let mark = cursor.save();
                let sum_attempt = (|| -> Result<i64, MatchFailure> {
                    let left = expr_for_body.parse(cursor)?;
                    char('+').parse(cursor)?;
                    let right = digit.parse(cursor)?.parse::<i64>().unwrap();
                    Ok(left + right)
                })();
                match sum_attempt {
                    Ok(value) => Ok(value),
                    Err(_) => {
                        cursor.restore(mark);
                        Ok(digit.parse(cursor)?.parse::<i64>().unwrap())
                    }
                }
            })
        };

        expr.define(sequence("expr", body));
        expr
    }

    #[test]
    fn left_recursive_sum_grows_left_to_right() {
        let expr = build_left_recursive_sum();
        let cursor = Cursor::new(Rc::from("1+2+3"));
        assert_eq!(expr.parse(&cursor).unwrap(), 6);
        assert_eq!(cursor.pos(), 5);
    }

    #[test]
    fn non_growing_alternative_falls_back() {
        let expr = build_left_recursive_sum();
        let cursor = Cursor::new(Rc::from("42"));
        assert_eq!(expr.parse(&cursor).unwrap(), 42);
    }

    #[test]
    fn fixed_point_matches_equivalent_right_associative_parse() {
        // Compare against a hand-written non-left-recursive right-fold over
        // the same digits, as called for by the spec's left-recursion
        // fixed-point property: `expr` on "1+2+3" must equal evaluating
        // "((1+2)+3)" left-to-right.
        let expr = build_left_recursive_sum();
        let cursor = Cursor::new(Rc::from("1+2+3"));
        let via_left_recursion = expr.parse(&cursor).unwrap();

        let digits: Vec<i64> = "1+2+3"
            .split('+')
            .map(|d| d.parse().unwrap())
            .collect();
        let folded = digits.into_iter().reduce(|a, b| a + b).unwrap();

        assert_eq!(via_left_recursion, folded);
    }

    #[test]
    fn ordered_choice_inside_left_recursion_still_recovers() {
        // sanity check that combinators compose normally inside a memo_left body
        let a_or_b: Recursive<char> = Recursive::declare("a_or_b");
        a_or_b.define(sequence("a_or_b", ordered_choice2("a_or_b", char('a'), char('b'))));
        let cursor = Cursor::new(Rc::from("b"));
        assert_eq!(a_or_b.parse(&cursor).unwrap(), 'b');
    }
}
