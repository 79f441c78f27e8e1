//! Packrat memoisation for non-left-recursive rules.

use std::cell::RefCell;
use std::fmt::Debug;

use rustc_hash::FxHashMap;

use crate::cursor::Cursor;
use crate::diagnostic::MatchFailure;

type MemoEntry<T> = Result<(T, usize), MatchFailure>;

/// Caches the result of parsing a rule at a given position, so that parsing
/// the same position with the same rule body only ever runs once. Unlike a
/// memoiser that only caches successes, this also caches failures: a position
/// known to fail a rule must replay that failure without re-running the body.
///
/// Entries are tagged with the [`Cursor`] epoch they were recorded under (see
/// [`Cursor::epoch`]) so that a `Memo` built once by a rule closure and reused
/// across many `Grammar::try_parse` calls on different inputs does not replay
/// a result left over from a previous call at the same byte position.
pub struct Memo<T: Clone> {
    map: RefCell<FxHashMap<usize, (u64, MemoEntry<T>)>>,
}

impl<T: Clone> Default for Memo<T> {
    fn default() -> Self {
        Self {
            map: RefCell::new(FxHashMap::default()),
        }
    }
}

impl<T: Clone + Debug> Debug for Memo<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.map.borrow().fmt(f)
    }
}

impl<T: Clone> Memo<T> {
    pub fn get(&self, pos: usize, epoch: u64) -> Option<MemoEntry<T>> {
        self.map
            .borrow()
            .get(&pos)
            .filter(|(recorded_epoch, _)| *recorded_epoch == epoch)
            .map(|(_, entry)| entry.clone())
    }

    pub fn insert(&self, pos: usize, epoch: u64, entry: MemoEntry<T>) {
        self.map.borrow_mut().insert(pos, (epoch, entry));
    }
}

/// Runs `body` at the cursor's current position through `memo`, replaying a
/// prior result (success or failure) without invoking `body` again.
#[inline]
pub fn memoize<T: Clone>(
    cursor: &Cursor,
    memo: &Memo<T>,
    body: impl FnOnce(&Cursor) -> Result<T, MatchFailure>,
) -> Result<T, MatchFailure> {
    let pos = cursor.pos();
    let epoch = cursor.epoch();
    if let Some(entry) = memo.get(pos, epoch) {
        return match entry {
            Ok((value, end)) => {
                cursor.seek(end);
                Ok(value)
            }
            Err(failure) => Err(failure),
        };
    }
    match body(cursor) {
        Ok(value) => {
            let end = cursor.pos();
            memo.insert(pos, epoch, Ok((value.clone(), end)));
            Ok(value)
        }
        Err(failure) => {
            memo.insert(pos, epoch, Err(failure.clone()));
            Err(failure)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::Parser;
    use crate::primitive::regex;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn repeated_calls_at_same_position_only_run_body_once() {
        let calls = Rc::new(Cell::new(0));
        let memo: Memo<String> = Memo::default();
        let digits = regex(r"[0-9]+");

        let run = |cursor: &Cursor| {
            calls.set(calls.get() + 1);
            memoize(cursor, &memo, |c| digits.parse(c))
        };

        let cursor = Cursor::new(Rc::from("123abc"));
        assert_eq!(run(&cursor).unwrap(), "123");
        cursor.restore(0);
        assert_eq!(run(&cursor).unwrap(), "123");
        assert_eq!(calls.get(), 2, "memoize is consulted each call");
        assert_eq!(cursor.pos(), 3, "memoised success replays the end position");
    }

    #[test]
    fn memoised_failure_replays_without_rerunning_body() {
        let calls = Rc::new(Cell::new(0));
        let memo: Memo<String> = Memo::default();

        let cursor = Cursor::new(Rc::from("abc"));
        let digits = regex(r"[0-9]+");
        let mut attempt = || {
            memoize(&cursor, &memo, |c| {
                calls.set(calls.get() + 1);
                digits.parse(c)
            })
        };

        assert!(attempt().is_err());
        assert!(attempt().is_err());
        assert_eq!(calls.get(), 1, "a memoised failure must not re-run the body");
    }
}
