//! The cursor that drives parsing, and the [`Parser`] trait every combinator implements.
//!
//! `Cursor` owns the input text and the current position, plus the shared
//! diagnostic heap (see [`crate::diagnostic`]). It uses interior mutability so that
//! a parser can be written as `Fn(&Cursor) -> Result<T, MatchFailure>` without
//! threading `&mut` through every combinator.
//!
//! # Backtracking
//!
//! A combinator that wants to try something speculatively calls [`Cursor::save`]
//! to get a checkpoint, attempts the body, and either lets the checkpoint drop
//! (on success) or calls [`Cursor::restore`] (on failure) to roll the position
//! back. Since the checkpoint is a plain `usize`, there is no separate stack to
//! manage; restoring out of order is a caller bug, not a runtime state to guard.

use std::cell::Cell;
use std::rc::Rc;

use crate::diagnostic::{DiagnosticHeap, MatchFailure};

/// A parser is anything that can consume some of a [`Cursor`] and produce a value
/// or a [`MatchFailure`].
///
/// Any closure of the right shape implements this automatically, so most
/// combinators in this crate are built out of plain closures; the combinator
/// *structs* (`Sequence`, `Repeat`, ...) exist only where the combinator needs
/// to carry extra configuration (a rule name, a minimum repeat count, ...).
pub trait Parser {
    type Output;

    fn parse(&self, cursor: &Cursor) -> Result<Self::Output, MatchFailure>;
}

impl<F, T> Parser for F
where
    F: Fn(&Cursor) -> Result<T, MatchFailure>,
{
    type Output = T;

    fn parse(&self, cursor: &Cursor) -> Result<T, MatchFailure> {
        self(cursor)
    }
}

/// The shared state threaded through one `try_parse` call.
///
/// Cloning a `Cursor` is cheap: the input text and diagnostic heap are
/// reference-counted, and the position is a plain `Cell<usize>` copied by value.
#[derive(Clone)]
pub struct Cursor {
    input: Rc<str>,
    pos: Cell<usize>,
    diagnostics: DiagnosticHeap,
    /// Bumped by [`crate::Grammar::try_parse`] on every call so that a memo
    /// table built once (by rule closures captured at grammar-construction
    /// time) and reused across many `try_parse` calls can tell a stale entry
    /// from a previous input apart from a fresh one, without needing the
    /// driver to reach into every rule's memo table to clear it. A `Cursor`
    /// built directly via `new`/`with_diagnostics_tracking` always carries
    /// epoch 0, which is fine as long as that cursor is used for only one
    /// parse (the common case in tests that construct a fresh cursor per
    /// assertion).
    epoch: u64,
}

impl Cursor {
    pub fn new(input: Rc<str>) -> Self {
        Self::with_epoch(input, 0, true)
    }

    pub fn with_diagnostics_tracking(input: Rc<str>, track: bool) -> Self {
        Self::with_epoch(input, 0, track)
    }

    /// Build a cursor tagged with `epoch`, the generation that memo tables
    /// use to distinguish "cached this call" from "stale from a previous
    /// `try_parse` on the same grammar".
    pub fn with_epoch(input: Rc<str>, epoch: u64, track: bool) -> Self {
        Self {
            input,
            pos: Cell::new(0),
            diagnostics: DiagnosticHeap::new(track),
            epoch,
        }
    }

    /// The generation this cursor belongs to. See the field doc on `epoch`.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// The full input text.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// The current byte offset into the input.
    pub fn pos(&self) -> usize {
        self.pos.get()
    }

    /// The unconsumed suffix of the input.
    pub fn rest(&self) -> &str {
        &self.input[self.pos.get()..]
    }

    pub fn is_empty(&self) -> bool {
        self.pos.get() >= self.input.len()
    }

    /// Advance the cursor by `n` bytes. `n` must land on a char boundary.
    pub fn advance(&self, n: usize) {
        self.pos.set(self.pos.get() + n);
    }

    /// Checkpoint the current position.
    pub fn save(&self) -> usize {
        self.pos.get()
    }

    /// Roll the position back to a checkpoint taken from [`Cursor::save`].
    pub fn restore(&self, mark: usize) {
        self.pos.set(mark);
    }

    /// Jump the position forward to an already-known end, e.g. when replaying
    /// a memoised result. Unlike `restore`, this is allowed to move forward
    /// past the current position.
    pub fn seek(&self, pos: usize) {
        self.pos.set(pos);
    }

    /// Build a failure anchored at the current position and record it in the
    /// diagnostic heap.
    pub fn fail(&self, rule: &'static str, message: impl Into<String>) -> MatchFailure {
        let failure = MatchFailure::new(rule, self.pos.get(), &self.input, message.into(), None);
        self.diagnostics.push(failure.clone());
        failure
    }

    /// Wrap an existing failure as the cause of a new one, labelled with `rule`.
    pub fn wrap(
        &self,
        rule: &'static str,
        message: impl Into<String>,
        cause: MatchFailure,
    ) -> MatchFailure {
        let failure = MatchFailure::new(
            rule,
            self.pos.get(),
            &self.input,
            message.into(),
            Some(Rc::new(cause)),
        );
        self.diagnostics.push(failure.clone());
        failure
    }

    /// The deepest failure recorded so far across the whole parse, if any.
    pub fn best_diagnostic(&self) -> Option<MatchFailure> {
        self.diagnostics.best()
    }
}
