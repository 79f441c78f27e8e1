//! Named rule binding and forward references.
//!
//! A grammar is a graph of mutually-referencing rules, so a rule must be
//! nameable before its body is fully built. `Recursive::declare` hands out a
//! handle that can be referenced immediately; `Recursive::define` fills in the
//! body once it is built. This mirrors the declare/define split used for
//! compile-time-generated recursive rules, backed here by a plain
//! `Rc<RefCell<Option<..>>>` cell rather than an arena slot, since rules in
//! this crate are assembled at runtime rather than by a macro that can
//! pre-size an arena.

use std::cell::RefCell;
use std::rc::Rc;

use crate::cursor::{Cursor, Parser};
use crate::diagnostic::MatchFailure;

/// A forward-declared rule. Clone is cheap (an `Rc` bump) and all clones
/// refer to the same underlying body, so a `Recursive` can be captured by
/// value in the closures of the rules that reference it.
pub struct Recursive<T> {
    name: &'static str,
    inner: Rc<RefCell<Option<Box<dyn Parser<Output = T>>>>>,
}

impl<T> Clone for Recursive<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            inner: self.inner.clone(),
        }
    }
}

impl<T> Recursive<T> {
    /// Declare a rule named `name` without yet providing its body. Any
    /// combinator built before `define` is called may capture this handle and
    /// invoke it; doing so before `define` is called is a programmer error.
    pub fn declare(name: &'static str) -> Self {
        Self {
            name,
            inner: Rc::new(RefCell::new(None)),
        }
    }

    /// Supply the rule's body. Must be called exactly once per `declare`.
    ///
    /// # Panics
    /// Panics if called more than once on the same handle.
    pub fn define(&self, parser: impl Parser<Output = T> + 'static)
    where
        T: 'static,
    {
        let mut slot = self.inner.borrow_mut();
        assert!(slot.is_none(), "rule '{}' defined more than once", self.name);
        *slot = Some(Box::new(parser));
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Parser for Recursive<T> {
    type Output = T;

    fn parse(&self, cursor: &Cursor) -> Result<T, MatchFailure> {
        log::trace!("dispatching rule '{}' at {}", self.name, cursor.pos());
        let borrowed = self.inner.borrow();
        let result = match borrowed.as_ref() {
            Some(parser) => parser.parse(cursor),
            None => panic!("rule '{}' used before being defined", self.name),
        };
        log::trace!("returning from rule '{}': {}", self.name, result.is_ok());
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combinator::{ordered_choice2, sequence};
    use crate::primitive::char;
    use std::rc::Rc as StdRc;

    #[test]
    fn mutually_recursive_rules_resolve() {
        // even := '0' | odd
        // odd  := '1' | even
        let even: Recursive<char> = Recursive::declare("even");
        let odd: Recursive<char> = Recursive::declare("odd");

        even.define(sequence("even", ordered_choice2("even", char('0'), odd.clone())));
        odd.define(sequence("odd", ordered_choice2("odd", char('1'), even.clone())));

        let cursor = Cursor::new(StdRc::from("0"));
        assert_eq!(even.parse(&cursor).unwrap(), '0');
    }

    #[test]
    #[should_panic(expected = "defined more than once")]
    fn redefining_a_rule_panics() {
        let r: Recursive<char> = Recursive::declare("r");
        r.define(char('a'));
        r.define(char('b'));
    }
}
