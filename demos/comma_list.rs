//! A left-recursive comma-separated list: `list := list ',' term | term`.
//!
//! Shown alongside `calc.rs` mainly to demonstrate that `memo_left` works
//! just as well when the recursive rule's payload is a growing `Vec` rather
//! than a folded scalar.

use std::rc::Rc;

use parse_it::combinator::sequence;
use parse_it::left_recursion::{memo_left, LeftMemo};
use parse_it::primitive::{char, regex};
use parse_it::rule::Recursive;
use parse_it::{Cursor, Grammar, Parser};

fn build_grammar() -> Grammar<Vec<i64>> {
    let list: Recursive<Vec<i64>> = Recursive::declare("list");
    let number = regex(r"[0-9]+");
    let ws = regex(r"[ \t]*");

    let memo: Rc<LeftMemo<Vec<i64>>> = Rc::new(LeftMemo::default());
    let list_for_body = list.clone();
    let body = move |cursor: &Cursor| {
        memo_left(cursor, &memo, "list", |cursor| {
            let mark = cursor.save();
            let attempt = (|| -> Result<Vec<i64>, parse_it::MatchFailure> {
                let mut items = list_for_body.parse(cursor)?;
                ws.parse(cursor)?;
                char(',').parse(cursor)?;
                ws.parse(cursor)?;
                let next: i64 = number.parse(cursor)?.parse().unwrap();
                items.push(next);
                Ok(items)
            })();
            match attempt {
                Ok(items) => Ok(items),
                Err(_) => {
                    cursor.restore(mark);
                    let first: i64 = number.parse(cursor)?.parse().unwrap();
                    Ok(vec![first])
                }
            }
        })
    };
    list.define(sequence("list", body));

    Grammar::new(list)
}

fn main() {
    env_logger::init();
    let grammar = build_grammar();
    match grammar.try_parse("1, 2, 3, 4") {
        Ok(items) => println!("parsed: {items:?}"),
        Err(err) => println!("failed: {err}"),
    }
}
