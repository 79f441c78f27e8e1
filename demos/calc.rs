//! Left-to-right arithmetic, no operator precedence: `expr := expr op factor | factor`.
//!
//! Demonstrates `memo_left` handling a genuinely left-recursive rule, and
//! `Recursive` resolving the mutual reference between `expr` and `factor`.

use std::rc::Rc;

use parse_it::combinator::{ordered_choice2, sequence, try_map};
use parse_it::left_recursion::{memo_left, LeftMemo};
use parse_it::primitive::{char, regex};
use parse_it::rule::Recursive;
use parse_it::{Cursor, Grammar, Parser};

fn build_grammar() -> Grammar<f64> {
    let expr: Recursive<f64> = Recursive::declare("expr");
    let factor: Recursive<f64> = Recursive::declare("factor");

    let number = regex(r"[0-9]+(\.[0-9]+)?");
    let ws = regex(r"[ \t]*");

    let paren_expr = {
        let expr = expr.clone();
        move |cursor: &Cursor| {
            char('(').parse(cursor)?;
            ws.parse(cursor)?;
            let value = expr.parse(cursor)?;
            ws.parse(cursor)?;
            char(')').parse(cursor)?;
            Ok(value)
        }
    };
    let number = try_map("factor", number, |text: String| {
        text.parse::<f64>().map_err(|e| e.to_string())
    });
    factor.define(sequence(
        "factor",
        ordered_choice2("factor", number, paren_expr),
    ));

    let memo: Rc<LeftMemo<f64>> = Rc::new(LeftMemo::default());
    let expr_for_body = expr.clone();
    let factor_for_body = factor.clone();
    let body = move |cursor: &Cursor| {
        memo_left(cursor, &memo, "expr", |cursor| {
            let mark = cursor.save();
            let attempt = (|| -> Result<f64, parse_it::MatchFailure> {
                let left = expr_for_body.parse(cursor)?;
                ws.parse(cursor)?;
                let op = regex(r"[+\-*/]").parse(cursor)?;
                ws.parse(cursor)?;
                let right = factor_for_body.parse(cursor)?;
                Ok(match op.as_str() {
                    "+" => left + right,
                    "-" => left - right,
                    "*" => left * right,
                    "/" => left / right,
                    _ => unreachable!(),
                })
            })();
            match attempt {
                Ok(value) => Ok(value),
                Err(_) => {
                    cursor.restore(mark);
                    factor_for_body.parse(cursor)
                }
            }
        })
    };
    expr.define(sequence("expr", body));

    Grammar::new(expr)
}

fn main() {
    env_logger::init();
    let grammar = build_grammar();
    for input in ["1 + 2 * 3", "(1 + 2) * 3", "10 / 2 - 3"] {
        match grammar.try_parse(input) {
            Ok(value) => println!("{input} = {value}"),
            Err(err) => println!("{input}: {err}"),
        }
    }
}
