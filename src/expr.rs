// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The expression evaluator.
//!
//! Recursive descent over the shared cursor, tightest binding
//! first:
//!
//! ```text
//! factor := '+' factor | '-' factor | '(' expr ')' | value
//! mult   := factor (('*'|'/'|'%') factor)*
//! add    := mult   (('+'|'-') mult)*
//! expr   := add    (relop add)?
//! ```
//!
//! All arithmetic is 64-bit signed and wraps.  Whitespace is not
//! permitted inside an expression; a space simply terminates the
//! parameter.  A `!` not followed by `=` is a comment leader, so
//! the evaluator backs up one character and stops.

use crate::cursor::Cursor;
use crate::diag::{Diag, NOSECS};
use crate::disk::SECTOR_SIZE;
use crate::result::{Error, Result};

/// Evaluates one expression at the cursor.
pub fn eval(dd: &mut Diag, cur: &mut Cursor) -> Result<i64> {
    let left = add(dd, cur)?;
    let rel: fn(i64, i64) -> bool = match cur.ch() {
        b'>' => {
            cur.bump();
            if cur.ch() == b'=' {
                cur.bump();
                |a, b| a >= b
            } else {
                |a, b| a > b
            }
        }
        b'<' => {
            cur.bump();
            if cur.ch() == b'=' {
                cur.bump();
                |a, b| a <= b
            } else {
                |a, b| a < b
            }
        }
        b'=' => {
            cur.bump();
            |a, b| a == b
        }
        b'!' => {
            cur.bump();
            if cur.ch() == b'=' {
                cur.bump();
                |a, b| a != b
            } else {
                cur.back();
                return Ok(left);
            }
        }
        _ => return Ok(left),
    };
    let right = add(dd, cur)?;
    Ok(rel(left, right) as i64)
}

fn add(dd: &mut Diag, cur: &mut Cursor) -> Result<i64> {
    let mut v = mult(dd, cur)?;
    loop {
        match cur.ch() {
            b'+' => {
                cur.bump();
                v = v.wrapping_add(mult(dd, cur)?);
            }
            b'-' => {
                cur.bump();
                v = v.wrapping_sub(mult(dd, cur)?);
            }
            _ => return Ok(v),
        }
    }
}

fn mult(dd: &mut Diag, cur: &mut Cursor) -> Result<i64> {
    let mut v = factor(dd, cur)?;
    loop {
        match cur.ch() {
            b'*' => {
                cur.bump();
                v = v.wrapping_mul(factor(dd, cur)?);
            }
            b'/' => {
                cur.bump();
                let d = factor(dd, cur)?;
                if d == 0 {
                    return Err(Error::Arith);
                }
                v = v.wrapping_div(d);
            }
            b'%' => {
                cur.bump();
                let d = factor(dd, cur)?;
                if d == 0 {
                    return Err(Error::Arith);
                }
                v = v.wrapping_rem(d);
            }
            _ => return Ok(v),
        }
    }
}

fn factor(dd: &mut Diag, cur: &mut Cursor) -> Result<i64> {
    match cur.ch() {
        b'+' => {
            cur.bump();
            factor(dd, cur)
        }
        b'-' => {
            cur.bump();
            Ok(factor(dd, cur)?.wrapping_neg())
        }
        b'(' => {
            cur.bump();
            let v = eval(dd, cur)?;
            if cur.ch() != b')' {
                return Err(Error::Syntax("Missing )"));
            }
            cur.bump();
            Ok(v)
        }
        _ => value(dd, cur),
    }
}

fn value(dd: &mut Diag, cur: &mut Cursor) -> Result<i64> {
    if cur.ch().is_ascii_digit() {
        return literal(cur);
    }
    let Some(name) = cur.word() else {
        return Err(Error::Syntax("Invalid expression"));
    };
    // Built-in variables shadow user variables, not the other
    // way around.
    match name.as_str() {
        "drvsiz" => Ok(dd.require_drive()? as i64),
        "secsiz" => Ok(SECTOR_SIZE as i64),
        "bufsiz" => Ok(NOSECS as i64),
        "rand" => Ok(dd.rng.rand64() as i64),
        "lbarnd" => {
            let size = dd.require_drive()?;
            if size == 0 {
                Ok(0)
            } else {
                Ok((dd.rng.rand64() % size) as i64)
            }
        }
        _ => dd.vars.get(&name).ok_or(Error::Variable(name)),
    }
}

/// C-style integer literal: `0x` hex, leading `0` octal, else
/// decimal.  Overflow wraps.
fn literal(cur: &mut Cursor) -> Result<i64> {
    let mut v: i64 = 0;
    if cur.ch() == b'0' {
        cur.bump();
        match cur.ch() {
            b'x' | b'X' => {
                cur.bump();
                if !cur.ch().is_ascii_hexdigit() {
                    return Err(Error::Syntax("Invalid expression"));
                }
                while cur.ch().is_ascii_hexdigit() {
                    let d = (cur.ch() as char).to_digit(16).unwrap();
                    v = v.wrapping_mul(16).wrapping_add(d as i64);
                    cur.bump();
                }
            }
            b'0'..=b'7' => {
                while matches!(cur.ch(), b'0'..=b'7') {
                    v = v.wrapping_mul(8).wrapping_add((cur.ch() - b'0') as i64);
                    cur.bump();
                }
            }
            _ => {}
        }
        return Ok(v);
    }
    while cur.ch().is_ascii_digit() {
        v = v.wrapping_mul(10).wrapping_add((cur.ch() - b'0') as i64);
        cur.bump();
    }
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes;

    fn ev(dd: &mut Diag, text: &str) -> Result<i64> {
        let mut cur = Cursor::imm(text);
        eval(dd, &mut cur)
    }

    #[test]
    fn literals() {
        let (mut dd, _) = fakes::diag(4);
        assert_eq!(ev(&mut dd, "42"), Ok(42));
        assert_eq!(ev(&mut dd, "0x10"), Ok(16));
        assert_eq!(ev(&mut dd, "0X1f"), Ok(31));
        assert_eq!(ev(&mut dd, "017"), Ok(15));
        assert_eq!(ev(&mut dd, "0"), Ok(0));
    }

    #[test]
    fn precedence_and_parens() {
        let (mut dd, _) = fakes::diag(4);
        assert_eq!(ev(&mut dd, "2+3*4"), Ok(14));
        assert_eq!(ev(&mut dd, "(2+3)*4"), Ok(20));
        assert_eq!(ev(&mut dd, "-2*3"), Ok(-6));
        assert_eq!(ev(&mut dd, "7%4+10/5"), Ok(5));
    }

    #[test]
    fn comparisons_yield_zero_or_one() {
        let (mut dd, _) = fakes::diag(4);
        assert_eq!(ev(&mut dd, "2>1"), Ok(1));
        assert_eq!(ev(&mut dd, "2<1"), Ok(0));
        assert_eq!(ev(&mut dd, "2>=2"), Ok(1));
        assert_eq!(ev(&mut dd, "2<=1"), Ok(0));
        assert_eq!(ev(&mut dd, "3=3"), Ok(1));
        assert_eq!(ev(&mut dd, "3!=3"), Ok(0));
    }

    #[test]
    fn divide_by_zero() {
        let (mut dd, _) = fakes::diag(4);
        assert_eq!(ev(&mut dd, "1/0"), Err(Error::Arith));
        assert_eq!(ev(&mut dd, "1%0"), Err(Error::Arith));
    }

    #[test]
    fn space_terminates() {
        let (mut dd, _) = fakes::diag(4);
        let mut cur = Cursor::imm("1 +2");
        assert_eq!(eval(&mut dd, &mut cur), Ok(1));
        assert_eq!(cur.ch(), b' ');
    }

    #[test]
    fn bang_backs_up() {
        let (mut dd, _) = fakes::diag(4);
        let mut cur = Cursor::imm("5!comment");
        assert_eq!(eval(&mut dd, &mut cur), Ok(5));
        assert_eq!(cur.ch(), b'!');
    }

    #[test]
    fn variables_and_unknowns() {
        let (mut dd, _) = fakes::diag(4);
        dd.vars.set("x", 7);
        assert_eq!(ev(&mut dd, "x*x"), Ok(49));
        assert_eq!(
            ev(&mut dd, "nope"),
            Err(Error::Variable("nope".to_string()))
        );
    }

    #[test]
    fn builtins() {
        let (mut dd, _) = fakes::diag(4);
        assert_eq!(ev(&mut dd, "secsiz"), Ok(512));
        assert_eq!(ev(&mut dd, "bufsiz"), Ok(NOSECS as i64));
        assert_eq!(ev(&mut dd, "drvsiz"), Err(Error::NoDrive));
        let r = ev(&mut dd, "rand").unwrap();
        assert!(r >= 0);
    }

    #[test]
    fn builtin_shadows_user_variable() {
        let (mut dd, _) = fakes::diag(4);
        dd.vars.set("secsiz", 9);
        assert_eq!(ev(&mut dd, "secsiz"), Ok(512));
    }

    #[test]
    fn rand_stream_is_monotonic_across_calls() {
        let (mut dd, _) = fakes::diag(4);
        dd.rng.set_seed(crate::rng::RESEED);
        let a = ev(&mut dd, "rand").unwrap();
        let b = ev(&mut dd, "rand").unwrap();
        assert_ne!(a, b);
    }
}
