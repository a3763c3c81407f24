// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The print family: `p`/`pn` with the format mini-language,
//! `echo`/`echon`, and `input`.

use crate::cons::Console;
use crate::cursor::Cursor;
use crate::diag::Diag;
use crate::expr;
use crate::result::{Error, Outcome, Result};
use crate::{cput, cputln};

/// `p`/`pn ["fmt"] expr...`.  With a format string, `%` takes
/// `%[width[.prec]]{d|x|o}`: precision zero-pads the digits,
/// width space-pads the field.  A backslash escapes the next
/// format character.  A `%` with an unknown conversion prints
/// its value in plain decimal; a directive with no expression
/// left prints nothing.
pub fn print(dd: &mut Diag, cur: &mut Cursor, newline: bool) -> Result<Outcome> {
    cur.skip_ws();
    if cur.ch() == b'"' {
        let fmt = cur.quoted()?;
        let mut args = Vec::new();
        loop {
            cur.skip_ws();
            if !cur.at_arg() {
                break;
            }
            args.push(expr::eval(dd, cur)?);
        }
        render(&mut dd.cons, &fmt, &args)?;
    } else {
        let mut first = true;
        loop {
            cur.skip_ws();
            if !cur.at_arg() {
                break;
            }
            let v = expr::eval(dd, cur)?;
            if !first {
                cput!(dd.cons, " ")?;
            }
            cput!(dd.cons, "{v}")?;
            first = false;
        }
    }
    if newline {
        cputln!(dd.cons)?;
    }
    Ok(Outcome::Ok)
}

fn render(cons: &mut Console, fmt: &str, args: &[i64]) -> Result<()> {
    let bytes = fmt.as_bytes();
    let mut args = args.iter();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                i += 1;
                if i < bytes.len() {
                    cput!(cons, "{}", bytes[i] as char)?;
                    i += 1;
                }
            }
            b'%' => {
                i += 1;
                let mut width = 0usize;
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    width = width * 10 + (bytes[i] - b'0') as usize;
                    i += 1;
                }
                let mut prec = None;
                if i < bytes.len() && bytes[i] == b'.' {
                    i += 1;
                    let mut p = 0usize;
                    while i < bytes.len() && bytes[i].is_ascii_digit() {
                        p = p * 10 + (bytes[i] - b'0') as usize;
                        i += 1;
                    }
                    prec = Some(p);
                }
                match bytes.get(i) {
                    Some(b'd') => {
                        i += 1;
                        field(cons, args.next(), 10, width, prec)?;
                    }
                    Some(b'x') => {
                        i += 1;
                        field(cons, args.next(), 16, width, prec)?;
                    }
                    Some(b'o') => {
                        i += 1;
                        field(cons, args.next(), 8, width, prec)?;
                    }
                    // Unknown conversion: plain decimal, and the
                    // character prints as itself.
                    _ => field(cons, args.next(), 10, 0, None)?,
                }
            }
            c => {
                cput!(cons, "{}", c as char)?;
                i += 1;
            }
        }
    }
    Ok(())
}

/// One formatted value.  A missing value prints nothing.
fn field(
    cons: &mut Console,
    v: Option<&i64>,
    radix: u32,
    width: usize,
    prec: Option<usize>,
) -> Result<()> {
    let Some(&v) = v else {
        return Ok(());
    };
    let (sign, digits) = match radix {
        10 if v < 0 => ("-", v.unsigned_abs().to_string()),
        10 => ("", v.to_string()),
        16 => ("", format!("{:x}", v as u64)),
        _ => ("", format!("{:o}", v as u64)),
    };
    let mut s = String::new();
    if let Some(p) = prec {
        for _ in digits.len()..p {
            s.push('0');
        }
    }
    s.push_str(&digits);
    let s = format!("{sign}{s}");
    for _ in s.len()..width {
        cput!(cons, " ")?;
    }
    cput!(cons, "{s}")?;
    Ok(())
}

/// `echo`/`echon`: the rest of the command, verbatim.
pub fn echo(dd: &mut Diag, cur: &mut Cursor, newline: bool) -> Result<Outcome> {
    cur.skip_ws();
    let text = cur.take_rest_of_cmd();
    cput!(dd.cons, "{text}")?;
    if newline {
        cputln!(dd.cons)?;
    }
    Ok(Outcome::Ok)
}

/// `input var`: read a line from the console and evaluate it as
/// an expression.
pub fn input(dd: &mut Diag, cur: &mut Cursor) -> Result<Outcome> {
    cur.skip_ws();
    let Some(name) = cur.word() else {
        return Err(Error::Syntax("Missing variable name"));
    };
    let line = dd.cons.read_line()?;
    let mut vcur = Cursor::imm(line.trim());
    let v = expr::eval(dd, &mut vcur)?;
    dd.vars.set(&name, v);
    Ok(Outcome::Ok)
}
