// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Program editing and persistence verbs.

use crate::cursor::Cursor;
use crate::diag::Diag;
use crate::expr;
use crate::result::{Error, Outcome, Result};
use crate::{brk, cputln};
use std::path::Path;

/// A top-level line starting with a decimal number: insert the
/// remainder before that 1-based line.
pub fn insert_line(dd: &mut Diag, line: &str) -> Result<()> {
    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    let n: usize = line[..digits]
        .parse()
        .map_err(|_| Error::Bounds("Invalid line number"))?;
    let rest = line[digits..].strip_prefix(' ').unwrap_or(&line[digits..]);
    dd.prog.insert(n, rest)
}

/// `list [n]`: the whole program, or one line.
pub fn list(dd: &mut Diag, cur: &mut Cursor) -> Result<Outcome> {
    cur.skip_ws();
    let only = if cur.at_arg() {
        let n = expr::eval(dd, cur)?;
        if n < 1 || n as usize > dd.prog.len() {
            return Err(Error::Bounds("Invalid line number"));
        }
        Some(n as usize)
    } else {
        None
    };
    dd.cons.page_on();
    let r = (|| {
        for i in 0..dd.prog.len() {
            if let Some(n) = only {
                if i + 1 != n {
                    continue;
                }
            }
            if brk::check() {
                return Err(Error::Stop);
            }
            let text = dd.prog.get(i).expect("indexed by len").render();
            cputln!(dd.cons, "{}: {text}", i + 1)?;
        }
        Ok(())
    })();
    dd.cons.page_off();
    r.map(|()| Outcome::Ok)
}

pub fn clear(dd: &mut Diag) -> Result<Outcome> {
    dd.prog.clear();
    Ok(Outcome::Ok)
}

/// `delt n`: remove the n-th line, its label, parameters, and
/// loop counters with it.
pub fn delt(dd: &mut Diag, cur: &mut Cursor) -> Result<Outcome> {
    cur.skip_ws();
    if !cur.at_arg() {
        return Err(Error::Syntax("Missing line number"));
    }
    let n = expr::eval(dd, cur)?;
    if n < 1 {
        return Err(Error::Bounds("Invalid line number"));
    }
    dd.prog.delete(n as usize)?;
    Ok(Outcome::Ok)
}

/// The file-name argument: everything up to whitespace or the
/// command separator.
fn filename(cur: &mut Cursor) -> Result<String> {
    cur.skip_ws();
    let mut name = String::new();
    while cur.at_arg() && !matches!(cur.ch(), b' ' | b'\t') {
        name.push(cur.ch() as char);
        cur.bump();
    }
    if name.is_empty() {
        return Err(Error::Syntax("Missing file name"));
    }
    Ok(name)
}

pub fn save(dd: &mut Diag, cur: &mut Cursor) -> Result<Outcome> {
    let name = filename(cur)?;
    dd.prog.save(Path::new(&name))?;
    Ok(Outcome::Ok)
}

pub fn load(dd: &mut Diag, cur: &mut Cursor) -> Result<Outcome> {
    let name = filename(cur)?;
    dd.prog.load(Path::new(&name))?;
    Ok(Outcome::Ok)
}
