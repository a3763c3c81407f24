// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pattern and compare verbs.

use crate::cputln;
use crate::cursor::Cursor;
use crate::diag::{Diag, NOSECS};
use crate::expr;
use crate::pattern::{self, CmpMode, Pattern};
use crate::result::{Error, Outcome, Result};

/// `name [val [len]]`; the value defaults to 0 and the length to
/// the whole buffer.
fn args(dd: &mut Diag, cur: &mut Cursor) -> Result<(Pattern, i64, usize)> {
    cur.skip_ws();
    let Some(name) = cur.word() else {
        return Err(Error::Syntax("Missing pattern name"));
    };
    let pat = Pattern::parse(&name)?;
    cur.skip_ws();
    let val = if cur.at_arg() { expr::eval(dd, cur)? } else { 0 };
    cur.skip_ws();
    let len = if cur.at_arg() {
        let l = expr::eval(dd, cur)?;
        if l < 0 {
            return Err(Error::Bounds("Invalid sector count"));
        }
        l as usize
    } else {
        NOSECS
    };
    Ok((pat, val, len))
}

pub fn pattn(dd: &mut Diag, cur: &mut Cursor) -> Result<Outcome> {
    let (pat, val, len) = args(dd, cur)?;
    pattern::fill(dd, pat, val, len)?;
    Ok(Outcome::Ok)
}

pub fn comp(dd: &mut Diag, cur: &mut Cursor) -> Result<Outcome> {
    let (pat, val, len) = args(dd, cur)?;
    pattern::verify(dd, pat, val, len)?;
    Ok(Outcome::Ok)
}

pub fn srand(dd: &mut Diag) -> Result<Outcome> {
    dd.rng.reseed();
    Ok(Outcome::Ok)
}

/// `cmode [all|one|fail]`: set or show the mismatch mode.
pub fn cmode(dd: &mut Diag, cur: &mut Cursor) -> Result<Outcome> {
    cur.skip_ws();
    match cur.word() {
        None => cputln!(dd.cons, "Compare mode: {}", dd.cmp_mode.name())?,
        Some(name) => dd.cmp_mode = CmpMode::parse(&name)?,
    }
    Ok(Outcome::Ok)
}
