// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Control flow verbs.
//!
//! `while`/`wend`, `repeat`/`until`, and `for`/`fend` run on the
//! control stack; `select`/`case`/`default`/`send`, `if`, `go`,
//! and the line-restart verbs (`loop`, `loopq`, `u`) redirect
//! the cursor directly.  The shared skip-to-terminator scan
//! below is what makes a false predicate find its matching
//! closer across nested constructs and program lines.

use crate::cursor::{Cursor, Loc};
use crate::cputln;
use crate::diag::{CtlFrame, Diag};
use crate::expr;
use crate::result::{Error, Outcome, Result};

/// Terminator keywords the skip scan can stop at.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Term {
    Wend,
    Fend,
    Send,
    Case,
    Default,
}

impl Term {
    fn word(self) -> &'static str {
        match self {
            Term::Wend => "wend",
            Term::Fend => "fend",
            Term::Send => "send",
            Term::Case => "case",
            Term::Default => "default",
        }
    }
}

/// Scans forward for one of `targets`, honoring nesting: each
/// construct keeps its own depth counter and a target only
/// matches when every counter is zero.  The scan follows the
/// interpreter's current line through the program; running off
/// the end drains the interpreter stack and fails with the
/// *flow* error.  On a match the cursor rests just past the
/// keyword.
fn skip_to(dd: &mut Diag, cur: &mut Cursor, targets: &[Term]) -> Result<Term> {
    let mut whiles = 0usize;
    let mut repeats = 0usize;
    let mut fors = 0usize;
    let mut selects = 0usize;
    loop {
        cur.skip_ws();
        if cur.at_end() || cur.ch() == b'!' {
            let next = match cur.loc {
                Loc::Line(id) => dd.prog.next_after(id).cloned(),
                Loc::Imm => None,
            };
            match next {
                Some(line) => *cur = Cursor::line(line.id, line.text.clone()),
                None => {
                    dd.drain();
                    return Err(Error::Flow("Ran off end of program"));
                }
            }
            continue;
        }
        if cur.ch() == b';' {
            cur.bump();
            continue;
        }
        let Some(word) = cur.word() else {
            cur.next_cmd();
            continue;
        };
        let at_depth = whiles == 0 && repeats == 0 && fors == 0 && selects == 0;
        if at_depth {
            if let Some(&t) = targets.iter().find(|t| t.word() == word) {
                return Ok(t);
            }
        }
        match word.as_str() {
            "while" => whiles += 1,
            "repeat" => repeats += 1,
            "for" => fors += 1,
            "select" => selects += 1,
            "wend" => whiles = whiles.saturating_sub(1),
            "until" => repeats = repeats.saturating_sub(1),
            "fend" => fors = fors.saturating_sub(1),
            "send" => selects = selects.saturating_sub(1),
            _ => {}
        }
        cur.next_cmd();
    }
}

/// `end`: return from a procedure, destroying its locals.
pub fn end(dd: &mut Diag, cur: &mut Cursor) -> Result<Outcome> {
    let Some(frame) = dd.frames.pop() else {
        // Popping the immediate-mode sentinel.
        return Err(Error::Fatal);
    };
    dd.vars.release(frame.mark);
    *cur = frame.ret;
    Ok(Outcome::Ok)
}

/// `go label`: redirect the current frame, without a call.
pub fn go(dd: &mut Diag, cur: &mut Cursor) -> Result<Outcome> {
    cur.skip_ws();
    let Some(name) = cur.word() else {
        return Err(Error::Syntax("Missing label"));
    };
    let Some(line) = dd.prog.find_label(&name) else {
        return Err(Error::Label(name));
    };
    *cur = Cursor::line(line.id, line.text.clone());
    Ok(Outcome::Ok)
}

/// `if cond`: a false condition discards the rest of the line.
pub fn if_(dd: &mut Diag, cur: &mut Cursor) -> Result<Outcome> {
    cur.skip_ws();
    if expr::eval(dd, cur)? == 0 {
        cur.to_end();
    }
    Ok(Outcome::Ok)
}

pub fn while_(dd: &mut Diag, cur: &mut Cursor) -> Result<Outcome> {
    cur.skip_ws();
    let cond = cur.clone();
    if expr::eval(dd, cur)? != 0 {
        dd.ctl.push(CtlFrame::While { cond });
    } else {
        skip_to(dd, cur, &[Term::Wend])?;
    }
    Ok(Outcome::Ok)
}

pub fn wend(dd: &mut Diag, cur: &mut Cursor) -> Result<Outcome> {
    let Some(CtlFrame::While { cond }) = dd.ctl.last() else {
        return Err(Error::Flow("No while is active"));
    };
    let cond = cond.clone();
    let after = cur.clone();
    *cur = cond;
    if expr::eval(dd, cur)? == 0 {
        dd.ctl.pop();
        *cur = after;
    }
    Ok(Outcome::Ok)
}

pub fn repeat(dd: &mut Diag, cur: &mut Cursor) -> Result<Outcome> {
    dd.ctl.push(CtlFrame::Repeat { body: cur.clone() });
    Ok(Outcome::Ok)
}

pub fn until(dd: &mut Diag, cur: &mut Cursor) -> Result<Outcome> {
    let Some(CtlFrame::Repeat { body }) = dd.ctl.last() else {
        return Err(Error::Flow("No repeat is active"));
    };
    let body = body.clone();
    cur.skip_ws();
    if expr::eval(dd, cur)? == 0 {
        *cur = body;
    } else {
        dd.ctl.pop();
    }
    Ok(Outcome::Ok)
}

pub fn for_(dd: &mut Diag, cur: &mut Cursor) -> Result<Outcome> {
    cur.skip_ws();
    let Some(var) = cur.word() else {
        return Err(Error::Syntax("Missing loop variable"));
    };
    cur.skip_ws();
    let start = expr::eval(dd, cur)?;
    cur.skip_ws();
    let bound_cur = cur.clone();
    let bound = expr::eval(dd, cur)?;
    cur.skip_ws();
    let step = if cur.at_arg() { expr::eval(dd, cur)? } else { 1 };
    dd.vars.set(&var, start);
    if (step >= 0 && start > bound) || (step < 0 && start < bound) {
        // Empty range: the body never runs.
        skip_to(dd, cur, &[Term::Fend])?;
    } else {
        dd.ctl.push(CtlFrame::For { bound: bound_cur, var, step });
    }
    Ok(Outcome::Ok)
}

pub fn fend(dd: &mut Diag, cur: &mut Cursor) -> Result<Outcome> {
    let Some(CtlFrame::For { bound, var, step }) = dd.ctl.last() else {
        return Err(Error::Flow("No for is active"));
    };
    let (bound_cur, var, step) = (bound.clone(), var.clone(), *step);
    let after = cur.clone();
    let v = dd
        .vars
        .get(&var)
        .ok_or_else(|| Error::Variable(var.clone()))?
        .wrapping_add(step);
    dd.vars.set(&var, v);
    // Re-evaluate the bound, then step past an optional step
    // expression so the cursor lands back at the body.
    *cur = bound_cur;
    let bound = expr::eval(dd, cur)?;
    cur.skip_ws();
    if cur.at_arg() {
        let _ = expr::eval(dd, cur)?;
    }
    if (step >= 0 && v > bound) || (step < 0 && v < bound) {
        dd.ctl.pop();
        *cur = after;
    }
    Ok(Outcome::Ok)
}

/// `select val`: scan arms until a `case` value matches or a
/// `default`/`send` is reached.
pub fn select(dd: &mut Diag, cur: &mut Cursor) -> Result<Outcome> {
    cur.skip_ws();
    let val = expr::eval(dd, cur)?;
    loop {
        match skip_to(dd, cur, &[Term::Case, Term::Default, Term::Send])? {
            Term::Send | Term::Default => return Ok(Outcome::Ok),
            Term::Case => {
                // Comma-separated candidate values; all of them
                // are parsed so the cursor ends at the arm body.
                let mut matched = false;
                cur.skip_ws();
                loop {
                    if expr::eval(dd, cur)? == val {
                        matched = true;
                    }
                    if cur.ch() == b',' {
                        cur.bump();
                    } else {
                        break;
                    }
                }
                if matched {
                    return Ok(Outcome::Ok);
                }
            }
            _ => unreachable!(),
        }
    }
}

/// A `case` or `default` reached by falling through a matched
/// arm ends that arm: skip to the closing `send`.
pub fn case_fallthrough(dd: &mut Diag, cur: &mut Cursor) -> Result<Outcome> {
    cur.next_cmd();
    skip_to(dd, cur, &[Term::Send])?;
    Ok(Outcome::Ok)
}

/// `loop` / `loopq`: per-site counted line restart.
pub fn loop_(
    dd: &mut Diag,
    cur: &mut Cursor,
    site: usize,
    quiet: bool,
) -> Result<Outcome> {
    cur.skip_ws();
    let n = if cur.at_arg() { Some(expr::eval(dd, cur)?) } else { None };
    let loc = cur.loc;
    let counter = dd.counter_mut(loc, site);
    *counter += 1;
    let count = *counter;
    let again = match n {
        Some(n) if (count as i64) >= n => {
            *dd.counter_mut(loc, site) = 0;
            false
        }
        _ => true,
    };
    if !quiet {
        cputln!(dd.cons, "{count}")?;
    }
    Ok(if again { Outcome::Restart } else { Outcome::Ok })
}

/// `u cond`: restart the line until the condition holds.
pub fn until_line(dd: &mut Diag, cur: &mut Cursor) -> Result<Outcome> {
    cur.skip_ws();
    if expr::eval(dd, cur)? == 0 {
        Ok(Outcome::Restart)
    } else {
        Ok(Outcome::Ok)
    }
}
