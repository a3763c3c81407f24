// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The command dispatcher.
//!
//! [`run_command`] is the top-level entry for one line: it
//! brackets the statistics window, renders errors, and unwinds
//! the stacks.  Below it, [`exec`] walks `;`-separated verbs
//! with the shared cursor, calling procedures by label and
//! built-ins from the match table in [`step`].

use crate::clock;
use crate::cursor::{Cursor, Loc};
use crate::diag::{Diag, Frame};
use crate::expr;
use crate::result::{Error, Outcome, Result};
use crate::{brk, cputln};

pub mod dump;
pub mod edit;
pub mod flow;
pub mod io;
pub mod pattn;
pub mod print;

/// What the REPL should do after a line.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Step {
    Continue,
    Quit(i32),
}

/// Runs one top-level line: a program edit (leading digit) or a
/// command sequence with its timing/IOPS report.
pub fn run_command(dd: &mut Diag, line: &str) -> Step {
    let trimmed = line.trim_start();
    if trimmed.is_empty() {
        return Step::Continue;
    }
    if trimmed.as_bytes()[0].is_ascii_digit() {
        if let Err(e) = edit::insert_line(dd, trimmed) {
            let _ = cputln!(dd.cons, "*** Error: {e}");
        }
        return Step::Continue;
    }

    dd.stats.clear();
    dd.imm_counters.clear();
    let t0 = clock::now();
    let r = exec_line(dd, line);
    let secs = clock::elapsed(t0);
    dd.cons.page_off();

    let step = match r {
        Ok(Outcome::Exit) => {
            dd.last_error = false;
            Step::Quit(0)
        }
        Ok(_) => {
            dd.last_error = false;
            Step::Continue
        }
        Err(Error::Fatal) => {
            let _ = cputln!(dd.cons, "*** Fatal: {}", Error::Fatal);
            return Step::Quit(1);
        }
        Err(Error::Stop) => {
            dd.drain();
            if dd.exit_on_error { Step::Quit(0) } else { Step::Continue }
        }
        Err(e) => {
            let _ = cputln!(dd.cons, "*** Error: {e}");
            dd.drain();
            dd.last_error = true;
            if dd.exit_on_error { Step::Quit(1) } else { Step::Continue }
        }
    };
    dd.ctl.clear();
    let _ = dd.stats.report(&mut dd.cons, secs);
    step
}

/// Executes one immediate-mode line to completion.
pub fn exec_line(dd: &mut Diag, text: &str) -> Result<Outcome> {
    let mut cur = Cursor::imm(text);
    exec(dd, &mut cur)
}

fn exec(dd: &mut Diag, cur: &mut Cursor) -> Result<Outcome> {
    loop {
        // Between commands is a suspension point.
        if brk::check() {
            return Err(Error::Stop);
        }
        cur.skip_ws();
        if cur.at_end() || cur.ch() == b'!' {
            if !advance(dd, cur) {
                return Ok(Outcome::Ok);
            }
            continue;
        }
        if cur.ch() == b';' {
            cur.bump();
            continue;
        }
        let site = cur.pos;
        let Some(verb) = cur.word() else {
            return Err(Error::Syntax("Unexpected character"));
        };
        match step(dd, cur, &verb, site)? {
            Outcome::Ok => {}
            Outcome::Exit => return Ok(Outcome::Exit),
            Outcome::Restart => cur.rewind(),
        }
    }
}

/// Moves to the next program line, or ends execution.  Falling
/// off the end of the program always terminates: any frames
/// still stacked are drained.
fn advance(dd: &mut Diag, cur: &mut Cursor) -> bool {
    let Loc::Line(id) = cur.loc else {
        return false;
    };
    match dd.prog.next_after(id) {
        Some(line) => {
            *cur = Cursor::line(line.id, line.text.clone());
            true
        }
        None => {
            dd.drain();
            false
        }
    }
}

/// One verb: a procedure label, or a built-in.
fn step(
    dd: &mut Diag,
    cur: &mut Cursor,
    verb: &str,
    site: usize,
) -> Result<Outcome> {
    if dd.prog.find_label(verb).is_some() {
        return call(dd, cur, verb);
    }
    match verb {
        "read" | "r" => io::read(dd, cur),
        "write" | "w" => io::write(dd, cur),
        "drive" => io::drive(dd, cur),
        "listdrives" | "ld" => io::listdrives(dd),
        "unprot" => io::unprot(dd),
        "pattn" | "pt" => pattn::pattn(dd, cur),
        "comp" | "c" => pattn::comp(dd, cur),
        "srand" => pattn::srand(dd),
        "cmode" => pattn::cmode(dd, cur),
        "dumpwrite" | "dw" => dump::write_buf(dd, cur),
        "dumpread" | "dr" => dump::read_buf(dd, cur),
        "p" | "print" => print::print(dd, cur, true),
        "pn" | "printn" => print::print(dd, cur, false),
        "echo" => print::echo(dd, cur, true),
        "echon" => print::echo(dd, cur, false),
        "input" | "i" => print::input(dd, cur),
        "set" | "s" => set(dd, cur),
        "local" => local(dd, cur),
        "end" => flow::end(dd, cur),
        "go" => flow::go(dd, cur),
        "if" => flow::if_(dd, cur),
        "loop" | "l" => flow::loop_(dd, cur, site, false),
        "loopq" | "lq" => flow::loop_(dd, cur, site, true),
        "u" => flow::until_line(dd, cur),
        "while" => flow::while_(dd, cur),
        "wend" => flow::wend(dd, cur),
        "repeat" => flow::repeat(dd, cur),
        "until" => flow::until(dd, cur),
        "for" => flow::for_(dd, cur),
        "fend" => flow::fend(dd, cur),
        "select" => flow::select(dd, cur),
        "case" | "default" => flow::case_fallthrough(dd, cur),
        "send" => Ok(Outcome::Ok),
        "list" => edit::list(dd, cur),
        "clear" => edit::clear(dd),
        "delt" => edit::delt(dd, cur),
        "save" => edit::save(dd, cur),
        "load" => edit::load(dd, cur),
        "exit" => Ok(Outcome::Exit),
        "exitonerror" => {
            dd.exit_on_error = true;
            Ok(Outcome::Ok)
        }
        "help" => help(dd),
        _ => Err(Error::Verb(verb.to_string())),
    }
}

/// Procedure call: evaluate arguments in the caller's scope,
/// push them as locals in parameter order, stack a frame, and
/// redirect to the labeled line.
fn call(dd: &mut Diag, cur: &mut Cursor, name: &str) -> Result<Outcome> {
    let line = dd.prog.find_label(name).expect("label checked by caller");
    let (id, text, params) =
        (line.id, line.text.clone(), line.params.clone());
    let mut args = Vec::with_capacity(params.len());
    for _ in &params {
        cur.skip_ws();
        if !cur.at_arg() {
            return Err(Error::Syntax("Missing argument"));
        }
        args.push(expr::eval(dd, cur)?);
    }
    let mark = dd.vars.mark();
    for (p, v) in params.iter().zip(args) {
        dd.vars.local(p, v);
    }
    dd.frames.push(Frame { ret: cur.clone(), mark });
    *cur = Cursor::line(id, text);
    Ok(Outcome::Ok)
}

fn set(dd: &mut Diag, cur: &mut Cursor) -> Result<Outcome> {
    cur.skip_ws();
    let Some(name) = cur.word() else {
        return Err(Error::Syntax("Missing variable name"));
    };
    cur.skip_ws();
    let v = expr::eval(dd, cur)?;
    dd.vars.set(&name, v);
    Ok(Outcome::Ok)
}

fn local(dd: &mut Diag, cur: &mut Cursor) -> Result<Outcome> {
    cur.skip_ws();
    let Some(name) = cur.word() else {
        return Err(Error::Syntax("Missing variable name"));
    };
    cur.skip_ws();
    let v = if cur.at_arg() { expr::eval(dd, cur)? } else { 0 };
    dd.vars.local(&name, v);
    Ok(Outcome::Ok)
}

const HELP: &[&str] = &[
    "drive [n]            select drive 0..9 / show current",
    "listdrives | ld      probe drives and sizes",
    "unprot               clear write protect (set on drive change)",
    "read | r [lba [n]]   read n sectors into the read buffer",
    "write | w [lba [n]]  write n sectors from the write buffer",
    "pattn | pt name [val [len]]   fill write buffer with pattern",
    "comp | c name [val [len]]     verify pattern (buffs: read vs write)",
    "cmode [all|one|fail] mismatch reporting mode",
    "srand                reset the random seed",
    "dumpwrite | dw [n]   hex dump of the write buffer",
    "dumpread | dr [n]    hex dump of the read buffer",
    "p | print [\"fmt\"] e...    print expressions (pn: no newline)",
    "echo text            print text (echon: no newline)",
    "input | i var        read a value from the console",
    "set | s var e        set a variable   (local: new cell)",
    "if e / go label / end",
    "while e ... wend / repeat ... until e / for v s e [step] ... fend",
    "select e; case v,...; ...; default; ...; send",
    "loop | l [n]         restart line n times (loopq quiet); u e",
    "list [n] / clear / delt n / save file / load file",
    "exit / exitonerror / help",
    "N text               insert a program line before line N",
];

fn help(dd: &mut Diag) -> Result<Outcome> {
    dd.cons.page_on();
    let r = (|| {
        for line in HELP {
            cputln!(dd.cons, "{line}")?;
        }
        Ok(())
    })();
    dd.cons.page_off();
    r.map(|()| Outcome::Ok)
}
