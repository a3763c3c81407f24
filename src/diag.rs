// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The diagnostic session.
//!
//! One `Diag` owns everything a command can touch: the two
//! sector buffers, the current drive slot, the variable stack,
//! the stored program, the interpreter and control stacks, and
//! the console.  Verb handlers all take `&mut Diag` plus the
//! shared cursor.

use crate::cons::Console;
use crate::cursor::{Cursor, Loc};
use crate::disk::{Disk, SECTOR_SIZE};
use crate::pattern::CmpMode;
use crate::program::Program;
use crate::result::{Error, Result};
use crate::rng::Rand;
use crate::stats::Stats;
use crate::vars::Vars;
use std::collections::HashMap;

/// Sectors per I/O buffer.
pub const NOSECS: usize = 256;

/// An interpreter frame: where to resume the caller, and how far
/// to unwind the variable stack on return.
#[derive(Clone, Debug)]
pub struct Frame {
    pub ret: Cursor,
    pub mark: usize,
}

/// A control-structure frame.
#[derive(Clone, Debug)]
pub enum CtlFrame {
    /// `while`: cursor at the condition expression.
    While { cond: Cursor },
    /// `repeat`: cursor at the start of the body.
    Repeat { body: Cursor },
    /// `for`: cursor at the bound expression, plus the loop
    /// variable and step.
    For { bound: Cursor, var: String, step: i64 },
}

pub struct Diag {
    pub cons: Console,
    pub disk: Box<dyn Disk>,
    pub wrbuf: Vec<u8>,
    pub rdbuf: Vec<u8>,
    /// Current drive, or none.  `drive_size` (in sectors) is
    /// meaningful only while this is set.
    pub drive: Option<u32>,
    pub drive_size: u64,
    pub write_protect: bool,
    pub vars: Vars,
    pub prog: Program,
    pub rng: Rand,
    pub stats: Stats,
    pub cmp_mode: CmpMode,
    pub exit_on_error: bool,
    pub last_error: bool,
    pub frames: Vec<Frame>,
    pub ctl: Vec<CtlFrame>,
    /// `loop` counters for immediate-mode lines, keyed by byte
    /// offset; reset whenever a new top-level line starts.
    pub imm_counters: HashMap<usize, u64>,
}

impl Diag {
    pub fn new(disk: Box<dyn Disk>, cons: Console) -> Diag {
        Diag {
            cons,
            disk,
            wrbuf: vec![0; NOSECS * SECTOR_SIZE],
            rdbuf: vec![0; NOSECS * SECTOR_SIZE],
            drive: None,
            drive_size: 0,
            write_protect: true,
            vars: Vars::default(),
            prog: Program::default(),
            rng: Rand::default(),
            stats: Stats::default(),
            cmp_mode: CmpMode::One,
            exit_on_error: false,
            last_error: false,
            frames: Vec::new(),
            ctl: Vec::new(),
            imm_counters: HashMap::new(),
        }
    }

    /// The current drive's size in sectors, or the *state* error.
    pub fn require_drive(&self) -> Result<u64> {
        if self.drive.is_some() {
            Ok(self.drive_size)
        } else {
            Err(Error::NoDrive)
        }
    }

    /// Unwinds both stacks back to immediate mode, destroying
    /// any procedure locals along the way.
    pub fn drain(&mut self) {
        if let Some(f) = self.frames.first() {
            let mark = f.mark;
            self.vars.release(mark);
        }
        self.frames.clear();
        self.ctl.clear();
    }

    /// The `loop`/`loopq` counter at a verb site.  Sites on
    /// stored lines live with the line; immediate-mode sites use
    /// the transient per-line table.
    pub fn counter_mut(&mut self, loc: Loc, pos: usize) -> &mut u64 {
        if let Loc::Line(id) = loc {
            if self.prog.by_id(id).is_some() {
                return self.prog.counter_mut(id, pos).unwrap();
            }
        }
        self.imm_counters.entry(pos).or_insert(0)
    }
}
