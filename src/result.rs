// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Errors and verb outcomes.

use thiserror::Error;

/// Everything a verb can fail with.  The top level renders these
/// as `*** Error: <message>` and unwinds the interpreter and
/// control stacks back to immediate mode.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum Error {
    #[error("{0}")]
    Syntax(&'static str),
    #[error("Command \"{0}\" invalid")]
    Verb(String),
    #[error("Variable \"{0}\" invalid")]
    Variable(String),
    #[error("Pattern \"{0}\" invalid")]
    Pattern(String),
    #[error("Label \"{0}\" invalid")]
    Label(String),
    #[error("Divide by zero")]
    Arith,
    #[error("{0}")]
    Bounds(&'static str),
    #[error("No current drive")]
    NoDrive,
    #[error("Drive is write protected")]
    Protected,
    #[error("I/O failed: {0}")]
    Io(String),
    #[error("Miscompare")]
    Compare,
    #[error("{0}")]
    Flow(&'static str),
    /// User break, sampled at a suspension point.  Unwinds like
    /// an error but is not one: it never counts toward the exit
    /// code and is only escalated under `exitonerror`.
    #[error("Stopped")]
    Stop,
    #[error("Interpreter stack underflow")]
    Fatal,
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

pub type Result<T> = core::result::Result<T, Error>;

/// What a successfully executed verb asks of the dispatcher.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Outcome {
    /// Keep walking the current line.
    Ok,
    /// Leave the program: `exit`, or an escalated break.
    Exit,
    /// Redo the current line from its first character (`loop`,
    /// `loopq`, `u`).
    Restart,
}
