// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The shared character cursor.
//!
//! The dispatcher, the expression evaluator, and the flow verbs
//! all advance one cursor over the text of the line being
//! executed.  The cursor snapshots the line text (cheaply, via
//! `Rc`), so stored frames stay valid even if the program is
//! edited while something is running.

use crate::result::{Error, Result};
use std::rc::Rc;

/// Which line a cursor points into.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Loc {
    /// The transient immediate-mode buffer.
    Imm,
    /// A stored program line, by identity (stable across edits).
    Line(u64),
}

#[derive(Clone, Debug)]
pub struct Cursor {
    pub loc: Loc,
    text: Rc<str>,
    pub pos: usize,
}

impl Cursor {
    pub fn imm(text: &str) -> Cursor {
        Cursor { loc: Loc::Imm, text: Rc::from(text), pos: 0 }
    }

    pub fn line(id: u64, text: Rc<str>) -> Cursor {
        Cursor { loc: Loc::Line(id), text, pos: 0 }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// The current character, or NUL at end of line.
    pub fn ch(&self) -> u8 {
        *self.text.as_bytes().get(self.pos).unwrap_or(&0)
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    pub fn bump(&mut self) {
        if !self.at_end() {
            self.pos += 1;
        }
    }

    /// Backs up one character (the `!` comment-leader retreat).
    pub fn back(&mut self) {
        self.pos = self.pos.saturating_sub(1);
    }

    pub fn skip_ws(&mut self) {
        while matches!(self.ch(), b' ' | b'\t') {
            self.bump();
        }
    }

    pub fn to_end(&mut self) {
        self.pos = self.text.len();
    }

    pub fn rewind(&mut self) {
        self.pos = 0;
    }

    /// True if another argument follows at this position: not
    /// end of line, not the command separator, not a comment.
    pub fn at_arg(&self) -> bool {
        !self.at_end() && self.ch() != b';' && self.ch() != b'!'
    }

    /// Takes an identifier (`[A-Za-z_][A-Za-z0-9_]*`), or `None`
    /// if the cursor is not at one.
    pub fn word(&mut self) -> Option<String> {
        let c = self.ch();
        if !(c.is_ascii_alphabetic() || c == b'_') {
            return None;
        }
        let start = self.pos;
        loop {
            let c = self.ch();
            if c.is_ascii_alphanumeric() || c == b'_' {
                self.bump();
            } else {
                break;
            }
        }
        Some(self.text[start..self.pos].to_string())
    }

    /// Consumes a double-quoted string, the opening quote
    /// included.  A backslash keeps the following character from
    /// terminating the string; the escape sequence itself is
    /// preserved for the format engine to interpret.
    pub fn quoted(&mut self) -> Result<String> {
        debug_assert_eq!(self.ch(), b'"');
        self.bump();
        let mut s = String::new();
        loop {
            match self.ch() {
                0 => return Err(Error::Syntax("Unterminated string")),
                b'"' => {
                    self.bump();
                    return Ok(s);
                }
                b'\\' => {
                    self.bump();
                    if self.at_end() {
                        return Err(Error::Syntax("Unterminated string"));
                    }
                    s.push('\\');
                    s.push(self.ch() as char);
                    self.bump();
                }
                c => {
                    s.push(c as char);
                    self.bump();
                }
            }
        }
    }

    /// Advances past the rest of the current command: to just
    /// after the next `;`, or to end of line.  Quoted strings
    /// are skipped over, so a `;` inside one does not split.
    pub fn next_cmd(&mut self) {
        loop {
            match self.ch() {
                0 => return,
                b';' => {
                    self.bump();
                    return;
                }
                b'"' => {
                    // Malformed strings just run to end of line.
                    let _ = self.quoted();
                }
                _ => self.bump(),
            }
        }
    }

    /// Remainder of the current command as text (up to `;` or
    /// end of line), consuming it.
    pub fn take_rest_of_cmd(&mut self) -> String {
        let start = self.pos;
        while !self.at_end() && self.ch() != b';' {
            self.bump();
        }
        self.text[start..self.pos].to_string()
    }
}
