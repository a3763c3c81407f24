// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! An interactive exerciser for raw block devices.
//!
//! The crate is organized around a single [`diag::Diag`] session
//! that owns the two sector buffers, the current drive slot, the
//! variable and interpreter stacks, and the program store.  The
//! REPL in [`repl`] walks command lines a verb at a time, calling
//! into the expression evaluator, the pattern engine, and the
//! block device layer as each verb demands.

#![forbid(unsafe_op_in_unsafe_fn)]

pub mod brk;
pub mod clock;
pub mod cons;
pub mod cursor;
pub mod diag;
pub mod disk;
pub mod expr;
#[cfg(test)]
pub mod fakes;
pub mod pattern;
pub mod program;
pub mod repl;
pub mod result;
pub mod rng;
pub mod stats;
pub mod vars;
