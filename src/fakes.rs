// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shared scaffolding for the unit tests: a session over the
//! memory disk with captured console output.

use crate::cons::Console;
use crate::diag::Diag;
use crate::disk::MemDisk;
use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

#[derive(Clone, Default)]
pub struct Sink(pub Rc<RefCell<Vec<u8>>>);

impl Sink {
    pub fn take(&self) -> String {
        let bytes = std::mem::take(&mut *self.0.borrow_mut());
        String::from_utf8(bytes).expect("console output is utf-8")
    }
}

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A session over a small memory drive, with captured output.
pub fn diag(sectors: usize) -> (Diag, Sink) {
    let sink = Sink::default();
    let cons = Console::new(Box::new(sink.clone()), Box::new(io::empty()));
    (Diag::new(Box::new(MemDisk::new(sectors)), cons), sink)
}
