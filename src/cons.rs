// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Console output, with the screen pager.
//!
//! Every byte the verbs print goes through here, so the session
//! can tell whether the cursor sits at the start of a line (the
//! per-command report cares) and can paginate voluminous output.
//! The sink and source are boxed so tests can capture output and
//! script the pager.

use crate::brk;
use crate::result::{Error, Result};
use std::fmt;
use std::io::{self, BufRead, Write};

/// Rows printed between pager pauses.
const PAGE_LINES: usize = 23;

pub struct Console {
    out: Box<dyn Write>,
    input: Box<dyn BufRead>,
    at_bol: bool,
    lines: usize,
    paging: bool,
}

impl Console {
    pub fn new(out: Box<dyn Write>, input: Box<dyn BufRead>) -> Console {
        Console { out, input, at_bol: true, lines: 0, paging: false }
    }

    pub fn stdio() -> Console {
        Console::new(Box::new(io::stdout()), Box::new(io::stdin().lock()))
    }

    /// True if the last character written was a newline (or
    /// nothing has been written yet).
    pub fn at_bol(&self) -> bool {
        self.at_bol
    }

    /// Turns pagination on for a verb with voluminous output.
    pub fn page_on(&mut self) {
        self.paging = true;
        self.lines = 0;
    }

    pub fn page_off(&mut self) {
        self.paging = false;
    }

    pub fn put(&mut self, args: fmt::Arguments<'_>) -> Result<()> {
        let s = args.to_string();
        self.write(&s)
    }

    pub fn put_line(&mut self, args: fmt::Arguments<'_>) -> Result<()> {
        let s = args.to_string();
        self.write(&s)?;
        self.write("\n")
    }

    fn write(&mut self, s: &str) -> Result<()> {
        for piece in s.split_inclusive('\n') {
            self.out.write_all(piece.as_bytes())?;
            self.at_bol = piece.ends_with('\n');
            if self.at_bol && self.paging {
                self.lines += 1;
                if self.lines >= PAGE_LINES {
                    self.out.flush()?;
                    self.pause()?;
                }
            }
        }
        self.out.flush()?;
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.out.write_all(b"-- more --")?;
        self.out.flush()?;
        let line = self.read_line()?;
        self.out.write_all(b"\n")?;
        self.at_bol = true;
        self.lines = 0;
        if brk::check() || line.trim().eq_ignore_ascii_case("q") {
            return Err(Error::Stop);
        }
        Ok(())
    }

    /// Reads one line from the console source, without the line
    /// terminator.  Used by the pager and the `input` verb.
    pub fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        self.input.read_line(&mut line)?;
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(line)
    }
}

/// Prints through a session console; propagates pager stops.
#[macro_export]
macro_rules! cput {
    ($cons:expr, $($arg:tt)*) => {
        $cons.put(core::format_args!($($arg)*))
    };
}

/// Like [`cput!`], with a trailing newline.
#[macro_export]
macro_rules! cputln {
    ($cons:expr) => {
        $cons.put(core::format_args!("\n"))
    };
    ($cons:expr, $($arg:tt)*) => {
        $cons.put_line(core::format_args!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct Sink(Rc<RefCell<Vec<u8>>>);

    impl Write for Sink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn capture() -> (Console, Sink) {
        let sink = Sink::default();
        let cons =
            Console::new(Box::new(sink.clone()), Box::new(io::empty()));
        (cons, sink)
    }

    #[test]
    fn tracks_line_start() {
        let (mut cons, _sink) = capture();
        assert!(cons.at_bol());
        cput!(cons, "abc").unwrap();
        assert!(!cons.at_bol());
        cputln!(cons).unwrap();
        assert!(cons.at_bol());
    }

    #[test]
    fn pager_pauses_after_a_screenful() {
        let (mut cons, sink) = capture();
        cons.page_on();
        for i in 0..30 {
            cputln!(cons, "row {i}").unwrap();
        }
        let text = String::from_utf8(sink.0.borrow().clone()).unwrap();
        assert!(text.contains("-- more --"));
    }

    #[test]
    fn no_pager_when_off() {
        let (mut cons, sink) = capture();
        for i in 0..30 {
            cputln!(cons, "row {i}").unwrap();
        }
        let text = String::from_utf8(sink.0.borrow().clone()).unwrap();
        assert!(!text.contains("-- more --"));
    }
}
