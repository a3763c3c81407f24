// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end scripted sessions over the memory disk.

use discdiag::cons::Console;
use discdiag::diag::{Diag, NOSECS};
use discdiag::disk::MemDisk;
use discdiag::repl::{self, Step};
use discdiag::result::Error;
use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

#[derive(Clone, Default)]
struct Sink(Rc<RefCell<Vec<u8>>>);

impl Sink {
    fn take(&self) -> String {
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

fn session(sectors: usize) -> (Diag, Sink) {
    let sink = Sink::default();
    let cons = Console::new(Box::new(sink.clone()), Box::new(io::empty()));
    (Diag::new(Box::new(MemDisk::new(sectors)), cons), sink)
}

fn run(dd: &mut Diag, sink: &Sink, line: &str) -> String {
    repl::exec_line(dd, line).unwrap_or_else(|e| panic!("{line}: {e}"));
    sink.take()
}

#[test]
fn hex_format_transcript() {
    let (mut dd, sink) = session(4);
    assert_eq!(run(&mut dd, &sink, "s x 0x10; p \"%4.4x\" x"), "0010\n");
}

#[test]
fn value_pattern_lands_in_the_dump() {
    let (mut dd, sink) = session(4);
    let text = run(&mut dd, &sink, "pt val 0xdeadbeef 1; dw 1");
    assert!(text.starts_with("0x00000000: de ad be ef"), "{text}");
}

#[test]
fn pattern_compare_is_clean_for_every_pattern_and_length() {
    for pat in ["cnt", "dwcnt", "val", "rand", "lba"] {
        for len in [1, 2, 3, 7, 255, NOSECS] {
            let (mut dd, sink) = session(4);
            let line = format!("pt {pat} 0x1122 {len}; c {pat} 0x1122 {len}");
            assert_eq!(run(&mut dd, &sink, &line), "", "{line}");
        }
    }
}

#[test]
fn device_round_trip_compares_clean() {
    let (mut dd, sink) = session(NOSECS);
    run(&mut dd, &sink, "drive 0; unprot");
    for pat in ["cnt", "dwcnt", "val", "rand"] {
        let line = format!(
            "pt {pat} 77 {n}; w 0 {n}; r 0 {n}; c buffs 0 {n}",
            n = NOSECS
        );
        assert_eq!(run(&mut dd, &sink, &line), "", "{pat}");
    }
}

#[test]
fn corrupted_sector_is_caught() {
    let (mut dd, sink) = session(64);
    run(&mut dd, &sink, "drive 0; unprot; pt rand 0 8; w 0 8");
    // Corrupt one byte behind the engine's back.
    let mut sector = vec![0u8; 512];
    {
        use discdiag::disk::Disk;
        dd.disk.read_sectors(5, &mut sector).unwrap();
        sector[17] ^= 0x40;
        dd.disk.write_sectors(5, &sector).unwrap();
    }
    run(&mut dd, &sink, "r 0 8");
    let text = run(&mut dd, &sink, "c buffs 0 8");
    let off = 5 * 512 + 17;
    assert!(
        text.contains(&format!("Miscompare at 0x{off:x}")),
        "{text}"
    );
}

#[test]
fn for_transcript() {
    let (mut dd, sink) = session(4);
    assert_eq!(
        run(&mut dd, &sink, "for i 1 3; pn i; pn \" \"; fend"),
        "1 2 3 "
    );
}

#[test]
fn procedure_transcript() {
    let (mut dd, sink) = session(4);
    assert_eq!(repl::run_command(&mut dd, "1 add(a b): p a+b"), Step::Continue);
    assert_eq!(sink.take(), "");
    assert_eq!(run(&mut dd, &sink, "add 40 2"), "42\n");
    assert_eq!(
        repl::exec_line(&mut dd, "p a"),
        Err(Error::Variable("a".into()))
    );
}

#[test]
fn report_supplies_the_final_newline() {
    let (mut dd, sink) = session(4);
    repl::run_command(&mut dd, "for i 1 3; pn i; pn \" \"; fend");
    let text = sink.take();
    assert!(text.starts_with("1 2 3 \nTime: "), "{text}");

    repl::run_command(&mut dd, "p 5");
    let text = sink.take();
    assert!(text.starts_with("5\nTime: "), "{text}");
    assert!(!text.contains("\n\n"), "{text}");
}

#[test]
fn error_report_and_exit_code_path() {
    let (mut dd, sink) = session(4);
    assert_eq!(repl::run_command(&mut dd, "p nosuch"), Step::Continue);
    let text = sink.take();
    assert!(
        text.starts_with("*** Error: Variable \"nosuch\" invalid\n"),
        "{text}"
    );
    repl::run_command(&mut dd, "exitonerror");
    sink.take();
    assert_eq!(repl::run_command(&mut dd, "p nosuch"), Step::Quit(1));
    assert_eq!(repl::run_command(&mut dd, "exit"), Step::Quit(0));
}

#[test]
fn startup_style_init_procedure() {
    let (mut dd, sink) = session(16);
    dd.prog
        .merge_text("init: drive 0; unprot; pt cnt 0 1; w 0 1; end\n")
        .unwrap();
    assert!(dd.prog.find_label("init").is_some());
    assert_eq!(repl::run_command(&mut dd, "init"), Step::Continue);
    let text = sink.take();
    assert!(text.contains("Drive 0: 16 sectors"), "{text}");
    // The write really reached the device.
    assert_eq!(run(&mut dd, &sink, "r 0 1; c buffs 0 1"), "");
}

#[test]
fn deep_nesting_across_lines() {
    let (mut dd, sink) = session(4);
    for (n, line) in [
        "sum(n): s t 0; for i 1 n",
        "s j 0",
        "while j<i; s j j+1; s t t+1; wend",
        "fend; p t; end",
    ]
    .iter()
    .enumerate()
    {
        repl::run_command(&mut dd, &format!("{} {line}", n + 1));
    }
    // Triangular number of 4.
    assert_eq!(run(&mut dd, &sink, "sum 4"), "10\n");
    assert!(dd.frames.is_empty());
    assert!(dd.ctl.is_empty());
}
