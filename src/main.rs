// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The interactive entry point.

use clap::Parser;
use discdiag::brk;
use discdiag::cons::Console;
use discdiag::diag::Diag;
use discdiag::disk::{Disk, SysDisk};
use discdiag::repl::{self, Step};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Interactive raw block device exerciser.  Point it at a drive
/// it may destroy.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Program file appended to the store after discdiag.ini.
    script: Option<PathBuf>,
    /// Suppress the banner.
    #[arg(long)]
    quiet: bool,
}

const STARTUP: &str = "discdiag.ini";

fn main() -> ExitCode {
    env_logger::init();
    brk::install();
    let args = Args::parse();

    if !args.quiet {
        println!("Disc Diagnostic, v{}", env!("CARGO_PKG_VERSION"));
    }

    let mut dd = Diag::new(Box::new(SysDisk::new()), Console::stdio());
    dd.disk.init();

    // The startup file loads silently when present.
    if Path::new(STARTUP).exists() {
        if let Err(e) = dd.prog.load(Path::new(STARTUP)) {
            log::warn!("{STARTUP}: {e}");
        }
    }
    if let Some(path) = &args.script {
        let loaded = std::fs::read_to_string(path)
            .map_err(Into::into)
            .and_then(|text| dd.prog.merge_text(&text));
        if let Err(e) = loaded {
            eprintln!("{}: {e}", path.display());
        }
    }

    let mut code = 0;
    let mut quit = false;
    if dd.prog.find_label("init").is_some() {
        if let Step::Quit(c) = repl::run_command(&mut dd, "init") {
            code = c;
            quit = true;
        }
    }

    if !quit {
        let Ok(mut rl) = DefaultEditor::new() else {
            eprintln!("discdiag: cannot open the terminal");
            return ExitCode::FAILURE;
        };
        loop {
            match rl.readline("Diag> ") {
                Ok(line) => {
                    let _ = rl.add_history_entry(line.as_str());
                    match repl::run_command(&mut dd, &line) {
                        Step::Continue => {}
                        Step::Quit(c) => {
                            code = c;
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Break at the prompt: clear the flag and
                    // offer a fresh prompt.
                    let _ = brk::check();
                }
                Err(ReadlineError::Eof) => break,
                Err(e) => {
                    log::error!("readline: {e}");
                    break;
                }
            }
        }
        if code == 0 && dd.exit_on_error && dd.last_error {
            code = 1;
        }
    }

    dd.disk.deinit();
    if code == 0 { ExitCode::SUCCESS } else { ExitCode::from(code as u8) }
}
