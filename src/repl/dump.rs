// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Buffer dumps: hex plus ASCII, sixteen bytes to the row,
//! paged.

use crate::cons::Console;
use crate::cursor::Cursor;
use crate::diag::{Diag, NOSECS};
use crate::disk::SECTOR_SIZE;
use crate::expr;
use crate::result::{Error, Outcome, Result};
use crate::{brk, cput, cputln};

fn hexdump(cons: &mut Console, buf: &[u8]) -> Result<()> {
    for (row, chunk) in buf.chunks(16).enumerate() {
        if brk::check() {
            return Err(Error::Stop);
        }
        cput!(cons, "0x{:08x}:", row * 16)?;
        for b in chunk {
            cput!(cons, " {b:02x}")?;
        }
        cput!(cons, " [")?;
        for &b in chunk {
            if b.is_ascii_graphic() || b == b' ' {
                cput!(cons, "{}", b as char)?;
            } else {
                cput!(cons, ".")?;
            }
        }
        cputln!(cons, "]")?;
    }
    Ok(())
}

fn dump(dd: &mut Diag, cur: &mut Cursor, write_side: bool) -> Result<Outcome> {
    cur.skip_ws();
    let n = if cur.at_arg() {
        let n = expr::eval(dd, cur)?;
        if n < 0 {
            return Err(Error::Bounds("Invalid sector count"));
        }
        n as usize
    } else {
        1
    };
    if n > NOSECS {
        return Err(Error::Bounds("Sector count exceeds buffer"));
    }
    let Diag { cons, wrbuf, rdbuf, .. } = dd;
    let buf = if write_side { wrbuf } else { rdbuf };
    cons.page_on();
    let r = hexdump(cons, &buf[..n * SECTOR_SIZE]);
    cons.page_off();
    r.map(|()| Outcome::Ok)
}

pub fn write_buf(dd: &mut Diag, cur: &mut Cursor) -> Result<Outcome> {
    dump(dd, cur, true)
}

pub fn read_buf(dd: &mut Diag, cur: &mut Cursor) -> Result<Outcome> {
    dump(dd, cur, false)
}
