// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Drive selection and sector I/O verbs.

use crate::cursor::Cursor;
use crate::diag::{Diag, NOSECS};
use crate::disk::{Disk, NDRIVES, SECTOR_SIZE};
use crate::expr;
use crate::result::{Error, Outcome, Result};
use crate::{brk, cputln};

/// Parses the optional `[lba [n]]` pair; defaults are sector 0,
/// one sector.
fn lba_count(dd: &mut Diag, cur: &mut Cursor) -> Result<(u64, usize)> {
    cur.skip_ws();
    let lba = if cur.at_arg() { expr::eval(dd, cur)? } else { 0 };
    if lba < 0 {
        return Err(Error::Bounds("Access beyond end of drive"));
    }
    cur.skip_ws();
    let n = if cur.at_arg() { expr::eval(dd, cur)? } else { 1 };
    if n < 0 {
        return Err(Error::Bounds("Invalid sector count"));
    }
    Ok((lba as u64, n as usize))
}

fn span(dd: &mut Diag, cur: &mut Cursor) -> Result<(u64, usize)> {
    let (lba, n) = lba_count(dd, cur)?;
    let size = dd.require_drive()?;
    if n > NOSECS {
        return Err(Error::Bounds("Sector count exceeds buffer"));
    }
    if lba + n as u64 > size {
        return Err(Error::Bounds("Access beyond end of drive"));
    }
    Ok((lba, n * SECTOR_SIZE))
}

pub fn read(dd: &mut Diag, cur: &mut Cursor) -> Result<Outcome> {
    let (lba, nbytes) = span(dd, cur)?;
    let Diag { disk, rdbuf, .. } = dd;
    disk.read_sectors(lba, &mut rdbuf[..nbytes])?;
    dd.stats.iop_read += 1;
    dd.stats.byte_read += nbytes as u64;
    Ok(Outcome::Ok)
}

pub fn write(dd: &mut Diag, cur: &mut Cursor) -> Result<Outcome> {
    let (lba, nbytes) = span(dd, cur)?;
    if dd.write_protect {
        return Err(Error::Protected);
    }
    let Diag { disk, wrbuf, .. } = dd;
    disk.write_sectors(lba, &wrbuf[..nbytes])?;
    dd.stats.iop_write += 1;
    dd.stats.byte_write += nbytes as u64;
    Ok(Outcome::Ok)
}

/// `drive [n]`: select and open a drive, or show the current
/// one.  Selecting re-arms write protection and clears the
/// statistics.
pub fn drive(dd: &mut Diag, cur: &mut Cursor) -> Result<Outcome> {
    cur.skip_ws();
    if !cur.at_arg() {
        match dd.drive {
            Some(n) => cputln!(dd.cons, "Drive: {n}")?,
            None => cputln!(dd.cons, "Drive: none")?,
        }
        return Ok(Outcome::Ok);
    }
    let n = expr::eval(dd, cur)?;
    if !(0..NDRIVES as i64).contains(&n) {
        return Err(Error::Bounds("Invalid drive number"));
    }
    let n = n as u32;
    dd.drive = None;
    dd.disk.set_drive(n)?;
    let bytes = match dd.disk.size_current() {
        Ok(b) => b,
        Err(e) => {
            dd.disk.close_drive();
            return Err(e);
        }
    };
    if bytes % SECTOR_SIZE as u64 != 0 {
        cputln!(
            dd.cons,
            "Warning: drive size is not a whole number of sectors"
        )?;
    }
    dd.drive = Some(n);
    dd.drive_size = bytes / SECTOR_SIZE as u64;
    dd.write_protect = true;
    dd.stats.clear();
    cputln!(dd.cons, "Drive {n}: {} sectors", dd.drive_size)?;
    Ok(Outcome::Ok)
}

/// `listdrives`: probe every slot, with name and size.
pub fn listdrives(dd: &mut Diag) -> Result<Outcome> {
    dd.cons.page_on();
    let r = (|| {
        for n in 0..NDRIVES {
            if brk::check() {
                return Err(Error::Stop);
            }
            if !dd.disk.test_drive(n) {
                continue;
            }
            let Ok(bytes) = dd.disk.size_of(n) else {
                continue;
            };
            let name = dd.disk.drive_name(n).unwrap_or_default();
            let secs = bytes / SECTOR_SIZE as u64;
            if bytes % SECTOR_SIZE as u64 != 0 {
                cputln!(dd.cons, "{n}: {name} {secs} sectors (partial last sector)")?;
            } else {
                cputln!(dd.cons, "{n}: {name} {secs} sectors")?;
            }
        }
        Ok(())
    })();
    dd.cons.page_off();
    r.map(|()| Outcome::Ok)
}

pub fn unprot(dd: &mut Diag) -> Result<Outcome> {
    dd.write_protect = false;
    Ok(Outcome::Ok)
}
