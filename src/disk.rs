// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The block device boundary.
//!
//! The engine sees drives as small integers 0..=9 behind the
//! [`Disk`] trait; everything below that (device nodes, image
//! files, a memory array) is interchangeable.  [`SysDisk`] is
//! the real one: a drive number maps to `drive<n>.img` in the
//! current directory when such a file exists, else to the
//! platform's raw device path.  [`MemDisk`] backs the test
//! suite.

use crate::result::{Error, Result};
use log::{debug, info, warn};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

pub const SECTOR_SIZE: usize = 512;

/// Number of drive slots probed by `listdrives` and accepted by
/// `drive`.
pub const NDRIVES: u32 = 10;

pub trait Disk {
    fn init(&mut self) {}
    fn deinit(&mut self) {}
    /// Opens drive `n`, closing any prior drive first.
    fn set_drive(&mut self, n: u32) -> Result<()>;
    fn get_drive(&self) -> Option<u32>;
    /// True if drive `n` exists and can be opened.
    fn test_drive(&mut self, n: u32) -> bool;
    /// Reads `buf.len() / SECTOR_SIZE` sectors at `lba` from the
    /// current drive.
    fn read_sectors(&mut self, lba: u64, buf: &mut [u8]) -> Result<()>;
    fn write_sectors(&mut self, lba: u64, buf: &[u8]) -> Result<()>;
    /// Size of the current drive in bytes.
    fn size_current(&mut self) -> Result<u64>;
    /// Size of drive `n` in bytes, without disturbing the
    /// current drive.
    fn size_of(&mut self, n: u32) -> Result<u64>;
    fn close_drive(&mut self);
    fn drive_name(&self, n: u32) -> Option<String>;
}

/// Real drives: image files or raw device nodes.
#[derive(Default)]
pub struct SysDisk {
    cur: Option<(u32, File)>,
}

impl SysDisk {
    pub fn new() -> SysDisk {
        SysDisk::default()
    }

    fn open(name: &str) -> Result<File> {
        match OpenOptions::new().read(true).write(true).open(name) {
            Ok(f) => Ok(f),
            Err(rw) => {
                // Fall back to read-only; writes will then fail
                // at the device rather than at open.
                match OpenOptions::new().read(true).open(name) {
                    Ok(f) => {
                        warn!("{name}: opened read-only ({rw})");
                        Ok(f)
                    }
                    Err(_) => Err(Error::Io(format!("{name}: {rw}"))),
                }
            }
        }
    }

    fn file(&mut self) -> Result<&mut File> {
        match self.cur.as_mut() {
            Some((_, f)) => Ok(f),
            None => Err(Error::NoDrive),
        }
    }
}

fn device_path(n: u32) -> String {
    if cfg!(target_os = "linux") {
        let letter = (b'a' + n as u8) as char;
        format!("/dev/sd{letter}")
    } else if cfg!(target_os = "macos") {
        format!("/dev/disk{n}")
    } else if cfg!(windows) {
        format!("\\\\.\\PhysicalDrive{n}")
    } else {
        format!("drive{n}.img")
    }
}

impl Disk for SysDisk {
    fn deinit(&mut self) {
        self.close_drive();
    }

    fn set_drive(&mut self, n: u32) -> Result<()> {
        let name = self.drive_name(n).ok_or(Error::Bounds("Invalid drive number"))?;
        self.close_drive();
        let file = Self::open(&name)?;
        info!("drive {n} open on {name}");
        self.cur = Some((n, file));
        Ok(())
    }

    fn get_drive(&self) -> Option<u32> {
        self.cur.as_ref().map(|&(n, _)| n)
    }

    fn test_drive(&mut self, n: u32) -> bool {
        self.size_of(n).is_ok()
    }

    fn read_sectors(&mut self, lba: u64, buf: &mut [u8]) -> Result<()> {
        let f = self.file()?;
        f.seek(SeekFrom::Start(lba * SECTOR_SIZE as u64))?;
        f.read_exact(buf)?;
        debug!("read {} sectors at {lba}", buf.len() / SECTOR_SIZE);
        Ok(())
    }

    fn write_sectors(&mut self, lba: u64, buf: &[u8]) -> Result<()> {
        let f = self.file()?;
        f.seek(SeekFrom::Start(lba * SECTOR_SIZE as u64))?;
        f.write_all(buf)?;
        f.flush()?;
        debug!("wrote {} sectors at {lba}", buf.len() / SECTOR_SIZE);
        Ok(())
    }

    fn size_current(&mut self) -> Result<u64> {
        let f = self.file()?;
        Ok(f.seek(SeekFrom::End(0))?)
    }

    fn size_of(&mut self, n: u32) -> Result<u64> {
        if self.get_drive() == Some(n) {
            return self.size_current();
        }
        let name = self.drive_name(n).ok_or(Error::Bounds("Invalid drive number"))?;
        let mut f = OpenOptions::new().read(true).open(&name)?;
        Ok(f.seek(SeekFrom::End(0))?)
    }

    fn close_drive(&mut self) {
        if let Some((n, _)) = self.cur.take() {
            debug!("drive {n} closed");
        }
    }

    fn drive_name(&self, n: u32) -> Option<String> {
        if n >= NDRIVES {
            return None;
        }
        let img = format!("drive{n}.img");
        if Path::new(&img).exists() {
            Some(img)
        } else {
            Some(device_path(n))
        }
    }
}

/// A drive made of memory, for tests and dry runs.  It answers
/// as drive 0 only.
pub struct MemDisk {
    data: Vec<u8>,
    open: bool,
}

impl MemDisk {
    pub fn new(sectors: usize) -> MemDisk {
        MemDisk { data: vec![0; sectors * SECTOR_SIZE], open: false }
    }

    fn span(&self, lba: u64, len: usize) -> Result<std::ops::Range<usize>> {
        let start = lba as usize * SECTOR_SIZE;
        let end = start + len;
        if end > self.data.len() {
            return Err(Error::Io("access beyond memory drive".into()));
        }
        Ok(start..end)
    }
}

impl Disk for MemDisk {
    fn set_drive(&mut self, n: u32) -> Result<()> {
        if n != 0 {
            return Err(Error::Io(format!("no drive {n}")));
        }
        self.open = true;
        Ok(())
    }

    fn get_drive(&self) -> Option<u32> {
        self.open.then_some(0)
    }

    fn test_drive(&mut self, n: u32) -> bool {
        n == 0
    }

    fn read_sectors(&mut self, lba: u64, buf: &mut [u8]) -> Result<()> {
        if !self.open {
            return Err(Error::NoDrive);
        }
        let span = self.span(lba, buf.len())?;
        buf.copy_from_slice(&self.data[span]);
        Ok(())
    }

    fn write_sectors(&mut self, lba: u64, buf: &[u8]) -> Result<()> {
        if !self.open {
            return Err(Error::NoDrive);
        }
        let span = self.span(lba, buf.len())?;
        self.data[span].copy_from_slice(buf);
        Ok(())
    }

    fn size_current(&mut self) -> Result<u64> {
        if !self.open {
            return Err(Error::NoDrive);
        }
        Ok(self.data.len() as u64)
    }

    fn size_of(&mut self, n: u32) -> Result<u64> {
        if n != 0 {
            return Err(Error::Io(format!("no drive {n}")));
        }
        Ok(self.data.len() as u64)
    }

    fn close_drive(&mut self) {
        self.open = false;
    }

    fn drive_name(&self, n: u32) -> Option<String> {
        (n == 0).then(|| "mem0".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memdisk_round_trip() {
        let mut d = MemDisk::new(8);
        d.set_drive(0).unwrap();
        let wr = vec![0xa5u8; SECTOR_SIZE * 2];
        d.write_sectors(3, &wr).unwrap();
        let mut rd = vec![0u8; SECTOR_SIZE * 2];
        d.read_sectors(3, &mut rd).unwrap();
        assert_eq!(wr, rd);
        assert_eq!(d.size_current().unwrap(), 8 * SECTOR_SIZE as u64);
    }

    #[test]
    fn memdisk_bounds() {
        let mut d = MemDisk::new(4);
        d.set_drive(0).unwrap();
        let mut buf = vec![0u8; SECTOR_SIZE];
        assert!(d.read_sectors(4, &mut buf).is_err());
    }

    #[test]
    fn memdisk_requires_open() {
        let mut d = MemDisk::new(4);
        let mut buf = vec![0u8; SECTOR_SIZE];
        assert_eq!(d.read_sectors(0, &mut buf), Err(Error::NoDrive));
    }
}
