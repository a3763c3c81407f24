// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Sector patterns: write-side generation and read-side verify.
//!
//! The verify side regenerates the exact byte stream the fill
//! side emitted, so everything here is deterministic, including
//! the per-sector `rand` stream.  The global RNG seed is saved
//! on entry and restored on every exit path, keeping scripted
//! `rand` use independent of pattern work.

use crate::brk;
use crate::cons::Console;
use crate::cputln;
use crate::diag::{Diag, NOSECS};
use crate::disk::SECTOR_SIZE;
use crate::result::{Error, Result};
use crate::rng::Rand;

/// What `comp` does about mismatches: report them all, report
/// only the first, or fail the command on the first.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CmpMode {
    All,
    One,
    Fail,
}

impl CmpMode {
    pub fn parse(name: &str) -> Result<CmpMode> {
        match name {
            "all" => Ok(CmpMode::All),
            "one" => Ok(CmpMode::One),
            "fail" => Ok(CmpMode::Fail),
            _ => Err(Error::Syntax("Invalid compare mode")),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CmpMode::All => "all",
            CmpMode::One => "one",
            CmpMode::Fail => "fail",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Pattern {
    Cnt,
    Dwcnt,
    Val,
    Rand,
    Lba,
    Buffs,
}

impl Pattern {
    pub fn parse(name: &str) -> Result<Pattern> {
        match name {
            "cnt" => Ok(Pattern::Cnt),
            "dwcnt" => Ok(Pattern::Dwcnt),
            "val" => Ok(Pattern::Val),
            "rand" => Ok(Pattern::Rand),
            "lba" => Ok(Pattern::Lba),
            "buffs" => Ok(Pattern::Buffs),
            _ => Err(Error::Pattern(name.to_string())),
        }
    }
}

fn check_len(len: usize) -> Result<usize> {
    if len > NOSECS {
        return Err(Error::Bounds("Sector count exceeds buffer"));
    }
    Ok(len * SECTOR_SIZE)
}

/// Fills the first `len` sectors of the write buffer.  `buffs`
/// has no write side and is rejected with the *name* error.
pub fn fill(dd: &mut Diag, pat: Pattern, val: i64, len: usize) -> Result<()> {
    let nbytes = check_len(len)?;
    if pat == Pattern::Buffs {
        return Err(Error::Pattern("buffs".to_string()));
    }
    let saved = dd.rng.seed();
    dd.rng.reseed();
    let r = fill_inner(&mut dd.wrbuf[..nbytes], &mut dd.rng, pat, val);
    dd.rng.set_seed(saved);
    r
}

fn fill_inner(
    buf: &mut [u8],
    rng: &mut Rand,
    pat: Pattern,
    val: i64,
) -> Result<()> {
    match pat {
        Pattern::Cnt => {
            for (i, b) in buf.iter_mut().enumerate() {
                *b = i as u8;
            }
        }
        Pattern::Dwcnt => {
            for (i, cell) in buf.chunks_exact_mut(4).enumerate() {
                cell.copy_from_slice(&(i as u32).to_be_bytes());
            }
        }
        Pattern::Val => {
            for cell in buf.chunks_exact_mut(4) {
                cell.copy_from_slice(&(val as u32).to_be_bytes());
            }
        }
        Pattern::Rand => {
            for sector in buf.chunks_exact_mut(SECTOR_SIZE) {
                rng.reseed();
                for b in sector.iter_mut() {
                    *b = rng.rand64() as u8;
                }
            }
        }
        Pattern::Lba => {
            // Only the first four bytes of each sector are
            // stamped; the caller pre-fills the rest.
            for (k, sector) in buf.chunks_exact_mut(SECTOR_SIZE).enumerate() {
                let lba = val.wrapping_add(k as i64) as u32;
                sector[..4].copy_from_slice(&lba.to_be_bytes());
            }
        }
        Pattern::Buffs => unreachable!("rejected above"),
    }
    Ok(())
}

/// Verifies `len` sectors against a pattern: the write buffer
/// against the generated stream, or, for `buffs`, the read
/// buffer against the write buffer.
pub fn verify(dd: &mut Diag, pat: Pattern, val: i64, len: usize) -> Result<()> {
    let nbytes = check_len(len)?;
    let saved = dd.rng.seed();
    dd.rng.reseed();
    let r = verify_inner(dd, pat, val, nbytes);
    dd.rng.set_seed(saved);
    r
}

fn verify_inner(
    dd: &mut Diag,
    pat: Pattern,
    val: i64,
    nbytes: usize,
) -> Result<()> {
    let Diag { cons, wrbuf, rdbuf, rng, cmp_mode, .. } = dd;
    let mut ck = Checker::new(cons, *cmp_mode);
    let buf = &wrbuf[..nbytes];
    match pat {
        Pattern::Cnt => {
            for (i, &got) in buf.iter().enumerate() {
                ck.byte(i, got, i as u8)?;
            }
        }
        Pattern::Dwcnt => {
            for (i, cell) in buf.chunks_exact(4).enumerate() {
                let want = (i as u32).to_be_bytes();
                for (j, &got) in cell.iter().enumerate() {
                    ck.byte(i * 4 + j, got, want[j])?;
                }
            }
        }
        Pattern::Val => {
            let want = (val as u32).to_be_bytes();
            for (i, &got) in buf.iter().enumerate() {
                ck.byte(i, got, want[i % 4])?;
            }
        }
        Pattern::Rand => {
            for (k, sector) in buf.chunks_exact(SECTOR_SIZE).enumerate() {
                rng.reseed();
                for (j, &got) in sector.iter().enumerate() {
                    ck.byte(k * SECTOR_SIZE + j, got, rng.rand64() as u8)?;
                }
            }
        }
        Pattern::Lba => {
            for (k, sector) in buf.chunks_exact(SECTOR_SIZE).enumerate() {
                let want = (val.wrapping_add(k as i64) as u32).to_be_bytes();
                for j in 0..4 {
                    ck.byte(k * SECTOR_SIZE + j, sector[j], want[j])?;
                }
            }
        }
        Pattern::Buffs => {
            for (i, (&got, &want)) in
                rdbuf[..nbytes].iter().zip(buf.iter()).enumerate()
            {
                ck.byte(i, got, want)?;
            }
        }
    }
    ck.finish()
}

/// The mismatch policy.  Tracks the first-mismatch flag, and the
/// last reported (read, expected) pair so that a run of
/// identical mismatches collapses into one record plus an
/// occurrence count.
struct Checker<'a> {
    cons: &'a mut Console,
    mode: CmpMode,
    first: bool,
    pair: (u8, u8),
    dataset: bool,
    repeats: u64,
}

impl<'a> Checker<'a> {
    fn new(cons: &'a mut Console, mode: CmpMode) -> Checker<'a> {
        Checker { cons, mode, first: true, pair: (0, 0), dataset: false, repeats: 0 }
    }

    fn byte(&mut self, off: usize, got: u8, want: u8) -> Result<()> {
        if got != want {
            self.mismatch(off, got, want)?;
        }
        // The compare inner loop is a suspension point.
        if brk::check() {
            self.flush()?;
            return Err(Error::Stop);
        }
        Ok(())
    }

    fn mismatch(&mut self, off: usize, got: u8, want: u8) -> Result<()> {
        if self.first || self.mode == CmpMode::All {
            if self.dataset && self.pair == (got, want) {
                self.repeats += 1;
            } else {
                self.flush()?;
                cputln!(
                    self.cons,
                    "Miscompare at 0x{off:x}: read 0x{got:02x} expected 0x{want:02x}"
                )?;
                self.pair = (got, want);
                self.dataset = true;
            }
        }
        self.first = false;
        if self.mode == CmpMode::Fail {
            self.flush()?;
            return Err(Error::Compare);
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if self.repeats > 0 {
            cputln!(
                self.cons,
                "{} occurrences of the above mismatch",
                self.repeats
            )?;
            self.repeats = 0;
        }
        Ok(())
    }

    fn finish(mut self) -> Result<()> {
        self.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes;

    #[test]
    fn cnt_bytes() {
        let (mut dd, _) = fakes::diag(4);
        fill(&mut dd, Pattern::Cnt, 0, 1).unwrap();
        assert_eq!(dd.wrbuf[0], 0);
        assert_eq!(dd.wrbuf[255], 255);
        assert_eq!(dd.wrbuf[256], 0);
        assert_eq!(dd.wrbuf[511], 255);
    }

    #[test]
    fn dwcnt_big_endian_cells() {
        let (mut dd, _) = fakes::diag(4);
        fill(&mut dd, Pattern::Dwcnt, 0, 1).unwrap();
        assert_eq!(&dd.wrbuf[0..4], &[0, 0, 0, 0]);
        assert_eq!(&dd.wrbuf[4..8], &[0, 0, 0, 1]);
        assert_eq!(&dd.wrbuf[508..512], &[0, 0, 0, 127]);
    }

    #[test]
    fn val_stamps_cells() {
        let (mut dd, _) = fakes::diag(4);
        fill(&mut dd, Pattern::Val, 0xdeadbeef, 1).unwrap();
        assert_eq!(&dd.wrbuf[0..4], &[0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(&dd.wrbuf[508..512], &[0xde, 0xad, 0xbe, 0xef]);
    }

    #[test]
    fn lba_touches_only_sector_heads() {
        let (mut dd, _) = fakes::diag(4);
        fill(&mut dd, Pattern::Val, 0x11111111, 2).unwrap();
        fill(&mut dd, Pattern::Lba, 0x20, 2).unwrap();
        assert_eq!(&dd.wrbuf[0..4], &[0, 0, 0, 0x20]);
        assert_eq!(&dd.wrbuf[4..8], &[0x11, 0x11, 0x11, 0x11]);
        assert_eq!(&dd.wrbuf[512..516], &[0, 0, 0, 0x21]);
    }

    #[test]
    fn every_pattern_verifies_clean_after_fill() {
        for (pat, val) in [
            (Pattern::Cnt, 0),
            (Pattern::Dwcnt, 0),
            (Pattern::Val, 0x1234abcd),
            (Pattern::Rand, 0),
            (Pattern::Lba, 7),
        ] {
            for len in [1usize, 3, NOSECS] {
                let (mut dd, sink) = fakes::diag(4);
                fill(&mut dd, pat, val, len).unwrap();
                verify(&mut dd, pat, val, len).unwrap();
                assert_eq!(sink.take(), "", "{pat:?} len {len}");
            }
        }
    }

    #[test]
    fn rand_is_idempotent_per_sector() {
        let (mut dd, sink) = fakes::diag(4);
        fill(&mut dd, Pattern::Rand, 0, 3).unwrap();
        // Repeated verification keeps seeding per sector, so it
        // stays clean no matter how often it runs.
        verify(&mut dd, Pattern::Rand, 0, 3).unwrap();
        verify(&mut dd, Pattern::Rand, 0, 3).unwrap();
        assert_eq!(sink.take(), "");
        // Per-sector seeding means every sector carries the
        // identical stream.
        assert_eq!(&dd.wrbuf[..512], &dd.wrbuf[512..1024]);
    }

    #[test]
    fn seed_is_restored_around_pattern_work() {
        let (mut dd, _) = fakes::diag(4);
        dd.rng.set_seed(12345);
        fill(&mut dd, Pattern::Rand, 0, 2).unwrap();
        assert_eq!(dd.rng.seed(), 12345);
        verify(&mut dd, Pattern::Rand, 0, 2).unwrap();
        assert_eq!(dd.rng.seed(), 12345);
    }

    #[test]
    fn buffs_compares_read_to_write() {
        let (mut dd, sink) = fakes::diag(4);
        fill(&mut dd, Pattern::Cnt, 0, 2).unwrap();
        dd.rdbuf[..1024].copy_from_slice(&dd.wrbuf[..1024].to_vec());
        verify(&mut dd, Pattern::Buffs, 0, 2).unwrap();
        assert_eq!(sink.take(), "");
        dd.rdbuf[700] ^= 0xff;
        verify(&mut dd, Pattern::Buffs, 0, 2).unwrap();
        let out = sink.take();
        assert!(out.contains("Miscompare at 0x2bc"), "{out}");
    }

    #[test]
    fn mode_one_reports_only_first() {
        let (mut dd, sink) = fakes::diag(4);
        fill(&mut dd, Pattern::Val, 0, 1).unwrap();
        dd.wrbuf[3] = 1;
        dd.wrbuf[7] = 1;
        dd.cmp_mode = CmpMode::One;
        verify(&mut dd, Pattern::Val, 0, 1).unwrap();
        let out = sink.take();
        assert_eq!(out.lines().count(), 1);
        assert!(out.contains("Miscompare at 0x3"));
    }

    #[test]
    fn mode_all_collapses_repeats() {
        let (mut dd, sink) = fakes::diag(4);
        fill(&mut dd, Pattern::Val, 0, 1).unwrap();
        // Same wrong (read, expected) pair at three offsets.
        dd.wrbuf[3] = 1;
        dd.wrbuf[7] = 1;
        dd.wrbuf[11] = 1;
        dd.cmp_mode = CmpMode::All;
        verify(&mut dd, Pattern::Val, 0, 1).unwrap();
        let out = sink.take();
        assert!(out.contains("Miscompare at 0x3"));
        assert!(out.contains("2 occurrences of the above mismatch"));
        assert!(!out.contains("0x7"));
    }

    #[test]
    fn mode_fail_raises_compare() {
        let (mut dd, _) = fakes::diag(4);
        fill(&mut dd, Pattern::Cnt, 0, 1).unwrap();
        dd.wrbuf[9] ^= 0xff;
        dd.cmp_mode = CmpMode::Fail;
        assert_eq!(
            verify(&mut dd, Pattern::Cnt, 0, 1),
            Err(Error::Compare)
        );
    }

    #[test]
    fn length_bounds() {
        let (mut dd, _) = fakes::diag(4);
        assert_eq!(
            fill(&mut dd, Pattern::Cnt, 0, NOSECS + 1),
            Err(Error::Bounds("Sector count exceeds buffer"))
        );
    }

    #[test]
    fn buffs_has_no_write_side() {
        let (mut dd, _) = fakes::diag(4);
        assert!(matches!(
            fill(&mut dd, Pattern::Buffs, 0, 1),
            Err(Error::Pattern(_))
        ));
    }
}
