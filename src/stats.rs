// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! I/O accounting for the per-command report.

use crate::cons::Console;
use crate::result::Result;
use crate::{cput, cputln};

#[derive(Clone, Copy, Debug, Default)]
pub struct Stats {
    pub iop_read: u64,
    pub iop_write: u64,
    pub byte_read: u64,
    pub byte_write: u64,
}

/// Binary-SI rendering: plain below 1024, `k` below 1024^2,
/// `M` above.
fn scaled(n: u64) -> String {
    const K: f64 = 1024.0;
    const M: f64 = 1024.0 * 1024.0;
    if (n as f64) >= M {
        format!("{:.1}M", n as f64 / M)
    } else if (n as f64) >= K {
        format!("{:.1}k", n as f64 / K)
    } else {
        format!("{n}")
    }
}

impl Stats {
    pub fn clear(&mut self) {
        *self = Stats::default();
    }

    /// One line per top-level command.  If the command left the
    /// console mid-line, the report starts with a newline so it
    /// always occupies a line of its own.
    pub fn report(&self, cons: &mut Console, secs: f64) -> Result<()> {
        if !cons.at_bol() {
            cputln!(cons)?;
        }
        cput!(cons, "Time: {secs:.3}")?;
        cput!(cons, " IOW: {}", scaled(self.iop_write))?;
        cput!(cons, " IOR: {}", scaled(self.iop_read))?;
        cput!(cons, " IO: {}", scaled(self.iop_write + self.iop_read))?;
        cput!(cons, " BW: {}", scaled(self.byte_write))?;
        cput!(cons, " BR: {}", scaled(self.byte_read))?;
        cputln!(cons, " BT: {}", scaled(self.byte_write + self.byte_read))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaling_breaks() {
        assert_eq!(scaled(0), "0");
        assert_eq!(scaled(1023), "1023");
        assert_eq!(scaled(1024), "1.0k");
        assert_eq!(scaled(512 * 1024), "512.0k");
        assert_eq!(scaled(1024 * 1024), "1.0M");
    }
}
