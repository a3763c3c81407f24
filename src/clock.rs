// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Monotonic time for the per-command report.

use std::time::Instant;

pub fn now() -> Instant {
    Instant::now()
}

pub fn elapsed(t0: Instant) -> f64 {
    t0.elapsed().as_secs_f64()
}
