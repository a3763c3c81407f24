// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The user break flag.
//!
//! A signal handler folds SIGINT and SIGTERM into one process
//! global atomic byte.  The engine samples and clears it in a
//! single operation at each suspension point: the prompt, the
//! pager, between commands, and inside the compare inner loop.

use std::sync::atomic::{AtomicBool, Ordering};

static BREAK: AtomicBool = AtomicBool::new(false);

/// Raises the break flag.  Callable from a signal handler.
pub fn post() {
    BREAK.store(true, Ordering::Relaxed);
}

/// Samples and clears the break flag.
pub fn check() -> bool {
    BREAK.swap(false, Ordering::Relaxed)
}

#[cfg(unix)]
pub fn install() {
    extern "C" fn handler(sig: libc::c_int) {
        post();
        // Handlers reinstall themselves.
        unsafe {
            libc::signal(
                sig,
                handler as extern "C" fn(libc::c_int) as libc::sighandler_t,
            );
        }
    }
    unsafe {
        libc::signal(
            libc::SIGINT,
            handler as extern "C" fn(libc::c_int) as libc::sighandler_t,
        );
        libc::signal(
            libc::SIGTERM,
            handler as extern "C" fn(libc::c_int) as libc::sighandler_t,
        );
    }
}

#[cfg(not(unix))]
pub fn install() {}
