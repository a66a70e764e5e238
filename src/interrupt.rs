// Copyright (c) SimpleStaking and Tezedge Contributors
// SPDX-License-Identifier: MIT

use std::{
    sync::{Arc, Condvar, Mutex},
    time::{Duration, Instant},
};

/// Stop request shared between the signal handler and the report loop.
/// Once triggered it stays triggered.
#[derive(Clone, Default)]
pub struct Interrupt {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl Interrupt {
    pub fn new() -> Self {
        Interrupt::default()
    }

    pub fn trigger(&self) {
        let (lock, cvar) = &*self.inner;
        *lock.lock().unwrap_or_else(|e| e.into_inner()) = true;
        cvar.notify_all();
    }

    #[cfg(test)]
    fn is_triggered(&self) -> bool {
        let (lock, _) = &*self.inner;
        *lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Sleeps for `timeout` or until triggered, returns whether it was triggered.
    pub fn wait(&self, timeout: Duration) -> bool {
        let (lock, cvar) = &*self.inner;
        // too far to be represented, wait for the trigger only
        let deadline = Instant::now().checked_add(timeout);
        let mut triggered = lock.lock().unwrap_or_else(|e| e.into_inner());
        while !*triggered {
            // spurious wakeups land back here
            triggered = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        break;
                    }
                    match cvar.wait_timeout(triggered, deadline - now) {
                        Ok((guard, _)) => guard,
                        Err(e) => e.into_inner().0,
                    }
                },
                None => cvar.wait(triggered).unwrap_or_else(|e| e.into_inner()),
            };
        }
        *triggered
    }
}
