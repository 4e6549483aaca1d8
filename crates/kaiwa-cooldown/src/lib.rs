// SPDX-FileCopyrightText: 2026 Kaiwa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-identity cooldown limiting.
//!
//! [`Cooldown`] enforces a minimum interval between successive accepted
//! actions from the same identity. It is a single slot per identity, not a
//! token bucket: a burst inside one window collapses to one acceptance
//! followed by rejections, and the window restarts from the last *accepted*
//! trigger, not from a calendar boundary.
//!
//! The identity map grows without eviction for the process lifetime, which
//! is acceptable at chat-user cardinality.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::debug;

/// Tracks the last accepted trigger per identity.
pub struct Cooldown {
    window: Duration,
    last_accepted: Mutex<HashMap<u64, Instant>>,
}

impl Cooldown {
    /// A limiter enforcing `window` between accepted triggers.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_accepted: Mutex::new(HashMap::new()),
        }
    }

    /// Attempt a trigger for `id`.
    ///
    /// Returns `None` when allowed, recording now as the identity's last
    /// accepted time. Returns `Some(remaining)` when still inside the
    /// window; the recorded time is left untouched so the wait does not
    /// extend under hammering.
    pub fn trigger(&self, id: u64) -> Option<Duration> {
        let now = Instant::now();
        // Whole check-then-set is one critical section per call, so
        // concurrent triggers for the same id cannot both be accepted.
        let mut map = self.last_accepted.lock().expect("cooldown map poisoned");
        if let Some(last) = map.get(&id) {
            let elapsed = now.duration_since(*last);
            if elapsed < self.window {
                let remaining = self.window - elapsed;
                debug!(id, remaining_secs = remaining.as_secs_f64(), "cooldown rejection");
                return Some(remaining);
            }
        }
        map.insert(id, now);
        None
    }

    /// The configured minimum interval.
    pub fn window(&self) -> Duration {
        self.window
    }
}
