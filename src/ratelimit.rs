//! Per-client request rate limiting over fixed one-minute windows.
//!
//! Each client key (normally the source address) maps to a `(count,
//! window_reset_at)` pair. Windows are lazy: an entry is created on first
//! sight of a key and overwritten once its window has passed, so there is no
//! background bookkeeping on the request path. Expired entries are reclaimed
//! by [`RateLimiter::sweep_expired`], which the server runs on an interval.
//!
//! The limiter is an injectable component, constructed per server (and per
//! test) rather than living in module-level state. The global limit is
//! runtime-mutable via the admin API and applies to all subsequent checks
//! immediately; in-flight windows are not grandfathered.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Length of one rate window.
pub const WINDOW: Duration = Duration::from_secs(60);

struct WindowEntry {
    count: u32,
    window_reset_at: Instant,
}

/// Tracks request counts per client key.
pub struct RateLimiter {
    entries: Mutex<HashMap<String, WindowEntry>>,
    limit: AtomicU32,
}

impl RateLimiter {
    pub fn new(limit: u32) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            limit: AtomicU32::new(limit),
        }
    }

    /// The current requests-per-window limit.
    pub fn limit(&self) -> u32 {
        self.limit.load(Ordering::Relaxed)
    }

    /// Replaces the global limit. Takes effect on the next check.
    pub fn set_limit(&self, limit: u32) {
        self.limit.store(limit, Ordering::Relaxed);
    }

    /// Records one request for `client_key` and reports whether it is
    /// admitted under the current limit.
    pub fn check(&self, client_key: &str) -> bool {
        self.check_at(client_key, Instant::now())
    }

    /// Number of client keys currently tracked, expired windows included.
    pub fn tracked_clients(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Drops every entry whose window has already passed.
    pub fn sweep_expired(&self) {
        self.sweep_expired_at(Instant::now());
    }

    // Clock-injected core, shared by the public entry points and the tests.
    //
    // A timestamp exactly at the window boundary counts as expired: the
    // request starts a fresh window. Note the quirk inherited from the
    // window model: the first request of a fresh window is always admitted
    // (its count is written as 1 and only compared on the next request), so
    // a limit of 0 admits one request per window rather than none.
    fn check_at(&self, client_key: &str, now: Instant) -> bool {
        let limit = self.limit();
        let mut entries = self.entries.lock().unwrap();
        match entries.get_mut(client_key) {
            Some(entry) if now < entry.window_reset_at => {
                if entry.count < limit {
                    entry.count += 1;
                    true
                } else {
                    false
                }
            }
            _ => {
                entries.insert(
                    client_key.to_string(),
                    WindowEntry {
                        count: 1,
                        window_reset_at: now + WINDOW,
                    },
                );
                true
            }
        }
    }

    fn sweep_expired_at(&self, now: Instant) {
        let mut entries = self.entries.lock().unwrap();
        entries.retain(|_, entry| now < entry.window_reset_at);
    }
}
