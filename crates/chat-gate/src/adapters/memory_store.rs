//! In-memory sliding-window store.
//!
//! One `VecDeque` of request instants per address, oldest first, kept in a
//! sharded `DashMap`. The entry guard holds the shard's write lock for the
//! whole evict/count/append step, so two requests from the same address can
//! never both observe `limit - 1` and both append. Unrelated addresses in
//! other shards proceed in parallel.
//!
//! The state is process-local. Deployments running several processes need a
//! shared [`RateLimitStore`] instead.

use crate::domain::GateResult;
use crate::ports::outbound::{RateDecision, RateLimitStore};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::net::IpAddr;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Request instants for one address
#[derive(Debug)]
struct SlidingWindow {
    hits: VecDeque<Instant>,
    /// Last time this address was seen (for the idle sweep)
    last_seen: Instant,
}

impl SlidingWindow {
    fn new(now: Instant) -> Self {
        Self {
            hits: VecDeque::new(),
            last_seen: now,
        }
    }

    /// Drop every hit older than `window` relative to `now`.
    fn evict_expired(&mut self, now: Instant, window: Duration) {
        while let Some(oldest) = self.hits.front() {
            if now.saturating_duration_since(*oldest) > window {
                self.hits.pop_front();
            } else {
                break;
            }
        }
    }
}

/// Minimum spacing between capacity scans that found nothing to free.
const FULL_SCAN_BACKOFF: Duration = Duration::from_secs(1);

/// Process-local rate limit store
#[derive(Debug)]
pub struct InMemoryRateLimitStore {
    windows: DashMap<IpAddr, SlidingWindow>,
    /// Soft upper bound on tracked addresses
    max_tracked: usize,
    /// When the last capacity scan freed nothing
    full_since: Mutex<Option<Instant>>,
}

impl InMemoryRateLimitStore {
    pub fn new(max_tracked: usize) -> Self {
        Self {
            windows: DashMap::new(),
            max_tracked: max_tracked.max(1),
            full_since: Mutex::new(None),
        }
    }

    /// Try to free a slot for a new address by dropping addresses with no
    /// hit left inside the window. Live windows are never dropped. Returns
    /// whether a slot is available.
    fn make_room(&self, now: Instant, window: Duration) -> bool {
        let mut full_since = self.full_since.lock();
        if let Some(since) = *full_since {
            if now.saturating_duration_since(since) < FULL_SCAN_BACKOFF {
                return false;
            }
        }

        self.windows.retain(|_, w| {
            w.hits
                .back()
                .is_some_and(|newest| now.saturating_duration_since(*newest) <= window)
        });

        let has_room = self.windows.len() < self.max_tracked;
        *full_since = if has_room { None } else { Some(now) };
        has_room
    }
}

impl Default for InMemoryRateLimitStore {
    fn default() -> Self {
        Self::new(100_000)
    }
}

impl RateLimitStore for InMemoryRateLimitStore {
    fn check_and_record(
        &self,
        key: IpAddr,
        now: Instant,
        limit: usize,
        window: Duration,
    ) -> GateResult<RateDecision> {
        if !self.windows.contains_key(&key)
            && self.windows.len() >= self.max_tracked
            && !self.make_room(now, window)
        {
            warn!(
                ip = %key,
                tracked = self.windows.len(),
                "Rate limit store full of live windows, refusing new address"
            );
            return Ok(RateDecision::Limited);
        }

        let mut entry = self.windows.entry(key).or_insert_with(|| {
            debug!(ip = %key, "Creating new rate limit window");
            SlidingWindow::new(now)
        });

        // Requests can reach the lock out of order; keep `hits` oldest first.
        let now = entry.hits.back().map_or(now, |newest| now.max(*newest));

        entry.last_seen = entry.last_seen.max(now);
        entry.evict_expired(now, window);

        if entry.hits.len() >= limit {
            return Ok(RateDecision::Limited);
        }

        entry.hits.push_back(now);
        Ok(RateDecision::Allowed {
            remaining: limit - entry.hits.len(),
        })
    }

    fn recorded(&self, key: IpAddr) -> usize {
        self.windows.get(&key).map(|w| w.hits.len()).unwrap_or(0)
    }

    fn sweep(&self, now: Instant, idle_ttl: Duration) -> usize {
        let mut removed = 0;
        self.windows.retain(|ip, w| {
            let idle = now.saturating_duration_since(w.last_seen);
            if idle > idle_ttl {
                debug!(ip = %ip, idle_secs = idle.as_secs(), "Removing idle rate limit window");
                removed += 1;
                false
            } else {
                true
            }
        });
        removed
    }

    fn tracked(&self) -> usize {
        self.windows.len()
    }
}
