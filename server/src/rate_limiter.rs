use std::{
    collections::{HashMap, VecDeque},
    time::Duration,
};

use log::{debug, warn};

use replica_shared::Instant;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Calls admitted per key within one window
    pub quota: usize,
    pub window: Duration,
}

impl RateLimitConfig {
    pub fn new(quota: usize, window: Duration) -> Self {
        Self { quota, window }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            quota: 20,
            window: Duration::from_secs(1),
        }
    }
}

/// Sliding-window admission control keyed by an arbitrary string,
/// e.g. `"move:" + participant`.
pub struct SlidingWindowLimiter {
    config: RateLimitConfig,
    hits: HashMap<String, VecDeque<Instant>>,
    last_prune: Option<Instant>,
}

impl SlidingWindowLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            hits: HashMap::new(),
            last_prune: None,
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    pub fn allow(&mut self, key: &str) -> bool {
        self.allow_at(key, Instant::now())
    }

    /// Whether a call at `now` fits the quota for the trailing window.
    /// Admitted calls are recorded; refused ones are not.
    pub fn allow_at(&mut self, key: &str, now: Instant) -> bool {
        let window = self.config.window;
        let hits = self.hits.entry(key.to_string()).or_default();
        while let Some(oldest) = hits.front() {
            if now.saturating_duration_since(*oldest) >= window {
                hits.pop_front();
            } else {
                break;
            }
        }
        if hits.len() >= self.config.quota {
            return false;
        }
        hits.push_back(now);
        true
    }

    /// Drops keys whose every timestamp has left the window
    pub fn prune(&mut self, now: Instant) {
        let window = self.config.window;
        self.hits.retain(|_, hits| {
            hits.back()
                .is_some_and(|newest| now.saturating_duration_since(*newest) < window)
        });
        self.last_prune = Some(now);
    }

    /// Prunes at most once per window
    pub fn maybe_prune(&mut self, now: Instant) {
        let due = match self.last_prune {
            Some(last) => now.saturating_duration_since(last) >= self.config.window,
            None => true,
        };
        if due {
            self.prune(now);
        }
    }

    /// Forgets `key` regardless of its window
    pub fn forget(&mut self, key: &str) {
        self.hits.remove(key);
    }

    pub fn tracked_keys(&self) -> usize {
        self.hits.len()
    }
}

/// Named limiter instances, one per concern (requests, movement, chat...)
#[derive(Default)]
pub struct RateLimiters {
    limiters: HashMap<String, SlidingWindowLimiter>,
}

impl RateLimiters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or reconfigures the limiter called `name`
    pub fn insert(&mut self, name: impl Into<String>, config: RateLimitConfig) {
        let name = name.into();
        debug!(
            "rate limiter '{}': {} per {:?}",
            name, config.quota, config.window
        );
        self.limiters
            .insert(name, SlidingWindowLimiter::new(config));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.limiters.contains_key(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut SlidingWindowLimiter> {
        self.limiters.get_mut(name)
    }

    /// `None` when no limiter has that name
    pub fn allow_at(&mut self, name: &str, key: &str, now: Instant) -> Option<bool> {
        match self.limiters.get_mut(name) {
            Some(limiter) => Some(limiter.allow_at(key, now)),
            None => {
                warn!("no rate limiter named '{}'", name);
                None
            }
        }
    }

    pub fn prune(&mut self, now: Instant) {
        for limiter in self.limiters.values_mut() {
            limiter.prune(now);
        }
    }

    pub fn maybe_prune(&mut self, now: Instant) {
        for limiter in self.limiters.values_mut() {
            limiter.maybe_prune(now);
        }
    }

    /// Forgets `key` in the limiter called `name`
    pub fn forget(&mut self, name: &str, key: &str) {
        if let Some(limiter) = self.limiters.get_mut(name) {
            limiter.forget(key);
        }
    }

    /// Keys tracked across every limiter
    pub fn tracked_keys(&self) -> usize {
        self.limiters.values().map(SlidingWindowLimiter::tracked_keys).sum()
    }
}
