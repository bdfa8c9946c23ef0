//! Per-user command cooldowns.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::session::UserId;

#[derive(Debug, Clone)]
pub struct CooldownConfig {
    /// Uses allowed per window, per user and command.
    pub uses: u32,
    pub window: Duration,
    pub enabled: bool,
    /// Memory bound on tracked (user, command) pairs.
    pub max_tracked: usize,
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self {
            uses: 3,
            window: Duration::from_secs(10),
            enabled: true,
            max_tracked: 10_000,
        }
    }
}

impl CooldownConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    pub fn custom(uses: u32, window_secs: u64) -> Self {
        Self {
            uses,
            window: Duration::from_secs(window_secs),
            ..Default::default()
        }
    }
}

type CooldownKey = (UserId, String);

/// Sliding-window limiter keyed by user and command.
#[derive(Debug)]
pub struct CooldownTracker {
    uses: RwLock<HashMap<CooldownKey, Vec<Instant>>>,
    config: CooldownConfig,
    last_cleanup: RwLock<Instant>,
}

impl CooldownTracker {
    pub fn new(config: CooldownConfig) -> Self {
        Self {
            uses: RwLock::new(HashMap::new()),
            config,
            last_cleanup: RwLock::new(Instant::now()),
        }
    }

    pub fn disabled() -> Self {
        Self::new(CooldownConfig::disabled())
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Record one use of `command` by `user`.
    ///
    /// Returns `Ok(remaining)` if allowed, `Err(retry_after)` while cooling down.
    pub fn check(&self, user: UserId, command: &str) -> Result<u32, Duration> {
        if !self.config.enabled {
            return Ok(self.config.uses);
        }

        self.maybe_cleanup();

        let Ok(mut uses) = self.uses.write() else {
            // Fail open on lock error
            return Ok(self.config.uses);
        };

        let window = self.config.window;
        let stamps = uses.entry((user, command.to_string())).or_default();
        stamps.retain(|t| t.elapsed() < window);
        let used = stamps.len() as u32;

        if used >= self.config.uses {
            let retry_after = stamps
                .first()
                .map(|t| window.saturating_sub(t.elapsed()))
                .unwrap_or(window);
            return Err(retry_after);
        }

        stamps.push(Instant::now());
        Ok(self.config.uses - used - 1)
    }

    fn maybe_cleanup(&self) {
        let due = self
            .last_cleanup
            .read()
            .map(|t| t.elapsed() > self.config.window * 2)
            .unwrap_or(false);
        if !due {
            return;
        }

        let Ok(mut last) = self.last_cleanup.write() else {
            return;
        };
        if last.elapsed() <= self.config.window * 2 {
            return;
        }
        *last = Instant::now();

        if let Ok(mut uses) = self.uses.write() {
            let window = self.config.window;
            uses.retain(|_, stamps| stamps.last().is_some_and(|t| t.elapsed() < window));

            if uses.len() > self.config.max_tracked {
                let mut entries: Vec<_> = uses
                    .iter()
                    .map(|(key, stamps)| (key.clone(), stamps.last().copied()))
                    .collect();
                entries.sort_by_key(|(_, t)| *t);

                let excess = uses.len() - self.config.max_tracked;
                for (key, _) in entries.into_iter().take(excess) {
                    uses.remove(&key);
                }
            }
        }
    }

    pub fn stats(&self) -> CooldownStats {
        CooldownStats {
            tracked: self.uses.read().map(|u| u.len()).unwrap_or(0),
            uses: self.config.uses,
            window_secs: self.config.window.as_secs(),
            enabled: self.config.enabled,
        }
    }
}

impl Default for CooldownTracker {
    fn default() -> Self {
        Self::new(CooldownConfig::default())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CooldownStats {
    pub tracked: usize,
    pub uses: u32,
    pub window_secs: u64,
    pub enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: UserId = UserId(1);
    const BOB: UserId = UserId(2);

    #[test]
    fn test_blocks_after_limit() {
        let tracker = CooldownTracker::new(CooldownConfig::custom(2, 60));

        assert_eq!(tracker.check(ALICE, "memory"), Ok(1));
        assert_eq!(tracker.check(ALICE, "memory"), Ok(0));
        let retry = tracker.check(ALICE, "memory").unwrap_err();
        assert!(retry <= Duration::from_secs(60));
    }

    #[test]
    fn test_separate_users_and_commands() {
        let tracker = CooldownTracker::new(CooldownConfig::custom(1, 60));

        assert!(tracker.check(ALICE, "memory").is_ok());
        assert!(tracker.check(ALICE, "memory").is_err());
        assert!(tracker.check(ALICE, "password").is_ok());
        assert!(tracker.check(BOB, "memory").is_ok());
        assert_eq!(tracker.stats().tracked, 3);
    }

    #[test]
    fn test_disabled() {
        let tracker = CooldownTracker::disabled();
        for _ in 0..100 {
            assert!(tracker.check(ALICE, "memory").is_ok());
        }
        assert!(!tracker.stats().enabled);
    }

    #[test]
    fn test_window_expiry() {
        let tracker = CooldownTracker::new(CooldownConfig {
            uses: 1,
            window: Duration::from_millis(20),
            ..Default::default()
        });
        assert!(tracker.check(ALICE, "help").is_ok());
        assert!(tracker.check(ALICE, "help").is_err());

        std::thread::sleep(Duration::from_millis(30));
        assert!(tracker.check(ALICE, "help").is_ok());
    }
}
