//! Fixed-window issuance bookkeeping

use chrono::{DateTime, Duration, Utc};

use otp_shared::config::{RateLimitConfig, RateRule};

use crate::domain::value_objects::{RateDecision, RateKey};

/// Event count for one rule over one fixed window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateWindow {
    pub window_start: DateTime<Utc>,
    pub count: u32,
    pub limit: u32,
    pub window_duration: Duration,
}

impl RateWindow {
    /// Empty window for `rule` starting at `now`
    pub fn new(rule: &RateRule, now: DateTime<Utc>) -> Self {
        Self {
            window_start: now,
            count: 0,
            limit: rule.limit,
            window_duration: Duration::seconds(rule.window_seconds as i64),
        }
    }

    /// Instant the current window closes
    pub fn resets_at(&self) -> DateTime<Utc> {
        self.window_start + self.window_duration
    }

    /// Window has closed; its count no longer matters
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        now >= self.resets_at()
    }

    /// Start a new window if the current one has closed
    pub fn roll(&mut self, now: DateTime<Utc>) {
        if self.is_stale(now) {
            self.window_start = now;
            self.count = 0;
        }
    }

    pub fn is_full(&self) -> bool {
        self.count >= self.limit
    }

    pub fn remaining(&self) -> u32 {
        self.limit.saturating_sub(self.count)
    }

    /// Whole seconds until the window reopens, rounded up, at least 1
    pub fn retry_after_seconds(&self, now: DateTime<Utc>) -> u64 {
        let millis = (self.resets_at() - now).num_milliseconds().max(0) as u64;
        millis.div_ceil(1000).max(1)
    }

    /// Count one event against every window, or none of them
    ///
    /// Windows are rolled first. If any is full the event is refused and no
    /// count changes; the reported rule is the one that stays closed longest.
    /// `windows` and `rules` are parallel slices.
    pub fn admit(windows: &mut [RateWindow], rules: &[RateRule], now: DateTime<Utc>) -> RateDecision {
        for window in windows.iter_mut() {
            window.roll(now);
        }

        let blocking = windows
            .iter()
            .zip(rules)
            .filter(|(window, _)| window.is_full())
            .max_by_key(|(window, _)| window.retry_after_seconds(now));

        if let Some((window, rule)) = blocking {
            return RateDecision::Denied {
                retry_after_seconds: window.retry_after_seconds(now),
                rule: rule.name.clone(),
            };
        }

        let mut remaining = u32::MAX;
        for window in windows.iter_mut() {
            window.count += 1;
            remaining = remaining.min(window.remaining());
        }
        RateDecision::Allowed { remaining }
    }
}

/// Which rules apply to which kind of rate key
#[derive(Debug, Clone, Default)]
pub struct RatePolicy {
    pub enabled: bool,
    pub phone: Vec<RateRule>,
    pub network_issue: Vec<RateRule>,
    pub network_verify: Vec<RateRule>,
}

impl RatePolicy {
    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self {
            enabled: config.enabled,
            phone: config.phone.clone(),
            network_issue: config.network_issue.clone(),
            network_verify: config.network_verify.clone(),
        }
    }

    /// Rules for `key`; empty when limiting is disabled
    pub fn rules_for(&self, key: &RateKey) -> &[RateRule] {
        if !self.enabled {
            return &[];
        }
        match key {
            RateKey::Phone(_) => &self.phone,
            RateKey::NetworkIssue(_) => &self.network_issue,
            RateKey::NetworkVerify(_) => &self.network_verify,
        }
    }

    /// Fresh windows for `key` starting at `now`
    pub fn windows_for(&self, key: &RateKey, now: DateTime<Utc>) -> Vec<RateWindow> {
        self.rules_for(key)
            .iter()
            .map(|rule| RateWindow::new(rule, now))
            .collect()
    }

    /// Longest window configured for `key`; how long state must be retained
    pub fn retention_for(&self, key: &RateKey) -> Duration {
        self.rules_for(key)
            .iter()
            .map(|rule| Duration::seconds(rule.window_seconds as i64))
            .max()
            .unwrap_or_else(Duration::zero)
    }
}
