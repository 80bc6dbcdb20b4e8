//! Per-URL response delays.
//!
//! A delay is associated with a request target and applies both to stubbed
//! responses (keyed by the matched stub key) and to proxied calls (keyed by
//! the literal request target). Delays have their own lifecycle: they can be
//! set without a stub and survive `clearAllMockResponses`.

use crate::upsert::{upsert, Upsert};
use parking_lot::{RwLock, RwLockWriteGuard};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// One `{url, delay}` pair as accepted by the `setDelays` command.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DelayEntry {
    #[serde(rename = "url")]
    pub path: String,
    #[serde(rename = "delay")]
    pub delay_ms: u64,
}

impl DelayEntry {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Table of configured delays, keyed by request target.
#[derive(Debug, Default)]
pub struct DelayScheduler {
    delays: RwLock<HashMap<String, Duration>>,
}

impl DelayScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate `delay` with `path`, returning the previous delay if one was set.
    pub fn set_delay(&self, path: impl Into<String>, delay: Duration) -> Upsert<Duration> {
        upsert(&mut self.delays.write(), path.into(), delay)
    }

    /// Apply many delays at once. Every entry is applied; the outcome of each
    /// is reported in input order.
    pub fn set_delays_bulk<I>(&self, entries: I) -> Vec<(String, Upsert<Duration>)>
    where
        I: IntoIterator<Item = DelayEntry>,
    {
        let mut delays = self.delays.write();
        entries
            .into_iter()
            .map(|entry| {
                let outcome = upsert(&mut delays, entry.path.clone(), entry.duration());
                (entry.path, outcome)
            })
            .collect()
    }

    /// Configured delay for `path`, zero when none is set.
    pub fn get_delay(&self, path: &str) -> Duration {
        self.delays.read().get(path).copied().unwrap_or_default()
    }

    /// Remove every delay entry, returning how many were removed.
    pub fn clear_all(&self) -> usize {
        let mut delays = self.delays.write();
        let count = delays.len();
        delays.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.delays.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.delays.read().is_empty()
    }

    /// Write access for the mock registry, which updates delays in the same
    /// critical section as its own maps. Callers must already hold the
    /// registry lock (lock order: registry, then delays).
    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Duration>> {
        self.delays.write()
    }
}

/// Suspend the current request for `delay` without blocking any other task.
pub async fn apply_delay(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_get_delay_defaults_to_zero() {
        let scheduler = DelayScheduler::new();
        assert_eq!(scheduler.get_delay("/missing"), Duration::ZERO);
    }

    #[test]
    fn test_set_delay_reports_overwrite() {
        let scheduler = DelayScheduler::new();
        assert!(!scheduler
            .set_delay("/slow", Duration::from_millis(100))
            .is_replaced());

        let outcome = scheduler.set_delay("/slow", Duration::from_millis(250));
        assert_eq!(outcome.previous(), Some(&Duration::from_millis(100)));
        assert_eq!(scheduler.get_delay("/slow"), Duration::from_millis(250));
    }

    #[test]
    fn test_set_delays_bulk_applies_each_entry() {
        let scheduler = DelayScheduler::new();
        scheduler.set_delay("/b", Duration::from_millis(1));

        let outcomes = scheduler.set_delays_bulk(vec![
            DelayEntry {
                path: "/a".to_string(),
                delay_ms: 10,
            },
            DelayEntry {
                path: "/b".to_string(),
                delay_ms: 20,
            },
        ]);

        assert_eq!(outcomes.len(), 2);
        assert!(!outcomes[0].1.is_replaced());
        assert!(outcomes[1].1.is_replaced());
        assert_eq!(scheduler.get_delay("/a"), Duration::from_millis(10));
        assert_eq!(scheduler.get_delay("/b"), Duration::from_millis(20));
    }

    #[test]
    fn test_clear_all() {
        let scheduler = DelayScheduler::new();
        scheduler.set_delay("/a", Duration::from_millis(10));
        scheduler.set_delay("/b", Duration::from_millis(10));
        assert_eq!(scheduler.clear_all(), 2);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_delay_entry_deserialize() {
        let entry: DelayEntry = serde_json::from_str(r#"{"url": "/slow", "delay": 100}"#).unwrap();
        assert_eq!(entry.path, "/slow");
        assert_eq!(entry.duration(), Duration::from_millis(100));

        assert!(serde_json::from_str::<DelayEntry>(r#"{"url": "/slow", "delay": -1}"#).is_err());
        assert!(serde_json::from_str::<DelayEntry>(r#"{"delay": 5}"#).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_apply_delay_waits() {
        let start = tokio::time::Instant::now();
        apply_delay(Duration::from_millis(100)).await;
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_apply_zero_delay_returns_immediately() {
        let start = Instant::now();
        apply_delay(Duration::ZERO).await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }
}
