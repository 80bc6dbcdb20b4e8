//! Bounded history of proxied requests.

use super::types::{ProxiedRequestRecord, RecordHandle, RequestSnapshot, ResponseMeta};
use crate::metrics;
use parking_lot::Mutex;
use std::collections::VecDeque;
use tracing::debug;

/// Number of records kept when no capacity is configured.
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

#[derive(Debug, Default)]
struct HistoryState {
    /// Oldest first. Handles are consecutive from front to back.
    records: VecDeque<ProxiedRequestRecord>,
    next_sequence: u64,
}

/// Fixed-capacity, oldest-evicted-first log of forwarded requests.
pub struct HistoryLog {
    state: Mutex<HistoryState>,
    capacity: usize,
}

impl HistoryLog {
    /// A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            state: Mutex::new(HistoryState {
                records: VecDeque::with_capacity(capacity + 1),
                next_sequence: 0,
            }),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Record a forwarded request, evicting the oldest record when full.
    pub fn append(&self, request: RequestSnapshot) -> RecordHandle {
        let mut state = self.state.lock();
        let id = RecordHandle(state.next_sequence);
        state.next_sequence += 1;

        state.records.push_back(ProxiedRequestRecord {
            id,
            request,
            response: None,
        });
        if state.records.len() > self.capacity {
            if let Some(evicted) = state.records.pop_front() {
                metrics::HISTORY_EVICTIONS_TOTAL.inc();
                debug!("History full, evicted record {}", evicted.id.sequence());
            }
        }
        id
    }

    /// Attach the upstream response to the record behind `handle`.
    ///
    /// Returns `false` without touching anything when that record has been
    /// evicted or the log cleared since.
    pub fn patch_response(&self, handle: RecordHandle, response: ResponseMeta) -> bool {
        let mut state = self.state.lock();
        let Some(front) = state.records.front().map(|r| r.id) else {
            return false;
        };
        let Some(offset) = handle.0.checked_sub(front.0) else {
            return false;
        };
        let Ok(offset) = usize::try_from(offset) else {
            return false;
        };

        match state.records.get_mut(offset) {
            Some(record) if record.id == handle => {
                record.response = Some(response);
                true
            }
            _ => false,
        }
    }

    /// Most recent records first. `None` or a negative limit returns everything.
    pub fn list(&self, limit: Option<i64>) -> Vec<ProxiedRequestRecord> {
        let state = self.state.lock();
        let take = match limit {
            Some(n) if n >= 0 => usize::try_from(n).unwrap_or(usize::MAX),
            _ => usize::MAX,
        };
        state.records.iter().rev().take(take).cloned().collect()
    }

    /// Drop every record. Handles issued earlier become stale.
    pub fn clear(&self) -> usize {
        let mut state = self.state.lock();
        let count = state.records.len();
        state.records.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.state.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().records.is_empty()
    }
}

impl Default for HistoryLog {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
