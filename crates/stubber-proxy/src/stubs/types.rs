//! Type definitions for the mock registry.

use crate::upsert::Upsert;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// A canned response registered for one request target.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MockStub {
    /// Lookup key: a full request target (`/a?x=1`) or a bare path (`/a`).
    pub path: String,
    pub status_code: u16,
    /// Delivered verbatim; objects and arrays as JSON, primitives as text.
    pub body: serde_json::Value,
    /// Merged over the default `Content-Type: application/json`.
    pub headers: BTreeMap<String, String>,
    /// `None` means the stub never expires.
    pub remaining_uses: Option<u64>,
}

impl MockStub {
    pub fn new(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            path: path.into(),
            status_code: 200,
            body,
            headers: BTreeMap::new(),
            remaining_uses: None,
        }
    }

    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = status_code;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_remaining_uses(mut self, uses: u64) -> Self {
        self.remaining_uses = Some(uses);
        self
    }
}

/// Registry slot: the stub plus bookkeeping that never leaves the registry.
#[derive(Debug, Clone)]
pub(crate) struct StubEntry {
    pub stub: MockStub,
    pub generation: u64,
    /// Claimed deliveries whose response has not been sent yet.
    pub in_flight: u64,
}

impl StubEntry {
    pub fn new(stub: MockStub, generation: u64) -> Self {
        Self {
            stub,
            generation,
            in_flight: 0,
        }
    }

    /// Whether another delivery may be claimed without exceeding `remaining_uses`.
    pub fn has_capacity(&self) -> bool {
        self.stub
            .remaining_uses
            .map_or(true, |remaining| remaining > self.in_flight)
    }
}

/// Result of a read-only lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct StubLookup {
    /// The key that matched (the full target or the base path).
    pub key: String,
    pub stub: MockStub,
}

/// What `set` overwrote, so the caller can warn about it.
#[derive(Debug, Clone, PartialEq)]
pub struct SetOutcome {
    pub stub: Upsert<MockStub>,
    pub delay: Upsert<Duration>,
}

/// Result of recording one delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Counted; `remaining` is `None` for unlimited stubs.
    Delivered { remaining: Option<u64> },
    /// This was the last permitted delivery; stub, delay and counter are gone.
    Expired,
    /// The registration was cleared or replaced after the claim was taken.
    Stale,
}
