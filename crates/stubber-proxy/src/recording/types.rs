//! Types for the proxied-request history: records, snapshots and handles.

use chrono::{DateTime, Utc};
use hyper::HeaderMap;
use serde::Serialize;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// Stable identity of a history record.
///
/// Handles are sequence numbers assigned at append time and never reused,
/// so a late upstream response can only ever patch the record it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RecordHandle(pub(crate) u64);

impl RecordHandle {
    pub fn sequence(&self) -> u64 {
        self.0
    }
}

/// Request side of a record, captured when the request is dispatched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestSnapshot {
    pub timestamp: DateTime<Utc>,
    /// Full request target including the query string.
    pub path: String,
    pub method: String,
    pub headers: BTreeMap<String, String>,
}

impl RequestSnapshot {
    pub fn new(method: &str, path: &str, headers: &HeaderMap) -> Self {
        Self {
            timestamp: Utc::now(),
            path: path.to_string(),
            method: method.to_string(),
            headers: flatten_headers(headers),
        }
    }
}

/// Response side of a record, filled in when the upstream answers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseMeta {
    pub timestamp: DateTime<Utc>,
    pub status: u16,
    pub headers: BTreeMap<String, String>,
}

impl ResponseMeta {
    pub fn new(status: u16, headers: &HeaderMap) -> Self {
        Self {
            timestamp: Utc::now(),
            status,
            headers: flatten_headers(headers),
        }
    }
}

/// One forwarded request and, once known, its upstream response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProxiedRequestRecord {
    pub id: RecordHandle,
    pub request: RequestSnapshot,
    pub response: Option<ResponseMeta>,
}

/// Collapse a header map into name -> value, joining repeated headers with ", ".
pub fn flatten_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut flat: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes());
        match flat.entry(name.as_str().to_string()) {
            Entry::Occupied(mut existing) => {
                let existing = existing.get_mut();
                existing.push_str(", ");
                existing.push_str(&value);
            }
            Entry::Vacant(slot) => {
                slot.insert(value.into_owned());
            }
        }
    }
    flat
}
