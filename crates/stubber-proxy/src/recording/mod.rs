//! History of proxied requests for operator inspection.
//!
//! Every request that is forwarded to the upstream gets a record. The
//! response side is filled in asynchronously when the upstream answers, via a
//! stable [`RecordHandle`], so eviction of older records never redirects a
//! late response onto the wrong entry.
//!
//! # Module Structure
//!
//! - `types` - records, snapshots and handles
//! - `store` - the bounded log

mod store;
mod types;

pub use store::{HistoryLog, DEFAULT_HISTORY_CAPACITY};
pub use types::{ProxiedRequestRecord, RecordHandle, RequestSnapshot, ResponseMeta};
