//! Insert-or-replace helper shared by the mock registry and the delay scheduler.

use std::collections::HashMap;
use std::hash::Hash;

/// Outcome of an [`upsert`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Upsert<V> {
    /// The key was not present before.
    Inserted,
    /// The key was present; holds the value that was overwritten.
    Replaced(V),
}

impl<V> Upsert<V> {
    pub fn is_replaced(&self) -> bool {
        matches!(self, Upsert::Replaced(_))
    }

    /// The overwritten value, if any.
    pub fn previous(&self) -> Option<&V> {
        match self {
            Upsert::Inserted => None,
            Upsert::Replaced(v) => Some(v),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(V) -> U) -> Upsert<U> {
        match self {
            Upsert::Inserted => Upsert::Inserted,
            Upsert::Replaced(v) => Upsert::Replaced(f(v)),
        }
    }
}

/// Insert `value` under `key`, reporting whether an existing value was overwritten.
///
/// The new value always wins; callers decide how loudly to report a replacement.
pub fn upsert<K, V>(map: &mut HashMap<K, V>, key: K, value: V) -> Upsert<V>
where
    K: Eq + Hash,
{
    match map.insert(key, value) {
        Some(previous) => Upsert::Replaced(previous),
        None => Upsert::Inserted,
    }
}
