//! MockRegistry - stub storage with use-count expiry.
//!
//! Stubs and use counters share one mutex. Operations that also touch the
//! delay table take the registry lock first and the delay lock second; the
//! delay scheduler never takes the registry lock, so the order is global.

use super::types::{DeliveryOutcome, MockStub, SetOutcome, StubEntry, StubLookup};
use crate::delay::DelayScheduler;
use crate::upsert::upsert;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Default)]
struct RegistryState {
    stubs: HashMap<String, StubEntry>,
    use_counts: HashMap<String, u64>,
    next_generation: u64,
}

/// Registry of mock responses keyed by request target.
pub struct MockRegistry {
    state: Mutex<RegistryState>,
    delays: Arc<DelayScheduler>,
}

impl MockRegistry {
    pub fn new(delays: Arc<DelayScheduler>) -> Self {
        Self {
            state: Mutex::new(RegistryState::default()),
            delays,
        }
    }

    /// The delay table this registry keeps in step with its stubs.
    pub fn delays(&self) -> &Arc<DelayScheduler> {
        &self.delays
    }

    /// Insert or overwrite a stub and set its delay in one critical section.
    ///
    /// The use counter for the key restarts at zero. Claims taken against a
    /// replaced registration become stale and no longer affect this one.
    pub fn set(&self, stub: MockStub, delay: Duration) -> SetOutcome {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let generation = state.next_generation;
        state.next_generation += 1;

        let path = stub.path.clone();
        let stub_outcome = upsert(
            &mut state.stubs,
            path.clone(),
            StubEntry::new(stub, generation),
        );
        state.use_counts.insert(path.clone(), 0);
        let delay_outcome = upsert(&mut self.delays.write(), path, delay);

        SetOutcome {
            stub: stub_outcome.map(|entry| entry.stub),
            delay: delay_outcome,
        }
    }

    /// Remove a stub together with its delay and use counter.
    ///
    /// Returns `false` when no stub was registered for `path`; the delay table
    /// is left untouched in that case.
    pub fn clear(&self, path: &str) -> bool {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        if state.stubs.remove(path).is_none() {
            return false;
        }
        state.use_counts.remove(path);
        self.delays.write().remove(path);
        true
    }

    /// Remove every stub and use counter. Delays are kept.
    pub fn clear_all(&self) -> usize {
        let mut guard = self.state.lock();
        let count = guard.stubs.len();
        guard.stubs.clear();
        guard.use_counts.clear();
        count
    }

    /// Exact-target lookup with fallback to the base path.
    pub fn lookup(&self, full_target: &str, base_path: &str) -> Option<StubLookup> {
        let state = self.state.lock();
        [full_target, base_path].into_iter().find_map(|key| {
            state.stubs.get(key).map(|entry| StubLookup {
                key: key.to_string(),
                stub: entry.stub.clone(),
            })
        })
    }

    /// Reserve one delivery of the stub matching `full_target` (or `base_path`).
    ///
    /// A finite stub whose remaining uses are all reserved by in-flight
    /// requests is skipped as if it were absent.
    pub fn claim(
        self: &Arc<Self>,
        full_target: &str,
        base_path: &str,
    ) -> Option<DeliveryClaim> {
        let mut state = self.state.lock();

        let key = [full_target, base_path].into_iter().find(|key| {
            state
                .stubs
                .get(*key)
                .is_some_and(StubEntry::has_capacity)
        })?;

        let entry = state.stubs.get_mut(key)?;
        entry.in_flight += 1;

        Some(DeliveryClaim {
            registry: Arc::clone(self),
            key: key.to_string(),
            generation: entry.generation,
            stub: entry.stub.clone(),
            delay: self.delays.get_delay(key),
            settled: false,
        })
    }

    fn record_delivery(&self, key: &str, generation: u64) -> DeliveryOutcome {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let Some(entry) = state.stubs.get_mut(key) else {
            return DeliveryOutcome::Stale;
        };
        if entry.generation != generation {
            return DeliveryOutcome::Stale;
        }

        entry.in_flight = entry.in_flight.saturating_sub(1);
        *state.use_counts.entry(key.to_string()).or_insert(0) += 1;

        let remaining_uses = entry.stub.remaining_uses;
        match remaining_uses {
            None => DeliveryOutcome::Delivered { remaining: None },
            Some(remaining) if remaining > 1 => {
                entry.stub.remaining_uses = Some(remaining - 1);
                DeliveryOutcome::Delivered {
                    remaining: Some(remaining - 1),
                }
            }
            Some(_) => {
                state.stubs.remove(key);
                state.use_counts.remove(key);
                self.delays.write().remove(key);
                debug!("Mock response for '{}' used up, removed", key);
                DeliveryOutcome::Expired
            }
        }
    }

    fn release(&self, key: &str, generation: u64) {
        let mut state = self.state.lock();
        if let Some(entry) = state.stubs.get_mut(key) {
            if entry.generation == generation {
                entry.in_flight = entry.in_flight.saturating_sub(1);
            }
        }
    }

    /// Snapshot of the stub registered under exactly `path`.
    pub fn get(&self, path: &str) -> Option<MockStub> {
        self.state.lock().stubs.get(path).map(|e| e.stub.clone())
    }

    /// Delivery counts per registered key.
    pub fn use_counts(&self) -> BTreeMap<String, u64> {
        self.state
            .lock()
            .use_counts
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.state.lock().stubs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().stubs.is_empty()
    }
}

/// A reserved delivery of one stub.
///
/// [`complete`](DeliveryClaim::complete) records the delivery once the
/// response has been handed to the transport. Dropping the claim without
/// completing it (client went away during the delay) gives the reservation
/// back without counting a delivery.
pub struct DeliveryClaim {
    registry: Arc<MockRegistry>,
    key: String,
    generation: u64,
    stub: MockStub,
    delay: Duration,
    settled: bool,
}

impl DeliveryClaim {
    /// The registry key that matched.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Snapshot of the stub taken when the claim was made.
    pub fn stub(&self) -> &MockStub {
        &self.stub
    }

    /// Delay configured for the matched key at claim time.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn complete(mut self) -> DeliveryOutcome {
        self.settled = true;
        self.registry.record_delivery(&self.key, self.generation)
    }
}

impl Drop for DeliveryClaim {
    fn drop(&mut self) {
        if !self.settled {
            self.registry.release(&self.key, self.generation);
        }
    }
}

impl std::fmt::Debug for DeliveryClaim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryClaim")
            .field("key", &self.key)
            .field("generation", &self.generation)
            .field("settled", &self.settled)
            .finish()
    }
}
