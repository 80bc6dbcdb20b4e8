//! Tests for the mock registry.
//!
//! Covers:
//! - exact vs base-path lookup
//! - use-count expiry and its cleanup of delays and counters
//! - claim reservation under concurrency
//! - stale claims after clear/replace

use super::*;
use crate::delay::DelayScheduler;
use crate::upsert::Upsert;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn registry() -> Arc<MockRegistry> {
    Arc::new(MockRegistry::new(Arc::new(DelayScheduler::new())))
}

#[test]
fn test_set_and_lookup_exact() {
    let registry = registry();
    registry.set(MockStub::new("/a", json!({"v": 1})), Duration::ZERO);

    let found = registry.lookup("/a", "/a").unwrap();
    assert_eq!(found.key, "/a");
    assert_eq!(found.stub.body, json!({"v": 1}));
}

#[test]
fn test_exact_match_takes_precedence_over_base_path() {
    let registry = registry();
    registry.set(MockStub::new("/a?x=1", json!("query")), Duration::ZERO);
    registry.set(MockStub::new("/a", json!("base")), Duration::ZERO);

    let found = registry.lookup("/a?x=1", "/a").unwrap();
    assert_eq!(found.key, "/a?x=1");
    assert_eq!(found.stub.body, json!("query"));

    let found = registry.lookup("/a?x=2", "/a").unwrap();
    assert_eq!(found.key, "/a");
    assert_eq!(found.stub.body, json!("base"));
}

#[test]
fn test_lookup_miss() {
    let registry = registry();
    registry.set(MockStub::new("/a", json!({})), Duration::ZERO);
    assert!(registry.lookup("/b?x=1", "/b").is_none());
}

#[test]
fn test_set_overwrite_reports_previous() {
    let registry = registry();
    let first = registry.set(MockStub::new("/a", json!(1)), Duration::from_millis(5));
    assert_eq!(first.stub, Upsert::Inserted);
    assert_eq!(first.delay, Upsert::Inserted);

    let second = registry.set(MockStub::new("/a", json!(2)), Duration::ZERO);
    assert!(second.stub.is_replaced());
    assert_eq!(second.stub.previous().unwrap().body, json!(1));
    assert_eq!(second.delay.previous(), Some(&Duration::from_millis(5)));
    assert_eq!(registry.get("/a").unwrap().body, json!(2));
}

#[test]
fn test_set_sets_delay_and_resets_use_count() {
    let registry = registry();
    registry.set(MockStub::new("/a", json!({})), Duration::from_millis(30));
    assert_eq!(
        registry.delays().get_delay("/a"),
        Duration::from_millis(30)
    );

    registry.claim("/a", "/a").unwrap().complete();
    assert_eq!(registry.use_counts().get("/a"), Some(&1));

    registry.set(MockStub::new("/a", json!({})), Duration::ZERO);
    assert_eq!(registry.use_counts().get("/a"), Some(&0));
}

#[test]
fn test_finite_stub_expires_after_k_deliveries() {
    let registry = registry();
    registry.set(
        MockStub::new("/ping", json!({"ok": true})).with_remaining_uses(3),
        Duration::from_millis(10),
    );

    for expected_left in [2, 1] {
        let outcome = registry.claim("/ping", "/ping").unwrap().complete();
        assert_eq!(
            outcome,
            DeliveryOutcome::Delivered {
                remaining: Some(expected_left)
            }
        );
    }

    let outcome = registry.claim("/ping", "/ping").unwrap().complete();
    assert_eq!(outcome, DeliveryOutcome::Expired);

    assert!(registry.claim("/ping", "/ping").is_none());
    assert!(registry.get("/ping").is_none());
    assert!(!registry.use_counts().contains_key("/ping"));
    assert_eq!(registry.delays().get_delay("/ping"), Duration::ZERO);
    assert!(registry.delays().is_empty());
}

#[test]
fn test_unlimited_stub_counts_deliveries() {
    let registry = registry();
    registry.set(MockStub::new("/a", json!({})), Duration::ZERO);
    for _ in 0..5 {
        assert_eq!(
            registry.claim("/a", "/a").unwrap().complete(),
            DeliveryOutcome::Delivered { remaining: None }
        );
    }
    assert_eq!(registry.use_counts().get("/a"), Some(&5));
}

#[test]
fn test_base_path_delivery_counts_against_base_key() {
    let registry = registry();
    registry.set(
        MockStub::new("/a", json!({})).with_remaining_uses(1),
        Duration::ZERO,
    );

    let claim = registry.claim("/a?page=2", "/a").unwrap();
    assert_eq!(claim.key(), "/a");
    assert_eq!(claim.complete(), DeliveryOutcome::Expired);
    assert!(registry.is_empty());
}

#[test]
fn test_in_flight_claims_cap_single_use_stub() {
    let registry = registry();
    registry.set(
        MockStub::new("/once", json!({})).with_remaining_uses(1),
        Duration::ZERO,
    );

    let first = registry.claim("/once", "/once");
    let second = registry.claim("/once", "/once");
    assert!(first.is_some());
    assert!(second.is_none());
}

#[test]
fn test_exhausted_exact_key_falls_back_to_base() {
    let registry = registry();
    registry.set(
        MockStub::new("/a?x=1", json!("exact")).with_remaining_uses(1),
        Duration::ZERO,
    );
    registry.set(MockStub::new("/a", json!("base")), Duration::ZERO);

    let first = registry.claim("/a?x=1", "/a").unwrap();
    let second = registry.claim("/a?x=1", "/a").unwrap();
    assert_eq!(first.key(), "/a?x=1");
    assert_eq!(second.key(), "/a");
}

#[test]
fn test_dropped_claim_releases_reservation() {
    let registry = registry();
    registry.set(
        MockStub::new("/once", json!({})).with_remaining_uses(1),
        Duration::ZERO,
    );

    drop(registry.claim("/once", "/once").unwrap());

    assert_eq!(registry.get("/once").unwrap().remaining_uses, Some(1));
    assert_eq!(registry.use_counts().get("/once"), Some(&0));
    assert!(registry.claim("/once", "/once").is_some());
}

#[test]
fn test_claim_against_replaced_stub_is_stale() {
    let registry = registry();
    registry.set(
        MockStub::new("/a", json!("old")).with_remaining_uses(1),
        Duration::ZERO,
    );
    let claim = registry.claim("/a", "/a").unwrap();
    assert_eq!(claim.stub().body, json!("old"));

    registry.set(
        MockStub::new("/a", json!("new")).with_remaining_uses(1),
        Duration::ZERO,
    );

    assert_eq!(claim.complete(), DeliveryOutcome::Stale);
    let current = registry.get("/a").unwrap();
    assert_eq!(current.body, json!("new"));
    assert_eq!(current.remaining_uses, Some(1));
    assert_eq!(registry.use_counts().get("/a"), Some(&0));
}

#[test]
fn test_claim_after_clear_is_stale_and_leaves_no_counter() {
    let registry = registry();
    registry.set(MockStub::new("/a", json!({})), Duration::ZERO);
    let claim = registry.claim("/a", "/a").unwrap();

    assert!(registry.clear("/a"));
    assert_eq!(claim.complete(), DeliveryOutcome::Stale);
    assert!(registry.use_counts().is_empty());
}

#[test]
fn test_claim_carries_delay() {
    let registry = registry();
    registry.set(MockStub::new("/slow", json!({})), Duration::from_millis(100));
    let claim = registry.claim("/slow", "/slow").unwrap();
    assert_eq!(claim.delay(), Duration::from_millis(100));
}

#[test]
fn test_clear_removes_stub_delay_and_counter() {
    let registry = registry();
    registry.set(MockStub::new("/a", json!({})), Duration::from_millis(10));
    registry.delays().set_delay("/other", Duration::from_millis(10));

    assert!(registry.clear("/a"));
    assert!(registry.get("/a").is_none());
    assert!(registry.use_counts().is_empty());
    assert_eq!(registry.delays().get_delay("/a"), Duration::ZERO);
    assert_eq!(
        registry.delays().get_delay("/other"),
        Duration::from_millis(10)
    );
}

#[test]
fn test_clear_missing_returns_false_and_keeps_delay() {
    let registry = registry();
    registry.delays().set_delay("/a", Duration::from_millis(10));
    assert!(!registry.clear("/a"));
    assert_eq!(registry.delays().get_delay("/a"), Duration::from_millis(10));
}

#[test]
fn test_clear_all_keeps_delays() {
    let registry = registry();
    registry.set(MockStub::new("/a", json!({})), Duration::from_millis(10));
    registry.set(MockStub::new("/b", json!({})), Duration::ZERO);

    assert_eq!(registry.clear_all(), 2);
    assert!(registry.is_empty());
    assert!(registry.use_counts().is_empty());
    assert_eq!(registry.delays().get_delay("/a"), Duration::from_millis(10));
}

#[test]
fn test_concurrent_claims_on_single_use_stub() {
    for _ in 0..50 {
        let registry = registry();
        registry.set(
            MockStub::new("/race", json!({})).with_remaining_uses(1),
            Duration::ZERO,
        );

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    registry
                        .claim("/race", "/race")
                        .map(|claim| claim.complete())
                })
            })
            .collect();

        let outcomes: Vec<_> = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .collect();

        let delivered = outcomes.iter().filter(|o| o.is_some()).count();
        assert_eq!(delivered, 1);
        assert!(outcomes.contains(&Some(DeliveryOutcome::Expired)));
        assert!(registry.is_empty());
    }
}

#[test]
fn test_concurrent_deliveries_never_exceed_remaining_uses() {
    let registry = registry();
    registry.set(
        MockStub::new("/few", json!({})).with_remaining_uses(5),
        Duration::ZERO,
    );

    let handles: Vec<_> = (0..32)
        .map(|_| {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || registry.claim("/few", "/few").map(|c| c.complete()))
        })
        .collect();

    let delivered = handles
        .into_iter()
        .filter_map(|h| h.join().unwrap())
        .count();
    assert_eq!(delivered, 5);
    assert!(registry.get("/few").is_none());
}
