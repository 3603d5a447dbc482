//! Cache lifecycle tests through the public crate API: registration,
//! expiry, eviction and the periodic maintenance tasks.

use std::thread::sleep;
use std::time::{Duration, Instant};

use named_cache::cache::{CacheOptionsOverrides, GetOptions, PutOptions, StatsSnapshot};
use named_cache::scheduler::{CronSchedule, MissingHourPolicy};
use named_cache::{CacheError, CacheRegistry};
use serde_json::json;

fn registry() -> CacheRegistry {
    CacheRegistry::with_current_runtime().unwrap()
}

#[tokio::test]
async fn test_two_caches_keep_separate_stats() {
    let registry = registry();
    let a = registry
        .register::<i32>("aCache", &CacheOptionsOverrides::new())
        .unwrap();
    a.put("a1", 1, PutOptions::default()).unwrap();
    assert_eq!(a.get("a1", GetOptions::default()).unwrap(), Some(1));
    assert_eq!(a.get("a2", GetOptions::default()).unwrap(), None);
    a.put("a1", 2, PutOptions::default()).unwrap();

    let b = registry
        .register::<i32>("bCache", &CacheOptionsOverrides::new())
        .unwrap();
    b.put("b1", 1, PutOptions::default()).unwrap();
    b.put("b1", 2, PutOptions::default()).unwrap();

    assert_eq!(
        a.get_stats(),
        StatsSnapshot {
            hits: 1,
            misses: 1,
            entry_count: 1,
            periodic_clearing: false,
            periodic_pruning: false,
        }
    );
    assert_eq!(
        b.get_stats(),
        StatsSnapshot {
            hits: 0,
            misses: 0,
            entry_count: 1,
            periodic_clearing: false,
            periodic_pruning: false,
        }
    );

    a.clear_cache();
    assert_eq!(a.get("a1", GetOptions::default()).unwrap(), None);
    assert_eq!(a.get("a2", GetOptions::default()).unwrap(), None);
}

#[tokio::test]
async fn test_duplicate_registration_fails() {
    let registry = registry();
    registry
        .register::<i32>("dupeCache", &CacheOptionsOverrides::new())
        .unwrap();

    let err = registry
        .register::<String>("dupeCache", &CacheOptionsOverrides::new())
        .unwrap_err();

    assert!(matches!(err, CacheError::NameConflict(_)));
    assert_eq!(err.to_string(), "cache already exists for dupeCache");
    assert!(registry.get::<i32>("dupeCache").is_some());
}

#[tokio::test]
async fn test_lru_eviction_at_capacity() {
    let registry = registry();
    let cache = registry
        .register::<i32>("small", &CacheOptionsOverrides::new().max(2))
        .unwrap();

    cache.put("x", 1, PutOptions::default()).unwrap();
    cache.put("y", 2, PutOptions::default()).unwrap();
    cache.get("x", GetOptions::default()).unwrap();
    cache.put("z", 3, PutOptions::default()).unwrap();

    assert_eq!(cache.get("y", GetOptions::allow_stale()).unwrap(), None);
    assert_eq!(cache.get("x", GetOptions::default()).unwrap(), Some(1));
    assert_eq!(cache.get("z", GetOptions::default()).unwrap(), Some(3));
    assert_eq!(cache.get_stats().entry_count, 2);
}

#[tokio::test]
async fn test_update_age_on_get_extends_life() {
    let registry = registry();
    let cache = registry
        .register::<i32>(
            "sliding",
            &CacheOptionsOverrides::new()
                .ttl(Duration::from_millis(300))
                .update_age_on_get(true),
        )
        .unwrap();
    cache.put("k", 1, PutOptions::default()).unwrap();

    for _ in 0..4 {
        sleep(Duration::from_millis(150));
        assert_eq!(cache.get("k", GetOptions::default()).unwrap(), Some(1));
    }

    sleep(Duration::from_millis(400));
    assert_eq!(cache.get("k", GetOptions::default()).unwrap(), None);
}

#[tokio::test]
async fn test_zero_ttl_never_expires() {
    let registry = registry();
    let cache = registry
        .register::<i32>("forever", &CacheOptionsOverrides::new().ttl(Duration::ZERO))
        .unwrap();
    cache.put("k", 1, PutOptions::default()).unwrap();
    sleep(Duration::from_millis(20));

    assert_eq!(cache.prune(), 0);
    assert_eq!(cache.get("k", GetOptions::default()).unwrap(), Some(1));
}

#[tokio::test]
async fn test_null_json_value_is_a_miss() {
    let registry = registry();
    let cache = registry
        .register::<serde_json::Value>("json", &CacheOptionsOverrides::new())
        .unwrap();

    let err = cache
        .put("k", serde_json::Value::Null, PutOptions::default())
        .unwrap_err();
    assert!(matches!(err, CacheError::InvalidArgument(_)));

    cache.put("k", json!({ "n": 1 }), PutOptions::default()).unwrap();
    assert!(cache.put("k", json!(null), PutOptions::default()).is_err());

    assert_eq!(cache.get("k", GetOptions::default()).unwrap(), Some(json!({ "n": 1 })));
    assert_eq!(cache.get("missing", GetOptions::default()).unwrap(), None);
    assert_eq!(cache.get_stats().entry_count, 1);
}

#[tokio::test]
async fn test_prune_of_one_hundred_thousand_entries() {
    let registry = registry();
    let cache = registry
        .register::<String>("big", &CacheOptionsOverrides::new().max(100_000))
        .unwrap();
    for i in 0..100_000 {
        cache
            .put(format!("a{i}"), i.to_string(), PutOptions::default())
            .unwrap();
    }

    let started = Instant::now();
    cache.prune();

    assert!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn test_scheduled_pruning_removes_expired_key() {
    let registry = registry();
    let cache = registry
        .register::<i32>(
            "pruned",
            &CacheOptionsOverrides::new()
                .ttl(Duration::from_millis(100))
                .pruning_schedule("* * * * * * *"),
        )
        .unwrap();
    cache
        .put("p1", 1, PutOptions::with_ttl(Duration::from_millis(1000)))
        .unwrap();
    cache.start_periodic_pruning(None).unwrap();
    assert!(cache.get_stats().periodic_pruning);

    let deadline = Instant::now() + Duration::from_secs(3);
    while cache.get("p1", GetOptions::allow_stale()).unwrap().is_some() {
        assert!(Instant::now() < deadline, "timeout waiting for cache prune");
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    cache.stop_periodic_pruning();
    assert!(!cache.get_stats().periodic_pruning);
}

#[tokio::test]
async fn test_auto_started_clearing() {
    let registry = registry();
    let cache = registry
        .register::<i32>(
            "cleared",
            &CacheOptionsOverrides::new()
                .clearing_schedule("* * * * * * *")
                .auto_start_clearing(true),
        )
        .unwrap();
    assert!(cache.get_stats().periodic_clearing);
    cache.put("c1", 1, PutOptions::default()).unwrap();

    let deadline = Instant::now() + Duration::from_secs(3);
    while cache.get("c1", GetOptions::allow_stale()).unwrap().is_some() {
        assert!(Instant::now() < deadline, "timeout waiting for cache clear");
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    registry.shutdown_all();
    assert!(!cache.get_stats().periodic_clearing);
}

#[test]
fn test_default_schedules_fire_when_documented() {
    use chrono::{TimeZone, Utc};

    let clearing = CronSchedule::parse("0 0 0 * * * *").unwrap();
    let pruning = CronSchedule::parse("0 0 * * * * *").unwrap();
    let from = Utc.with_ymd_and_hms(2024, 5, 17, 13, 42, 7).unwrap();

    assert_eq!(
        clearing.next_after(&from, MissingHourPolicy::Offset),
        Some(Utc.with_ymd_and_hms(2024, 5, 18, 0, 0, 0).unwrap())
    );
    assert_eq!(
        pruning.next_after(&from, MissingHourPolicy::Offset),
        Some(Utc.with_ymd_and_hms(2024, 5, 17, 14, 0, 0).unwrap())
    );
}
