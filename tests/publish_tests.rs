//! Publish store behaviour through the conversion service.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;

use linkforge::generator::{Generator, RuleMode, Variant};
use linkforge::service::cache::{CacheLimits, PublishCache};
use linkforge::service::{ConversionService, ConvertError, PublishError, PublishStore};

const LINK: &str = "trojan://secret@host.example:443#Node";

#[test]
fn test_published_document_matches_conversion() {
    let cache = Arc::new(PublishCache::new());
    let svc = ConversionService::new(Generator::default()).with_store(cache.clone());

    let conversion = svc.convert(&[LINK], Variant::Full, RuleMode::AllowList).unwrap();
    let receipt = svc.publish("share-1", &conversion).unwrap();

    assert_eq!(receipt.expires_in, Duration::from_secs(30 * 60));
    assert_eq!(cache.stats().items, 1);
    assert_eq!(svc.fetch("share-1").as_deref(), Some(conversion.text.as_str()));
}

#[test]
fn test_expired_document_is_gone() {
    let cache = PublishCache::with_limits(CacheLimits {
        ttl: Duration::from_secs(5),
        ..CacheLimits::default()
    });
    let t0 = Instant::now();
    cache.put_at("id", "proxies: []\n", t0).unwrap();

    assert!(cache.get_at("id", t0 + Duration::from_secs(4)).is_some());
    assert_eq!(cache.get_at("id", t0 + Duration::from_secs(5)), None);
}

#[test]
fn test_document_over_size_limit_rejected() {
    let cache = Arc::new(PublishCache::with_limits(CacheLimits {
        max_bytes: 64,
        ..CacheLimits::default()
    }));
    let svc = ConversionService::new(Generator::default()).with_store(cache.clone());
    let conversion = svc.convert(&[LINK], Variant::Full, RuleMode::DenyList).unwrap();

    match svc.publish("big", &conversion) {
        Err(ConvertError::Publish(PublishError::TooLarge { size, max })) => {
            assert_eq!(size, conversion.text.len());
            assert_eq!(max, 64);
        }
        other => panic!("expected TooLarge, got {other:?}"),
    }
    assert_eq!(cache.stats().items, 0);
}

#[test]
fn test_capacity_never_exceeded() {
    let cache = PublishCache::with_limits(CacheLimits {
        max_items: 3,
        ..CacheLimits::default()
    });
    for i in 0..10 {
        cache.put(&format!("id-{i}"), "doc").unwrap();
        assert!(cache.stats().items <= 3);
    }
    assert_eq!(cache.get("id-6"), None);
    assert!(cache.get("id-7").is_some());
    assert!(cache.get("id-9").is_some());
}

#[test]
fn test_concurrent_publishers() {
    let cache = Arc::new(PublishCache::with_limits(CacheLimits {
        max_items: 16,
        ..CacheLimits::default()
    }));

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for i in 0..20 {
                    cache.put(&format!("w{worker}-{i}"), "doc").unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(cache.stats().items, 16);
}
