//! Evidence cache tests — reuse, invalidation reasons, retention, locking.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{Duration, Utc};
use osmforge_cache::{CacheOutcome, CacheRequest, EvidenceCacheService};
use osmforge_core::config::{EvidenceCacheOptions, ModuleSelection};
use osmforge_core::errors::{CacheError, ErrorCode};
use tempfile::TempDir;

fn write_fixture(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn request(model_path: &Path, metadata: &[(&str, &str)]) -> CacheRequest {
    CacheRequest {
        command: "build-ssdt".to_string(),
        model_path: model_path.to_path_buf(),
        profile_path: None,
        dmm_path: None,
        config_payload: None,
        metadata: metadata
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        selection: ModuleSelection::default(),
    }
}

fn service(root: &Path) -> EvidenceCacheService {
    EvidenceCacheService::new(EvidenceCacheOptions {
        root: root.to_path_buf(),
        ..Default::default()
    })
}

#[test]
fn first_call_creates_second_call_reuses_without_touching_artifacts() {
    let temp = TempDir::new().unwrap();
    let model = write_fixture(temp.path(), "model.json", "{\"modules\": []}\n");
    let cache_root = temp.path().join("cache");
    let service = service(&cache_root);
    let request = request(&model, &[("policy.mode", "EvidenceGated")]);

    let t0 = Utc::now();
    let first = service.cache_at(&request, t0).unwrap();
    assert_eq!(first.outcome, CacheOutcome::Created);
    assert_eq!(first.evaluation["reason"], "manifest.missing");

    let artifact_path = first.cache_directory.join("model.json");
    let mtime_before = std::fs::metadata(&artifact_path).unwrap().modified().unwrap();

    let t1 = t0 + Duration::seconds(30);
    let second = service.cache_at(&request, t1).unwrap();
    assert_eq!(second.outcome, CacheOutcome::Reused);
    assert_eq!(second.evaluation["reason"], "cache.reused");
    assert_eq!(second.key, first.key);
    assert_eq!(second.cache_directory, first.cache_directory);
    assert_eq!(second.manifest.key, first.manifest.key);
    assert_eq!(second.manifest.created_at_utc, first.manifest.created_at_utc);
    assert_eq!(second.manifest.last_validated_at_utc, t1);

    let mtime_after = std::fs::metadata(&artifact_path).unwrap().modified().unwrap();
    assert_eq!(mtime_before, mtime_after);
}

#[test]
fn metadata_change_invalidates_in_place() {
    let temp = TempDir::new().unwrap();
    let model = write_fixture(temp.path(), "model.json", "{\"modules\": []}\n");
    let cache_root = temp.path().join("cache");
    let service = service(&cache_root);

    let first = service
        .cache_at(&request(&model, &[("policy.mode", "EvidenceGated")]), Utc::now())
        .unwrap();
    assert_eq!(first.outcome, CacheOutcome::Created);

    let second = service
        .cache_at(&request(&model, &[("policy.mode", "Aggressive")]), Utc::now())
        .unwrap();
    assert_eq!(second.outcome, CacheOutcome::Created);
    assert_eq!(second.evaluation["reason"], "metadata.mismatch");
    assert_eq!(second.key, first.key);
}

#[test]
fn model_content_change_forks_a_new_key() {
    let temp = TempDir::new().unwrap();
    let model = write_fixture(temp.path(), "model.json", "{\"modules\": []}\n");
    let cache_root = temp.path().join("cache");
    let service = service(&cache_root);

    let first = service.cache_at(&request(&model, &[]), Utc::now()).unwrap();
    std::fs::write(&model, "{\"modules\": [1]}\n").unwrap();
    let second = service.cache_at(&request(&model, &[]), Utc::now()).unwrap();

    assert_ne!(first.key, second.key);
    assert_eq!(second.outcome, CacheOutcome::Created);
}

#[test]
fn crlf_model_bytes_produce_the_same_key() {
    let temp = TempDir::new().unwrap();
    let unix = write_fixture(temp.path(), "model-unix.json", "{\n  \"modules\": []\n}\n");
    let windows = write_fixture(
        temp.path(),
        "model-windows.json",
        "{\r\n  \"modules\": []\r\n}\r\n",
    );
    let cache_root = temp.path().join("cache");
    let service = service(&cache_root);

    let first = service.cache_at(&request(&unix, &[]), Utc::now()).unwrap();
    let second = service.cache_at(&request(&windows, &[]), Utc::now()).unwrap();
    assert_eq!(first.key, second.key);
    assert_eq!(second.outcome, CacheOutcome::Reused);
}

#[test]
fn ttl_elapse_rebuilds_with_ttl_reason() {
    let temp = TempDir::new().unwrap();
    let model = write_fixture(temp.path(), "model.json", "{}");
    let cache_root = temp.path().join("cache");
    let service = EvidenceCacheService::new(EvidenceCacheOptions {
        root: cache_root,
        ttl_seconds: Some(60),
        ..Default::default()
    });
    let request = request(&model, &[]);

    let t0 = Utc::now();
    let first = service.cache_at(&request, t0).unwrap();
    assert_eq!(first.outcome, CacheOutcome::Created);
    assert!(first.evaluation.contains_key("manifest.expiresAtUtc"));

    let within = service.cache_at(&request, t0 + Duration::seconds(30)).unwrap();
    assert_eq!(within.outcome, CacheOutcome::Reused);

    let after = service.cache_at(&request, t0 + Duration::seconds(120)).unwrap();
    assert_eq!(after.outcome, CacheOutcome::Created);
    assert_eq!(after.evaluation["reason"], "ttl.elapsed");
}

#[test]
fn refresh_flag_forces_rebuild() {
    let temp = TempDir::new().unwrap();
    let model = write_fixture(temp.path(), "model.json", "{}");
    let cache_root = temp.path().join("cache");

    let first = service(&cache_root)
        .cache_at(&request(&model, &[]), Utc::now())
        .unwrap();
    assert_eq!(first.outcome, CacheOutcome::Created);

    let refreshing = EvidenceCacheService::new(EvidenceCacheOptions {
        root: cache_root,
        refresh: true,
        ..Default::default()
    });
    let second = refreshing
        .cache_at(&request(&model, &[]), Utc::now())
        .unwrap();
    assert_eq!(second.outcome, CacheOutcome::Created);
    assert_eq!(second.evaluation["reason"], "refresh.requested");
}

#[test]
fn missing_model_fails_with_stable_code() {
    let temp = TempDir::new().unwrap();
    let service = service(&temp.path().join("cache"));
    let missing = temp.path().join("nope.json");
    let error = service
        .cache_at(&request(&missing, &[]), Utc::now())
        .unwrap_err();
    assert!(matches!(error, CacheError::ModelNotFound { .. }));
    assert_eq!(error.error_code(), "cache.model.notFound");
}

#[test]
fn capacity_retention_keeps_most_recently_validated() {
    let temp = TempDir::new().unwrap();
    let cache_root = temp.path().join("cache");
    let service = EvidenceCacheService::new(EvidenceCacheOptions {
        root: cache_root.clone(),
        max_entries: Some(2),
        ..Default::default()
    });

    let t0 = Utc::now();
    let model_a = write_fixture(temp.path(), "a.json", "{\"a\": 1}");
    let model_b = write_fixture(temp.path(), "b.json", "{\"b\": 2}");
    let model_c = write_fixture(temp.path(), "c.json", "{\"c\": 3}");

    let a = service.cache_at(&request(&model_a, &[]), t0).unwrap();
    let b = service
        .cache_at(&request(&model_b, &[]), t0 + Duration::seconds(10))
        .unwrap();
    let c = service
        .cache_at(&request(&model_c, &[]), t0 + Duration::seconds(20))
        .unwrap();

    // Oldest entry evicted; the two most recently validated survive.
    assert!(!a.cache_directory.exists());
    assert!(b.cache_directory.exists());
    assert!(c.cache_directory.exists());
    assert_eq!(c.evaluation["pruned.total"], "1");
    assert_eq!(c.evaluation["pruned.capacity"], "1");
    assert_eq!(c.evaluation["pruned.remaining"], "2");
    assert!(c.evaluation["pruned.entries"].contains(&a.key));
}

#[test]
fn age_retention_prunes_stale_entries() {
    let temp = TempDir::new().unwrap();
    let cache_root = temp.path().join("cache");
    let service = EvidenceCacheService::new(EvidenceCacheOptions {
        root: cache_root,
        max_age_seconds: Some(3600),
        ..Default::default()
    });

    let t0 = Utc::now();
    let model_a = write_fixture(temp.path(), "a.json", "{\"a\": 1}");
    let model_b = write_fixture(temp.path(), "b.json", "{\"b\": 2}");

    let a = service.cache_at(&request(&model_a, &[]), t0).unwrap();
    let b = service
        .cache_at(&request(&model_b, &[]), t0 + Duration::seconds(7200))
        .unwrap();

    assert!(!a.cache_directory.exists());
    assert!(b.cache_directory.exists());
    assert_eq!(b.evaluation["pruned.expired"], "1");
}

#[test]
fn evaluation_always_carries_reason_time_and_selection_hash() {
    let temp = TempDir::new().unwrap();
    let model = write_fixture(temp.path(), "model.json", "{}");
    let service = service(&temp.path().join("cache"));
    let result = service.cache_at(&request(&model, &[]), Utc::now()).unwrap();

    assert!(result.evaluation.contains_key("reason"));
    assert!(result.evaluation.contains_key("evaluatedAtUtc"));
    assert!(result.evaluation.contains_key("moduleSelection.hash"));
}
