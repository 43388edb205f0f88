//! Engine behaviour against a scripted adapter
//!
//! These tests use the zero-delay limiter unless they are specifically
//! about waits, so pass counts rather than wall-clock time bound them.

use crate::support::{batch, fatal, not_found, transient, ScriptedAdapter, Step};
use shelf_scout::cache::{
    MemoryCache, RecordCache, Schema, TsvCache, INDEX_FIELD, SOURCE_TITLE_FIELD,
};
use shelf_scout::engine::{RateLimiter, ResolveEngine, ResolveError, Termination};
use shelf_scout::state::{Disposition, ItemIndex};
use std::collections::HashSet;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

fn schema() -> Schema {
    Schema::new(SOURCE_TITLE_FIELD, &["name"])
}

fn immediate_engine(adapter: ScriptedAdapter, max_passes: u32) -> ResolveEngine {
    ResolveEngine::new(Box::new(adapter), RateLimiter::immediate(), max_passes)
}

fn dispositions(report: &shelf_scout::ResolveReport) -> Vec<Disposition> {
    report.outcomes.iter().map(|o| o.disposition).collect()
}

#[tokio::test]
async fn test_terminates_within_max_passes() {
    let adapter = ScriptedAdapter::new(vec![
        ("Dune", vec![transient()]),
        ("Emma", vec![transient()]),
    ]);
    let calls = adapter.calls();
    let engine = immediate_engine(adapter, 4);
    let mut cache = MemoryCache::new(schema());

    let report = engine
        .resolve(&batch(&["Dune", "Emma"]), &mut cache)
        .await
        .unwrap();

    assert_eq!(report.termination, Termination::Exhausted);
    assert_eq!(report.passes, 4);
    assert_eq!(report.adapter_calls, 8);
    assert_eq!(calls.lock().unwrap().len(), 8);
    assert_eq!(
        dispositions(&report),
        vec![Disposition::Unresolved, Disposition::Unresolved]
    );
    assert!(cache.is_empty());
}

#[tokio::test]
async fn test_second_run_with_populated_cache_makes_no_calls() {
    let dir = TempDir::new().unwrap();
    let cache_path = dir.path().join("cache.tsv");
    let items = batch(&["Dune", "Emma", "Persuasion"]);

    {
        let adapter = ScriptedAdapter::new(vec![
            ("Dune", vec![Step::Found("Dune")]),
            ("Emma", vec![transient(), Step::Found("Emma")]),
            ("Persuasion", vec![Step::Found("Persuasion")]),
        ]);
        let engine = immediate_engine(adapter, 20);
        let mut cache = TsvCache::load(&cache_path, schema()).unwrap();
        assert!(cache.is_new());

        let report = engine.resolve(&items, &mut cache).await.unwrap();
        assert_eq!(report.counts.fetched, 3);
    }

    let adapter = ScriptedAdapter::new(vec![]);
    let calls = adapter.calls();
    let engine = immediate_engine(adapter, 20);
    let mut cache = TsvCache::load(&cache_path, schema()).unwrap();
    assert!(!cache.is_new());
    assert_eq!(cache.len(), 3);

    let report = engine.resolve(&items, &mut cache).await.unwrap();

    assert_eq!(report.adapter_calls, 0);
    assert!(calls.lock().unwrap().is_empty());
    assert_eq!(report.counts.cache_hit, 3);
    assert_eq!(report.termination, Termination::Completed);
}

#[tokio::test]
async fn test_outcomes_partition_the_batch() {
    let adapter = ScriptedAdapter::new(vec![
        ("Dune", vec![Step::Found("Dune")]),
        ("Emma", vec![not_found()]),
        ("Ulysses", vec![transient()]),
        ("Dracula", vec![transient(), Step::Found("Dracula")]),
    ]);
    let engine = immediate_engine(adapter, 3);
    let mut cache = MemoryCache::new(schema());
    cache
        .append(
            shelf_scout::Record::new()
                .with(INDEX_FIELD, "0")
                .with(SOURCE_TITLE_FIELD, "Persuasion")
                .with("name", "Persuasion"),
        )
        .unwrap();

    let items = batch(&["Dune", "Emma", "Ulysses", "Dracula", "Persuasion"]);
    let report = engine.resolve(&items, &mut cache).await.unwrap();

    let seen: HashSet<&ItemIndex> = report.outcomes.iter().map(|o| &o.index).collect();
    assert_eq!(report.outcomes.len(), items.len());
    assert_eq!(seen.len(), items.len());
    assert_eq!(report.counts.total(), items.len());

    assert_eq!(
        dispositions(&report),
        vec![
            Disposition::Fetched,
            Disposition::NotFound,
            Disposition::Unresolved,
            Disposition::Fetched,
            Disposition::CacheHit,
        ]
    );
    assert_eq!(report.counts.pending(), 1);
}

#[tokio::test]
async fn test_fatal_stops_before_later_items() {
    let adapter = ScriptedAdapter::new(vec![
        ("Dune", vec![Step::Found("Dune")]),
        ("Emma", vec![fatal()]),
        ("Persuasion", vec![Step::Found("Persuasion")]),
    ]);
    let calls = adapter.calls();
    let engine = immediate_engine(adapter, 20);
    let mut cache = MemoryCache::new(schema());

    let result = engine
        .resolve(&batch(&["Dune", "Emma", "Persuasion"]), &mut cache)
        .await;

    let Err(ResolveError::Fatal { index, reason, report }) = result else {
        panic!("expected a fatal abort");
    };

    assert_eq!(index, ItemIndex::from(2));
    assert_eq!(reason, "robot check");
    assert_eq!(*calls.lock().unwrap(), vec!["Dune", "Emma"]);
    assert_eq!(report.termination, Termination::Aborted);
    assert_eq!(report.passes, 1);
    assert_eq!(
        dispositions(&report),
        vec![
            Disposition::Fetched,
            Disposition::Unresolved,
            Disposition::NotAttempted,
        ]
    );

    // Records fetched before the abort are persisted
    assert!(cache.contains("Dune"));
}

#[tokio::test]
async fn test_not_found_is_not_requeued() {
    let adapter = ScriptedAdapter::new(vec![
        ("Emma", vec![not_found()]),
        ("Dune", vec![transient(), Step::Found("Dune")]),
    ]);
    let calls = adapter.calls();
    let engine = immediate_engine(adapter, 20);
    let mut cache = MemoryCache::new(schema());

    let report = engine
        .resolve(&batch(&["Emma", "Dune"]), &mut cache)
        .await
        .unwrap();

    assert_eq!(*calls.lock().unwrap(), vec!["Emma", "Dune", "Dune"]);
    assert_eq!(report.passes, 2);
    assert_eq!(report.counts.not_found, 1);
    assert_eq!(report.counts.pending(), 0);
    assert_eq!(report.termination, Termination::Completed);
}

#[tokio::test]
async fn test_fetched_record_is_written_through_and_reused() {
    let dir = TempDir::new().unwrap();
    let cache_path = dir.path().join("cache.tsv");

    let adapter = ScriptedAdapter::new(vec![("Dune", vec![Step::Found("Dune (Deluxe)")])]);
    let engine = immediate_engine(adapter, 20);
    let mut cache = TsvCache::load(&cache_path, schema()).unwrap();

    engine.resolve(&batch(&["Dune"]), &mut cache).await.unwrap();

    let content = std::fs::read_to_string(&cache_path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines, vec!["1\tDune\tDune (Deluxe)"]);

    let adapter = ScriptedAdapter::new(vec![]);
    let calls = adapter.calls();
    let engine = immediate_engine(adapter, 20);
    let mut reloaded = TsvCache::load(&cache_path, schema()).unwrap();

    let mut other = shelf_scout::Batch::new();
    other.insert(7u64, shelf_scout::WorkItem::new("Dune", vec![]));
    let report = engine.resolve(&other, &mut reloaded).await.unwrap();

    assert!(calls.lock().unwrap().is_empty());
    let record = report.outcomes[0].record.as_ref().unwrap();
    assert_eq!(report.outcomes[0].disposition, Disposition::CacheHit);
    assert_eq!(record.get(INDEX_FIELD), Some("7"));
    assert_eq!(record.get("name"), Some("Dune (Deluxe)"));
}

#[tokio::test]
async fn test_failed_cache_append_still_reports_fetched() {
    let dir = TempDir::new().unwrap();
    let cache_path = dir.path().join("missing").join("cache.tsv");

    let adapter = ScriptedAdapter::new(vec![("Dune", vec![Step::Found("Dune (Deluxe)")])]);
    let calls = adapter.calls();
    let engine = immediate_engine(adapter, 20);
    let mut cache = TsvCache::load(&cache_path, schema()).unwrap();
    let items = batch(&["Dune"]);

    let report = engine.resolve(&items, &mut cache).await.unwrap();

    assert_eq!(report.termination, Termination::Completed);
    assert_eq!(dispositions(&report), vec![Disposition::Fetched]);
    let record = report.outcomes[0].record.as_ref().unwrap();
    assert_eq!(record.get(INDEX_FIELD), Some("1"));
    assert_eq!(record.get("name"), Some("Dune (Deluxe)"));
    assert!(!cache.contains("Dune"));
    assert!(!cache_path.exists());

    let report = engine.resolve(&items, &mut cache).await.unwrap();

    assert_eq!(dispositions(&report), vec![Disposition::Fetched]);
    assert_eq!(*calls.lock().unwrap(), vec!["Dune", "Dune"]);
}

#[tokio::test]
async fn test_duplicate_titles_fetch_once() {
    let adapter = ScriptedAdapter::new(vec![("Dune", vec![Step::Found("Dune")])]);
    let calls = adapter.calls();
    let engine = immediate_engine(adapter, 20);
    let mut cache = MemoryCache::new(schema());

    let report = engine
        .resolve(&batch(&["Dune", "Dune"]), &mut cache)
        .await
        .unwrap();

    assert_eq!(calls.lock().unwrap().len(), 1);
    assert_eq!(
        dispositions(&report),
        vec![Disposition::Fetched, Disposition::CacheHit]
    );
    assert_eq!(
        report.outcomes[1].record.as_ref().unwrap().get(INDEX_FIELD),
        Some("2")
    );
    assert_eq!(cache.get("Dune").unwrap().get(INDEX_FIELD), Some("1"));
}

#[tokio::test]
async fn test_no_cooldown_after_full_success() {
    let adapter = ScriptedAdapter::new(vec![
        ("Dune", vec![Step::Found("Dune")]),
        ("Emma", vec![Step::Found("Emma")]),
    ]);
    let limiter = RateLimiter::new(
        Duration::ZERO,
        Duration::from_secs(600),
        CancellationToken::new(),
    );
    let engine = ResolveEngine::new(Box::new(adapter), limiter, 20);
    let mut cache = MemoryCache::new(schema());

    let report = tokio::time::timeout(
        Duration::from_secs(5),
        engine.resolve(&batch(&["Dune", "Emma"]), &mut cache),
    )
    .await
    .expect("resolve waited for a cool-down")
    .unwrap();

    assert_eq!(report.termination, Termination::Completed);
    assert_eq!(report.passes, 1);
}

#[tokio::test]
async fn test_no_cooldown_after_final_pass() {
    let adapter = ScriptedAdapter::new(vec![("Dune", vec![transient()])]);
    let limiter = RateLimiter::new(
        Duration::ZERO,
        Duration::from_secs(600),
        CancellationToken::new(),
    );
    let engine = ResolveEngine::new(Box::new(adapter), limiter, 1);
    let mut cache = MemoryCache::new(schema());

    let report = tokio::time::timeout(
        Duration::from_secs(5),
        engine.resolve(&batch(&["Dune"]), &mut cache),
    )
    .await
    .expect("resolve waited for a cool-down")
    .unwrap();

    assert_eq!(report.termination, Termination::Exhausted);
    assert_eq!(report.passes, 1);
}

#[tokio::test]
async fn test_cancel_during_cooldown_returns_partial_report() {
    let adapter = ScriptedAdapter::new(vec![
        ("Dune", vec![Step::Found("Dune")]),
        ("Emma", vec![transient()]),
    ]);
    let limiter = RateLimiter::new(
        Duration::ZERO,
        Duration::from_secs(600),
        CancellationToken::new(),
    );
    let token = limiter.cancellation_token();
    let engine = ResolveEngine::new(Box::new(adapter), limiter, 20);
    let mut cache = MemoryCache::new(schema());

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();
    });

    let report = tokio::time::timeout(
        Duration::from_secs(5),
        engine.resolve(&batch(&["Dune", "Emma"]), &mut cache),
    )
    .await
    .expect("cancellation did not interrupt the cool-down")
    .unwrap();

    assert_eq!(report.termination, Termination::Cancelled);
    assert_eq!(report.passes, 1);
    assert_eq!(
        dispositions(&report),
        vec![Disposition::Fetched, Disposition::Unresolved]
    );
    assert!(cache.contains("Dune"));
}

#[tokio::test]
async fn test_cancel_during_fetch_stops_the_pass() {
    let adapter = ScriptedAdapter::new(vec![
        ("Dune", vec![Step::Found("Dune")]),
        ("Emma", vec![Step::Hang]),
        ("Persuasion", vec![Step::Found("Persuasion")]),
    ]);
    let calls = adapter.calls();
    let engine = immediate_engine(adapter, 20);
    let token = engine.limiter().cancellation_token();
    let mut cache = MemoryCache::new(schema());

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();
    });

    let report = tokio::time::timeout(
        Duration::from_secs(5),
        engine.resolve(&batch(&["Dune", "Emma", "Persuasion"]), &mut cache),
    )
    .await
    .expect("cancellation did not interrupt the fetch")
    .unwrap();

    assert_eq!(report.termination, Termination::Cancelled);
    assert_eq!(*calls.lock().unwrap(), vec!["Dune", "Emma"]);
    assert_eq!(
        dispositions(&report),
        vec![
            Disposition::Fetched,
            Disposition::Unresolved,
            Disposition::NotAttempted,
        ]
    );
}

#[tokio::test]
async fn test_cancel_after_fetch_keeps_completed_record() {
    let token = CancellationToken::new();
    let adapter = ScriptedAdapter::new(vec![
        ("Dune", vec![Step::Found("Dune")]),
        ("Emma", vec![Step::Found("Emma")]),
        ("Persuasion", vec![Step::Found("Persuasion")]),
    ])
    .cancel_on("Emma", token.clone());
    let calls = adapter.calls();
    let limiter = RateLimiter::new(Duration::ZERO, Duration::ZERO, token);
    let engine = ResolveEngine::new(Box::new(adapter), limiter, 20);
    let mut cache = MemoryCache::new(schema());

    let report = engine
        .resolve(&batch(&["Dune", "Emma", "Persuasion"]), &mut cache)
        .await
        .unwrap();

    assert_eq!(report.termination, Termination::Cancelled);
    assert_eq!(*calls.lock().unwrap(), vec!["Dune", "Emma"]);
    assert_eq!(
        dispositions(&report),
        vec![
            Disposition::Fetched,
            Disposition::Fetched,
            Disposition::NotAttempted,
        ]
    );
    assert!(cache.contains("Emma"));
}
