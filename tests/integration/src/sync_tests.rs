//! End-to-end reconciliation passes over the in-memory store.
//!
//! These tests exercise the full flow: request construction, engine
//! lifecycle, strategy execution, and summary rendering.

use node_sync::{
    CancellationFlag, ImportReport, NodeError, RepositoryAction, RepositoryDescriptor, SyncEngine,
    SyncOptions, SyncRequest, SyncScope, SyncStrategy,
};
use node_test_utils::{MemoryStore, StoreCall, binding, init_tracing};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn node_request(ids: &[&str]) -> SyncRequest {
    SyncRequest::new(
        ids.iter().map(|id| binding(id)).collect(),
        SyncScope::Node,
        SyncOptions::default(),
        CancellationFlag::new(),
    )
}

fn actions(request: &SyncRequest) -> Vec<(String, RepositoryAction)> {
    request
        .summary
        .repositories
        .iter()
        .map(|(id, report)| (id.clone(), report.action))
        .collect()
}

#[test]
fn mirror_node_scope_covers_every_repository() {
    init_tracing();
    let mut store = MemoryStore::new()
        .with_repository(RepositoryDescriptor::new("repo-b"))
        .with_repository(RepositoryDescriptor::new("repo-stale"));
    let mut request = node_request(&["repo-a", "repo-b"]);

    SyncEngine::new(SyncStrategy::Mirror).synchronize(&mut request, &mut store);

    assert_eq!(
        actions(&request),
        vec![
            ("repo-a".to_string(), RepositoryAction::Added),
            ("repo-b".to_string(), RepositoryAction::Merged),
            ("repo-stale".to_string(), RepositoryAction::Deleted),
        ]
    );
    assert_eq!(store.repository_ids(), vec!["repo-a", "repo-b"]);
    assert!(request.summary.succeeded());
}

#[test]
fn additive_leaves_unbound_repositories_untouched() {
    let mut store = MemoryStore::new().with_repository(RepositoryDescriptor::new("repo-stale"));
    let mut request = node_request(&["repo-a"]);

    SyncEngine::new(SyncStrategy::Additive).synchronize(&mut request, &mut store);

    assert!(store.contains("repo-stale"));
    // Unbound locals get no summary entry at all under additive.
    assert!(!request.summary.repositories.contains_key("repo-stale"));
    assert!(!store.calls.iter().any(|c| matches!(c, StoreCall::Delete(_))));
}

#[test]
fn mirror_single_repository_scope_never_deletes() {
    let mut store = MemoryStore::new().with_repository(RepositoryDescriptor::new("repo-stale"));
    let mut request = SyncRequest::new(
        vec![binding("repo-a")],
        SyncScope::Repository,
        SyncOptions::default(),
        CancellationFlag::new(),
    );

    SyncEngine::new(SyncStrategy::Mirror).synchronize(&mut request, &mut store);

    assert!(store.contains("repo-stale"));
    assert!(!store.calls.iter().any(|c| matches!(c, StoreCall::Delete(_))));
}

#[test]
fn two_passes_over_the_same_bindings_report_in_the_same_order() {
    let ids = ["zebra", "alpha", "mango", "delta"];

    let mut first_store = MemoryStore::new();
    let mut first = node_request(&ids);
    SyncEngine::new(SyncStrategy::Mirror).synchronize(&mut first, &mut first_store);

    let mut second_store = MemoryStore::new();
    let mut second = node_request(&ids);
    SyncEngine::new(SyncStrategy::Mirror).synchronize(&mut second, &mut second_store);

    let first_order: Vec<String> = first.summary.repositories.keys().cloned().collect();
    let second_order: Vec<String> = second.summary.repositories.keys().cloned().collect();
    assert_eq!(first_order, second_order);
    assert_eq!(first_order, vec!["alpha", "delta", "mango", "zebra"]);
}

proptest! {
    /// Determinism over arbitrary binding sets: two passes with identical
    /// inputs produce identically ordered reports, and that order is the
    /// ascending repo_id order.
    #[test]
    fn reports_are_ordered_and_reproducible(
        ids in proptest::collection::btree_set("[a-z]{1,8}", 1..12)
    ) {
        let ids: Vec<String> = ids.into_iter().collect();
        let bindings: Vec<_> = ids.iter().rev().map(|id| binding(id)).collect();

        let mut first_store = MemoryStore::new();
        let mut first = SyncRequest::new(
            bindings.clone(),
            SyncScope::Node,
            SyncOptions::default(),
            CancellationFlag::new(),
        );
        SyncEngine::new(SyncStrategy::Mirror).synchronize(&mut first, &mut first_store);

        let mut second_store = MemoryStore::new();
        let mut second = SyncRequest::new(
            bindings,
            SyncScope::Node,
            SyncOptions::default(),
            CancellationFlag::new(),
        );
        SyncEngine::new(SyncStrategy::Mirror).synchronize(&mut second, &mut second_store);

        let first_order: Vec<String> = first.summary.repositories.keys().cloned().collect();
        let second_order: Vec<String> = second.summary.repositories.keys().cloned().collect();
        prop_assert_eq!(&first_order, &second_order);
        prop_assert_eq!(first_order, ids);
    }
}

#[test]
fn cancellation_before_the_pass_marks_everything_cancelled() {
    let flag = CancellationFlag::new();
    flag.set();
    let mut store = MemoryStore::new();
    let mut request = SyncRequest::new(
        vec![binding("repo-a"), binding("repo-b")],
        SyncScope::Node,
        SyncOptions::default(),
        flag,
    );

    SyncEngine::new(SyncStrategy::Mirror).synchronize(&mut request, &mut store);

    for report in request.summary.repositories.values() {
        assert_eq!(report.action, RepositoryAction::Cancelled);
    }
    assert!(store.calls.is_empty());
    assert!(store.is_empty());
}

#[test]
fn cancellation_mid_pass_spares_no_later_repository() {
    let flag = CancellationFlag::new();
    let mut store = MemoryStore::new();
    store.cancel_on_sync("repo-a", flag.clone());
    let mut request = SyncRequest::new(
        vec![binding("repo-a"), binding("repo-b"), binding("repo-c")],
        SyncScope::Node,
        SyncOptions::default(),
        flag,
    );

    SyncEngine::new(SyncStrategy::Mirror).synchronize(&mut request, &mut store);

    // The in-flight repository and every later one end up cancelled; the
    // in-flight one keeps no unit counts.
    for id in ["repo-a", "repo-b", "repo-c"] {
        assert_eq!(
            request.summary.repositories[id].action,
            RepositoryAction::Cancelled
        );
    }
    let syncs = store
        .calls
        .iter()
        .filter(|c| matches!(c, StoreCall::RunSynchronization(_)))
        .count();
    assert_eq!(syncs, 1);
}

#[test]
fn one_failing_repository_does_not_abort_the_rest() {
    let mut store = MemoryStore::new();
    store.fail_synchronization("repo-b");
    let mut request = node_request(&["repo-a", "repo-b", "repo-c"]);

    SyncEngine::new(SyncStrategy::Mirror).synchronize(&mut request, &mut store);

    assert_eq!(request.summary.errors.len(), 1);
    match &request.summary.errors[0] {
        NodeError::Caught { repo_id, detail } => {
            assert_eq!(repo_id.as_deref(), Some("repo-b"));
            assert!(detail.contains("importer crashed"));
        }
        other => panic!("expected Caught, got {other:?}"),
    }
    assert_eq!(
        request.summary.repositories["repo-a"].action,
        RepositoryAction::Added
    );
    assert_eq!(
        request.summary.repositories["repo-c"].action,
        RepositoryAction::Added
    );
}

#[test]
fn merge_failure_skips_content_sync_for_that_repository_only() {
    let mut store = MemoryStore::new().with_repository(RepositoryDescriptor::new("repo-a"));
    store.fail_merge("repo-a");
    let mut request = node_request(&["repo-a", "repo-b"]);

    SyncEngine::new(SyncStrategy::Mirror).synchronize(&mut request, &mut store);

    // The failed repository keeps its merged marking with the error
    // alongside; its content sync never ran.
    assert_eq!(
        request.summary.repositories["repo-a"].action,
        RepositoryAction::Merged
    );
    assert!(!store.calls.contains(&StoreCall::RunSynchronization(
        "repo-a".to_string()
    )));
    assert!(store.calls.contains(&StoreCall::RunSynchronization(
        "repo-b".to_string()
    )));
    assert_eq!(request.summary.errors.len(), 1);
}

#[test]
fn invalid_bindings_stop_the_pass_before_any_store_call() {
    let mut store = MemoryStore::new();
    let mut request = SyncRequest::new(
        vec![binding("repo-a"), binding("repo-a")],
        SyncScope::Node,
        SyncOptions::default(),
        CancellationFlag::new(),
    );

    SyncEngine::new(SyncStrategy::Mirror).synchronize(&mut request, &mut store);

    assert!(store.calls.is_empty());
    assert!(
        request
            .summary
            .errors
            .iter()
            .all(|e| matches!(e, NodeError::InvalidBindings { .. }))
    );
    assert!(request.summary.completed_at.is_some());
}

#[test]
fn purge_orphans_runs_once_and_failures_are_recorded() {
    let mut store = MemoryStore::new();
    store.fail_purge();
    let mut request = SyncRequest::new(
        vec![binding("repo-a")],
        SyncScope::Node,
        SyncOptions {
            purge_orphans: true,
            ..SyncOptions::default()
        },
        CancellationFlag::new(),
    );

    SyncEngine::new(SyncStrategy::Mirror).synchronize(&mut request, &mut store);

    let purges = store
        .calls
        .iter()
        .filter(|c| matches!(c, StoreCall::PurgeOrphans))
        .count();
    assert_eq!(purges, 1);
    assert!(
        request
            .summary
            .errors
            .iter()
            .any(|e| matches!(e, NodeError::PurgeOrphans { .. }))
    );
    // The repository pass itself still succeeded.
    assert_eq!(
        request.summary.repositories["repo-a"].action,
        RepositoryAction::Added
    );
}

#[test]
fn purge_orphans_is_not_called_unless_requested() {
    let mut store = MemoryStore::new();
    let mut request = node_request(&["repo-a"]);

    SyncEngine::new(SyncStrategy::Mirror).synchronize(&mut request, &mut store);

    assert!(!store.calls.iter().any(|c| matches!(c, StoreCall::PurgeOrphans)));
}

#[test]
fn skip_content_update_is_metadata_only() {
    let mut store = MemoryStore::new();
    let mut request = SyncRequest::new(
        vec![binding("repo-a")],
        SyncScope::Node,
        SyncOptions {
            skip_content_update: true,
            ..SyncOptions::default()
        },
        CancellationFlag::new(),
    );

    SyncEngine::new(SyncStrategy::Mirror).synchronize(&mut request, &mut store);

    assert!(store.contains("repo-a"));
    assert!(
        !store
            .calls
            .iter()
            .any(|c| matches!(c, StoreCall::RunSynchronization(_)))
    );
}

#[test]
fn scripted_import_counts_land_in_the_summary() {
    let mut store = MemoryStore::new();
    store.script_import(
        "repo-a",
        ImportReport {
            added_count: 10,
            updated_count: 2,
            removed_count: 1,
            sources: vec![serde_json::json!({"url": "http://parent"})],
            ..ImportReport::default()
        },
    );
    let mut request = node_request(&["repo-a"]);

    SyncEngine::new(SyncStrategy::Mirror).synchronize(&mut request, &mut store);

    let entry = &request.summary.repositories["repo-a"];
    assert_eq!(entry.units.added, 10);
    assert_eq!(entry.units.updated, 2);
    assert_eq!(entry.units.removed, 1);
    assert_eq!(entry.sources.len(), 1);
}

#[test]
fn added_repositories_get_working_directories() {
    let workdir = tempfile::tempdir().unwrap();
    let mut store = MemoryStore::new().with_working_root(workdir.path());
    let mut request = node_request(&["repo-a"]);

    SyncEngine::new(SyncStrategy::Mirror).synchronize(&mut request, &mut store);

    let repo = store.repository("repo-a").unwrap();
    assert_eq!(
        repo.working_dir.as_deref(),
        Some(workdir.path().join("repo-a").as_path())
    );
}

#[test]
fn merged_repositories_take_parent_details() {
    let mut stale = RepositoryDescriptor::new("repo-a");
    stale
        .details
        .insert("relative_url".to_string(), serde_json::json!("/old"));
    stale
        .details
        .insert("notes".to_string(), serde_json::json!("local"));
    let mut store = MemoryStore::new().with_repository(stale);
    let mut request = node_request(&["repo-a"]);

    SyncEngine::new(SyncStrategy::Mirror).synchronize(&mut request, &mut store);

    let repo = store.repository("repo-a").unwrap();
    // The parent's declared value wins; local-only keys survive.
    assert_eq!(repo.details["relative_url"], "/repo-a");
    assert_eq!(repo.details["notes"], "local");
}

#[test]
fn summary_renders_to_json_for_the_surrounding_layer() {
    let mut store = MemoryStore::new();
    store.fail_synchronization("repo-a");
    let mut request = node_request(&["repo-a"]);

    SyncEngine::new(SyncStrategy::Mirror).synchronize(&mut request, &mut store);

    let doc = serde_json::to_value(&request.summary).unwrap();
    assert_eq!(doc["repositories"]["repo-a"]["action"], "added");
    assert_eq!(doc["errors"][0]["error_id"], "caught");
    assert!(doc["started_at"].is_string());
    assert!(doc["completed_at"].is_string());
}
