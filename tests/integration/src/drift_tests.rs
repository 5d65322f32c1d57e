//! End-to-end drift checks between expected and reported profiles.

use node_sync::{
    Discrepancy, DriftDetector, Profile, SyncStrategy, drift_strategy, find_strategy,
};
use node_test_utils::repo_profile;
use rstest::rstest;
use serde_json::json;

fn profile(repos: Vec<node_sync::RepositoryProfile>) -> Profile {
    Profile::new(repos)
}

#[test]
fn mirror_count_mismatch_is_a_count_discrepancy() {
    let expected = profile(vec![
        repo_profile("r1", json!({}), vec![]),
        repo_profile("r2", json!({}), vec![]),
    ]);
    let reported = profile(vec![repo_profile("r1", json!({}), vec![])]);

    let result = drift_strategy(SyncStrategy::Mirror).pair_repositories(&expected, &reported);
    assert_eq!(
        result.err().unwrap(),
        Discrepancy::RepositoryCount {
            expected: 2,
            reported: 1
        }
    );
}

#[test]
fn mirror_matching_profiles_pair_and_compare_clean() {
    let expected = profile(vec![repo_profile("a", json!({"x": 1}), vec![])]);
    let reported = profile(vec![repo_profile("a", json!({"x": 1}), vec![])]);

    let strategy = drift_strategy(SyncStrategy::Mirror);
    let pairs = strategy.pair_repositories(&expected, &reported).unwrap();
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].0, pairs[0].1);
    assert!(strategy.compare_units(&pairs).is_ok());
}

#[test]
fn mirror_metadata_change_is_a_repository_discrepancy() {
    let expected = profile(vec![repo_profile("a", json!({"x": 1}), vec![])]);
    let reported = profile(vec![repo_profile("a", json!({"x": 2}), vec![])]);

    let result = drift_strategy(SyncStrategy::Mirror).pair_repositories(&expected, &reported);
    match result.err().unwrap() {
        Discrepancy::Repository { expected, reported } => {
            assert_eq!(expected.id, "a");
            assert_eq!(reported.metadata["x"], 2);
        }
        other => panic!("expected Repository discrepancy, got {other:?}"),
    }
}

#[test]
fn additive_tolerates_extra_reported_repositories() {
    let expected = profile(vec![repo_profile("a", json!({"x": 1}), vec![])]);
    let reported = profile(vec![
        repo_profile("a", json!({"x": 1}), vec![]),
        repo_profile("b", json!({"x": 9}), vec![]),
    ]);

    let pairs = drift_strategy(SyncStrategy::Additive)
        .pair_repositories(&expected, &reported)
        .unwrap();
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].1.id, "a");
}

#[rstest]
#[case::extra_reported_unit_tolerated(vec![json!({"n": 1})], vec![json!({"n": 1}), json!({"n": 2})], true)]
#[case::missing_reported_unit_fails(vec![json!({"n": 1}), json!({"n": 2})], vec![json!({"n": 1})], false)]
#[case::identical_units_in_sync(vec![json!({"n": 1})], vec![json!({"n": 1})], true)]
fn additive_unit_semantics(
    #[case] expected_units: Vec<serde_json::Value>,
    #[case] reported_units: Vec<serde_json::Value>,
    #[case] in_sync: bool,
) {
    let expected = profile(vec![repo_profile("a", json!({}), expected_units)]);
    let reported = profile(vec![repo_profile("a", json!({}), reported_units)]);

    let detector = DriftDetector::new(SyncStrategy::Additive);
    assert_eq!(detector.in_sync(&expected, &reported), in_sync);
}

#[rstest]
#[case::identical_in_sync(vec![json!({"n": 1})], vec![json!({"n": 1})], true)]
#[case::extra_reported_unit_fails(vec![json!({"n": 1})], vec![json!({"n": 1}), json!({"n": 2})], false)]
#[case::missing_reported_unit_fails(vec![json!({"n": 1}), json!({"n": 2})], vec![json!({"n": 1})], false)]
fn mirror_unit_semantics(
    #[case] expected_units: Vec<serde_json::Value>,
    #[case] reported_units: Vec<serde_json::Value>,
    #[case] in_sync: bool,
) {
    let expected = profile(vec![repo_profile("a", json!({}), expected_units)]);
    let reported = profile(vec![repo_profile("a", json!({}), reported_units)]);

    let detector = DriftDetector::new(SyncStrategy::Mirror);
    assert_eq!(detector.in_sync(&expected, &reported), in_sync);
}

#[test]
fn unit_fingerprints_ignore_field_ordering() {
    let expected = profile(vec![repo_profile(
        "a",
        json!({}),
        vec![json!({"name": "unit_1", "version": "1.0"})],
    )]);
    let reported = profile(vec![repo_profile(
        "a",
        json!({}),
        vec![json!({"version": "1.0", "name": "unit_1"})],
    )]);

    assert!(DriftDetector::new(SyncStrategy::Mirror).in_sync(&expected, &reported));
}

#[test]
fn metadata_comparison_ignores_units() {
    let expected = profile(vec![repo_profile("a", json!({"x": 1}), vec![json!({"n": 1})])]);
    let reported = profile(vec![repo_profile("a", json!({"x": 1}), vec![json!({"n": 2})])]);

    // Pairing succeeds (units are stripped); the unit phase is what drifts.
    let strategy = drift_strategy(SyncStrategy::Mirror);
    let pairs = strategy.pair_repositories(&expected, &reported).unwrap();
    assert!(matches!(
        strategy.compare_units(&pairs),
        Err(Discrepancy::Unit { .. })
    ));
}

#[test]
fn strategy_factory_matches_both_sides() {
    assert!(find_strategy("mirror").is_ok());
    assert!(find_strategy("additive").is_ok());

    let error = find_strategy("bogus").err().unwrap();
    assert!(error.to_string().contains("bogus"));

    // The drift side keys off the same enum, so an unknown name can never
    // reach it.
    let kind: SyncStrategy = "mirror".parse().unwrap();
    drift_strategy(kind);
}
