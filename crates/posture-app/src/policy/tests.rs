use super::*;
use camino::Utf8PathBuf;
use posture_cache::CacheStore;
use posture_source::{Getters, MemorySource, SourceCall};
use posture_test_util::{control_id, utf8_root};
use posture_types::{
    Control, ControlsInputs, Exception, Framework, PolicyIdentifier, PolicyKind,
    PolicyNotification, ScanPolicySet,
};
use proptest::prelude::*;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use tempfile::TempDir;

fn framework_with_controls(name: &str, count: usize) -> Framework {
    let controls = (1..=count)
        .map(|n| Control::new(control_id(n), format!("control {n}")))
        .collect();
    Framework::new(name, controls)
}

fn handler(source: &Arc<MemorySource>) -> PolicyHandler {
    PolicyHandler::new(Getters::uniform(Arc::clone(source)), CacheStore::disabled())
}

fn cached_handler(source: &Arc<MemorySource>, cache_dir: Utf8PathBuf) -> PolicyHandler {
    PolicyHandler::new(Getters::uniform(Arc::clone(source)), CacheStore::new(cache_dir))
}

fn sentinel_session() -> ScanPolicySet {
    ScanPolicySet {
        policies: vec![Framework::new("previous", Vec::new())],
        ..ScanPolicySet::default()
    }
}

fn sample_inputs() -> ControlsInputs {
    let mut map = BTreeMap::new();
    map.insert("insecureCapabilities".to_string(), json!(["SYS_ADMIN"]));
    ControlsInputs(map)
}

#[test]
fn single_framework_request() {
    let source = Arc::new(MemorySource::new().with_framework(framework_with_controls("nsa", 10)));
    let notification = PolicyNotification::of_kind(PolicyKind::Framework, ["nsa"]);
    let mut session = ScanPolicySet::default();

    handler(&source)
        .get_policies(&notification, &mut session)
        .expect("get policies");

    assert_eq!(session.policies.len(), 1);
    assert_eq!(session.policies[0].name, "nsa");
    assert_eq!(session.policies[0].controls.len(), 10);
}

#[test]
fn frameworks_keep_request_order() {
    let source = Arc::new(
        MemorySource::new()
            .with_framework(framework_with_controls("nsa", 1))
            .with_framework(framework_with_controls("mitre", 2))
            .with_framework(framework_with_controls("cis", 3)),
    );
    let notification = PolicyNotification::of_kind(PolicyKind::Framework, ["mitre", "cis", "nsa"]);
    let mut session = ScanPolicySet::default();

    handler(&source)
        .get_policies(&notification, &mut session)
        .expect("get policies");

    let names: Vec<&str> = session.policies.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["mitre", "cis", "nsa"]);
}

#[test]
fn controls_are_wrapped_in_one_synthetic_framework() {
    let source = Arc::new(
        MemorySource::new()
            .with_control("c-0001", Control::new("C-0001", "registries"))
            .with_control("c-0002", Control::new("C-0002", "privileged")),
    );
    let notification = PolicyNotification::of_kind(PolicyKind::Control, ["c-0002", "c-0001"]);
    let mut session = ScanPolicySet::default();

    handler(&source)
        .get_policies(&notification, &mut session)
        .expect("get policies");

    assert_eq!(session.policies.len(), 1);
    let synthetic = &session.policies[0];
    assert!(synthetic.is_synthetic());
    let ids: Vec<&str> = synthetic.controls.iter().map(Control::id).collect();
    assert_eq!(ids, vec!["C-0002", "C-0001"]);
}

#[test]
fn control_fetch_failure_aborts_and_leaves_session_untouched() {
    let source = Arc::new(
        MemorySource::new()
            .with_control("c-0001", Control::new("C-0001", "registries"))
            .with_control("c-0003", Control::new("C-0003", "host network"))
            .fail_on("c-0002")
            .with_exceptions(Vec::new()),
    );
    let notification =
        PolicyNotification::of_kind(PolicyKind::Control, ["c-0001", "c-0002", "c-0003"]);
    let mut session = sentinel_session();

    let err = handler(&source)
        .get_policies(&notification, &mut session)
        .expect_err("download must fail");

    assert!(matches!(err, PolicyError::Download { .. }));
    assert!(err.to_string().starts_with("failed to download policies:"));
    assert_eq!(session, sentinel_session());
    assert_eq!(
        source.calls(),
        vec![
            SourceCall::Control("c-0001".to_string()),
            SourceCall::Control("c-0002".to_string()),
        ]
    );
}

#[test]
fn framework_fetch_failure_aborts_before_later_fetches() {
    let source = Arc::new(
        MemorySource::new()
            .with_framework(framework_with_controls("nsa", 1))
            .fail_on("mitre"),
    );
    let notification = PolicyNotification::of_kind(PolicyKind::Framework, ["mitre", "nsa"]);
    let mut session = ScanPolicySet::default();

    let err = handler(&source)
        .get_policies(&notification, &mut session)
        .expect_err("download must fail");

    assert!(matches!(err, PolicyError::Download { .. }));
    assert!(session.policies.is_empty());
    assert_eq!(source.calls(), vec![SourceCall::Framework("mitre".to_string())]);
}

#[test]
fn missing_control_is_an_empty_result() {
    let source = Arc::new(MemorySource::new());
    let notification = PolicyNotification::of_kind(PolicyKind::Control, ["c-0001"]);
    let mut session = ScanPolicySet::default();

    let err = handler(&source)
        .get_policies(&notification, &mut session)
        .expect_err("nothing fetched");

    assert!(matches!(err, PolicyError::EmptyResult { .. }));
    assert!(err.to_string().contains("'Control: c-0001'"));
    assert!(session.policies.is_empty());
}

#[test]
fn empty_result_lists_all_requested_identifiers() {
    let source = Arc::new(MemorySource::new());
    let notification = PolicyNotification::of_kind(PolicyKind::Framework, ["nsa", "mitre", "cis"]);
    let mut session = ScanPolicySet::default();

    let err = handler(&source)
        .get_policies(&notification, &mut session)
        .expect_err("nothing fetched");

    assert!(
        err.to_string()
            .contains("'Framework: nsa, Framework: mitre, Framework: cis'")
    );
    // Overlays are never consulted when there is nothing to scan.
    assert_eq!(source.calls().len(), 3);
}

#[test]
fn not_found_frameworks_are_skipped() {
    let source = Arc::new(
        MemorySource::new()
            .with_framework(framework_with_controls("nsa", 2))
            .with_framework(framework_with_controls("cis", 4)),
    );
    let notification = PolicyNotification::of_kind(PolicyKind::Framework, ["nsa", "ghost", "cis"]);
    let mut session = ScanPolicySet::default();

    handler(&source)
        .get_policies(&notification, &mut session)
        .expect("get policies");

    let names: Vec<&str> = session.policies.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["nsa", "cis"]);
}

#[test]
fn unrecognized_kind_never_calls_the_source() {
    let source = Arc::new(MemorySource::new().with_framework(framework_with_controls("nsa", 1)));
    let notification = PolicyNotification::of_kind(PolicyKind::Rule, ["nsa"]);
    let mut session = sentinel_session();

    let err = handler(&source)
        .get_policies(&notification, &mut session)
        .expect_err("rule is not scannable");

    assert!(err.is_configuration());
    assert_eq!(err.to_string(), "unknown policy kind: Rule");
    assert!(source.calls().is_empty());
    assert_eq!(session, sentinel_session());
}

#[test]
fn empty_notification_is_a_configuration_error() {
    let source = Arc::new(MemorySource::new());
    let mut session = ScanPolicySet::default();

    let err = handler(&source)
        .get_policies(&PolicyNotification::default(), &mut session)
        .expect_err("empty request");

    assert!(matches!(err, PolicyError::UnknownKind { kind: None }));
    assert!(source.calls().is_empty());
}

#[test]
fn overlays_are_attached_for_the_scope() {
    let exceptions = vec![Exception {
        name: "skip-kube-system".to_string(),
        ..Exception::default()
    }];
    let source = Arc::new(
        MemorySource::new()
            .with_framework(framework_with_controls("nsa", 1))
            .with_exceptions(exceptions.clone())
            .with_controls_inputs(sample_inputs()),
    );
    let notification = PolicyNotification::of_kind(PolicyKind::Framework, ["nsa"]);
    let mut session = ScanPolicySet::default();

    handler(&source)
        .with_scope("prod")
        .get_policies(&notification, &mut session)
        .expect("get policies");

    assert_eq!(session.exceptions, Some(exceptions));
    assert_eq!(session.controls_inputs, Some(sample_inputs()));
    assert!(source.calls().contains(&SourceCall::Exceptions("prod".to_string())));
    assert!(source.calls().contains(&SourceCall::ControlsInputs("prod".to_string())));
}

#[test]
fn overlay_failures_do_not_change_the_outcome() {
    let source = Arc::new(
        MemorySource::new()
            .with_framework(framework_with_controls("nsa", 3))
            .with_exceptions(Vec::new())
            .with_controls_inputs(sample_inputs())
            .fail_overlays(),
    );
    let notification = PolicyNotification::of_kind(PolicyKind::Framework, ["nsa"]);
    let mut session = ScanPolicySet::default();

    handler(&source)
        .get_policies(&notification, &mut session)
        .expect("overlays are optional");

    assert_eq!(session.policies.len(), 1);
    assert_eq!(session.exceptions, None);
    assert_eq!(session.controls_inputs, None);
}

#[test]
fn one_overlay_may_succeed_without_the_other() {
    let source = Arc::new(
        MemorySource::new()
            .with_framework(framework_with_controls("nsa", 1))
            .with_controls_inputs(sample_inputs()),
    );
    let notification = PolicyNotification::of_kind(PolicyKind::Framework, ["nsa"]);
    let mut session = ScanPolicySet::default();

    handler(&source)
        .get_policies(&notification, &mut session)
        .expect("get policies");

    assert_eq!(session.exceptions, None);
    assert_eq!(session.controls_inputs, Some(sample_inputs()));
}

#[test]
fn fetched_artifacts_are_cached_by_requested_name() {
    let tmp = TempDir::new().expect("temp dir");
    let cache_dir = utf8_root(&tmp).join("cache");
    let source = Arc::new(
        MemorySource::new()
            .with_control("c-0001", Control::new("C-0001", "registries"))
            .with_control("c-0002", Control::new("C-0002", "privileged")),
    );
    let notification = PolicyNotification::of_kind(PolicyKind::Control, ["c-0001", "c-0002"]);
    let mut session = ScanPolicySet::default();

    cached_handler(&source, cache_dir.clone())
        .get_policies(&notification, &mut session)
        .expect("get policies");

    let mut cached: Vec<String> = std::fs::read_dir(&cache_dir)
        .expect("read cache dir")
        .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
        .collect();
    cached.sort();
    assert_eq!(cached, vec!["c-0001.json", "c-0002.json"]);

    let text = std::fs::read_to_string(cache_dir.join("c-0002.json")).expect("read cached");
    let control: Control = serde_json::from_str(&text).expect("parse cached");
    assert_eq!(control, Control::new("C-0002", "privileged"));
}

#[test]
fn cache_write_failure_is_not_fatal() {
    let tmp = TempDir::new().expect("temp dir");
    let blocker = utf8_root(&tmp).join("not-a-dir");
    std::fs::write(&blocker, "occupied").expect("write blocker");

    let source = Arc::new(MemorySource::new().with_framework(framework_with_controls("nsa", 2)));
    let notification = PolicyNotification::of_kind(PolicyKind::Framework, ["nsa"]);
    let mut session = ScanPolicySet::default();

    cached_handler(&source, blocker)
        .get_policies(&notification, &mut session)
        .expect("cache failures are warnings");

    assert_eq!(session.policies.len(), 1);
}

#[test]
fn path_like_names_are_never_cached_outside_the_cache_dir() {
    let tmp = TempDir::new().expect("temp dir");
    let root = utf8_root(&tmp);
    let source = Arc::new(
        MemorySource::new().with_framework(framework_with_controls("../escaped", 1)),
    );
    let notification = PolicyNotification::of_kind(PolicyKind::Framework, ["../escaped"]);
    let mut session = ScanPolicySet::default();

    cached_handler(&source, root.join("a").join("cache"))
        .get_policies(&notification, &mut session)
        .expect("the artifact is still delivered");

    assert_eq!(session.policies.len(), 1);
    assert!(!root.join("a").join("escaped.json").exists());
}

#[test]
fn aggregate_accepts_an_empty_identifier_list() {
    let source = MemorySource::new();
    let cache = CacheStore::disabled();
    assert!(
        aggregate(ScanKind::Framework, &[], &source, &cache)
            .expect("empty is valid")
            .is_empty()
    );
    assert!(
        aggregate(ScanKind::Control, &[], &source, &cache)
            .expect("empty is valid")
            .is_empty()
    );
    assert!(source.calls().is_empty());
}

#[test]
fn aggregate_rejects_unrecognized_kind_immediately() {
    let source = MemorySource::new();
    let identifiers = vec![PolicyIdentifier::new(PolicyKind::Rule, "r")];
    let err = aggregate(
        ScanKind::Unrecognized(Some(PolicyKind::Rule)),
        &identifiers,
        &source,
        &CacheStore::disabled(),
    )
    .expect_err("unknown kind");
    assert!(err.is_configuration());
    assert!(source.calls().is_empty());
}

fn names_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z][a-z0-9-]{0,11}", 1..8)
}

proptest! {
    #[test]
    fn all_frameworks_fetched_in_order(names in names_strategy()) {
        let mut source = MemorySource::new();
        for name in &names {
            source = source.with_framework(framework_with_controls(name, 1));
        }
        let source = Arc::new(source);
        let notification = PolicyNotification::of_kind(PolicyKind::Framework, names.clone());
        let mut session = ScanPolicySet::default();

        handler(&source).get_policies(&notification, &mut session).expect("get policies");

        let got: Vec<String> = session.policies.iter().map(|f| f.name.clone()).collect();
        prop_assert_eq!(got, names);
    }

    #[test]
    fn all_controls_land_in_one_framework(names in names_strategy()) {
        let mut source = MemorySource::new();
        for name in &names {
            source = source.with_control(name.clone(), Control::new(name.to_uppercase(), ""));
        }
        let source = Arc::new(source);
        let notification = PolicyNotification::of_kind(PolicyKind::Control, names.clone());
        let mut session = ScanPolicySet::default();

        handler(&source).get_policies(&notification, &mut session).expect("get policies");

        prop_assert_eq!(session.policies.len(), 1);
        prop_assert_eq!(session.policies[0].controls.len(), names.len());
    }

    #[test]
    fn first_failure_stops_the_pass(names in names_strategy(), pick in any::<prop::sample::Index>()) {
        let failing = pick.index(names.len());
        let mut source = MemorySource::new().fail_on(names[failing].clone());
        for name in &names {
            source = source.with_framework(framework_with_controls(name, 1));
        }
        let source = Arc::new(source);
        let notification = PolicyNotification::of_kind(PolicyKind::Framework, names.clone());
        let mut session = sentinel_session();

        let result = handler(&source).get_policies(&notification, &mut session);

        let is_download = matches!(result, Err(PolicyError::Download { .. }));
        prop_assert!(is_download);
        prop_assert_eq!(session, sentinel_session());
        // Duplicated names fail at their first occurrence.
        let first = names.iter().position(|n| *n == names[failing]).expect("present");
        prop_assert_eq!(source.calls().len(), first + 1);
    }
}
