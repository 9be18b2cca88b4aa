//! Skiller log to lookup store, end to end through the file-backed store

use skilltime::duration::DurationBounds;
use skilltime::event::{SkillEvent, Status};
use skilltime::lookup::{EntryDuration, LookupEntry, LookupEntryBuilder, LookupWriter};
use skilltime::store::{DocumentStore, JsonlCollection};
use skilltime::transform::{transform, TransformReport};
use skilltime::SkillTimeError;
use tempfile::TempDir;

fn seed_log(store: &DocumentStore, events: &[SkillEvent]) {
    let mut log: JsonlCollection<SkillEvent> = store.open_collection("fflog", "skiller").unwrap();
    for event in events {
        log.push(event.clone()).unwrap();
    }
}

fn run_pass(store: &DocumentStore, bounds: DurationBounds, dry_run: bool) -> TransformReport {
    let log: JsonlCollection<SkillEvent> = store.open_collection("fflog", "skiller").unwrap();
    let mut lookup: JsonlCollection<LookupEntry> =
        store.open_collection("skills", "exec_times").unwrap();
    let mut writer = LookupWriter::new(&mut lookup, dry_run);
    transform(&log, &LookupEntryBuilder::new(bounds), &mut writer, |_| {}).unwrap()
}

fn stored_entries(store: &DocumentStore) -> Vec<LookupEntry> {
    let lookup: JsonlCollection<LookupEntry> =
        store.open_collection("skills", "exec_times").unwrap();
    lookup.documents().to_vec()
}

const BRING_PRODUCT: &str = r#"bring_product_to{place="C-DS",side="INPUT"}"#;

fn workday_log() -> Vec<SkillEvent> {
    vec![
        SkillEvent::new(1, 1_000, Status::Running, r#"goto{place="M-BS-I"}"#),
        SkillEvent::new(2, 1_200, Status::Running, BRING_PRODUCT),
        SkillEvent::new(1, 4_500, Status::Final, r#"goto{place="M-BS-I"}"#),
        SkillEvent::new(2, 9_300, Status::Failed, BRING_PRODUCT).with_error("gripper timeout"),
        // restart: first start sees a Running event next and is dropped
        SkillEvent::new(1, 10_000, Status::Running, r#"goto{place="C-CS1-O"}"#),
        SkillEvent::new(1, 10_400, Status::Running, r#"goto{place="C-CS1-O"}"#),
        SkillEvent::new(1, 70_400, Status::Final, r#"goto{place="C-CS1-O"}"#),
        // never finished
        SkillEvent::new(3, 20_000, Status::Running, r#"explore_zone{zone="M-Z41"}"#),
    ]
}

#[test]
fn test_full_pass_writes_expected_entries() {
    let dir = TempDir::new().unwrap();
    let store = DocumentStore::new(dir.path());
    seed_log(&store, &workday_log());

    let report = run_pass(&store, DurationBounds::default(), false);
    assert_eq!(report.starts, 5);
    assert_eq!(report.paired, 3);
    assert_eq!(report.non_terminal, 1);
    assert_eq!(report.unmatched, 1);
    assert_eq!(report.added, 3);

    let entries = stored_entries(&store);
    assert_eq!(entries.len(), 3);

    let failed = entries
        .iter()
        .find(|e| e.name == "bring_product_to")
        .unwrap();
    assert_eq!(failed.outcome, Status::Failed);
    assert_eq!(failed.error, "gripper timeout");
    assert_eq!(failed.duration, EntryDuration::Seconds(8));
    assert_eq!(failed.args["side"], "INPUT");

    let restarted = entries
        .iter()
        .find(|e| e.args.get("place").map(String::as_str) == Some("C-CS1-O"))
        .unwrap();
    assert_eq!(restarted.id.as_ref().unwrap().start_time, 10_400);
    assert_eq!(restarted.duration, EntryDuration::Seconds(60));
}

#[test]
fn test_repeated_pass_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let store = DocumentStore::new(dir.path());
    seed_log(&store, &workday_log());

    let first = run_pass(&store, DurationBounds::default(), false);
    let second = run_pass(&store, DurationBounds::default(), false);
    assert_eq!(first.added, 3);
    assert_eq!(second.added, 0);
    assert_eq!(second.duplicates, 3);
    assert_eq!(stored_entries(&store).len(), 3);
}

#[test]
fn test_bounds_filter_entries() {
    let dir = TempDir::new().unwrap();
    let store = DocumentStore::new(dir.path());
    seed_log(&store, &workday_log());

    let report = run_pass(&store, DurationBounds::new(5.0, 30.0).unwrap(), false);
    // 3s and 60s fall outside, 8s stays
    assert_eq!(report.out_of_range, 2);
    assert_eq!(report.added, 1);
    assert_eq!(stored_entries(&store)[0].duration, EntryDuration::Seconds(8));
}

#[test]
fn test_dry_run_leaves_store_untouched() {
    let dir = TempDir::new().unwrap();
    let store = DocumentStore::new(dir.path());
    seed_log(&store, &workday_log());

    let report = run_pass(&store, DurationBounds::default(), true);
    assert_eq!(report.added, 3);
    assert!(stored_entries(&store).is_empty());
    assert!(!store.collection_path("skills", "exec_times").exists());
}

#[test]
fn test_malformed_skill_string_aborts_run() {
    let dir = TempDir::new().unwrap();
    let store = DocumentStore::new(dir.path());
    seed_log(
        &store,
        &[
            SkillEvent::new(1, 0, Status::Running, "foo(a=1)"),
            SkillEvent::new(1, 1_000, Status::Final, "foo(a=1)"),
        ],
    );

    let log: JsonlCollection<SkillEvent> = store.open_collection("fflog", "skiller").unwrap();
    let mut lookup = JsonlCollection::<LookupEntry>::in_memory();
    let mut writer = LookupWriter::new(&mut lookup, false);
    let err = transform(&log, &LookupEntryBuilder::default(), &mut writer, |_| {}).unwrap_err();
    assert!(matches!(err, SkillTimeError::MalformedSkillString { .. }));
}

#[test]
fn test_text_after_closing_brace_does_not_abort() {
    let dir = TempDir::new().unwrap();
    let store = DocumentStore::new(dir.path());
    let skill = "goto{place=\"M-BS-I\"}\n-- (cancelled by operator)";
    seed_log(
        &store,
        &[
            SkillEvent::new(1, 0, Status::Running, skill),
            SkillEvent::new(1, 4_000, Status::Final, skill),
        ],
    );

    let report = run_pass(&store, DurationBounds::default(), false);
    assert_eq!(report.added, 1);
    let entries = stored_entries(&store);
    assert_eq!(entries[0].name, "goto");
    assert_eq!(entries[0].args.len(), 1);
    assert_eq!(entries[0].args["place"], "M-BS-I");
}

#[test]
fn test_stray_argument_text_aborts_run() {
    let dir = TempDir::new().unwrap();
    let store = DocumentStore::new(dir.path());
    seed_log(
        &store,
        &[
            SkillEvent::new(1, 0, Status::Running, r#"foo{x;a="1"y;}"#),
            SkillEvent::new(1, 1_000, Status::Final, r#"foo{x;a="1"y;}"#),
        ],
    );

    let log: JsonlCollection<SkillEvent> = store.open_collection("fflog", "skiller").unwrap();
    let mut lookup = JsonlCollection::<LookupEntry>::in_memory();
    let mut writer = LookupWriter::new(&mut lookup, false);
    let err = transform(&log, &LookupEntryBuilder::default(), &mut writer, |_| {}).unwrap_err();
    assert!(matches!(err, SkillTimeError::MalformedSkillString { .. }));
    assert!(lookup.is_empty());
}
