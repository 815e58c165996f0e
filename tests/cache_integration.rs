//! Integration tests for the result cache and the cruise driver.

use std::fs;
use std::path::Path;

use cruise_kernel::cache::store::cache_file;
use cruise_kernel::{
    can_serve, read_cache, write_cache, CacheDocument, CacheVerdict, Change, ChangeType,
    CruiseOptions, Cruiser, OptionsUsed, RawModule, RawRule, RawRuleSet, RevisionData, Summary,
    ValidationConfig,
};
use tempfile::TempDir;

const MOCK_SHA: &str = "26fc7183127945393f77c8559f28bf623babe17f";

// ─────────────────────────────────────────────────────────────────────────────
// Test Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn minimal_cruise_result(args: &str) -> CacheDocument {
    CacheDocument {
        summary: Summary {
            options_used: Some(OptionsUsed {
                args: args.to_string(),
                ..OptionsUsed::default()
            }),
            ..Summary::default()
        },
        revision_data: Some(RevisionData::clean("dummy-sha")),
        ..CacheDocument::empty()
    }
}

fn options(args: &str, folder: &Path) -> CruiseOptions {
    CruiseOptions::new(args).with_cache(folder)
}

fn modules() -> Vec<RawModule> {
    vec![
        RawModule::new("src/a.js").depends_on("src/b.js"),
        RawModule::new("src/b.js"),
        RawModule::new("src/orphan.js"),
    ]
}

// ─────────────────────────────────────────────────────────────────────────────
// read / write
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_read_nonexistent_is_empty() {
    let dir = TempDir::new().unwrap();
    assert_eq!(read_cache(&dir.path().join("this/folder/does/not-exist")), CacheDocument::empty());
}

#[test]
fn test_read_invalid_json_is_empty() {
    let dir = TempDir::new().unwrap();
    fs::write(cache_file(dir.path()), "this is not json {").unwrap();
    assert_eq!(read_cache(dir.path()), CacheDocument::empty());
}

#[test]
fn test_read_valid_minimal_cache() {
    let dir = TempDir::new().unwrap();
    fs::write(
        cache_file(dir.path()),
        format!(r#"{{"modules":[],"summary":{{}},"revisionData":{{"SHA1":"{MOCK_SHA}","changes":[]}}}}"#),
    )
    .unwrap();

    let doc = read_cache(dir.path());
    assert!(doc.modules.is_empty());
    assert_eq!(doc.summary, Summary::default());
    assert_eq!(doc.revision_data, Some(RevisionData::clean(MOCK_SHA)));
}

#[test]
fn test_write_creates_folder() {
    let dir = TempDir::new().unwrap();
    let folder = dir.path().join("write-cache");

    write_cache(&folder, &CacheDocument::empty()).unwrap();
    assert_eq!(read_cache(&folder), CacheDocument::empty());
}

#[test]
fn test_second_write_replaces_first() {
    let dir = TempDir::new().unwrap();
    let folder = dir.path().join("two-writes");
    let second = CacheDocument {
        revision_data: Some(RevisionData::clean("dummy-sha")),
        ..CacheDocument::empty()
    };

    write_cache(&folder, &CacheDocument::empty()).unwrap();
    write_cache(&folder, &second).unwrap();
    assert_eq!(read_cache(&folder), second);
}

#[test]
fn test_write_into_a_file_fails() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "not a folder").unwrap();

    assert!(write_cache(&blocker.join("cache"), &CacheDocument::empty()).is_err());
}

// ─────────────────────────────────────────────────────────────────────────────
// can_serve
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_cannot_serve_when_not_written() {
    let dir = TempDir::new().unwrap();
    let folder = dir.path().join("serve-from-cache");
    assert!(!can_serve(&options("", &folder), &RevisionData::clean("dummy-sha")));
}

#[test]
fn test_cannot_serve_when_sha_differs() {
    let dir = TempDir::new().unwrap();
    write_cache(dir.path(), &minimal_cruise_result("src test tools")).unwrap();
    assert!(!can_serve(
        &options("src test tools", dir.path()),
        &RevisionData::clean("another-sha")
    ));
}

#[test]
fn test_cannot_serve_when_a_file_was_added() {
    let dir = TempDir::new().unwrap();
    write_cache(dir.path(), &minimal_cruise_result("src test tools")).unwrap();
    let revision = RevisionData::clean("dummy-sha").with_change(Change::new(
        ChangeType::Added,
        "some-new-file.aap",
        "dummy-checksum",
    ));
    assert!(!can_serve(&options("src test tools", dir.path()), &revision));
}

#[test]
fn test_cannot_serve_when_options_incompatible() {
    let dir = TempDir::new().unwrap();
    write_cache(dir.path(), &minimal_cruise_result("src test tools")).unwrap();
    assert!(!can_serve(
        &options("src test tools configs", dir.path()),
        &RevisionData::clean("dummy-sha")
    ));
}

#[test]
fn test_can_serve_when_compatible() {
    let dir = TempDir::new().unwrap();
    write_cache(dir.path(), &minimal_cruise_result("src test tools")).unwrap();
    assert!(can_serve(
        &options("src test tools", dir.path()),
        &RevisionData::clean("dummy-sha")
    ));
}

// ─────────────────────────────────────────────────────────────────────────────
// Cruiser
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_cruise_writes_then_serves() {
    let dir = TempDir::new().unwrap();
    let cruiser = Cruiser::new(ValidationConfig::sequential());
    let opts = options("src", dir.path())
        .with_rule_set(RawRuleSet::new(vec![RawRule::new("no-orphans").named("no-orphans")]));
    let revision = RevisionData::clean(MOCK_SHA);

    let first = cruiser.cruise(&modules(), &opts, Some(&revision)).unwrap();
    assert!(!first.served_from_cache);
    assert_eq!(first.cache_verdict, Some(CacheVerdict::NoCache));
    assert_eq!(first.result.summary.violations.len(), 1);

    // The second run never asks the source for modules.
    let second = cruiser.cruise(&Vec::new(), &opts, Some(&revision)).unwrap();
    assert!(second.served_from_cache);
    assert_eq!(second.cache_verdict, Some(CacheVerdict::Serve));
    assert_eq!(second.result, first.result);
    assert_eq!(second.rule_set_fingerprint, first.rule_set_fingerprint);
}

#[test]
fn test_bust_the_cache_recomputes_and_rewrites() {
    let dir = TempDir::new().unwrap();
    let cruiser = Cruiser::default();
    let revision = RevisionData::clean(MOCK_SHA);

    cruiser
        .cruise(&modules(), &options("src", dir.path()), Some(&revision))
        .unwrap();

    let busted = cruiser
        .cruise(&Vec::new(), &options("src", dir.path()).busting_cache(), Some(&revision))
        .unwrap();
    assert!(!busted.served_from_cache);
    assert_eq!(busted.cache_verdict, None);
    assert_eq!(busted.result.summary.total_cruised, 0);

    // The busted run's result replaced the earlier one.
    assert_eq!(read_cache(dir.path()).summary.total_cruised, 0);
}

#[test]
fn test_changed_rule_set_misses() {
    let dir = TempDir::new().unwrap();
    let cruiser = Cruiser::default();
    let revision = RevisionData::clean(MOCK_SHA);

    cruiser
        .cruise(&modules(), &options("src", dir.path()), Some(&revision))
        .unwrap();

    let with_rules = options("src", dir.path())
        .with_rule_set(RawRuleSet::new(vec![RawRule::new("no-circular")]));
    let outcome = cruiser.cruise(&modules(), &with_rules, Some(&revision)).unwrap();
    assert!(!outcome.served_from_cache);
    assert_eq!(outcome.cache_verdict, Some(CacheVerdict::OptionsIncompatible));
}

#[test]
fn test_dirty_tree_misses_but_still_writes() {
    let dir = TempDir::new().unwrap();
    let cruiser = Cruiser::default();
    let dirty = RevisionData::clean(MOCK_SHA).with_change(Change::new(ChangeType::Modified, "src/a.js", "abc"));

    let outcome = cruiser
        .cruise(&modules(), &options("src", dir.path()), Some(&dirty))
        .unwrap();
    assert!(!outcome.served_from_cache);
    assert_eq!(read_cache(dir.path()).revision_data, Some(dirty));
}

#[test]
fn test_dirty_result_is_not_served_to_clean_tree() {
    let dir = TempDir::new().unwrap();
    let cruiser = Cruiser::default();
    let opts = options("src", dir.path())
        .with_rule_set(RawRuleSet::new(vec![RawRule::new("no-orphans").named("no-orphans")]));

    let dirty = RevisionData::clean(MOCK_SHA).with_change(Change::new(ChangeType::Added, "src/tmp.js", "abc"));
    let with_tmp = vec![
        RawModule::new("src/a.js").depends_on("src/b.js"),
        RawModule::new("src/b.js"),
        RawModule::new("src/tmp.js"),
    ];
    let first = cruiser.cruise(&with_tmp, &opts, Some(&dirty)).unwrap();
    assert_eq!(first.result.summary.violations.len(), 1);

    // src/tmp.js was deleted again; the tree is clean at the same commit.
    let without_tmp = vec![
        RawModule::new("src/a.js").depends_on("src/b.js"),
        RawModule::new("src/b.js"),
    ];
    let second = cruiser
        .cruise(&without_tmp, &opts, Some(&RevisionData::clean(MOCK_SHA)))
        .unwrap();
    assert!(!second.served_from_cache);
    assert_eq!(second.cache_verdict, Some(CacheVerdict::UncommittedChanges));
    assert!(second.result.summary.violations.is_empty());

    // The clean result replaced the dirty one and is served from now on.
    let third = cruiser
        .cruise(&Vec::new(), &opts, Some(&RevisionData::clean(MOCK_SHA)))
        .unwrap();
    assert!(third.served_from_cache);
}

#[test]
fn test_cache_without_options_used_is_not_served() {
    let dir = TempDir::new().unwrap();
    fs::write(
        cache_file(dir.path()),
        format!(r#"{{"modules":[],"summary":{{}},"revisionData":{{"SHA1":"{MOCK_SHA}","changes":[]}}}}"#),
    )
    .unwrap();

    assert!(!can_serve(&options("", dir.path()), &RevisionData::clean(MOCK_SHA)));
}

#[test]
fn test_no_revision_skips_cache_entirely() {
    let dir = TempDir::new().unwrap();
    let outcome = Cruiser::default()
        .cruise(&modules(), &options("src", dir.path()), None)
        .unwrap();
    assert_eq!(outcome.cache_verdict, None);
    assert!(!cache_file(dir.path()).exists());
}
