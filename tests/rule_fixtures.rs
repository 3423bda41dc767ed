//! Marker fixtures for the built-in rules.
//!
//! Every case under `tests/fixtures/RuleNNNN` is run through the rule that
//! owns the descriptor, and the reported spans must equal the marked ones.

use std::path::PathBuf;

use alcop::harness::{CaseKind, FixtureMismatch, FixtureSet, RuleFixture};
use alcop::rules::{EXPLICITLY_SET_RUN_TRIGGER, HELPER_CODEUNITS};

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

#[test]
fn test_rule0040_fixtures() {
    let set = FixtureSet::open(fixtures_path(), "Rule0040").expect("fixture dir should exist");
    let fixture = RuleFixture::for_rule(EXPLICITLY_SET_RUN_TRIGGER).unwrap();
    let verified = fixture.verify_all(&set, "LC0040").unwrap();
    assert_eq!(verified, 10);
}

#[test]
fn test_rule0021_fixtures() {
    let set = FixtureSet::open(fixtures_path(), "Rule0021").unwrap();
    let fixture = RuleFixture::for_rule(HELPER_CODEUNITS).unwrap();
    assert_eq!(fixture.verify_all(&set, "LC0021").unwrap(), 4);
}

#[test]
fn test_rule0022_fixtures() {
    let set = FixtureSet::open(fixtures_path(), "Rule0022").unwrap();
    let fixture = RuleFixture::for_rule(HELPER_CODEUNITS).unwrap();
    assert_eq!(fixture.verify_all(&set, "LC0022").unwrap(), 3);
}

#[test]
fn test_cases_are_numbered_from_one() {
    let set = FixtureSet::open(fixtures_path(), "Rule0040").unwrap();
    for kind in CaseKind::ALL {
        let indexes: Vec<u32> = set.cases(kind).unwrap().iter().map(|c| c.index).collect();
        let expected: Vec<u32> = (1..=indexes.len() as u32).collect();
        assert_eq!(indexes, expected, "{} cases", kind);
    }
}

#[test]
fn test_positive_case_fails_as_negative() {
    let set = FixtureSet::open(fixtures_path(), "Rule0040").unwrap();
    let fixture = RuleFixture::for_rule(EXPLICITLY_SET_RUN_TRIGGER).unwrap();
    let case = &set.cases(CaseKind::HasDiagnostic).unwrap()[0];
    let code = case.read().unwrap().replace("[|", "").replace("|]", "");

    match fixture.no_diagnostic_at_all_markers(&code, "LC0040") {
        Err(FixtureMismatch::Positions { expected, actual, .. }) => {
            assert!(expected.is_empty());
            assert_eq!(actual.len(), 1);
        }
        other => panic!("expected a position mismatch, got {:?}", other),
    }
}

#[test]
fn test_other_ids_do_not_count() {
    // The helper rule reports LC0021 here, which an LC0022 fixture ignores.
    let fixture = RuleFixture::for_rule(HELPER_CODEUNITS).unwrap();
    let code = "codeunit 1 C
{
    procedure P()
    begin
        Confirm('Sure?');
    end;
}";
    fixture.no_diagnostic_at_all_markers(code, "LC0022").unwrap();
    assert!(fixture.no_diagnostic_at_all_markers(code, "LC0021").is_err());
}
