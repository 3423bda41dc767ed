//! Marker verification harness for rule fixtures.
//!
//! A fixture is source text with every expected diagnostic location wrapped
//! in `[|` and `|]`. The harness strips the markers, resolves the text with a
//! [`Frontend`], runs a single rule and compares the spans it reports for one
//! descriptor id with the marked ranges.
//!
//! Fixtures live on disk as
//!
//! ```text
//! tests/fixtures/Rule0040/
//! ├── HasDiagnostic/1.al, 2.al, ...
//! └── NoDiagnostic/1.al, 2.al, ...
//! ```

pub mod frontend;
pub mod markers;

pub use frontend::{FixtureFrontend, Frontend};
pub use markers::{parse_markers, MarkedSource, MarkerError};

use anyhow::Context as _;
use std::fmt;
use std::ops::Range;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

use crate::catalog;
use crate::config::Config;
use crate::engine::{AnalysisResult, Dispatcher, EngineError};
use crate::rules::RuleRegistration;

/// Path given to resolved fixture trees.
const FIXTURE_PATH: &str = "fixture.al";

/// Which expectation a fixture case carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CaseKind {
    HasDiagnostic,
    NoDiagnostic,
}

impl CaseKind {
    pub const ALL: [CaseKind; 2] = [CaseKind::HasDiagnostic, CaseKind::NoDiagnostic];

    /// Directory holding cases of this kind.
    pub fn dir_name(&self) -> &'static str {
        match self {
            CaseKind::HasDiagnostic => "HasDiagnostic",
            CaseKind::NoDiagnostic => "NoDiagnostic",
        }
    }
}

impl fmt::Display for CaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Why a fixture did not match what the rule reported.
#[derive(Error, Debug)]
pub enum FixtureMismatch {
    #[error(transparent)]
    Markers(#[from] MarkerError),
    #[error("has-diagnostic fixture contains no markers")]
    NoMarkers,
    #[error("no-diagnostic fixture contains markers")]
    UnexpectedMarkers,
    #[error("fixture could not be resolved: {0:#}")]
    Frontend(anyhow::Error),
    #[error("rule {rule} faulted: {message}")]
    Fault { rule: String, message: String },
    #[error("{id} expected at {expected:?} but reported at {actual:?}")]
    Positions {
        id: String,
        expected: Vec<Range<usize>>,
        actual: Vec<Range<usize>>,
    },
}

/// Runs one rule over fixtures.
pub struct RuleFixture<F = FixtureFrontend> {
    dispatcher: Dispatcher,
    frontend: F,
}

impl RuleFixture {
    /// Fixture runner for `rule` alone, with all of its descriptors enabled.
    pub fn for_rule(rule: RuleRegistration) -> Result<Self, EngineError> {
        let catalog = catalog::init()?;
        let config = Config::enabling(&catalog, rule.descriptors.iter().copied());
        let mut dispatcher = Dispatcher::new(catalog);
        dispatcher.register(rule)?;
        Ok(Self {
            dispatcher: dispatcher.with_config(&config)?,
            frontend: FixtureFrontend,
        })
    }
}

impl<F: Frontend> RuleFixture<F> {
    /// Resolve fixtures with another front end.
    pub fn with_frontend<G: Frontend>(self, frontend: G) -> RuleFixture<G> {
        RuleFixture {
            dispatcher: self.dispatcher,
            frontend,
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Strip markers, resolve and analyze `code`.
    pub fn run(&self, code: &str) -> Result<(MarkedSource, AnalysisResult), FixtureMismatch> {
        let marked = parse_markers(code)?;
        let tree = self
            .frontend
            .resolve(FIXTURE_PATH, &marked.source)
            .map_err(FixtureMismatch::Frontend)?;
        let result = self.dispatcher.analyze(&tree);
        if let Some(fault) = result.faults.first() {
            return Err(FixtureMismatch::Fault {
                rule: fault.rule_id.clone(),
                message: fault.message.clone(),
            });
        }
        Ok((marked, result))
    }

    /// `id` is reported at every marker and nowhere else.
    pub fn has_diagnostic_at_all_markers(&self, code: &str, id: &str) -> Result<(), FixtureMismatch> {
        let (marked, result) = self.run(code)?;
        if marked.markers.is_empty() {
            return Err(FixtureMismatch::NoMarkers);
        }
        compare(id, marked.markers, &result)
    }

    /// `id` is reported nowhere.
    pub fn no_diagnostic_at_all_markers(&self, code: &str, id: &str) -> Result<(), FixtureMismatch> {
        let (marked, result) = self.run(code)?;
        if !marked.markers.is_empty() {
            return Err(FixtureMismatch::UnexpectedMarkers);
        }
        compare(id, Vec::new(), &result)
    }

    /// Check one case from disk against its expectation.
    pub fn verify(&self, case: &FixtureCase, id: &str) -> anyhow::Result<()> {
        let code = case.read()?;
        let outcome = match case.kind {
            CaseKind::HasDiagnostic => self.has_diagnostic_at_all_markers(&code, id),
            CaseKind::NoDiagnostic => self.no_diagnostic_at_all_markers(&code, id),
        };
        outcome.with_context(|| format!("{} case {}", case.kind, case.path.display()))
    }

    /// Check every case of `set`, reporting all failures together.
    pub fn verify_all(&self, set: &FixtureSet, id: &str) -> anyhow::Result<usize> {
        let cases = set.all()?;
        let failures: Vec<String> = cases
            .iter()
            .filter_map(|case| self.verify(case, id).err())
            .map(|e| format!("{:#}", e))
            .collect();
        if !failures.is_empty() {
            anyhow::bail!(
                "{} of {} cases failed:\n{}",
                failures.len(),
                cases.len(),
                failures.join("\n")
            );
        }
        Ok(cases.len())
    }
}

fn compare(
    id: &str,
    expected: Vec<Range<usize>>,
    result: &AnalysisResult,
) -> Result<(), FixtureMismatch> {
    let mut actual: Vec<Range<usize>> = result.with_id(id).map(|d| d.span.range()).collect();
    actual.sort_by_key(|r| (r.start, r.end));
    if actual != expected {
        return Err(FixtureMismatch::Positions {
            id: id.to_string(),
            expected,
            actual,
        });
    }
    Ok(())
}

/// One fixture file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureCase {
    pub kind: CaseKind,
    pub index: u32,
    pub path: PathBuf,
}

impl FixtureCase {
    pub fn read(&self) -> anyhow::Result<String> {
        std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read fixture {}", self.path.display()))
    }
}

/// The fixture directory of one rule.
#[derive(Debug, Clone)]
pub struct FixtureSet {
    root: PathBuf,
}

impl FixtureSet {
    /// Open `<fixtures>/<rule_dir>`, e.g. `tests/fixtures` and `Rule0040`.
    pub fn open<P: AsRef<Path>>(fixtures: P, rule_dir: &str) -> anyhow::Result<Self> {
        let root = fixtures.as_ref().join(rule_dir);
        if !root.is_dir() {
            anyhow::bail!("fixture directory {} does not exist", root.display());
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Cases of one kind in increasing index order.
    ///
    /// Files whose stem is not a number are ignored.
    pub fn cases(&self, kind: CaseKind) -> anyhow::Result<Vec<FixtureCase>> {
        let dir = self.root.join(kind.dir_name());
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut cases = Vec::new();
        for entry in WalkDir::new(&dir).min_depth(1).max_depth(1) {
            let entry = entry.with_context(|| format!("failed to list {}", dir.display()))?;
            let path = entry.path();
            if !entry.file_type().is_file() || path.extension().map_or(true, |e| e != "al") {
                continue;
            }
            let index = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<u32>().ok());
            match index {
                Some(index) => cases.push(FixtureCase {
                    kind,
                    index,
                    path: path.to_path_buf(),
                }),
                None => log::warn!("ignoring fixture with non-numeric name {}", path.display()),
            }
        }
        cases.sort_by_key(|c| c.index);
        Ok(cases)
    }

    /// Every case, positive ones first.
    pub fn all(&self) -> anyhow::Result<Vec<FixtureCase>> {
        let mut all = Vec::new();
        for kind in CaseKind::ALL {
            all.extend(self.cases(kind)?);
        }
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::EXPLICITLY_SET_RUN_TRIGGER;
    use std::fs;
    use tempfile::TempDir;

    const HAS: &str = "codeunit 1 C
{
    procedure P(var Cust: Record Customer)
    begin
        [|Cust.Modify()|];
        Cust.Modify(true);
    end;
}";

    fn fixture() -> RuleFixture {
        RuleFixture::for_rule(EXPLICITLY_SET_RUN_TRIGGER).unwrap()
    }

    #[test]
    fn test_marker_fidelity() {
        let fixture = fixture();
        fixture.has_diagnostic_at_all_markers(HAS, "LC0040").unwrap();

        let unmarked = HAS.replace("[|", "").replace("|]", "");
        assert!(matches!(
            fixture.no_diagnostic_at_all_markers(&unmarked, "LC0040"),
            Err(FixtureMismatch::Positions { .. })
        ));
        assert!(matches!(
            fixture.has_diagnostic_at_all_markers(&unmarked, "LC0040"),
            Err(FixtureMismatch::NoMarkers)
        ));
    }

    #[test]
    fn test_extra_marker_is_a_mismatch() {
        let code = HAS.replace("Cust.Modify(true)", "[|Cust.Modify(true)|]");
        match fixture().has_diagnostic_at_all_markers(&code, "LC0040") {
            Err(FixtureMismatch::Positions { expected, actual, .. }) => {
                assert_eq!(expected.len(), 2);
                assert_eq!(actual.len(), 1);
            }
            other => panic!("unexpected outcome {:?}", other.err()),
        }
    }

    #[test]
    fn test_fixture_set_orders_numerically() {
        let dir = TempDir::new().unwrap();
        let has = dir.path().join("Rule0040").join("HasDiagnostic");
        fs::create_dir_all(&has).unwrap();
        for name in ["10.al", "2.al", "1.al", "notes.txt", "draft.al"] {
            fs::write(has.join(name), HAS).unwrap();
        }

        let set = FixtureSet::open(dir.path(), "Rule0040").unwrap();
        let indexes: Vec<u32> = set
            .cases(CaseKind::HasDiagnostic)
            .unwrap()
            .iter()
            .map(|c| c.index)
            .collect();
        assert_eq!(indexes, vec![1, 2, 10]);
        assert!(set.cases(CaseKind::NoDiagnostic).unwrap().is_empty());
        assert_eq!(fixture().verify_all(&set, "LC0040").unwrap(), 3);

        assert!(FixtureSet::open(dir.path(), "Rule0001").is_err());
    }
}
