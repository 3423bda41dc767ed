//! alcop - diagnostic rules for resolved AL (Business Central) syntax trees.
//!
//! A host (parser plus semantic resolver) exports one resolved tree per
//! document. alcop runs a catalog of LinterCop style rules over those trees
//! and reports diagnostics at source spans.
//!
//! # Architecture
//!
//! - `semantic`: read-only facade over a resolved tree (nodes, symbols, types)
//! - `catalog`: diagnostic descriptors, validated once per process
//! - `rules`: rule registrations (node kinds plus a check function)
//! - `engine`: dispatcher, rule context, obsolescence guard, pragma suppression
//! - `config`: YAML configuration of severities and excluded paths
//! - `harness`: marker-annotated fixtures and a small front end for them
//! - `report`: output formatting (pretty, JSON, SARIF)
//!
//! # Adding a Rule
//!
//! Declare a `RuleRegistration` const next to its check function in
//! `src/rules/`, add its descriptor ids to the catalog and list it in
//! `rules/mod.rs`. Every check starts with the obsolescence guard.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod engine;
pub mod harness;
pub mod report;
pub mod rules;
pub mod semantic;

pub use catalog::{Catalog, CatalogError, DiagnosticDescriptor, Severity};
pub use config::Config;
pub use engine::{AnalysisResult, Diagnostic, Dispatcher, EngineError, RuleContext, RuleFault};
pub use harness::{FixtureFrontend, FixtureSet, Frontend, RuleFixture};
pub use rules::{builtin_rules, RuleRegistration};
pub use semantic::{NodeHandle, NodeKind, SemanticTree, SymbolRef};
