//! End-to-end tests of the dispatcher over resolved trees.

use std::path::PathBuf;

use alcop::catalog::{self, ids, Catalog};
use alcop::engine::{Diagnostic, Dispatcher, RuleContext};
use alcop::harness::{FixtureFrontend, Frontend};
use alcop::rules::{RuleRegistration, EXPLICITLY_SET_RUN_TRIGGER};
use alcop::semantic::{
    BoundArgument, Invocation, LineIndex, MethodKind, NodeData, NodeKind, ObsoleteState,
    SemanticTree, Symbol, SymbolKind, TargetMethod, TreeBuilder, TypeInfo, TypeKind,
};

fn testdata_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

fn resolve(source: &str) -> SemanticTree {
    FixtureFrontend
        .resolve("src/Test.Codeunit.al", source)
        .expect("fixture source should resolve")
}

fn run_trigger_only() -> Dispatcher {
    let mut dispatcher = Dispatcher::new(catalog::init().unwrap());
    dispatcher.register(EXPLICITLY_SET_RUN_TRIGGER).unwrap();
    dispatcher
}

/// `Rec.Modify(<args>)` on a record parameter, built the way a host would
/// export it.
fn modify_call(parameter: Option<&str>, procedure_state: ObsoleteState) -> SemanticTree {
    let source = match parameter {
        Some(_) => "Rec.Modify(RunTrigger := true);",
        None => "Rec.Modify();",
    };
    let index = LineIndex::new(source);
    let call_end = source.len() - 1;

    let mut builder = TreeBuilder::new("src/Scenario.Codeunit.al").source(source);
    let object = builder.add_symbol(Symbol::new(SymbolKind::Codeunit, "Scenario"));
    let procedure = builder.add_symbol(
        Symbol::new(SymbolKind::Method, "Update")
            .within(object)
            .obsolete(procedure_state),
    );
    let record = TypeInfo::named(TypeKind::Record, "Customer");
    let rec = builder.add_symbol(
        Symbol::new(SymbolKind::Parameter, "Rec")
            .within(procedure)
            .typed(record.clone()),
    );

    let call = builder.push(
        None,
        NodeData::new(NodeKind::InvocationExpression, index.span(0, call_end)).contained_in(procedure),
    );
    builder.push(
        Some(call),
        NodeData::new(NodeKind::ParameterReference, index.span(0, 3))
            .with_symbol(rec)
            .with_type(record)
            .contained_in(procedure),
    );
    let mut arguments = Vec::new();
    if let Some(name) = parameter {
        let argument = builder.push(
            Some(call),
            NodeData::new(NodeKind::Argument, index.span(11, call_end - 1)).contained_in(procedure),
        );
        arguments.push(BoundArgument {
            parameter: Some(name.to_string()),
            value: Some(argument),
        });
    }
    if let Some(node) = builder.node_mut(call) {
        node.invocation = Some(Invocation {
            method: TargetMethod {
                name: "Modify".to_string(),
                kind: MethodKind::BuiltInMethod,
            },
            arguments,
        });
    }
    builder.build().unwrap()
}

#[test]
fn test_scenario_missing_run_trigger() {
    let tree = modify_call(None, ObsoleteState::None);
    let result = run_trigger_only().analyze(&tree);

    assert_eq!(result.diagnostics.len(), 1);
    let diagnostic = &result.diagnostics[0];
    assert_eq!(diagnostic.id, ids::EXPLICITLY_SET_RUN_TRIGGER);
    assert_eq!(diagnostic.span.range(), 0..12);
    assert_eq!(&tree.source().unwrap()[diagnostic.span.range()], "Rec.Modify()");
}

#[test]
fn test_scenario_explicit_run_trigger() {
    let tree = modify_call(Some("RunTrigger"), ObsoleteState::None);
    assert!(run_trigger_only().analyze(&tree).diagnostics.is_empty());

    // Parameter names compare case-insensitively.
    let tree = modify_call(Some("runtrigger"), ObsoleteState::None);
    assert!(run_trigger_only().analyze(&tree).diagnostics.is_empty());
}

#[test]
fn test_scenario_storage_receiver() {
    let tree = resolve(
        "codeunit 50100 Storage
{
    procedure Forget(Key: Text)
    begin
        IsolatedStorage.Delete(Key);
    end;
}",
    );
    let result = run_trigger_only().analyze(&tree);
    assert!(result.diagnostics.is_empty());
    assert!(result.faults.is_empty());
}

#[test]
fn test_scenario_obsolete_pending_procedure() {
    let tree = modify_call(None, ObsoleteState::Pending);
    assert!(run_trigger_only().analyze(&tree).diagnostics.is_empty());
    let tree = modify_call(None, ObsoleteState::Removed);
    assert!(run_trigger_only().analyze(&tree).diagnostics.is_empty());
}

#[test]
fn test_analysis_is_deterministic() {
    let source = include_str!("fixtures/Rule0040/HasDiagnostic/2.al")
        .replace("[|", "")
        .replace("|]", "");
    let tree = resolve(&source);
    let dispatcher = Dispatcher::builtin().unwrap();
    let keys = || -> Vec<String> {
        dispatcher
            .analyze(&tree)
            .diagnostics
            .iter()
            .map(Diagnostic::key)
            .collect()
    };

    let mut first = keys();
    let mut second = keys();
    first.sort();
    second.sort();
    assert_eq!(first.len(), 4);
    assert_eq!(first, second);
}

#[test]
fn test_nothing_reported_inside_obsolete_symbols() {
    let tree = resolve(
        "codeunit 50100 Mixed
{
    procedure Current(var Cust: Record Customer)
    begin
        Cust.Modify();
        if Confirm('Sure?') then;
    end;

    [Obsolete('Use Current', '24.0')]
    procedure Legacy(var Cust: Record Customer)
    begin
        Cust.Modify();
        if Confirm('Sure?') then;
    end;
}

codeunit 50101 Retired
{
    ObsoleteState = Removed;

    procedure Anything(var Cust: Record Customer)
    begin
        Cust.Delete();
    end;
}",
    );
    let config = alcop::Config::enabling(&Catalog::builtin().unwrap(), ["LC0021"]);
    let result = Dispatcher::builtin().unwrap().with_config(&config).unwrap().analyze(&tree);

    assert_eq!(result.count("LC0040"), 1);
    assert_eq!(result.count("LC0021"), 1);
    for diagnostic in &result.diagnostics {
        let node = tree
            .nodes()
            .find(|n| n.kind() == NodeKind::InvocationExpression && n.span() == diagnostic.span)
            .unwrap();
        let procedure = node.containing_symbol().unwrap();
        assert_eq!(procedure.name(), "Current");
        assert_eq!(procedure.obsolete_state(), ObsoleteState::None);
    }
}

#[test]
fn test_faulting_rule_does_not_stop_others() {
    fn always_fails(ctx: &RuleContext<'_>) -> anyhow::Result<Option<Diagnostic>> {
        anyhow::bail!("cannot decide at {}", ctx.node().span())
    }

    let mut dispatcher = run_trigger_only();
    dispatcher
        .register(RuleRegistration {
            rule_id: "AlwaysFails",
            descriptors: &[ids::EXPLICITLY_SET_RUN_TRIGGER],
            kinds: &[NodeKind::InvocationExpression],
            check: always_fails,
        })
        .unwrap();

    let tree = modify_call(None, ObsoleteState::None);
    let result = dispatcher.analyze(&tree);
    assert_eq!(result.count("LC0040"), 1);
    assert_eq!(result.faults.len(), 1);
    assert_eq!(result.faults[0].rule_id, "AlwaysFails");
    assert!(result.faults[0].message.contains("cannot decide"));
}

#[test]
fn test_parallel_analysis_matches_sequential() {
    let dispatcher = Dispatcher::builtin().unwrap();
    let trees: Vec<SemanticTree> = (0..16)
        .map(|i| {
            let state = if i % 2 == 0 { ObsoleteState::None } else { ObsoleteState::Pending };
            modify_call(None, state)
        })
        .collect();

    let merged = dispatcher.analyze_all(&trees);
    assert_eq!(merged.trees_analyzed, 16);
    assert_eq!(merged.count("LC0040"), 8);

    let sequential: usize = trees.iter().map(|t| dispatcher.analyze(t).count("LC0040")).sum();
    assert_eq!(sequential, 8);
}

#[test]
fn test_host_export_with_pragmas() {
    let tree = SemanticTree::from_json_file(testdata_path().join("CustomerTouch.Codeunit.json"))
        .expect("sample export should load");
    let result = Dispatcher::builtin().unwrap().analyze(&tree);

    assert_eq!(result.count("LC0040"), 1);
    assert_eq!(result.diagnostics[0].line(), 5);
    assert_eq!(result.suppressed_count(), 1);
    assert_eq!(result.suppressed[0].diagnostic.line(), 8);
    assert!(!result.has_errors());
}

#[test]
fn test_catalog_ids_are_unique_among_primaries() {
    let catalog = catalog::init().unwrap();
    let mut ids: Vec<&str> = catalog.primaries().map(|d| d.id).collect();
    let total = ids.len();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), total);
    assert!(catalog.len() > total, "aliases share ids with primaries");
}
