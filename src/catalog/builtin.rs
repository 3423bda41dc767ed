//! The descriptor table shipped with the analyzer set.
//!
//! Message templates are the invariant-culture strings; translation is the
//! host's business.

use super::{DiagnosticDescriptor, Severity};

/// Ids referenced from code.
pub mod ids {
    pub const ERROR_IN_RULE: &str = "LC0000";
    pub const CONFIRM_IMPLEMENT_CONFIRM_MANAGEMENT: &str = "LC0021";
    pub const GLOBAL_LANGUAGE_IMPLEMENT_TRANSLATION_HELPER: &str = "LC0022";
    pub const EXPLICITLY_SET_RUN_TRIGGER: &str = "LC0040";
}

const DESIGN: &str = "Design";

fn descriptor(
    id: &'static str,
    name: &'static str,
    severity: Severity,
    enabled_by_default: bool,
    title: &'static str,
    message: &'static str,
    description: &'static str,
) -> DiagnosticDescriptor {
    DiagnosticDescriptor {
        id,
        name,
        category: DESIGN,
        severity,
        enabled_by_default,
        title,
        message,
        description,
        alias_of: None,
    }
}

fn alias(of: &'static str, descriptor: DiagnosticDescriptor) -> DiagnosticDescriptor {
    DiagnosticDescriptor {
        alias_of: Some(of),
        ..descriptor
    }
}

/// All built-in descriptors, primaries before the aliases that share their id.
pub fn descriptors() -> Vec<DiagnosticDescriptor> {
    use Severity::*;

    vec![
        descriptor(
            "LC0000",
            "ErrorInRule",
            Info,
            true,
            "An error occurred in a rule",
            "An error occurred in rule {0}: {1}",
            "A rule failed while analyzing this node; analysis of the rest of the document continued.",
        ),
        descriptor(
            "LC0001",
            "FlowFieldsShouldNotBeEditable",
            Warning,
            true,
            "FlowFields should not be editable",
            "FlowFields should not be editable.",
            "Set Editable = false on FlowFields; their value is calculated.",
        ),
        descriptor(
            "LC0002",
            "CommitMustBeExplainedByComment",
            Warning,
            true,
            "Commit() needs a comment to justify its existence",
            "Commit() needs a comment to justify its existence. Either a leading or a trailing comment.",
            "Every explicit Commit() should be explained by a comment next to it.",
        ),
        descriptor(
            "LC0003",
            "DoNotUseObjectIDsInVariablesOrProperties",
            Warning,
            true,
            "Do not use object IDs in variables or properties",
            "Do not use an object ID for properties or variable declarations. Use {0} instead.",
            "Reference objects by name so declarations survive renumbering.",
        ),
        descriptor(
            "LC0004",
            "LookupPageIdAndDrillDownPageId",
            Warning,
            true,
            "LookupPageId and DrillDownPageId must be set",
            "Both LookupPageId and DrillDownPageId need to be defined on table {0}.",
            "Tables used in lookups should define both pages.",
        ),
        descriptor(
            "LC0005",
            "VariableCasingShouldNotDifferFromDeclaration",
            Warning,
            true,
            "Casing should match the declaration",
            "The casing of variable/method usage must align with the definition.",
            "Use identifiers with the same casing as their declaration.",
        ),
        descriptor(
            "LC0006",
            "FieldNotAutoIncrementInTemporaryTable",
            Error,
            true,
            "AutoIncrement in temporary tables",
            "Property AutoIncrement cannot be used in temporary tables.",
            "AutoIncrement is not supported on fields of temporary tables.",
        ),
        descriptor(
            "LC0007",
            "DataPerCompanyShouldAlwaysBeSet",
            Hidden,
            false,
            "DataPerCompany should always be set",
            "The property DataPerCompany should always be set explicitly.",
            "Make the company scope of table data explicit.",
        ),
        descriptor(
            "LC0008",
            "NoFilterOperatorsInSetRange",
            Warning,
            true,
            "No filter operators in SetRange",
            "Filter operators should not be used in SetRange.",
            "SetRange compares values literally; use SetFilter for filter expressions.",
        ),
        descriptor(
            "LC0009",
            "CodeMetricsInfo",
            Info,
            false,
            "Code metrics",
            "Cyclomatic complexity: {0}, Maintainability index: {1}",
            "Reports code metrics for every method.",
        ),
        descriptor(
            "LC0010",
            "CodeMetricsWarning",
            Warning,
            true,
            "Code metrics",
            "Cyclomatic complexity: {0}, Maintainability index: {1}",
            "Reports methods whose metrics exceed the configured thresholds.",
        ),
        descriptor(
            "LC0011",
            "AccessPropertyShouldAlwaysBeSet",
            Hidden,
            false,
            "Access property should always be set",
            "The Access property should always be set explicitly.",
            "Make the accessibility of objects explicit.",
        ),
        descriptor(
            "LC0012",
            "DoNotUseObjectIdInSystemFunctions",
            Warning,
            true,
            "Do not use object IDs in system functions",
            "Do not use an object ID in system functions. Use {0} instead.",
            "Reference objects by name when calling system functions.",
        ),
        descriptor(
            "LC0013",
            "CheckForNotBlankOnSingleFieldPrimaryKeys",
            Warning,
            true,
            "NotBlank on single field primary keys",
            "Single field primary keys of type Code or Text should have NotBlank set to true.",
            "Blank primary key values are rarely intended.",
        ),
        descriptor(
            "LC0014",
            "PermissionSetCaptionLength",
            Warning,
            true,
            "Permission set caption length",
            "The caption of permission set {0} exceeds the maximum length of 30 characters.",
            "Permission set captions are truncated after 30 characters.",
        ),
        descriptor(
            "LC0015",
            "PermissionSetCoverage",
            Warning,
            true,
            "Permission set coverage",
            "Application object {0} is not covered by any permission set.",
            "Every application object should be part of a permission set.",
        ),
        descriptor(
            "LC0016",
            "CheckForMissingCaptions",
            Warning,
            true,
            "Missing caption",
            "Caption is missing.",
            "User-facing elements need a caption.",
        ),
        descriptor(
            "LC0017",
            "WriteToFlowField",
            Warning,
            true,
            "Writing to a FlowField",
            "Writing to a FlowField is not common. Add a comment to explain this.",
            "FlowField values are calculated; assignments are usually mistakes.",
        ),
        descriptor(
            "LC0018",
            "NoEventsInInternalCodeunits",
            Info,
            true,
            "No events in internal codeunits",
            "Events in internal codeunits are not accessible to extensions.",
            "Publish events from public codeunits.",
        ),
        descriptor(
            "LC0019",
            "DataClassificationFieldEqualsTable",
            Info,
            true,
            "DataClassification repeats the table value",
            "The DataClassification of a field should not repeat the value set on the table.",
            "Only set DataClassification on fields that differ from the table.",
        ),
        descriptor(
            "LC0020",
            "ApplicationAreaEqualsToPage",
            Info,
            true,
            "ApplicationArea repeats the page value",
            "The ApplicationArea of a control should not repeat the value set on the page.",
            "Only set ApplicationArea on controls that differ from the page.",
        ),
        descriptor(
            "LC0021",
            "ConfirmImplementConfirmManagement",
            Info,
            true,
            "Use Confirm Management instead of Confirm()",
            "Use the \"Confirm Management\" codeunit instead of the built-in Confirm().",
            "Confirm Management respects GUI availability and can be handled in tests.",
        ),
        descriptor(
            "LC0022",
            "GlobalLanguageImplementTranslationHelper",
            Info,
            true,
            "Use Translation Helper instead of GlobalLanguage()",
            "Use the \"Translation Helper\" codeunit instead of setting GlobalLanguage() directly.",
            "Translation Helper restores the language reliably.",
        ),
        descriptor(
            "LC0023",
            "AlwaysSpecifyFieldgroups",
            Info,
            true,
            "Always specify fieldgroups",
            "Always specify the DropDown and Brick fieldgroups on table {0}.",
            "Fieldgroups drive lookups and tile views.",
        ),
        descriptor(
            "LC0024",
            "SemicolonAfterProcedureDeclaration",
            Info,
            true,
            "Semicolon after procedure declaration",
            "A semicolon is not needed after a procedure declaration.",
            "Remove the trailing semicolon after the procedure header.",
        ),
        descriptor(
            "LC0025",
            "InternalProcedureModifier",
            Hidden,
            true,
            "Consider the internal or local modifier",
            "Procedure {0} is only used inside its module; consider the internal or local modifier.",
            "Keep the public surface of objects small.",
        ),
        descriptor(
            "LC0026",
            "ToolTipMustEndWithDot",
            Info,
            true,
            "ToolTip must end with a dot",
            "ToolTips must end with a dot.",
            "ToolTips are sentences.",
        ),
        descriptor(
            "LC0027",
            "RunPageImplementPageManagement",
            Info,
            true,
            "Use Page Management instead of Page.Run",
            "Use the \"Page Management\" codeunit instead of Page.Run() or Page.RunModal().",
            "Page Management picks the right page for a record.",
        ),
        descriptor(
            "LC0028",
            "IdentifiersInEventSubscribers",
            Info,
            true,
            "Identifiers in event subscribers",
            "Event subscriber arguments should use identifiers instead of strings.",
            "Identifiers are checked by the compiler, strings are not.",
        ),
        descriptor(
            "LC0029",
            "CompareDateTimeThroughCodeunit",
            Info,
            true,
            "Compare DateTime values through a codeunit",
            "Compare DateTime values using the \"Type Helper\" codeunit CompareDateTimes().",
            "DateTime values lose precision in SQL; direct comparison is unreliable.",
        ),
        descriptor(
            "LC0030",
            "AccessInternalForInstallAndUpgradeCodeunits",
            Info,
            true,
            "Access Internal for install and upgrade codeunits",
            "Install and upgrade codeunits should set Access = Internal.",
            "These codeunits are not meant to be called by other extensions.",
        ),
        descriptor(
            "LC0031",
            "RecordInstanceIsolationLevel",
            Info,
            true,
            "Use the record instance isolation level",
            "Use ReadIsolation on the record instance instead of LockTable().",
            "Record instance isolation is more precise than table locks.",
        ),
        descriptor(
            "LC0032",
            "ClearCodeunitSingleInstance",
            Warning,
            true,
            "Clearing a SingleInstance codeunit",
            "Clearing SingleInstance codeunit {0} also resets its global state.",
            "Clear() on a SingleInstance codeunit affects every user of the instance.",
        ),
        descriptor(
            "LC0033",
            "AppManifestRuntimeBehind",
            Info,
            true,
            "Runtime in app manifest is behind",
            "The runtime in app.json ({0}) is behind the version supported by the platform ({1}).",
            "A newer runtime unlocks newer language features.",
        ),
        descriptor(
            "LC0034",
            "ExtensiblePropertyShouldAlwaysBeSet",
            Hidden,
            true,
            "Extensible property should always be set",
            "The Extensible property should always be set explicitly.",
            "Make extensibility of objects explicit.",
        ),
        descriptor(
            "LC0035",
            "ExplicitSetAllowInCustomizations",
            Info,
            true,
            "Set AllowInCustomizations explicitly",
            "Set the AllowInCustomizations property explicitly for field {0}.",
            "Fields not shown on any page should declare whether they can be added by customizations.",
        ),
        descriptor(
            "LC0036",
            "ToolTipShouldStartWithSpecifies",
            Info,
            true,
            "ToolTip should start with Specifies",
            "ToolTips for fields should start with 'Specifies'.",
            "Consistent ToolTip phrasing across the application.",
        ),
        descriptor(
            "LC0037",
            "ToolTipDoNotUseLineBreaks",
            Info,
            true,
            "ToolTip should not use line breaks",
            "ToolTips must not contain line breaks.",
            "Line breaks are not rendered in ToolTips.",
        ),
        descriptor(
            "LC0038",
            "ToolTipMaximumLength",
            Info,
            true,
            "ToolTip maximum length",
            "ToolTips should not exceed 200 characters.",
            "Long ToolTips are truncated.",
        ),
        descriptor(
            "LC0039",
            "ArgumentDifferentTypeThenExpected",
            Warning,
            true,
            "Argument type differs from the expected type",
            "Argument {0} has type {1} but {2} is expected.",
            "Implicit conversions between object types hide mistakes.",
        ),
        descriptor(
            "LC0040",
            "ExplicitlySetRunTrigger",
            Info,
            true,
            "Explicitly set the RunTrigger parameter",
            "Explicitly set the RunTrigger parameter on built-in record methods.",
            "Insert, Modify, ModifyAll, Delete and DeleteAll should state whether table triggers run.",
        ),
        alias(
            "ExplicitlySetRunTrigger",
            descriptor(
                "LC0040",
                "ZeroEnumValueReservedForEmpty",
                Info,
                true,
                "Zero enum value is reserved for empty",
                "The zero value of an enum should be reserved for the empty value.",
                "Superseded numbering: shares LC0040 with ExplicitlySetRunTrigger.",
            ),
        ),
        descriptor(
            "LC0041",
            "EmptyCaptionLocked",
            Info,
            true,
            "Empty captions should be locked",
            "Empty captions should be locked.",
            "Empty captions need no translation.",
        ),
        alias(
            "EmptyCaptionLocked",
            descriptor(
                "LC0041",
                "TokLabelsLocked",
                Info,
                true,
                "Labels with the Tok suffix should be locked",
                "Labels with the Tok suffix should be locked.",
                "Superseded numbering: shares LC0041 with EmptyCaptionLocked.",
            ),
        ),
        alias(
            "EmptyCaptionLocked",
            descriptor(
                "LC0041",
                "LockedLabelsTok",
                Info,
                true,
                "Locked labels should use the Tok suffix",
                "Locked labels should use the Tok suffix.",
                "Superseded numbering: shares LC0041 with EmptyCaptionLocked.",
            ),
        ),
        descriptor(
            "LC0042",
            "AutoCalcFieldsOnNormalFields",
            Warning,
            true,
            "AutoCalcFields on normal fields",
            "AutoCalcFields should only be used for FlowFields and Blob fields.",
            "Calculating normal fields has no effect.",
        ),
        descriptor(
            "LC0043",
            "SecretText",
            Info,
            true,
            "Use SecretText",
            "Use SecretText for credentials and other secrets.",
            "SecretText keeps values out of the debugger.",
        ),
        descriptor(
            "LC0044",
            "AnalyzeTransferFields",
            Info,
            true,
            "TransferFields field conflict",
            "Field {0} in table {1} conflicts with field {2} in table {3} when using TransferFields.",
            "TransferFields copies by field number; names and types must line up.",
        ),
        alias(
            "AnalyzeTransferFields",
            descriptor(
                "LC0044",
                "AnalyzeTableExtension",
                Info,
                true,
                "TransferFields field conflict in table extensions",
                "Field {0} in table extension {1} conflicts with field {2} in table extension {3} when using TransferFields.",
                "Superseded numbering: shares LC0044 with AnalyzeTransferFields.",
            ),
        ),
    ]
}
