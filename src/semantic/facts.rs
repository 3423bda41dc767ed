//! Fact structures supplied by the host's semantic resolver.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::NodeId;

/// Source location span with byte offsets and line/column positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// Start byte offset (0-indexed).
    pub start_byte: usize,
    /// End byte offset (0-indexed, exclusive).
    pub end_byte: usize,
    /// Start line (1-indexed).
    pub start_line: usize,
    /// Start column (1-indexed).
    pub start_col: usize,
    /// End line (1-indexed).
    pub end_line: usize,
    /// End column (1-indexed).
    pub end_col: usize,
}

impl Span {
    /// Whether `other` lies entirely within this span.
    pub fn contains(&self, other: &Span) -> bool {
        self.start_byte <= other.start_byte && other.end_byte <= self.end_byte
    }

    /// Byte range of the span.
    pub fn range(&self) -> std::ops::Range<usize> {
        self.start_byte..self.end_byte
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start_line, self.start_col)
    }
}

/// Maps byte offsets of a source text to 1-based line/column positions.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            source
                .bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self { line_starts }
    }

    /// Line and column (both 1-indexed) of a byte offset.
    pub fn position(&self, offset: usize) -> (usize, usize) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        (line + 1, offset - self.line_starts[line] + 1)
    }

    /// Build a span for the byte range `start..end`.
    pub fn span(&self, start: usize, end: usize) -> Span {
        let (start_line, start_col) = self.position(start);
        let (end_line, end_col) = self.position(end);
        Span {
            start_byte: start,
            end_byte: end,
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }
}

/// Kind of a node in the resolved tree.
///
/// This is a closed tag set; rules subscribe to one or more of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    CompilationUnit,
    ObjectDeclaration,
    MethodDeclaration,
    TriggerDeclaration,
    Block,
    ExpressionStatement,
    AssignmentStatement,
    InvocationExpression,
    Argument,
    MemberAccess,
    FieldAccess,
    LocalReference,
    GlobalReference,
    ParameterReference,
    TypeReference,
    Identifier,
    Literal,
    Expression,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::CompilationUnit => "compilation_unit",
            NodeKind::ObjectDeclaration => "object_declaration",
            NodeKind::MethodDeclaration => "method_declaration",
            NodeKind::TriggerDeclaration => "trigger_declaration",
            NodeKind::Block => "block",
            NodeKind::ExpressionStatement => "expression_statement",
            NodeKind::AssignmentStatement => "assignment_statement",
            NodeKind::InvocationExpression => "invocation_expression",
            NodeKind::Argument => "argument",
            NodeKind::MemberAccess => "member_access",
            NodeKind::FieldAccess => "field_access",
            NodeKind::LocalReference => "local_reference",
            NodeKind::GlobalReference => "global_reference",
            NodeKind::ParameterReference => "parameter_reference",
            NodeKind::TypeReference => "type_reference",
            NodeKind::Identifier => "identifier",
            NodeKind::Literal => "literal",
            NodeKind::Expression => "expression",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Resolved type kind of an expression or symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeKind {
    Record,
    RecordRef,
    FieldRef,
    Codeunit,
    Page,
    Report,
    Query,
    XmlPort,
    Enum,
    Option,
    Text,
    Code,
    Label,
    Char,
    Integer,
    BigInteger,
    Decimal,
    Boolean,
    Date,
    Time,
    DateTime,
    Duration,
    Guid,
    JsonObject,
    JsonArray,
    JsonToken,
    HttpClient,
    List,
    Dictionary,
    Variant,
    IsolatedStorage,
    Database,
    Session,
    System,
    Unknown,
}

impl TypeKind {
    /// Map a type keyword as written in source to its kind.
    pub fn from_keyword(keyword: &str) -> TypeKind {
        match keyword.to_ascii_lowercase().as_str() {
            "record" => TypeKind::Record,
            "recordref" => TypeKind::RecordRef,
            "fieldref" => TypeKind::FieldRef,
            "codeunit" => TypeKind::Codeunit,
            "page" => TypeKind::Page,
            "report" => TypeKind::Report,
            "query" => TypeKind::Query,
            "xmlport" => TypeKind::XmlPort,
            "enum" => TypeKind::Enum,
            "option" => TypeKind::Option,
            "text" | "bigtext" | "secrettext" => TypeKind::Text,
            "code" => TypeKind::Code,
            "label" => TypeKind::Label,
            "char" => TypeKind::Char,
            "integer" | "byte" => TypeKind::Integer,
            "biginteger" => TypeKind::BigInteger,
            "decimal" => TypeKind::Decimal,
            "boolean" => TypeKind::Boolean,
            "date" => TypeKind::Date,
            "time" => TypeKind::Time,
            "datetime" => TypeKind::DateTime,
            "duration" => TypeKind::Duration,
            "guid" => TypeKind::Guid,
            "jsonobject" => TypeKind::JsonObject,
            "jsonarray" => TypeKind::JsonArray,
            "jsontoken" => TypeKind::JsonToken,
            "httpclient" => TypeKind::HttpClient,
            "list" => TypeKind::List,
            "dictionary" => TypeKind::Dictionary,
            "variant" => TypeKind::Variant,
            "isolatedstorage" => TypeKind::IsolatedStorage,
            "database" => TypeKind::Database,
            "session" => TypeKind::Session,
            "system" => TypeKind::System,
            _ => TypeKind::Unknown,
        }
    }
}

/// A resolved type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeInfo {
    pub kind: TypeKind,
    /// Object name for object-typed values (e.g. the table of a record).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub temporary: bool,
}

impl TypeInfo {
    pub fn new(kind: TypeKind) -> Self {
        Self {
            kind,
            name: None,
            temporary: false,
        }
    }

    pub fn named(kind: TypeKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: Some(name.into()),
            temporary: false,
        }
    }

    /// Whether this is a persistent, keyed data entity.
    pub fn is_record(&self) -> bool {
        self.kind == TypeKind::Record
    }
}

/// Kind of a symbol in the host's symbol table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolKind {
    Table,
    TableExtension,
    Page,
    PageExtension,
    Codeunit,
    Report,
    Query,
    XmlPort,
    Enum,
    EnumExtension,
    Interface,
    PermissionSet,
    Method,
    Trigger,
    Field,
    Parameter,
    LocalVariable,
    GlobalVariable,
    ReturnValue,
}

impl SymbolKind {
    /// Check if this is an application object (table, page, codeunit, ...).
    pub fn is_object(&self) -> bool {
        matches!(
            self,
            SymbolKind::Table
                | SymbolKind::TableExtension
                | SymbolKind::Page
                | SymbolKind::PageExtension
                | SymbolKind::Codeunit
                | SymbolKind::Report
                | SymbolKind::Query
                | SymbolKind::XmlPort
                | SymbolKind::Enum
                | SymbolKind::EnumExtension
                | SymbolKind::Interface
                | SymbolKind::PermissionSet
        )
    }

    /// Map an object keyword as written in source to its symbol kind.
    pub fn from_object_keyword(keyword: &str) -> Option<SymbolKind> {
        match keyword.to_ascii_lowercase().as_str() {
            "table" => Some(SymbolKind::Table),
            "tableextension" => Some(SymbolKind::TableExtension),
            "page" => Some(SymbolKind::Page),
            "pageextension" => Some(SymbolKind::PageExtension),
            "codeunit" => Some(SymbolKind::Codeunit),
            "report" => Some(SymbolKind::Report),
            "query" => Some(SymbolKind::Query),
            "xmlport" => Some(SymbolKind::XmlPort),
            "enum" => Some(SymbolKind::Enum),
            "enumextension" => Some(SymbolKind::EnumExtension),
            "interface" => Some(SymbolKind::Interface),
            "permissionset" => Some(SymbolKind::PermissionSet),
            _ => None,
        }
    }
}

/// Lifecycle stage of a symbol.
///
/// Assigned by the host; transitions are monotonic (`None -> Pending -> Removed`).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum ObsoleteState {
    #[default]
    None,
    Pending,
    Removed,
}

impl ObsoleteState {
    pub fn is_obsolete(&self) -> bool {
        *self != ObsoleteState::None
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "no" | "none" => Some(ObsoleteState::None),
            "pending" => Some(ObsoleteState::Pending),
            "removed" => Some(ObsoleteState::Removed),
            _ => None,
        }
    }
}

/// How the target of an invocation is implemented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MethodKind {
    /// Supplied by the platform (e.g. `Record.Modify`, `Confirm`).
    BuiltInMethod,
    /// A user-defined procedure.
    Method,
    Trigger,
}

/// The method an invocation resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetMethod {
    pub name: String,
    pub kind: MethodKind,
}

/// An argument bound to a parameter of the target method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundArgument {
    /// Name of the parameter this argument binds to (if the host resolved it).
    #[serde(default)]
    pub parameter: Option<String>,
    /// Node holding the argument expression.
    #[serde(default)]
    pub value: Option<NodeId>,
}

impl BoundArgument {
    /// Whether this argument is bound to the parameter called `name`.
    pub fn binds(&self, name: &str) -> bool {
        self.parameter
            .as_deref()
            .map_or(false, |p| is_same_name(p, name))
    }
}

/// Invocation facts for call-like nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    pub method: TargetMethod,
    #[serde(default)]
    pub arguments: Vec<BoundArgument>,
}

/// Strip the double-quote delimiters of a quoted identifier.
pub fn unquote(name: &str) -> &str {
    let name = name.trim();
    name.strip_prefix('"')
        .and_then(|n| n.strip_suffix('"'))
        .unwrap_or(name)
}

/// Compare two identifiers the way the language does: case-insensitive,
/// ignoring quote delimiters.
pub fn is_same_name(a: &str, b: &str) -> bool {
    unquote(a).eq_ignore_ascii_case(unquote(b))
}
