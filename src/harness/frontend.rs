//! A small resolver for the language subset used by rule fixtures.
//!
//! Real hosts export fully resolved trees. Fixtures only need objects,
//! procedures and triggers, variable declarations and calls, so this front
//! end recognizes just that much:
//!
//! - object headers with `ObsoleteState` and (for pages) `SourceTable`
//! - `procedure`/`trigger` declarations with `[Obsolete]` attributes,
//!   parameters and `var` sections, plus global `var` sections
//! - the implicit `Rec`/`xRec` of tables, table extensions and pages
//! - calls written with parentheses, with positional arguments bound to the
//!   parameters of known built-in methods and `Name := value` arguments
//!   bound by name
//!
//! Comments and string literals are blanked before scanning, so offsets in
//! the scanned text are offsets in the source.

use anyhow::Context as _;
use phf::{phf_map, phf_set};
use regex::Regex;
use std::ops::Range;

use crate::semantic::{
    is_same_name, unquote, BoundArgument, Invocation, LineIndex, MethodKind, NodeData, NodeId,
    NodeKind, ObsoleteState, SemanticTree, Span, Symbol, SymbolId, SymbolKind, TargetMethod,
    TreeBuilder, TypeInfo, TypeKind,
};

/// Turns source text into a resolved tree.
pub trait Frontend: Send + Sync {
    fn resolve(&self, path: &str, source: &str) -> anyhow::Result<SemanticTree>;
}

/// Front end for fixture sources.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureFrontend;

impl Frontend for FixtureFrontend {
    fn resolve(&self, path: &str, source: &str) -> anyhow::Result<SemanticTree> {
        let text = Text::new(source)?;
        let mut resolver = Resolver {
            text: &text,
            builder: TreeBuilder::new(path).source(source),
        };
        resolver.compilation_unit()?;
        Ok(resolver.builder.build()?)
    }
}

lazy_static::lazy_static! {
    static ref OBJECT_HEADER: Regex = Regex::new(
        r#"(?i)\b(tableextension|pageextension|enumextension|permissionset|table|page|codeunit|report|query|xmlport|enum|interface)\s+(?:\d+\s+)?("[^"]*"|[A-Za-z_]\w*)(?:\s+extends\s+("[^"]*"|[A-Za-z_]\w*))?"#
    ).unwrap();
    static ref ROUTINE_HEADER: Regex = Regex::new(
        r#"(?i)\b(?:(?:local|internal|protected)\s+)?(procedure|trigger)\s+("[^"]*"|[A-Za-z_]\w*)\s*\("#
    ).unwrap();
    static ref OBSOLETE_STATE: Regex =
        Regex::new(r"(?i)\bObsoleteState\s*=\s*([A-Za-z]+)\s*;").unwrap();
    static ref SOURCE_TABLE: Regex =
        Regex::new(r#"(?i)\bSourceTable\s*=\s*("[^"]*"|[A-Za-z_]\w*)\s*;"#).unwrap();
    static ref OBSOLETE_ATTRIBUTE: Regex = Regex::new(r"(?i)^\s*\[\s*Obsolete\b").unwrap();
    static ref VAR_KEYWORD: Regex = Regex::new(r"(?i)\bvar\b").unwrap();
    static ref BEGIN_KEYWORD: Regex = Regex::new(r"(?i)\bbegin\b").unwrap();
    static ref BLOCK_TOKEN: Regex = Regex::new(r"(?i)\b(begin|case|end)\b").unwrap();
    static ref CALL: Regex = Regex::new(
        r#"("[^"]*"|\b[A-Za-z_]\w*)(?:\s*\.\s*("[^"]*"|[A-Za-z_]\w*))?\s*\("#
    ).unwrap();
    static ref TYPE_SPEC: Regex = Regex::new(
        r#"^\s*([A-Za-z]+)(?:\s*\[[^\]]*\])?(?:\s+("[^"]*"|[A-Za-z_]\w*))?"#
    ).unwrap();
    static ref TEMPORARY: Regex = Regex::new(r"(?i)\btemporary\b").unwrap();
    static ref IDENTIFIER: Regex = Regex::new(r#"^("[^"]*"|[A-Za-z_]\w*)$"#).unwrap();
    static ref NAMED_ARGUMENT: Regex = Regex::new(r"^([A-Za-z_]\w*)\s*:=\s*").unwrap();
}

/// Words that look like calls when followed by a parenthesis.
static KEYWORDS: phf::Set<&'static str> = phf_set! {
    "if", "then", "else", "while", "do", "until", "repeat", "for", "to", "downto",
    "foreach", "in", "case", "of", "with", "exit", "not", "and", "or", "xor", "div",
    "mod", "begin", "end", "var", "array",
};

const NO_PARAMETERS: &[&str] = &[];
const RUN_TRIGGER: &[&str] = &["RunTrigger"];
const INSERT: &[&str] = &["RunTrigger", "InsertWithSystemId"];
const MODIFY_ALL: &[&str] = &["Field", "NewValue", "RunTrigger"];
const SET_RANGE: &[&str] = &["Field", "FromValue", "ToValue"];
const SET_FILTER: &[&str] = &["Field", "String", "Value"];
const FIELD_VALUE: &[&str] = &["Field", "Value"];
const VALIDATE: &[&str] = &["Field", "NewValue"];
const FIND_SET: &[&str] = &["ForUpdate", "UpdateKey"];
const FIND: &[&str] = &["Which"];
const NEXT: &[&str] = &["Steps"];
const VALUES: &[&str] = &["Value"];
const FIELDS: &[&str] = &["Field"];
const COPY: &[&str] = &["FromRecord", "ShareTable"];
const TRANSFER_FIELDS: &[&str] = &["FromRecord", "InitPrimaryKeyFields"];
const LOCK_TABLE: &[&str] = &["Wait", "VersionCheck"];
const STORAGE_SET: &[&str] = &["Key", "Value", "DataScope"];
const STORAGE_GET: &[&str] = &["Key", "DataScope", "Value"];
const STORAGE_KEY: &[&str] = &["Key", "DataScope"];
const CONFIRM: &[&str] = &["String", "Default", "Value"];
const FORMATTED: &[&str] = &["String", "Value"];
const LANGUAGE: &[&str] = &["Language"];
const STR_MENU: &[&str] = &["OptionMembers", "DefaultNumber", "Instruction"];

/// Built-in methods of record variables.
static RECORD_METHODS: phf::Map<&'static str, &'static [&'static str]> = phf_map! {
    "insert" => INSERT,
    "modify" => RUN_TRIGGER,
    "modifyall" => MODIFY_ALL,
    "delete" => RUN_TRIGGER,
    "deleteall" => RUN_TRIGGER,
    "get" => VALUES,
    "find" => FIND,
    "findfirst" => NO_PARAMETERS,
    "findlast" => NO_PARAMETERS,
    "findset" => FIND_SET,
    "next" => NEXT,
    "isempty" => NO_PARAMETERS,
    "count" => NO_PARAMETERS,
    "init" => NO_PARAMETERS,
    "reset" => NO_PARAMETERS,
    "setrange" => SET_RANGE,
    "setfilter" => SET_FILTER,
    "validate" => VALIDATE,
    "testfield" => FIELD_VALUE,
    "calcfields" => FIELDS,
    "setloadfields" => FIELDS,
    "setcurrentkey" => FIELDS,
    "setautocalcfields" => FIELDS,
    "copy" => COPY,
    "transferfields" => TRANSFER_FIELDS,
    "rename" => VALUES,
    "locktable" => LOCK_TABLE,
};

/// Built-in methods of the `IsolatedStorage` data type.
static ISOLATED_STORAGE_METHODS: phf::Map<&'static str, &'static [&'static str]> = phf_map! {
    "set" => STORAGE_SET,
    "setencrypted" => STORAGE_SET,
    "get" => STORAGE_GET,
    "delete" => STORAGE_KEY,
    "contains" => STORAGE_KEY,
};

/// Built-in methods callable without a receiver.
static GLOBAL_METHODS: phf::Map<&'static str, &'static [&'static str]> = phf_map! {
    "confirm" => CONFIRM,
    "message" => FORMATTED,
    "error" => FORMATTED,
    "strsubstno" => FORMATTED,
    "strmenu" => STR_MENU,
    "globallanguage" => LANGUAGE,
    "commit" => NO_PARAMETERS,
    "clear" => VALUES,
    "clearall" => NO_PARAMETERS,
    "format" => VALUES,
    "evaluate" => VALUES,
    "guiallowed" => NO_PARAMETERS,
    "userid" => NO_PARAMETERS,
    "companyname" => NO_PARAMETERS,
    "today" => NO_PARAMETERS,
    "workdate" => VALUES,
    "sleep" => VALUES,
    "copystr" => VALUES,
    "strlen" => VALUES,
    "lowercase" => VALUES,
    "uppercase" => VALUES,
    "createguid" => NO_PARAMETERS,
    "isnullguid" => VALUES,
};

/// Source text prepared for scanning.
struct Text {
    /// Comments and string literal contents replaced by spaces.
    masked: String,
    /// As `masked`, with quoted identifier contents blanked too.
    bare: String,
    /// Brace depth before each byte of the source.
    depth: Vec<u32>,
    index: LineIndex,
}

impl Text {
    fn new(source: &str) -> anyhow::Result<Self> {
        let (masked, bare) = mask(source)?;
        let mut depth = Vec::with_capacity(bare.len() + 1);
        let mut current = 0u32;
        for byte in bare.bytes() {
            depth.push(current);
            match byte {
                b'{' => current += 1,
                b'}' => current = current.saturating_sub(1),
                _ => {}
            }
        }
        depth.push(current);
        Ok(Self {
            masked,
            bare,
            depth,
            index: LineIndex::new(source),
        })
    }

    fn span(&self, range: Range<usize>) -> Span {
        self.index.span(range.start, range.end)
    }

    /// Identifier text of `range`, quotes removed.
    fn name(&self, range: Range<usize>) -> &str {
        unquote(&self.masked[range])
    }

    fn matching_brace(&self, open: usize) -> Option<usize> {
        let inner = self.depth[open] + 1;
        self.bare[open + 1..]
            .bytes()
            .enumerate()
            .find(|&(i, b)| b == b'}' && self.depth[open + 1 + i] == inner)
            .map(|(i, _)| open + 1 + i)
    }

    fn matching_paren(&self, open: usize, limit: usize) -> Option<usize> {
        let mut depth = 0usize;
        for (i, byte) in self.bare[open..limit].bytes().enumerate() {
            match byte {
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(open + i);
                    }
                }
                _ => {}
            }
        }
        None
    }

    /// End offset of the `end` closing the block opened at `begin`.
    fn matching_end(&self, begin: usize, limit: usize) -> Option<usize> {
        let mut depth = 0usize;
        for token in BLOCK_TOKEN.find_iter(&self.bare[begin..limit]) {
            if token.as_str().eq_ignore_ascii_case("end") {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(begin + token.end());
                }
            } else {
                depth += 1;
            }
        }
        None
    }

    /// First capture group of the first match of `re` at brace depth `depth`.
    fn property(&self, re: &Regex, range: Range<usize>, depth: u32) -> Option<Range<usize>> {
        re.captures_iter(&self.bare[range.clone()])
            .filter(|caps| caps.get(0).map_or(false, |m| self.depth[range.start + m.start()] == depth))
            .find_map(|caps| caps.get(1))
            .map(|m| range.start + m.start()..range.start + m.end())
    }

    fn line_start(&self, offset: usize) -> usize {
        self.bare[..offset].rfind('\n').map_or(0, |p| p + 1)
    }

    /// Start of the attribute lines directly above `header`, and whether one
    /// of them is `[Obsolete]`.
    fn attributes(&self, header: usize, floor: usize) -> (usize, bool) {
        let mut start = self.line_start(header);
        let mut obsolete = false;
        while start > floor {
            let previous = self.line_start(start - 1).max(floor);
            let line = &self.bare[previous..start - 1];
            if !line.trim_start().starts_with('[') {
                break;
            }
            obsolete |= OBSOLETE_ATTRIBUTE.is_match(line);
            start = previous;
        }
        (start, obsolete)
    }

    /// Split an argument list into trimmed top-level arguments.
    fn arguments(&self, range: Range<usize>) -> Vec<Range<usize>> {
        if self.bare[range.clone()].trim().is_empty() {
            return Vec::new();
        }
        let mut pieces = Vec::new();
        let mut depth = 0usize;
        let mut start = range.start;
        for (i, byte) in self.bare[range.clone()].bytes().enumerate() {
            match byte {
                b'(' | b'[' => depth += 1,
                b')' | b']' => depth = depth.saturating_sub(1),
                b',' if depth == 0 => {
                    pieces.push(start..range.start + i);
                    start = range.start + i + 1;
                }
                _ => {}
            }
        }
        pieces.push(start..range.end);
        pieces.into_iter().map(|piece| self.trim(piece)).collect()
    }

    fn trim(&self, range: Range<usize>) -> Range<usize> {
        let text = &self.bare[range.clone()];
        let leading = text.len() - text.trim_start().len();
        let trailing = text.len() - text.trim_end().len();
        let start = range.start + leading;
        start..(range.end - trailing).max(start)
    }

    /// Parse `name[, name]: Type` declarations separated by semicolons.
    ///
    /// Stops at the first segment that is not a declaration.
    fn declarations(&self, range: Range<usize>, parameters: bool) -> Vec<(String, TypeInfo)> {
        let mut declared = Vec::new();
        let mut start = range.start;
        let ends = self.bare[range.clone()]
            .match_indices(';')
            .map(|(i, _)| range.start + i)
            .chain(std::iter::once(range.end));

        for end in ends {
            let segment = start..end;
            start = end + 1;
            let bare = &self.bare[segment.clone()];
            if bare.trim().is_empty() {
                continue;
            }
            let Some(colon) = bare.find(':') else {
                break;
            };
            let mut names = self.masked[segment.start..segment.start + colon].trim();
            if parameters {
                if let Some(rest) = strip_keyword(names, "var") {
                    names = rest;
                }
            }
            let names: Vec<&str> = names.split(',').map(str::trim).collect();
            if names.iter().any(|n| !IDENTIFIER.is_match(n)) {
                break;
            }
            let Some(type_info) = parse_type(&self.masked[segment.start + colon + 1..segment.end])
            else {
                break;
            };
            for name in names {
                declared.push((unquote(name).to_string(), type_info.clone()));
            }
        }
        declared
    }
}

fn strip_keyword<'t>(text: &'t str, keyword: &str) -> Option<&'t str> {
    let head = text.get(..keyword.len())?;
    let rest = &text[keyword.len()..];
    (head.eq_ignore_ascii_case(keyword) && rest.starts_with(char::is_whitespace))
        .then(|| rest.trim_start())
}

fn parse_type(text: &str) -> Option<TypeInfo> {
    let caps = TYPE_SPEC.captures(text)?;
    let kind = TypeKind::from_keyword(caps.get(1)?.as_str());
    let name = caps
        .get(2)
        .filter(|_| takes_object_name(kind))
        .map(|m| unquote(m.as_str()).to_string());
    Some(TypeInfo {
        kind,
        name,
        temporary: TEMPORARY.is_match(text),
    })
}

fn takes_object_name(kind: TypeKind) -> bool {
    matches!(
        kind,
        TypeKind::Record
            | TypeKind::Codeunit
            | TypeKind::Page
            | TypeKind::Report
            | TypeKind::Query
            | TypeKind::XmlPort
            | TypeKind::Enum
    )
}

/// Data types whose methods are called on the type name itself.
fn static_receiver(name: &str) -> Option<TypeKind> {
    match TypeKind::from_keyword(name) {
        kind @ (TypeKind::IsolatedStorage
        | TypeKind::Database
        | TypeKind::Session
        | TypeKind::System
        | TypeKind::Codeunit
        | TypeKind::Page
        | TypeKind::Report
        | TypeKind::Query
        | TypeKind::XmlPort) => Some(kind),
        _ => None,
    }
}

/// Blank comments and string literals (and, for the second copy, quoted
/// identifiers), keeping every byte offset and line break in place.
fn mask(source: &str) -> anyhow::Result<(String, String)> {
    let bytes = source.as_bytes();
    let len = bytes.len();
    let mut masked = bytes.to_vec();
    let mut quoted = Vec::new();
    let mut i = 0;

    while i < len {
        match bytes[i] {
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                let end = find_byte(bytes, i, b'\n').unwrap_or(len);
                blank(&mut masked, i..end);
                i = end;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                let end = source[i + 2..].find("*/").map_or(len, |p| i + 2 + p + 2);
                blank(&mut masked, i..end);
                i = end;
            }
            b'\'' => {
                let mut j = i + 1;
                while j < len {
                    if bytes[j] == b'\'' {
                        if bytes.get(j + 1) == Some(&b'\'') {
                            j += 2;
                            continue;
                        }
                        break;
                    }
                    j += 1;
                }
                blank(&mut masked, i + 1..j.min(len));
                i = j + 1;
            }
            b'"' => {
                let end = bytes[i + 1..]
                    .iter()
                    .position(|&b| b == b'"' || b == b'\n')
                    .map_or(len, |p| i + 1 + p);
                quoted.push(i + 1..end);
                i = end + 1;
            }
            _ => i += 1,
        }
    }

    let mut bare = masked.clone();
    for range in quoted {
        blank(&mut bare, range);
    }
    Ok((
        String::from_utf8(masked).context("masking produced invalid text")?,
        String::from_utf8(bare).context("masking produced invalid text")?,
    ))
}

fn find_byte(bytes: &[u8], from: usize, needle: u8) -> Option<usize> {
    bytes[from..].iter().position(|&b| b == needle).map(|p| from + p)
}

fn blank(bytes: &mut [u8], range: Range<usize>) {
    for byte in &mut bytes[range] {
        if *byte != b'\n' && *byte != b'\r' {
            *byte = b' ';
        }
    }
}

/// A declared variable, parameter or implicit record.
struct Variable {
    name: String,
    symbol: SymbolId,
    kind: SymbolKind,
    type_info: TypeInfo,
    implicit: bool,
}

impl Variable {
    fn reference(&self, span: Span, routine: SymbolId) -> NodeData {
        let kind = match self.kind {
            SymbolKind::Parameter => NodeKind::ParameterReference,
            SymbolKind::LocalVariable => NodeKind::LocalReference,
            _ => NodeKind::GlobalReference,
        };
        NodeData::new(kind, span)
            .with_symbol(self.symbol)
            .with_type(self.type_info.clone())
            .contained_in(routine)
    }
}

struct Routine {
    kind: SymbolKind,
    name: Range<usize>,
    obsolete: bool,
    /// Attributes through the closing `end` (or the header's `;`).
    extent: Range<usize>,
    header: usize,
    parameters: Range<usize>,
    locals: Option<Range<usize>>,
    body: Option<Range<usize>>,
}

/// Names visible inside one routine body.
struct Scope<'v> {
    routine: SymbolId,
    locals: Vec<Variable>,
    globals: &'v [Variable],
    procedures: &'v [String],
}

impl Scope<'_> {
    fn lookup(&self, name: &str) -> Option<&Variable> {
        self.locals
            .iter()
            .chain(self.globals.iter())
            .find(|v| is_same_name(&v.name, name))
    }

    fn implicit_record(&self) -> Option<&Variable> {
        self.globals
            .iter()
            .find(|v| v.implicit && v.name == "Rec")
    }
}

struct Call {
    /// Receiver (or method name) start through the closing parenthesis.
    range: Range<usize>,
    receiver: Option<Range<usize>>,
    method: String,
    arguments: Vec<Range<usize>>,
}

enum Receiver<'v> {
    None,
    Variable(&'v Variable, Range<usize>),
    Implicit(&'v Variable),
    Static(TypeKind, Range<usize>),
    Unknown(Range<usize>),
}

struct Target<'v> {
    kind: MethodKind,
    signature: &'static [&'static str],
    receiver: Receiver<'v>,
}

struct Resolver<'a> {
    text: &'a Text,
    builder: TreeBuilder,
}

impl<'a> Resolver<'a> {
    fn compilation_unit(&mut self) -> anyhow::Result<()> {
        let text = self.text;
        let root = self.builder.push(
            None,
            NodeData::new(NodeKind::CompilationUnit, text.span(0..text.bare.len())),
        );

        let mut resume = 0;
        for caps in OBJECT_HEADER.captures_iter(&text.bare) {
            let (Some(header), Some(keyword), Some(name)) = (caps.get(0), caps.get(1), caps.get(2))
            else {
                continue;
            };
            if header.start() < resume || text.depth[header.start()] != 0 {
                continue;
            }
            let open = text.bare[header.end()..]
                .find('{')
                .map(|i| header.end() + i)
                .with_context(|| format!("object at {} has no body", text.span(header.range())))?;
            let close = text
                .matching_brace(open)
                .with_context(|| format!("object at {} is not closed", text.span(header.range())))?;

            let kind = SymbolKind::from_object_keyword(keyword.as_str())
                .with_context(|| format!("unknown object type {}", keyword.as_str()))?;
            let extends = caps.get(3).map(|m| text.name(m.range()).to_string());
            self.object(root, kind, header.start(), name.range(), extends, open, close)?;
            resume = close + 1;
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn object(
        &mut self,
        parent: NodeId,
        kind: SymbolKind,
        start: usize,
        name: Range<usize>,
        extends: Option<String>,
        open: usize,
        close: usize,
    ) -> anyhow::Result<()> {
        let text = self.text;
        let name = text.name(name).to_string();
        let inner = text.depth[open] + 1;
        let members = open + 1..close;

        let state = text
            .property(&OBSOLETE_STATE, members.clone(), inner)
            .and_then(|r| ObsoleteState::parse(&text.masked[r]))
            .unwrap_or_default();
        let object = self
            .builder
            .add_symbol(Symbol::new(kind, name.clone()).obsolete(state));
        let node = self.builder.push(
            Some(parent),
            NodeData::new(NodeKind::ObjectDeclaration, text.span(start..close + 1))
                .with_symbol(object)
                .contained_in(object),
        );

        let routines = self.routines(members.clone())?;

        let record = match kind {
            SymbolKind::Table => Some(name.clone()),
            SymbolKind::TableExtension => extends,
            SymbolKind::Page => text
                .property(&SOURCE_TABLE, members.clone(), inner)
                .map(|r| text.name(r).to_string()),
            _ => None,
        };
        let mut globals = Vec::new();
        if let Some(table) = record {
            for implicit in ["Rec", "xRec"] {
                let type_info = TypeInfo::named(TypeKind::Record, table.clone());
                let symbol = self.builder.add_symbol(
                    Symbol::new(SymbolKind::GlobalVariable, implicit)
                        .within(object)
                        .typed(type_info.clone()),
                );
                globals.push(Variable {
                    name: implicit.to_string(),
                    symbol,
                    kind: SymbolKind::GlobalVariable,
                    type_info,
                    implicit: true,
                });
            }
        }

        for var in VAR_KEYWORD.find_iter(&text.bare[members.clone()]) {
            let at = members.start + var.start();
            if text.depth[at] != inner || routines.iter().any(|r| r.extent.contains(&at)) {
                continue;
            }
            let end = routines
                .iter()
                .map(|r| r.extent.start)
                .filter(|&s| s > at)
                .min()
                .unwrap_or(close);
            for (name, type_info) in text.declarations(members.start + var.end()..end, false) {
                globals.push(self.declare(name, SymbolKind::GlobalVariable, type_info, object));
            }
        }

        let procedures: Vec<String> = routines
            .iter()
            .filter(|r| r.kind == SymbolKind::Method)
            .map(|r| text.name(r.name.clone()).to_string())
            .collect();

        for routine in &routines {
            self.routine(node, object, routine, &globals, &procedures);
        }
        Ok(())
    }

    fn routines(&self, members: Range<usize>) -> anyhow::Result<Vec<Routine>> {
        let text = self.text;
        let scope = &text.bare[..members.end];
        let mut routines: Vec<Routine> = Vec::new();

        for caps in ROUTINE_HEADER.captures_iter(&text.bare[members.clone()]) {
            let (Some(header), Some(keyword), Some(name)) = (caps.get(0), caps.get(1), caps.get(2))
            else {
                continue;
            };
            let header_start = members.start + header.start();
            if routines.last().map_or(false, |r| header_start < r.extent.end) {
                continue;
            }
            let open = members.start + header.end() - 1;
            let close = text
                .matching_paren(open, members.end)
                .with_context(|| format!("unclosed parameter list at {}", text.span(open..open + 1)))?;

            let floor = routines.last().map_or(members.start, |r| r.extent.end);
            let (attributes, obsolete) = text.attributes(header_start, floor);
            let next_header = ROUTINE_HEADER
                .find_at(scope, close)
                .map_or(members.end, |m| m.start());

            let (locals, body, end) = match BEGIN_KEYWORD.find_at(&scope[..next_header], close) {
                Some(begin) => {
                    let end = text.matching_end(begin.start(), members.end).with_context(|| {
                        format!("unbalanced begin/end at {}", text.span(begin.range()))
                    })?;
                    let locals = VAR_KEYWORD
                        .find_at(&scope[..begin.start()], close)
                        .map(|var| var.end()..begin.start());
                    (locals, Some(begin.start()..end), end)
                }
                // Declaration without a body (interfaces).
                None => (None, None, find_byte(scope.as_bytes(), close, b';').unwrap_or(close) + 1),
            };

            let kind = if keyword.as_str().eq_ignore_ascii_case("trigger") {
                SymbolKind::Trigger
            } else {
                SymbolKind::Method
            };
            routines.push(Routine {
                kind,
                name: members.start + name.start()..members.start + name.end(),
                obsolete,
                extent: attributes..end,
                header: header_start,
                parameters: open + 1..close,
                locals,
                body,
            });
        }
        Ok(routines)
    }

    fn declare(
        &mut self,
        name: String,
        kind: SymbolKind,
        type_info: TypeInfo,
        within: SymbolId,
    ) -> Variable {
        let symbol = self.builder.add_symbol(
            Symbol::new(kind, name.clone())
                .within(within)
                .typed(type_info.clone()),
        );
        Variable {
            name,
            symbol,
            kind,
            type_info,
            implicit: false,
        }
    }

    fn routine(
        &mut self,
        parent: NodeId,
        object: SymbolId,
        routine: &Routine,
        globals: &[Variable],
        procedures: &[String],
    ) {
        let text = self.text;
        let state = if routine.obsolete {
            ObsoleteState::Pending
        } else {
            ObsoleteState::None
        };
        let symbol = self.builder.add_symbol(
            Symbol::new(routine.kind, text.name(routine.name.clone()))
                .within(object)
                .obsolete(state),
        );

        let mut locals = Vec::new();
        for (name, type_info) in text.declarations(routine.parameters.clone(), true) {
            locals.push(self.declare(name, SymbolKind::Parameter, type_info, symbol));
        }
        if let Some(range) = &routine.locals {
            for (name, type_info) in text.declarations(range.clone(), false) {
                locals.push(self.declare(name, SymbolKind::LocalVariable, type_info, symbol));
            }
        }

        let kind = match routine.kind {
            SymbolKind::Trigger => NodeKind::TriggerDeclaration,
            _ => NodeKind::MethodDeclaration,
        };
        let declaration = self.builder.push(
            Some(parent),
            NodeData::new(kind, text.span(routine.header..routine.extent.end))
                .with_symbol(symbol)
                .contained_in(symbol),
        );

        let Some(body) = routine.body.clone() else {
            return;
        };
        let block = self.builder.push(
            Some(declaration),
            NodeData::new(NodeKind::Block, text.span(body.clone())).contained_in(symbol),
        );
        let calls = self.calls(body.clone());
        let scope = Scope {
            routine: symbol,
            locals,
            globals,
            procedures,
        };
        self.emit_calls(block, &calls, body, &scope);
    }

    fn calls(&self, body: Range<usize>) -> Vec<Call> {
        let text = self.text;
        let mut calls = Vec::new();

        for caps in CALL.captures_iter(&text.bare[body.clone()]) {
            let (Some(whole), Some(first)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let first = body.start + first.start()..body.start + first.end();
            let (receiver, method) = match caps.get(2) {
                Some(m) => (Some(first.clone()), body.start + m.start()..body.start + m.end()),
                None => (None, first.clone()),
            };
            let method = text.name(method).to_string();
            if receiver.is_none() && KEYWORDS.contains(method.to_ascii_lowercase().as_str()) {
                continue;
            }

            let open = body.start + whole.end() - 1;
            let Some(close) = text.matching_paren(open, body.end) else {
                log::debug!("unclosed call to {} at {}", method, text.span(first));
                continue;
            };
            calls.push(Call {
                range: first.start..close + 1,
                receiver,
                method,
                arguments: text.arguments(open + 1..close),
            });
        }
        calls
    }

    /// Emit the outermost calls lying within `within` under `parent`.
    fn emit_calls(&mut self, parent: NodeId, calls: &[Call], within: Range<usize>, scope: &Scope<'_>) {
        let mut cursor = within.start;
        for call in calls {
            if call.range.start < cursor || call.range.end > within.end {
                continue;
            }
            self.emit_call(parent, call, calls, scope);
            cursor = call.range.end;
        }
    }

    fn emit_call(&mut self, parent: NodeId, call: &Call, calls: &[Call], scope: &Scope<'_>) {
        let text = self.text;
        let target = self.target(call, scope);
        let invocation = self.builder.push(
            Some(parent),
            NodeData::new(NodeKind::InvocationExpression, text.span(call.range.clone()))
                .contained_in(scope.routine),
        );

        let receiver = match &target.receiver {
            Receiver::None => None,
            Receiver::Variable(variable, range) => {
                Some(variable.reference(text.span(range.clone()), scope.routine))
            }
            Receiver::Implicit(variable) => {
                let at = call.range.start;
                Some(variable.reference(text.span(at..at), scope.routine))
            }
            Receiver::Static(kind, range) => Some(
                NodeData::new(NodeKind::TypeReference, text.span(range.clone()))
                    .with_type(TypeInfo::new(*kind))
                    .contained_in(scope.routine),
            ),
            Receiver::Unknown(range) => Some(
                NodeData::new(NodeKind::Identifier, text.span(range.clone()))
                    .contained_in(scope.routine),
            ),
        };
        if let Some(receiver) = receiver {
            self.builder.push(Some(invocation), receiver);
        }

        let mut arguments = Vec::with_capacity(call.arguments.len());
        for (position, range) in call.arguments.iter().enumerate() {
            let argument = self.builder.push(
                Some(invocation),
                NodeData::new(NodeKind::Argument, text.span(range.clone()))
                    .contained_in(scope.routine),
            );
            // `Name := value` binds by name, anything else by position.
            let (parameter, value) = match NAMED_ARGUMENT.captures(&text.bare[range.clone()]) {
                Some(caps) => {
                    let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                        continue;
                    };
                    (
                        Some(name.as_str().to_string()),
                        range.start + whole.end()..range.end,
                    )
                }
                None => (
                    target.signature.get(position).map(|p| p.to_string()),
                    range.clone(),
                ),
            };
            let nested = calls
                .iter()
                .any(|c| c.range.start >= value.start && c.range.end <= value.end);
            if nested {
                self.emit_calls(argument, calls, value, scope);
            } else {
                self.emit_operand(argument, value, scope);
            }
            arguments.push(BoundArgument {
                parameter,
                value: Some(argument),
            });
        }

        if let Some(node) = self.builder.node_mut(invocation) {
            node.invocation = Some(Invocation {
                method: TargetMethod {
                    name: call.method.clone(),
                    kind: target.kind,
                },
                arguments,
            });
        }
    }

    fn emit_operand(&mut self, parent: NodeId, range: Range<usize>, scope: &Scope<'_>) {
        let text = self.text;
        let operand = text.masked[range.clone()].trim();
        let span = text.span(range);
        let node = match scope.lookup(operand).filter(|_| IDENTIFIER.is_match(operand)) {
            Some(variable) => variable.reference(span, scope.routine),
            None => NodeData::new(NodeKind::Literal, span).contained_in(scope.routine),
        };
        self.builder.push(Some(parent), node);
    }

    fn target<'v>(&self, call: &Call, scope: &'v Scope<'v>) -> Target<'v> {
        let method = call.method.to_ascii_lowercase();
        let method = method.as_str();

        let Some(range) = call.receiver.clone() else {
            if scope.procedures.iter().any(|p| is_same_name(p, &call.method)) {
                return user_method(Receiver::None);
            }
            if let Some(signature) = GLOBAL_METHODS.get(method) {
                return built_in(*signature, Receiver::None);
            }
            if let (Some(record), Some(signature)) =
                (scope.implicit_record(), RECORD_METHODS.get(method))
            {
                return built_in(*signature, Receiver::Implicit(record));
            }
            return user_method(Receiver::None);
        };

        let name = self.text.name(range.clone());
        if let Some(variable) = scope.lookup(name) {
            return match variable.type_info.kind {
                TypeKind::Record => match RECORD_METHODS.get(method) {
                    Some(signature) => built_in(*signature, Receiver::Variable(variable, range)),
                    None => user_method(Receiver::Variable(variable, range)),
                },
                TypeKind::Codeunit => user_method(Receiver::Variable(variable, range)),
                _ => built_in(NO_PARAMETERS, Receiver::Variable(variable, range)),
            };
        }
        match static_receiver(name) {
            Some(TypeKind::IsolatedStorage) => built_in(
                ISOLATED_STORAGE_METHODS
                    .get(method)
                    .copied()
                    .unwrap_or(NO_PARAMETERS),
                Receiver::Static(TypeKind::IsolatedStorage, range),
            ),
            Some(kind) => built_in(NO_PARAMETERS, Receiver::Static(kind, range)),
            None => user_method(Receiver::Unknown(range)),
        }
    }
}

fn built_in<'v>(signature: &'static [&'static str], receiver: Receiver<'v>) -> Target<'v> {
    Target {
        kind: MethodKind::BuiltInMethod,
        signature,
        receiver,
    }
}

fn user_method(receiver: Receiver<'_>) -> Target<'_> {
    Target {
        kind: MethodKind::Method,
        signature: NO_PARAMETERS,
        receiver,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CODEUNIT: &str = r#"codeunit 50100 "My Codeunit"
{
    // Cust.Delete(); in a comment
    var
        GlobalCust: Record Customer;

    procedure Update(var Cust: Record Customer; Key: Text)
    var
        Item: Record Item temporary;
    begin
        Cust.Modify(true);
        if not Item.Insert() then
            Message('Cust.Delete(%1)', Key);
        IsolatedStorage.Delete(Key);
        GlobalCust.ModifyAll("Search Name", '', false);
    end;

    [Obsolete('Use Update', '23.0')]
    procedure Legacy()
    begin
        GlobalCust.Delete();
    end;
}
"#;

    fn resolve(source: &str) -> SemanticTree {
        FixtureFrontend.resolve("test.al", source).unwrap()
    }

    fn invocations(tree: &SemanticTree) -> Vec<(String, Option<TypeKind>, Vec<Option<String>>)> {
        tree.nodes()
            .filter_map(|n| {
                let invocation = n.invocation()?;
                let receiver = n.children().next().and_then(|c| {
                    (c.kind() != NodeKind::Argument).then(|| c.type_kind()).flatten()
                });
                let parameters = invocation.arguments.iter().map(|a| a.parameter.clone()).collect();
                Some((invocation.method.name.clone(), receiver, parameters))
            })
            .collect()
    }

    #[test]
    fn test_mask_keeps_offsets() {
        let source = "a // b\n'x''y' \"q r\" /* c\nd */ e";
        let (masked, bare) = mask(source).unwrap();
        assert_eq!(masked.len(), source.len());
        assert_eq!(masked, "a     \n'    ' \"q r\"     \n     e");
        assert_eq!(bare, "a     \n'    ' \"   \"     \n     e");
    }

    #[test]
    fn test_resolves_calls_in_document_order() {
        let tree = resolve(CODEUNIT);
        let calls = invocations(&tree);
        let names: Vec<_> = calls.iter().map(|c| c.0.as_str()).collect();
        assert_eq!(names, vec!["Modify", "Insert", "Message", "Delete", "ModifyAll", "Delete"]);

        assert_eq!(calls[0].1, Some(TypeKind::Record));
        assert_eq!(calls[0].2, vec![Some("RunTrigger".to_string())]);
        assert!(calls[1].2.is_empty());
        assert_eq!(calls[3].1, Some(TypeKind::IsolatedStorage));
        assert_eq!(calls[3].2, vec![Some("Key".to_string())]);
        assert_eq!(calls[4].2[2], Some("RunTrigger".to_string()));
    }

    #[test]
    fn test_call_span_covers_receiver_through_parenthesis() {
        let tree = resolve(CODEUNIT);
        let call = tree
            .nodes()
            .find(|n| n.invocation().map_or(false, |i| i.method.name == "Modify"))
            .unwrap();
        assert_eq!(call.text(), Some("Cust.Modify(true)"));
        let receiver = call.children().next().unwrap();
        assert_eq!(receiver.kind(), NodeKind::ParameterReference);
        assert_eq!(receiver.symbol().unwrap().name(), "Cust");
    }

    #[test]
    fn test_symbols_and_obsolete_attribute() {
        let tree = resolve(CODEUNIT);
        let object = tree.roots().next().unwrap().children().next().unwrap();
        assert_eq!(object.kind(), NodeKind::ObjectDeclaration);
        assert_eq!(object.symbol().unwrap().name(), "My Codeunit");

        let methods: Vec<_> = object.children().collect();
        assert_eq!(methods.len(), 2);
        assert_eq!(
            methods[0].symbol().unwrap().obsolete_state(),
            ObsoleteState::None
        );
        assert_eq!(
            methods[1].symbol().unwrap().obsolete_state(),
            ObsoleteState::Pending
        );

        let item = tree.symbols().iter().find(|s| s.name == "Item").unwrap();
        assert_eq!(item.kind, SymbolKind::LocalVariable);
        assert!(item.type_info.as_ref().unwrap().temporary);
    }

    #[test]
    fn test_nested_calls_sit_under_arguments() {
        let tree = resolve(
            "codeunit 1 C
{
    procedure P()
    var
        Cust: Record Customer;
    begin
        if Confirm('Sure?') then
            Cust.Insert(Confirm('Triggers?'));
    end;
}",
        );
        let insert = tree
            .nodes()
            .find(|n| n.invocation().map_or(false, |i| i.method.name == "Insert"))
            .unwrap();
        let nested: Vec<_> = insert
            .descendants()
            .filter_map(|n| n.invocation().map(|i| i.method.name.clone()))
            .collect();
        assert_eq!(nested, vec!["Confirm"]);
        assert_eq!(insert.invocation().unwrap().arguments[0].parameter.as_deref(), Some("RunTrigger"));
    }

    #[test]
    fn test_implicit_rec_and_object_obsolete_state() {
        let tree = resolve(
            "table 50100 \"My Table\"
{
    ObsoleteState = Pending;
    ObsoleteReason = 'Replaced';

    fields
    {
        field(1; \"No.\"; Code[20]) { }
    }

    trigger OnInsert()
    begin
        Modify();
    end;
}",
        );
        let table = &tree.symbols()[0];
        assert_eq!(table.kind, SymbolKind::Table);
        assert_eq!(table.obsolete_state, ObsoleteState::Pending);

        let modify = tree.nodes().find(|n| n.invocation().is_some()).unwrap();
        assert_eq!(modify.invocation().unwrap().method.kind, MethodKind::BuiltInMethod);
        let receiver = modify.children().next().unwrap();
        assert_eq!(receiver.symbol().unwrap().name(), "Rec");
        assert_eq!(
            receiver.resolved_type().unwrap().name.as_deref(),
            Some("My Table")
        );
    }

    #[test]
    fn test_page_source_table_and_user_procedures() {
        let tree = resolve(
            "page 50100 \"Cust Card\"
{
    SourceTable = Customer;

    local procedure Delete()
    begin
    end;

    trigger OnOpenPage()
    begin
        Delete();
        Rec.Delete();
    end;
}",
        );
        let kinds: Vec<_> = tree
            .nodes()
            .filter_map(|n| n.invocation().map(|i| i.method.kind))
            .collect();
        assert_eq!(kinds, vec![MethodKind::Method, MethodKind::BuiltInMethod]);
    }

    #[test]
    fn test_named_arguments_bind_by_name() {
        let tree = resolve(
            "codeunit 1 C
{
    procedure P(var Cust: Record Customer)
    begin
        Cust.Modify(RunTrigger := true);
        Cust.Modify(Unrelated := true);
    end;
}",
        );
        let calls = invocations(&tree);
        assert_eq!(calls[0].2, vec![Some("RunTrigger".to_string())]);
        assert_eq!(calls[1].2, vec![Some("Unrelated".to_string())]);
    }

    #[test]
    fn test_unbalanced_object_is_an_error() {
        assert!(FixtureFrontend
            .resolve("bad.al", "codeunit 1 C\n{\n procedure P()\n begin\n")
            .is_err());
    }
}
