use serde::{Deserialize, Serialize};
use serde_json::Value;
use ustr::Ustr;

/// The semantic kind of a symbol as reported by the analysis backend.
///
/// The `name` string form is what sibling ordering keys off of, so the
/// mapping must stay stable; appending new kinds is fine, renaming is not.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SymbolKind {
    File,
    Module,
    Namespace,
    Package,
    Class,
    Method,
    Property,
    Field,
    Constructor,
    Enum,
    Interface,
    Function,
    Variable,
    Constant,
    String,
    Number,
    Boolean,
    Array,
    Object,
    Key,
    Null,
    EnumMember,
    Struct,
    Event,
    Operator,
    TypeParameter,
}

impl SymbolKind {
    pub fn name(&self) -> &'static str {
        match self {
            SymbolKind::File => "file",
            SymbolKind::Module => "module",
            SymbolKind::Namespace => "namespace",
            SymbolKind::Package => "package",
            SymbolKind::Class => "class",
            SymbolKind::Method => "method",
            SymbolKind::Property => "property",
            SymbolKind::Field => "field",
            SymbolKind::Constructor => "constructor",
            SymbolKind::Enum => "enum",
            SymbolKind::Interface => "interface",
            SymbolKind::Function => "function",
            SymbolKind::Variable => "variable",
            SymbolKind::Constant => "constant",
            SymbolKind::String => "string",
            SymbolKind::Number => "number",
            SymbolKind::Boolean => "boolean",
            SymbolKind::Array => "array",
            SymbolKind::Object => "object",
            SymbolKind::Key => "key",
            SymbolKind::Null => "null",
            SymbolKind::EnumMember => "enumMember",
            SymbolKind::Struct => "struct",
            SymbolKind::Event => "event",
            SymbolKind::Operator => "operator",
            SymbolKind::TypeParameter => "typeParameter",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolTag {
    Deprecated,
}

/// A point in a source file, 1-based line, 0-based column.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lineno: u32,
    pub col: u32,
}

#[derive(Clone, Debug, Eq, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceRange {
    pub start_lineno: u32,
    pub start_col: u32,
    pub end_lineno: u32,
    pub end_col: u32,
}

impl SourceRange {
    pub fn contains(&self, pos: &Position) -> bool {
        if pos.lineno < self.start_lineno || pos.lineno > self.end_lineno {
            return false;
        }
        if pos.lineno == self.start_lineno && pos.col < self.start_col {
            return false;
        }
        if pos.lineno == self.end_lineno && pos.col > self.end_col {
            return false;
        }
        true
    }

    pub fn contains_range(&self, other: &SourceRange) -> bool {
        (self.start_lineno, self.start_col) <= (other.start_lineno, other.start_col)
            && (other.end_lineno, other.end_col) <= (self.end_lineno, self.end_col)
    }
}

/// One symbol's descriptive data as reported by the hierarchy query service.
///
/// Items are produced only by the backend and are immutable once fetched; the
/// tree model wraps them but never rewrites their fields.  `selection_range`
/// is expected to be contained within `range`; the backend owns that
/// invariant and we only warn when it is visibly violated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HierarchyItem {
    pub name: Ustr,
    pub kind: SymbolKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<SymbolTag>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub uri: Ustr,
    pub range: SourceRange,
    pub selection_range: SourceRange,
    /// Opaque correlation payload owned by whichever backend produced the
    /// item; round-tripped on every related-symbol query.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}
