//! Raw-layer AST for COBOL source.
//!
//! These types mirror what the division parsers actually recognize: a data
//! item tree per section and a flat statement list per paragraph. Nesting
//! of control flow happens later, in [`crate::flow`]; semantic filtering
//! happens in [`crate::builder`].

use serde_json::json;

/// A coerced VALUE clause literal.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
}

impl Value {
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Str(s) => json!(s),
            Value::Int(n) => json!(n),
            Value::Float(f) => json!(f),
        }
    }
}

/// A data item declaration, with subordinate items attached by level.
#[derive(Debug, Clone, PartialEq)]
pub struct DataItem {
    /// COBOL level number (01-49 in practice).
    pub level: u8,
    pub name: String,
    /// PIC/PICTURE clause text.
    pub picture: Option<String>,
    /// USAGE clause text.
    pub usage: Option<String>,
    /// Coerced VALUE literal.
    pub value: Option<Value>,
    /// OCCURS count.
    pub occurs: Option<u32>,
    /// INDEXED BY name.
    pub indexed_by: Option<String>,
    /// REDEFINES target.
    pub redefines: Option<String>,
    pub is_filler: bool,
    /// Sequence-number field of the item's first line.
    pub sequence: String,
    pub children: Vec<DataItem>,
}

/// Parsed DATA DIVISION sections.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataDivision {
    pub file_section: Vec<DataItem>,
    pub working_storage: Vec<DataItem>,
    pub linkage: Vec<DataItem>,
}

/// Parsed PROCEDURE DIVISION.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcedureDivision {
    /// USING clause parameters from the division header.
    pub using: Vec<String>,
    pub paragraphs: Vec<RawParagraph>,
}

/// A paragraph with its flat statement list.
#[derive(Debug, Clone, PartialEq)]
pub struct RawParagraph {
    pub name: String,
    /// Sequence-number field of the label line.
    pub sequence: String,
    pub statements: Vec<RawStatement>,
}

/// A recognized statement plus the sequence field of its first line.
#[derive(Debug, Clone, PartialEq)]
pub struct RawStatement {
    pub sequence: String,
    pub statement: Statement,
}

/// One recognized statement form.
///
/// `Other` retains the first keyword and raw text of anything outside the
/// recognized set — unknown verbs degrade, they never fail the parse.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Perform(PerformStatement),
    If { condition: String },
    Else,
    EndIf,
    EndPerform,
    Compute(ComputeStatement),
    Move {
        source: Option<String>,
        targets: Vec<String>,
    },
    Initialize { targets: Vec<String> },
    Call {
        program: Option<String>,
        using: Vec<String>,
    },
    Exit { keyword: String },
    Display { items: Vec<String> },
    Accept { variable: Option<String> },
    Arithmetic(ArithmeticStatement),
    Copy { copybook: Option<String> },
    NextSentence,
    Other { keyword: String, content: String },
}

/// PERFORM with its independently extracted clauses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerformStatement {
    /// First identifier after PERFORM (the paragraph for a plain call).
    pub target: Option<String>,
    /// VARYING counter, set only when the full
    /// `VARYING … FROM … BY … UNTIL` chain is present.
    pub varying: Option<String>,
    pub from: Option<String>,
    pub by: Option<String>,
    /// UNTIL condition text.
    pub until: Option<String>,
    /// `PERFORM n TIMES` count.
    pub times: Option<u32>,
}

impl PerformStatement {
    /// An inline loop rather than a paragraph call.
    pub fn is_loop(&self) -> bool {
        self.varying.is_some()
    }
}

/// COMPUTE target/expression pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComputeStatement {
    pub target: Option<String>,
    pub rounded: bool,
    pub expression: Option<String>,
}

/// ADD/SUBTRACT/MULTIPLY/DIVIDE with GIVING/ROUNDED sub-parsing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArithmeticStatement {
    pub operation: String,
    pub operand1: Option<String>,
    pub operand2: Option<String>,
    pub rounded: bool,
    pub giving: Option<String>,
}

/// The raw parse of a whole program.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawProgram {
    pub program_id: Option<String>,
    pub data: Option<DataDivision>,
    pub procedure: Option<ProcedureDivision>,
}
