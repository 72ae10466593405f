//! AST for the 4GL dialect.
//!
//! One variant per recognized construct, with named fields. The serialized
//! form is the tagged `{type, value, children, metadata}` shape consumed
//! downstream; [`Node::to_json`] renders it with the omission rules the
//! consumers depend on: `type` is always present, `value` only when
//! non-empty, `children` only when the list is non-empty, `metadata` only
//! when the map is non-empty.

use serde_json::{json, Map, Value};

use crate::analyzer::ProcedureAnalysis;

/// Kind tag of a literal expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    /// A double-quoted string (value keeps its quotes).
    String,
    /// A numeric literal.
    Number,
    /// `VRAI`/`FAUX`/`TRUE`/`FALSE`.
    Boolean,
}

impl LiteralKind {
    /// The tag used in serialized metadata.
    pub fn as_str(&self) -> &'static str {
        match self {
            LiteralKind::String => "string",
            LiteralKind::Number => "number",
            LiteralKind::Boolean => "boolean",
        }
    }
}

/// A node in the 4GL syntax tree.
///
/// Children are exclusively owned and kept in source order.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Root of a parsed source file.
    Program {
        total_lines: usize,
        /// Sorted names of every global variable seen.
        global_variables: Vec<String>,
        /// Sorted names of every function called.
        functions_called: Vec<String>,
        procedures_count: usize,
        children: Vec<Node>,
    },
    /// A `//` comment or blank line.
    Comment { text: String, is_documentation: bool },
    /// A `PROCÉDURE name(params)` block with its body and inferred summary.
    Procedure {
        name: String,
        parameters: Vec<String>,
        body: Vec<Node>,
        analysis: ProcedureAnalysis,
    },
    /// `name est un(e) type [= init]`.
    VariableDeclaration {
        name: String,
        var_type: String,
        is_global: bool,
        is_parameter: bool,
        is_array: bool,
        is_associative_array: bool,
        initializer: Option<Box<Node>>,
    },
    /// `left = right`.
    Assignment { left: Box<Node>, right: Box<Node> },
    /// `left op= right` for `+= -= *= /=`.
    CompoundAssignment {
        operator: String,
        left: Box<Node>,
        right: Box<Node>,
    },
    /// `POUR i = start _À_ end … FIN`.
    ForLoop {
        iterator: String,
        start: String,
        end: String,
        body: Vec<Node>,
    },
    /// `SI cond ALORS … [SINON …] FIN`.
    IfStatement {
        condition: String,
        then_branch: Vec<Node>,
        else_branch: Vec<Node>,
    },
    /// `RENVOYER expr`.
    ReturnStatement { text: String, value: Box<Node> },
    /// Bare `SORTIR`.
    BreakStatement,
    /// `Dialogue(args)`.
    DialogCall { args: Vec<Node>, is_error_dialog: bool },
    /// A generic `name(args)` call.
    FunctionCall {
        name: String,
        args: Vec<Node>,
        is_api_call: bool,
        is_business_function: bool,
    },
    /// String, number, or boolean literal (text kept verbatim).
    Literal { text: String, kind: LiteralKind },
    /// A plain identifier.
    Identifier { name: String },
    /// An identifier following the global naming convention.
    GlobalVariable { name: String },
    /// `name[index]`.
    ArrayAccess {
        array: String,
        index_text: String,
        index: Box<Node>,
        is_global: bool,
    },
    /// `name[a][b]…` with two or more bracket groups.
    ChainAccess {
        base: String,
        /// Raw text of each bracket group, in order.
        accesses: Vec<String>,
        children: Vec<Node>,
        is_global: bool,
    },
    /// String concatenation split on top-level `+`.
    Concatenation { parts: Vec<Node> },
    /// A single binary operator application.
    BinaryOperation {
        operator: String,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    /// Render the tagged wire shape.
    pub fn to_json(&self) -> Value {
        match self {
            Node::Program {
                total_lines,
                global_variables,
                functions_called,
                procedures_count,
                children,
            } => tagged(
                "Program",
                None,
                children.iter().map(Node::to_json).collect(),
                metadata(|m| {
                    m.insert("total_lines".into(), json!(total_lines));
                    m.insert("global_variables".into(), json!(global_variables));
                    m.insert("functions_called".into(), json!(functions_called));
                    m.insert("procedures_count".into(), json!(procedures_count));
                }),
            ),
            Node::Comment {
                text,
                is_documentation,
            } => tagged(
                "Comment",
                some_nonempty(text),
                vec![],
                metadata(|m| {
                    m.insert("is_documentation".into(), json!(is_documentation));
                }),
            ),
            Node::Procedure {
                name,
                parameters,
                body,
                analysis,
            } => tagged(
                "Procedure",
                Some(name.clone()),
                body.iter().map(Node::to_json).collect(),
                metadata(|m| {
                    m.insert("parameters".into(), json!(parameters));
                    m.insert("parameter_count".into(), json!(parameters.len()));
                    m.insert("body_statements".into(), json!(body.len()));
                    m.insert("analysis".into(), analysis.to_json());
                }),
            ),
            Node::VariableDeclaration {
                name,
                var_type,
                is_global,
                is_parameter,
                is_array,
                is_associative_array,
                initializer,
            } => tagged(
                "VariableDeclaration",
                Some(name.clone()),
                initializer.iter().map(|n| n.to_json()).collect(),
                metadata(|m| {
                    m.insert("var_type".into(), json!(var_type));
                    m.insert("is_global".into(), json!(is_global));
                    m.insert("is_parameter".into(), json!(is_parameter));
                    m.insert("is_array".into(), json!(is_array));
                    m.insert("is_associative_array".into(), json!(is_associative_array));
                }),
            ),
            Node::Assignment { left, right } => tagged(
                "Assignment",
                None,
                vec![left.to_json(), right.to_json()],
                metadata(|m| {
                    m.insert("operator".into(), json!("="));
                }),
            ),
            Node::CompoundAssignment {
                operator,
                left,
                right,
            } => tagged(
                "CompoundAssignment",
                None,
                vec![left.to_json(), right.to_json()],
                metadata(|m| {
                    m.insert("operator".into(), json!(operator));
                }),
            ),
            Node::ForLoop {
                iterator,
                start,
                end,
                body,
            } => tagged(
                "ForLoop",
                None,
                body.iter().map(Node::to_json).collect(),
                metadata(|m| {
                    m.insert("iterator".into(), json!(iterator));
                    m.insert("start".into(), json!(start));
                    m.insert("end".into(), json!(end));
                    m.insert("body_statements".into(), json!(body.len()));
                }),
            ),
            Node::IfStatement {
                condition,
                then_branch,
                else_branch,
            } => {
                // Branches serialize as synthetic wrapper nodes; the else
                // wrapper is attached only when the branch is non-empty.
                let mut children = vec![branch_json("ThenBranch", then_branch)];
                if !else_branch.is_empty() {
                    children.push(branch_json("ElseBranch", else_branch));
                }
                tagged(
                    "IfStatement",
                    None,
                    children,
                    metadata(|m| {
                        m.insert("condition".into(), json!(condition));
                        m.insert("has_else".into(), json!(!else_branch.is_empty()));
                    }),
                )
            }
            Node::ReturnStatement { text, value } => tagged(
                "ReturnStatement",
                Some(text.clone()),
                vec![value.to_json()],
                Map::new(),
            ),
            Node::BreakStatement => {
                tagged("BreakStatement", Some("SORTIR".into()), vec![], Map::new())
            }
            Node::DialogCall {
                args,
                is_error_dialog,
            } => tagged(
                "DialogCall",
                Some("Dialogue".into()),
                args.iter().map(Node::to_json).collect(),
                metadata(|m| {
                    m.insert("argument_count".into(), json!(args.len()));
                    m.insert("is_error_dialog".into(), json!(is_error_dialog));
                }),
            ),
            Node::FunctionCall {
                name,
                args,
                is_api_call,
                is_business_function,
            } => tagged(
                "FunctionCall",
                Some(name.clone()),
                args.iter().map(Node::to_json).collect(),
                metadata(|m| {
                    m.insert("argument_count".into(), json!(args.len()));
                    m.insert("is_api_call".into(), json!(is_api_call));
                    m.insert("is_business_function".into(), json!(is_business_function));
                }),
            ),
            Node::Literal { text, kind } => tagged(
                "Literal",
                Some(text.clone()),
                vec![],
                metadata(|m| {
                    m.insert("literal_type".into(), json!(kind.as_str()));
                }),
            ),
            Node::Identifier { name } => tagged(
                "Identifier",
                Some(name.clone()),
                vec![],
                metadata(|m| {
                    m.insert("is_global".into(), json!(false));
                }),
            ),
            Node::GlobalVariable { name } => tagged(
                "GlobalVariable",
                Some(name.clone()),
                vec![],
                metadata(|m| {
                    m.insert("is_global".into(), json!(true));
                }),
            ),
            Node::ArrayAccess {
                array,
                index_text,
                index,
                is_global,
            } => tagged(
                "ArrayAccess",
                Some(array.clone()),
                vec![index.to_json()],
                metadata(|m| {
                    m.insert("index".into(), json!(index_text));
                    m.insert("is_global".into(), json!(is_global));
                }),
            ),
            Node::ChainAccess {
                base,
                accesses,
                children,
                is_global,
            } => tagged(
                "ChainAccess",
                Some(base.clone()),
                children.iter().map(Node::to_json).collect(),
                metadata(|m| {
                    m.insert("access_chain".into(), json!(accesses));
                    m.insert("depth".into(), json!(accesses.len()));
                    m.insert("is_global".into(), json!(is_global));
                }),
            ),
            Node::Concatenation { parts } => tagged(
                "Concatenation",
                None,
                parts.iter().map(Node::to_json).collect(),
                metadata(|m| {
                    m.insert("part_count".into(), json!(parts.len()));
                }),
            ),
            Node::BinaryOperation {
                operator,
                left,
                right,
            } => tagged(
                "BinaryOperation",
                None,
                vec![left.to_json(), right.to_json()],
                metadata(|m| {
                    m.insert("operator".into(), json!(operator));
                }),
            ),
        }
    }
}

fn branch_json(tag: &str, body: &[Node]) -> Value {
    tagged(
        tag,
        None,
        body.iter().map(Node::to_json).collect(),
        metadata(|m| {
            m.insert("statement_count".into(), json!(body.len()));
        }),
    )
}

fn tagged(tag: &str, value: Option<String>, children: Vec<Value>, meta: Map<String, Value>) -> Value {
    let mut out = Map::new();
    out.insert("type".into(), json!(tag));
    if let Some(v) = value {
        out.insert("value".into(), json!(v));
    }
    if !children.is_empty() {
        out.insert("children".into(), Value::Array(children));
    }
    if !meta.is_empty() {
        out.insert("metadata".into(), Value::Object(meta));
    }
    Value::Object(out)
}

fn metadata(fill: impl FnOnce(&mut Map<String, Value>)) -> Map<String, Value> {
    let mut m = Map::new();
    fill(&mut m);
    m
}

fn some_nonempty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}
