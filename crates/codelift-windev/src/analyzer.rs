//! Side-effect inference over parsed procedure bodies.
//!
//! One walk per procedure. A single flag threads through the traversal:
//! it is true only while descending into the left-hand child of an
//! assignment, so global names touched there count as writes and
//! everywhere else as reads.

use std::collections::BTreeSet;

use serde_json::{json, Value};

use crate::ast::{LiteralKind, Node};

/// Inferred effective signature of a procedure.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcedureAnalysis {
    pub parameters: Vec<String>,
    /// Global names read, sorted.
    pub global_reads: Vec<String>,
    /// Global names written, sorted.
    pub global_writes: Vec<String>,
    /// Unique returned expression texts, sorted.
    pub return_values: Vec<String>,
    pub return_count: usize,
    /// `"void"`, a single agreed type, or `"mixed"`.
    pub return_type: String,
    pub api_calls: Vec<String>,
    /// Upper-snake-case string literals assigned somewhere in the body;
    /// a best-effort guess at touched tables, not a verified fact.
    pub database_operations: Vec<String>,
    pub external_functions: Vec<String>,
    pub dialog_error_count: usize,
    pub dialog_info_count: usize,
}

impl ProcedureAnalysis {
    pub fn dialog_count(&self) -> usize {
        self.dialog_error_count + self.dialog_info_count
    }

    pub fn has_side_effects(&self) -> bool {
        !self.api_calls.is_empty()
            || !self.database_operations.is_empty()
            || self.dialog_count() > 0
    }

    /// The summary attached to the procedure node's metadata.
    pub fn to_json(&self) -> Value {
        json!({
            "inputs": {
                "parameters": self.parameters,
                "global_dependencies": self.global_reads,
            },
            "outputs": {
                "return_type": self.return_type,
                "return_values": self.return_values,
                "return_count": self.return_count,
                "global_modifications": self.global_writes,
            },
            "side_effects": {
                "api_calls": self.api_calls,
                "database_operations": self.database_operations,
                "dialogs": self.dialog_count(),
                "external_functions": self.external_functions,
            },
            "complexity": {
                "global_reads": self.global_reads.len(),
                "global_writes": self.global_writes.len(),
                "has_side_effects": self.has_side_effects(),
            },
        })
    }
}

/// Accumulator for one procedure body walk.
#[derive(Debug, Default)]
pub struct Analyzer {
    global_reads: BTreeSet<String>,
    global_writes: BTreeSet<String>,
    returns: Vec<(String, String)>,
    api_calls: BTreeSet<String>,
    tables: BTreeSet<String>,
    external_functions: BTreeSet<String>,
    dialog_errors: usize,
    dialog_infos: usize,
}

impl Analyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Visit one node. `in_assignment_left` is inherited by every child
    /// except across an assignment, which restarts it per side.
    pub fn analyze(&mut self, node: &Node, in_assignment_left: bool) {
        match node {
            Node::GlobalVariable { name } => {
                self.record_global(name, in_assignment_left);
            }
            Node::ArrayAccess {
                array,
                index,
                is_global,
                ..
            } => {
                if *is_global {
                    self.record_global(array, in_assignment_left);
                }
                self.analyze(index, in_assignment_left);
            }
            Node::ChainAccess {
                base,
                children,
                is_global,
                ..
            } => {
                if *is_global {
                    self.record_global(base, in_assignment_left);
                }
                for child in children {
                    self.analyze(child, in_assignment_left);
                }
            }
            Node::ReturnStatement { text, value } => {
                self.returns.push((text.clone(), infer_type(value)));
                self.analyze(value, in_assignment_left);
            }
            Node::FunctionCall {
                name,
                args,
                is_api_call,
                is_business_function,
            } => {
                if *is_api_call {
                    self.api_calls.insert(name.clone());
                }
                if *is_business_function {
                    self.external_functions.insert(name.clone());
                }
                for arg in args {
                    self.analyze(arg, in_assignment_left);
                }
            }
            Node::DialogCall {
                args,
                is_error_dialog,
            } => {
                if *is_error_dialog {
                    self.dialog_errors += 1;
                } else {
                    self.dialog_infos += 1;
                }
                for arg in args {
                    self.analyze(arg, in_assignment_left);
                }
            }
            Node::Assignment { left, right } => {
                if let Node::Literal { text, kind } = right.as_ref() {
                    if *kind == LiteralKind::String {
                        if let Some(table) = table_name(text) {
                            self.tables.insert(table);
                        }
                    }
                }
                self.analyze(left, true);
                self.analyze(right, false);
            }
            Node::CompoundAssignment { left, right, .. } => {
                self.analyze(left, true);
                self.analyze(right, false);
            }
            Node::VariableDeclaration { initializer, .. } => {
                if let Some(init) = initializer {
                    self.analyze(init, in_assignment_left);
                }
            }
            Node::ForLoop { body, .. } => {
                for child in body {
                    self.analyze(child, in_assignment_left);
                }
            }
            Node::IfStatement {
                then_branch,
                else_branch,
                ..
            } => {
                for child in then_branch.iter().chain(else_branch) {
                    self.analyze(child, in_assignment_left);
                }
            }
            Node::Concatenation { parts } => {
                for child in parts {
                    self.analyze(child, in_assignment_left);
                }
            }
            Node::BinaryOperation { left, right, .. } => {
                self.analyze(left, in_assignment_left);
                self.analyze(right, in_assignment_left);
            }
            Node::Program { children, .. } => {
                for child in children {
                    self.analyze(child, in_assignment_left);
                }
            }
            Node::Procedure { body, .. } => {
                for child in body {
                    self.analyze(child, in_assignment_left);
                }
            }
            Node::Comment { .. }
            | Node::Literal { .. }
            | Node::Identifier { .. }
            | Node::BreakStatement => {}
        }
    }

    fn record_global(&mut self, name: &str, in_assignment_left: bool) {
        if in_assignment_left {
            self.global_writes.insert(name.to_string());
        } else {
            self.global_reads.insert(name.to_string());
        }
    }

    /// Finish the walk and produce the summary.
    pub fn summary(self, parameters: Vec<String>) -> ProcedureAnalysis {
        let return_type = if self.returns.is_empty() {
            "void".to_string()
        } else {
            let types: BTreeSet<&str> = self.returns.iter().map(|(_, t)| t.as_str()).collect();
            if types.len() == 1 {
                types.into_iter().next().unwrap().to_string()
            } else {
                "mixed".to_string()
            }
        };

        let return_values: Vec<String> = self
            .returns
            .iter()
            .map(|(v, _)| v.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        ProcedureAnalysis {
            parameters,
            global_reads: self.global_reads.into_iter().collect(),
            global_writes: self.global_writes.into_iter().collect(),
            return_values,
            return_count: self.returns.len(),
            return_type,
            api_calls: self.api_calls.into_iter().collect(),
            database_operations: self.tables.into_iter().collect(),
            external_functions: self.external_functions.into_iter().collect(),
            dialog_error_count: self.dialog_errors,
            dialog_info_count: self.dialog_infos,
        }
    }
}

/// Best-effort type of a returned expression.
fn infer_type(node: &Node) -> String {
    match node {
        Node::Literal { kind, .. } => kind.as_str().to_string(),
        Node::FunctionCall { name, .. } => {
            let lower = name.to_lowercase();
            if lower.contains("date") {
                "date".to_string()
            } else if lower.contains("chaine") || lower.contains("string") {
                "string".to_string()
            } else if lower.contains("numeric") || lower.contains("entier") {
                "number".to_string()
            } else {
                "variant".to_string()
            }
        }
        _ => "inferred".to_string(),
    }
}

/// Extract an upper-snake-case table name from a quoted literal
/// (`"NOM_TABLE"`): fully uppercase, at least one underscore.
fn table_name(literal: &str) -> Option<String> {
    let body = literal.strip_prefix('"')?;
    let end = body.find('"')?;
    let run = &body[..end];
    let shape_ok = !run.is_empty()
        && run.chars().all(|c| c.is_ascii_uppercase() || c == '_')
        && run.contains('_')
        && run.chars().any(|c| c.is_ascii_uppercase());
    if shape_ok {
        Some(run.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Parser;

    fn analyze_body(code: &str) -> ProcedureAnalysis {
        let program = Parser::new(code).parse();
        let body = match program {
            Node::Program { children, .. } => children,
            _ => unreachable!(),
        };
        let mut analyzer = Analyzer::new();
        for node in &body {
            analyzer.analyze(node, false);
        }
        analyzer.summary(vec![])
    }

    #[test]
    fn assignment_left_is_a_write() {
        let summary = analyze_body("gTotal = gBase + 1");
        assert_eq!(summary.global_writes, vec!["gTotal"]);
        assert_eq!(summary.global_reads, vec!["gBase"]);
    }

    #[test]
    fn reads_outside_assignments() {
        let summary = analyze_body("Affiche(gSolde)");
        assert_eq!(summary.global_reads, vec!["gSolde"]);
        assert!(summary.global_writes.is_empty());
    }

    #[test]
    fn return_type_agreement() {
        let summary = analyze_body("RENVOYER \"oui\"");
        assert_eq!(summary.return_type, "string");
        assert_eq!(summary.return_count, 1);

        let summary = analyze_body("RENVOYER 1\nRENVOYER \"x\"");
        assert_eq!(summary.return_type, "mixed");
        assert_eq!(summary.return_values, vec!["\"x\"", "1"]);
    }

    #[test]
    fn void_without_returns() {
        let summary = analyze_body("gX = 1");
        assert_eq!(summary.return_type, "void");
    }

    #[test]
    fn table_heuristic_on_assignment_rhs() {
        let summary = analyze_body("sTable = \"CLIENT_FACTURE\"");
        assert_eq!(summary.database_operations, vec!["CLIENT_FACTURE"]);
        assert!(summary.has_side_effects());

        // Lowercase or underscore-free literals are not tables.
        let summary = analyze_body("sTable = \"client\"\nsAutre = \"FACTURE\"");
        assert!(summary.database_operations.is_empty());
    }

    #[test]
    fn api_and_business_calls_are_split() {
        let summary = analyze_body("_apiEnvoie(1)\nfctCalcule(2)");
        assert_eq!(summary.api_calls, vec!["_apiEnvoie"]);
        // `_apiEnvoie` also matches the business prefix convention.
        assert_eq!(summary.external_functions, vec!["_apiEnvoie", "fctCalcule"]);
        assert!(summary.has_side_effects());
    }

    #[test]
    fn dialog_calls_are_counted_by_kind() {
        let summary =
            analyze_body("Dialogue(\"Erreur grave\")\nDialogue(\"info\")\nDialogue(\"autre\")");
        assert_eq!(summary.dialog_error_count, 1);
        assert_eq!(summary.dialog_info_count, 2);
        assert_eq!(summary.dialog_count(), 3);
    }

    #[test]
    fn summary_json_shape() {
        let summary = analyze_body("gA = 1\nRENVOYER gA");
        let v = summary.to_json();
        assert_eq!(v["outputs"]["return_type"], "inferred");
        assert_eq!(v["outputs"]["global_modifications"], json!(["gA"]));
        assert_eq!(v["inputs"]["global_dependencies"], json!(["gA"]));
        assert_eq!(v["complexity"]["has_side_effects"], false);
        assert_eq!(v["side_effects"]["dialogs"], 0);
    }
}
