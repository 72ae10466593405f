//! Line-dispatch parser for the 4GL dialect.
//!
//! The parser walks the source one line at a time and recognizes a fixed
//! set of syntactic forms. Recognition order is part of the contract —
//! downstream consumers depend on it — and is preserved exactly:
//! comment, procedure header, variable declaration, `POUR` loop, `SI`
//! conditional, `RENVOYER`, `SORTIR`, compound assignment, plain
//! assignment, `Dialogue(` call, generic call. A line matching nothing is
//! dropped.
//!
//! Expressions are recognized form by form in the order documented on
//! [`Parser::parse_expression`]; operator trials split once at the first
//! top-level occurrence and recurse on both halves, so repeated operators
//! of one category associate right-heavy relative to scan order.

use std::collections::BTreeSet;

use codelift_lang_core::{text, LineCursor};
use tracing::debug;

use crate::analyzer::Analyzer;
use crate::ast::{LiteralKind, Node};
use crate::expr;
use crate::scope::ScopeStack;

const COMPOUND_OPS: [&str; 4] = ["+=", "-=", "*=", "/="];
const COMPARISON_OPS: [&str; 6] = ["<>", "<=", ">=", "<", ">", "="];
const ARITHMETIC_OPS: [&str; 4] = ["+", "-", "*", "/"];

/// Parser state for one source file.
pub struct Parser {
    cursor: LineCursor,
    scopes: ScopeStack,
    functions_called: BTreeSet<String>,
}

impl Parser {
    pub fn new(code: &str) -> Self {
        Self {
            cursor: LineCursor::new(code),
            scopes: ScopeStack::new(),
            functions_called: BTreeSet::new(),
        }
    }

    /// Parse the whole source into a program node.
    pub fn parse(mut self) -> Node {
        debug!(total_lines = self.cursor.len(), "parsing 4GL source");

        let mut children = Vec::new();
        while !self.cursor.at_end() {
            if let Some(node) = self.parse_statement() {
                children.push(node);
            }
            self.cursor.advance();
        }

        let procedures_count = children
            .iter()
            .filter(|n| matches!(n, Node::Procedure { .. }))
            .count();

        Node::Program {
            total_lines: self.cursor.len(),
            global_variables: self.scopes.globals_sorted(),
            functions_called: self.functions_called.iter().cloned().collect(),
            procedures_count,
            children,
        }
    }

    // ── Statement dispatch ─────────────────────────────────────────────

    fn parse_statement(&mut self) -> Option<Node> {
        let line = self.cursor.current().unwrap_or("").trim().to_string();

        if line.is_empty() || line.starts_with("//") {
            return Some(parse_comment(&line));
        }

        if text::starts_with_ci(&line, "PROCÉDURE") || text::starts_with_ci(&line, "PROCEDURE") {
            return self.parse_procedure(&line);
        }

        if is_variable_declaration(&line) {
            return self.parse_variable_declaration(&line);
        }

        if text::starts_with_ci(&line, "POUR") {
            return self.parse_for_loop(&line);
        }

        if text::starts_with_ci(&line, "SI") {
            return self.parse_if_statement(&line);
        }

        if text::starts_with_ci(&line, "RENVOYER") {
            return self.parse_return_statement(&line);
        }

        if text::eq_ci(&line, "SORTIR") {
            return Some(Node::BreakStatement);
        }

        if COMPOUND_OPS.iter().any(|op| line.contains(op)) {
            return self.parse_compound_assignment(&line);
        }

        if line.contains('=') && !is_comparison(&line) {
            return self.parse_assignment(&line);
        }

        if text::contains_ci(&line, "Dialogue(") {
            return self.parse_dialog_call(&line);
        }

        if line.contains('(') && line.contains(')') {
            return self.parse_function_call(&line);
        }

        None
    }

    // ── Procedures ─────────────────────────────────────────────────────

    fn parse_procedure(&mut self, line: &str) -> Option<Node> {
        let (name, params_text) = parse_procedure_header(line)?;
        let parameters: Vec<String> = params_text
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();

        // Procedure bodies get a fresh local frame; siblings never see
        // each other's locals.
        self.scopes.push();
        for param in &parameters {
            self.scopes.declare_local(param);
        }

        let mut body = Vec::new();
        self.cursor.advance();

        while !self.cursor.at_end() {
            let current = self.cursor.current().unwrap_or("").trim().to_string();
            if text::starts_with_ci(&current, "PROCÉDURE")
                || text::starts_with_ci(&current, "PROCEDURE")
            {
                self.cursor.retreat();
                break;
            }
            if let Some(node) = self.parse_statement() {
                body.push(node);
            }
            self.cursor.advance();
        }

        self.scopes.pop();

        let mut analyzer = Analyzer::new();
        for node in &body {
            analyzer.analyze(node, false);
        }
        let analysis = analyzer.summary(parameters.clone());

        Some(Node::Procedure {
            name,
            parameters,
            body,
            analysis,
        })
    }

    // ── Declarations ───────────────────────────────────────────────────

    fn parse_variable_declaration(&mut self, line: &str) -> Option<Node> {
        let words = words_with_positions(line);
        let decl = words.iter().enumerate().find(|(i, (_, w))| {
            text::eq_ci(w, "est")
                && *i >= 1
                && words
                    .get(i + 1)
                    .is_some_and(|(_, next)| text::eq_ci(next, "un") || text::eq_ci(next, "une"))
                && words.get(i + 2).is_some()
        });
        let (est_idx, _) = decl?;

        let name = words[est_idx - 1].1;
        if name.is_empty() || !name.chars().all(expr::is_word_char) {
            return None;
        }

        // Everything after `un`/`une` is the type text, with an optional
        // `= initializer` tail.
        let rest = &line[words[est_idx + 2].0..];
        let (type_text, init_text) = match rest.find('=') {
            Some(eq) => (rest[..eq].trim(), Some(rest[eq + 1..].trim())),
            None => (rest.trim(), None),
        };
        if type_text.is_empty()
            || !type_text
                .chars()
                .all(|c| expr::is_word_char(c) || c.is_whitespace() || c == '<' || c == '>')
        {
            return None;
        }
        let init_text = init_text.filter(|s| !s.is_empty());

        let is_global = name.starts_with('g');
        let is_parameter = name.starts_with('p') || name.starts_with('t');
        let is_array = text::contains_ci(type_text, "tableau");
        let is_associative_array = text::contains_ci(type_text, "associatif");

        if is_global {
            self.scopes.note_global(name);
        } else {
            self.scopes.declare_local(name);
        }

        let initializer = init_text.map(|s| Box::new(self.parse_expression(s)));

        Some(Node::VariableDeclaration {
            name: name.to_string(),
            var_type: type_text.to_string(),
            is_global,
            is_parameter,
            is_array,
            is_associative_array,
            initializer,
        })
    }

    // ── Control flow ───────────────────────────────────────────────────

    fn parse_for_loop(&mut self, line: &str) -> Option<Node> {
        let rest = text::strip_prefix_ci(line, "POUR")?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let rest = rest.trim_start();
        let iterator = expr::leading_ident(rest)?;
        let rest = rest[iterator.len()..].trim_start();
        let rest = rest.strip_prefix('=')?;

        let (start_text, end_text) = split_on_loop_marker(rest)?;
        if start_text.is_empty() || end_text.is_empty() {
            return None;
        }

        let mut body = Vec::new();
        self.cursor.advance();

        while !self.cursor.at_end() {
            let current = self.cursor.current().unwrap_or("").trim().to_string();
            if text::eq_ci(&current, "FIN") {
                break;
            }
            if let Some(node) = self.parse_statement() {
                body.push(node);
            }
            self.cursor.advance();
        }

        Some(Node::ForLoop {
            iterator: iterator.to_string(),
            start: start_text.to_string(),
            end: end_text.to_string(),
            body,
        })
    }

    fn parse_if_statement(&mut self, line: &str) -> Option<Node> {
        let rest = text::strip_prefix_ci(line, "SI")?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let rest = rest.trim_start();
        let alors = find_keyword(rest, "ALORS")?;
        let condition = rest[..alors].trim().to_string();
        if condition.is_empty() {
            return None;
        }

        let mut then_branch = Vec::new();
        let mut else_branch = Vec::new();
        let mut in_else = false;

        self.cursor.advance();

        while !self.cursor.at_end() {
            let current = self.cursor.current().unwrap_or("").trim().to_string();
            if text::eq_ci(&current, "FIN") {
                break;
            }
            if text::eq_ci(&current, "SINON") {
                in_else = true;
                self.cursor.advance();
                continue;
            }
            if let Some(node) = self.parse_statement() {
                if in_else {
                    else_branch.push(node);
                } else {
                    then_branch.push(node);
                }
            }
            self.cursor.advance();
        }

        Some(Node::IfStatement {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn parse_return_statement(&mut self, line: &str) -> Option<Node> {
        let rest = text::strip_prefix_ci(line, "RENVOYER")?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let value_text = rest.trim();
        if value_text.is_empty() {
            return None;
        }
        Some(Node::ReturnStatement {
            text: value_text.to_string(),
            value: Box::new(self.parse_expression(value_text)),
        })
    }

    // ── Assignments and calls ──────────────────────────────────────────

    fn parse_compound_assignment(&mut self, line: &str) -> Option<Node> {
        for op in COMPOUND_OPS {
            if let Some(idx) = line.find(op) {
                let left = line[..idx].trim();
                let right = line[idx + op.len()..].trim();
                return Some(Node::CompoundAssignment {
                    operator: op.to_string(),
                    left: Box::new(self.parse_expression(left)),
                    right: Box::new(self.parse_expression(right)),
                });
            }
        }
        None
    }

    fn parse_assignment(&mut self, line: &str) -> Option<Node> {
        let idx = line.find('=')?;
        let left = line[..idx].trim();
        let right = line[idx + 1..].trim();
        Some(Node::Assignment {
            left: Box::new(self.parse_expression(left)),
            right: Box::new(self.parse_expression(right)),
        })
    }

    fn parse_dialog_call(&mut self, line: &str) -> Option<Node> {
        let pos = text::find_ci(line, "Dialogue")?;
        let after = text::strip_prefix_ci(&line[pos..], "Dialogue")?;
        let after = after.trim_start();
        let args_body = after.strip_prefix('(')?;
        let close = args_body.rfind(')')?;
        let args_str = &args_body[..close];

        let args = if args_str.trim().is_empty() {
            Vec::new()
        } else {
            expr::split_arguments(args_str)
                .iter()
                .map(|a| self.parse_expression(a))
                .collect()
        };

        self.functions_called.insert("Dialogue".to_string());

        Some(Node::DialogCall {
            args,
            is_error_dialog: line.contains("dlgIcôneErreur") || line.contains("Erreur"),
        })
    }

    fn parse_function_call(&mut self, line: &str) -> Option<Node> {
        let (name, args_str) = find_call_form(line)?;

        self.functions_called.insert(name.to_string());

        let args = if args_str.trim().is_empty() {
            Vec::new()
        } else {
            expr::split_arguments(args_str)
                .iter()
                .map(|a| self.parse_expression(a))
                .collect()
        };

        let is_api_call = name.starts_with("_api") || name.to_lowercase().contains("api");
        let is_business_function = name.starts_with('_') || name.starts_with("fct");

        Some(Node::FunctionCall {
            name: name.to_string(),
            args,
            is_api_call,
            is_business_function,
        })
    }

    // ── Expressions ────────────────────────────────────────────────────

    /// Parse a single trimmed expression substring.
    ///
    /// Recognition order, first match wins: string literal, numeric
    /// literal, boolean keyword, chained bracket access, single bracket
    /// access (no parens), call form, concatenation, comparison operators
    /// (`<> <= >= < > =`), arithmetic operators (`+ - * /`), identifier.
    pub fn parse_expression(&mut self, raw: &str) -> Node {
        let expr = raw.trim();

        if expr.starts_with('"') && expr.ends_with('"') {
            return Node::Literal {
                text: expr.to_string(),
                kind: LiteralKind::String,
            };
        }

        if expr::is_numeric_literal(expr) {
            return Node::Literal {
                text: expr.to_string(),
                kind: LiteralKind::Number,
            };
        }

        if ["VRAI", "FAUX", "TRUE", "FALSE"]
            .iter()
            .any(|kw| text::eq_ci(expr, kw))
        {
            return Node::Literal {
                text: expr.to_string(),
                kind: LiteralKind::Boolean,
            };
        }

        if expr::is_chain_access(expr) {
            if let Some(node) = self.parse_chain_access(expr) {
                return node;
            }
        }

        if expr.contains('[') && expr.contains(']') && !expr.contains('(') {
            if let Some(node) = self.parse_array_access(expr) {
                return node;
            }
        }

        if expr.contains('(') && expr.contains(')') {
            // The call form terminates recognition; a paren-bearing
            // fragment that is not a call degrades to an identifier
            // rather than being mis-split on an inner operator.
            return match self.parse_function_call(expr) {
                Some(node) => node,
                None => self.identifier_fallback(expr),
            };
        }

        if expr.contains('+') && (expr.contains('"') || expr.contains(';')) {
            let parts = expr::split_concatenation(expr);
            if parts.len() > 1 {
                let children = parts.iter().map(|p| self.parse_expression(p)).collect();
                return Node::Concatenation { parts: children };
            }
        }

        for op in COMPARISON_OPS {
            if let Some((left, right)) = expr::split_top_level_once(expr, op) {
                return Node::BinaryOperation {
                    operator: op.to_string(),
                    left: Box::new(self.parse_expression(left.trim())),
                    right: Box::new(self.parse_expression(right.trim())),
                };
            }
        }

        for op in ARITHMETIC_OPS {
            if let Some((left, right)) = expr::split_top_level_once(expr, op) {
                return Node::BinaryOperation {
                    operator: op.to_string(),
                    left: Box::new(self.parse_expression(left.trim())),
                    right: Box::new(self.parse_expression(right.trim())),
                };
            }
        }

        self.identifier_fallback(expr)
    }

    fn identifier_fallback(&mut self, expr: &str) -> Node {
        if expr.starts_with('g') {
            self.scopes.note_global(expr);
            Node::GlobalVariable {
                name: expr.to_string(),
            }
        } else {
            Node::Identifier {
                name: expr.to_string(),
            }
        }
    }

    fn parse_array_access(&mut self, expr: &str) -> Option<Node> {
        let open = expr.find('[')?;
        let base_start = expr[..open]
            .char_indices()
            .rev()
            .take_while(|(_, c)| expr::is_word_char(*c))
            .last()
            .map(|(i, _)| i)?;
        let base = &expr[base_start..open];
        let inner = &expr[open + 1..];
        let close = inner.find(']')?;
        let index_text = &inner[..close];
        if index_text.is_empty() {
            return None;
        }

        let is_global = base.starts_with('g');
        if is_global {
            self.scopes.note_global(base);
        }

        let base = base.to_string();
        let index_text = index_text.to_string();
        let index = Box::new(self.parse_expression(&index_text));
        Some(Node::ArrayAccess {
            array: base,
            index_text,
            index,
            is_global,
        })
    }

    fn parse_chain_access(&mut self, expr: &str) -> Option<Node> {
        let base = expr::leading_ident(expr)?.to_string();
        let accesses = expr::bracket_groups(expr);
        let children = accesses
            .iter()
            .map(|a| self.parse_expression(a))
            .collect();

        let is_global = base.starts_with('g');
        if is_global {
            self.scopes.note_global(&base);
        }

        Some(Node::ChainAccess {
            base,
            accesses,
            children,
            is_global,
        })
    }
}

// ── Free recognition helpers ───────────────────────────────────────────

fn parse_comment(line: &str) -> Node {
    let content = line.trim_start_matches('/').trim();
    let is_documentation = content.starts_with("Résumé") || content.starts_with("Description");
    Node::Comment {
        text: content.to_string(),
        is_documentation,
    }
}

fn is_variable_declaration(line: &str) -> bool {
    text::contains_ci(line, "est un")
}

/// `x = 1` is an assignment; `<>`/`<=`/`>=` or an embedded
/// `SI … = … ALORS` fragment marks the `=` as a comparison instead.
fn is_comparison(line: &str) -> bool {
    let upper = text::to_upper(line);
    if upper.contains("<>") || upper.contains("<=") || upper.contains(">=") {
        return true;
    }

    for (i, _) in upper.char_indices() {
        if !upper[i..].starts_with("SI") {
            continue;
        }
        let before_ws = upper[..i].chars().next_back().is_some_and(char::is_whitespace);
        let after = &upper[i + 2..];
        if before_ws && after.starts_with(char::is_whitespace) {
            if let Some(eq) = after.find('=') {
                if after[eq..].contains("ALORS") {
                    return true;
                }
            }
        }
    }
    false
}

fn parse_procedure_header(line: &str) -> Option<(String, String)> {
    let rest = text::strip_prefix_ci(line, "PROCÉDURE")
        .or_else(|| text::strip_prefix_ci(line, "PROCEDURE"))?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let rest = rest.trim_start();
    let name = expr::leading_ident(rest)?;
    let after_name = rest[name.len()..].trim_start();
    let params_body = after_name.strip_prefix('(')?;
    let close = params_body.find(')')?;
    Some((name.to_string(), params_body[..close].to_string()))
}

/// Locate the `_À_` marker of a `POUR` header, returning the trimmed
/// start and end expressions around it.
fn split_on_loop_marker(rest: &str) -> Option<(&str, &str)> {
    let mut offset = 0;
    while let Some(found) = text::find_ci(&rest[offset..], "_À_") {
        let pos = offset + found;
        let before_ws = rest[..pos].chars().next_back().is_some_and(char::is_whitespace);
        if before_ws {
            if let Some(after) = text::strip_prefix_ci(&rest[pos..], "_À_") {
                if after.starts_with(char::is_whitespace) {
                    return Some((rest[..pos].trim(), after.trim()));
                }
            }
        }
        offset = pos + 1;
    }
    None
}

/// First occurrence of `word` preceded by whitespace (or returns `None`).
fn find_keyword(haystack: &str, word: &str) -> Option<usize> {
    let mut offset = 0;
    while let Some(found) = text::find_ci(&haystack[offset..], word) {
        let pos = offset + found;
        let before_ws = haystack[..pos]
            .chars()
            .next_back()
            .is_some_and(char::is_whitespace);
        if pos > 0 && before_ws {
            return Some(pos);
        }
        offset = pos + 1;
    }
    None
}

/// First `name(args)` shape: an identifier followed by `(`, arguments
/// running to the last `)` in the text.
fn find_call_form(line: &str) -> Option<(&str, &str)> {
    let close = line.rfind(')')?;
    let mut prev_is_word = false;

    for (i, ch) in line.char_indices() {
        let is_word = expr::is_word_char(ch);
        if is_word && !prev_is_word {
            let name_end = line[i..]
                .char_indices()
                .find(|(_, c)| !expr::is_word_char(*c))
                .map(|(j, _)| i + j)
                .unwrap_or(line.len());
            let after = &line[name_end..];
            let open_offset = after.len() - after.trim_start().len();
            if after.trim_start().starts_with('(') {
                let open = name_end + open_offset;
                if close > open {
                    return Some((&line[i..name_end], &line[open + 1..close]));
                }
            }
        }
        prev_is_word = is_word;
    }
    None
}

fn words_with_positions(line: &str) -> Vec<(usize, &str)> {
    let mut words = Vec::new();
    let mut start = None;
    for (i, ch) in line.char_indices() {
        if ch.is_whitespace() {
            if let Some(s) = start.take() {
                words.push((s, &line[s..i]));
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        words.push((s, &line[s..]));
    }
    words
}
