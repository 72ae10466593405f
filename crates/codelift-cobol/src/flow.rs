//! Control-flow reconstruction: flat statement list → nested tree.
//!
//! The division parser only recognizes line-level statement kinds; `IF`,
//! `ELSE`, `END-IF`, `PERFORM … VARYING`, and `END-PERFORM` arrive as flat
//! markers. This module is the single canonical nesting pass: a stack
//! machine that opens a frame per `IF`/loop, swaps the active branch on
//! `ELSE`, closes on the matching terminator, and emits semantic
//! [`ControlFlow`] nodes.
//!
//! Tolerances, kept deliberately:
//! - a stray `ELSE` with no open `IF` (or one already in its else branch)
//!   is ignored rather than corrupting an unrelated open block;
//! - `END-IF`/`END-PERFORM` with no matching frame are ignored;
//! - frames still open at end of input are force-closed, never reported.

use serde_json::{json, Map, Value};

use crate::ast::{RawStatement, Statement};

/// A semantic control-flow node.
///
/// Statement kinds outside this set (DISPLAY, ACCEPT, arithmetic verbs,
/// COPY, …) carry no business meaning at this layer and are dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlFlow {
    If {
        condition: Option<String>,
        then_block: Vec<ControlFlow>,
        else_block: Vec<ControlFlow>,
    },
    /// A PERFORM, with the UNTIL condition when one was present.
    Call {
        target: Option<String>,
        condition: Option<String>,
    },
    Compute {
        target: Option<String>,
        expression: Option<String>,
    },
    /// A MOVE, rendered as `source → targets`.
    Assign { expression: String },
    Initialize { target: String },
    /// EXIT / GOBACK / STOP RUN.
    Return,
}

impl ControlFlow {
    /// Render the wire shape: `type` always, every other key only when
    /// its value is non-empty.
    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        match self {
            ControlFlow::If {
                condition,
                then_block,
                else_block,
            } => {
                out.insert("type".into(), json!("if"));
                insert_opt(&mut out, "condition", condition);
                insert_block(&mut out, "then", then_block);
                insert_block(&mut out, "else", else_block);
            }
            ControlFlow::Call { target, condition } => {
                out.insert("type".into(), json!("call"));
                insert_opt(&mut out, "condition", condition);
                insert_opt(&mut out, "target", target);
            }
            ControlFlow::Compute { target, expression } => {
                out.insert("type".into(), json!("compute"));
                insert_opt(&mut out, "target", target);
                insert_opt(&mut out, "expression", expression);
            }
            ControlFlow::Assign { expression } => {
                out.insert("type".into(), json!("assign"));
                if !expression.is_empty() {
                    out.insert("expression".into(), json!(expression));
                }
            }
            ControlFlow::Initialize { target } => {
                out.insert("type".into(), json!("initialize"));
                if !target.is_empty() {
                    out.insert("target".into(), json!(target));
                }
            }
            ControlFlow::Return => {
                out.insert("type".into(), json!("return"));
            }
        }
        Value::Object(out)
    }

    /// Maximum nesting depth of `if` nodes, counting this node.
    pub fn depth(&self) -> usize {
        match self {
            ControlFlow::If {
                then_block,
                else_block,
                ..
            } => {
                1 + then_block
                    .iter()
                    .chain(else_block)
                    .map(ControlFlow::depth)
                    .max()
                    .unwrap_or(0)
            }
            _ => 0,
        }
    }
}

fn insert_opt(out: &mut Map<String, Value>, key: &str, value: &Option<String>) {
    if let Some(v) = value {
        if !v.is_empty() {
            out.insert(key.into(), json!(v));
        }
    }
}

fn insert_block(out: &mut Map<String, Value>, key: &str, block: &[ControlFlow]) {
    if !block.is_empty() {
        out.insert(
            key.into(),
            Value::Array(block.iter().map(ControlFlow::to_json).collect()),
        );
    }
}

/// An open block on the reconstruction stack.
#[derive(Debug)]
enum Frame {
    If {
        condition: Option<String>,
        then_block: Vec<ControlFlow>,
        else_block: Vec<ControlFlow>,
        in_else: bool,
    },
    Loop {
        target: Option<String>,
        until: Option<String>,
        body: Vec<ControlFlow>,
    },
}

/// The stack machine.
#[derive(Debug, Default)]
pub struct ControlFlowBuilder {
    stack: Vec<Frame>,
    root: Vec<ControlFlow>,
}

impl ControlFlowBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert a flat statement list into nested control flow.
    pub fn build(mut self, statements: &[RawStatement]) -> Vec<ControlFlow> {
        for raw in statements {
            self.process(&raw.statement);
        }
        // Unbalanced input: close whatever is still open.
        while !self.stack.is_empty() {
            self.close_top();
        }
        self.root
    }

    fn process(&mut self, statement: &Statement) {
        match statement {
            Statement::If { condition } => {
                self.stack.push(Frame::If {
                    condition: non_empty(condition),
                    then_block: Vec::new(),
                    else_block: Vec::new(),
                    in_else: false,
                });
            }
            Statement::Else => {
                match self.stack.last_mut() {
                    Some(Frame::If { in_else, .. }) if !*in_else => *in_else = true,
                    // Stray ELSE: no open IF, or the IF already switched.
                    _ => {}
                }
            }
            Statement::EndIf => {
                if matches!(self.stack.last(), Some(Frame::If { .. })) {
                    self.close_top();
                }
            }
            Statement::Perform(p) if p.is_loop() => {
                self.stack.push(Frame::Loop {
                    target: p.target.clone(),
                    until: p.until.clone(),
                    body: Vec::new(),
                });
            }
            Statement::EndPerform => {
                if matches!(self.stack.last(), Some(Frame::Loop { .. })) {
                    self.close_top();
                }
            }
            Statement::Perform(p) => {
                self.emit(ControlFlow::Call {
                    target: p.target.clone(),
                    condition: p.until.clone(),
                });
            }
            Statement::Compute(c) => {
                self.emit(ControlFlow::Compute {
                    target: c.target.clone(),
                    expression: c.expression.clone(),
                });
            }
            Statement::Move { source, targets } => {
                self.emit(ControlFlow::Assign {
                    expression: format!(
                        "{} → {}",
                        source.as_deref().unwrap_or_default(),
                        targets.join(", ")
                    ),
                });
            }
            Statement::Initialize { targets } => {
                self.emit(ControlFlow::Initialize {
                    target: targets.join(", "),
                });
            }
            Statement::Exit { .. } => self.emit(ControlFlow::Return),
            // No semantic counterpart (CALL here is the subprogram verb,
            // not a PERFORM).
            Statement::Call { .. }
            | Statement::Display { .. }
            | Statement::Accept { .. }
            | Statement::Arithmetic(_)
            | Statement::Copy { .. }
            | Statement::NextSentence
            | Statement::Other { .. } => {}
        }
    }

    /// Append to the innermost open block, or to the root.
    fn emit(&mut self, node: ControlFlow) {
        match self.stack.last_mut() {
            Some(Frame::If {
                then_block,
                else_block,
                in_else,
                ..
            }) => {
                if *in_else {
                    else_block.push(node);
                } else {
                    then_block.push(node);
                }
            }
            Some(Frame::Loop { body, .. }) => body.push(node),
            None => self.root.push(node),
        }
    }

    fn close_top(&mut self) {
        match self.stack.pop() {
            Some(Frame::If {
                condition,
                then_block,
                else_block,
                ..
            }) => {
                self.emit(ControlFlow::If {
                    condition,
                    then_block,
                    else_block,
                });
            }
            Some(Frame::Loop {
                target,
                until,
                body,
            }) => {
                // A loop renders as a call carrying its UNTIL condition,
                // with the body statements following as siblings.
                self.emit(ControlFlow::Call {
                    target,
                    condition: until,
                });
                for node in body {
                    self.emit(node);
                }
            }
            None => {}
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Convenience wrapper over [`ControlFlowBuilder`].
pub fn build_control_flow(statements: &[RawStatement]) -> Vec<ControlFlow> {
    ControlFlowBuilder::new().build(statements)
}
