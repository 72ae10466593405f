//! COMPUTE formula extraction and complexity scoring.
//!
//! Formulas never become expression trees on the COBOL side: the extractor
//! pulls flat variable and operator lists out of the expression text and
//! derives a coarse complexity tag from the operator count and the
//! maximum parenthesis nesting depth.

use std::collections::BTreeSet;

use serde_json::{json, Value as Json};

use crate::ast::{RawParagraph, Statement};

/// The operator tokens recognized in COMPUTE expressions.
const OPERATORS: [&str; 7] = ["+", "-", "*", "/", "**", "(", ")"];

/// Complexity tag thresholds: ≤2 ops and depth ≤1 → simple; ≤5 ops and
/// depth ≤2 → medium; anything beyond → complex. Parens are excluded
/// from the operator count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Complexity {
    Simple,
    Medium,
    Complex,
}

impl Complexity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Complexity::Simple => "simple",
            Complexity::Medium => "medium",
            Complexity::Complex => "complex",
        }
    }
}

/// One extracted formula.
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    pub target: String,
    pub expression: String,
    pub rounded: bool,
    /// Referenced variable names, deduplicated and sorted.
    pub variables: Vec<String>,
    /// Operator tokens present in the expression.
    pub operators: Vec<String>,
    pub complexity: Complexity,
}

impl Formula {
    pub fn to_json(&self) -> Json {
        json!({
            "target": self.target,
            "expression": self.expression,
            "rounded": self.rounded,
            "variables_used": self.variables,
            "operators": self.operators,
            "complexity": self.complexity.as_str(),
        })
    }
}

/// Extracts formulas from COMPUTE statements.
#[derive(Debug, Default)]
pub struct FormulaExtractor;

impl FormulaExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract from one statement; `None` for anything but a COMPUTE with
    /// both a target and an expression.
    pub fn extract_from_statement(&self, statement: &Statement) -> Option<Formula> {
        let Statement::Compute(compute) = statement else {
            return None;
        };
        let target = compute.target.as_deref()?;
        let expression = compute.expression.as_deref()?;
        if target.is_empty() || expression.is_empty() {
            return None;
        }

        let operators = extract_operators(expression);
        Some(Formula {
            target: target.to_string(),
            expression: expression.to_string(),
            rounded: compute.rounded,
            variables: extract_variables(expression),
            complexity: evaluate_complexity(expression, &operators),
            operators,
        })
    }

    /// All formulas of one paragraph, in statement order.
    pub fn extract_from_paragraph(&self, paragraph: &RawParagraph) -> Vec<Formula> {
        paragraph
            .statements
            .iter()
            .filter_map(|s| self.extract_from_statement(&s.statement))
            .collect()
    }

    /// Group rendered formulas into the three complexity buckets.
    pub fn group_by_complexity(&self, formulas: &[Formula]) -> Json {
        let bucket = |c: Complexity| {
            formulas
                .iter()
                .filter(|f| f.complexity == c)
                .map(Formula::to_json)
                .collect::<Vec<_>>()
        };
        json!({
            "simple": bucket(Complexity::Simple),
            "medium": bucket(Complexity::Medium),
            "complex": bucket(Complexity::Complex),
        })
    }

    /// The full per-paragraph report: `by_paragraph`, `by_complexity`,
    /// and a total count.
    pub fn extract_from_paragraphs(&self, paragraphs: &[RawParagraph]) -> Json {
        let mut by_paragraph = serde_json::Map::new();
        let mut all = Vec::new();

        for paragraph in paragraphs {
            let formulas = self.extract_from_paragraph(paragraph);
            if !formulas.is_empty() {
                by_paragraph.insert(
                    paragraph.name.clone(),
                    Json::Array(formulas.iter().map(Formula::to_json).collect()),
                );
                all.extend(formulas);
            }
        }

        json!({
            "by_paragraph": by_paragraph,
            "by_complexity": self.group_by_complexity(&all),
            "total_count": all.len(),
        })
    }
}

/// Identifier-shaped tokens left after stripping operator characters,
/// minus pure numbers; deduplicated and sorted.
fn extract_variables(expression: &str) -> Vec<String> {
    let cleaned: String = expression
        .chars()
        .map(|c| if "+-*/()".contains(c) { ' ' } else { c })
        .collect();

    let variables: BTreeSet<String> = cleaned
        .split_whitespace()
        .filter(|token| {
            let mut chars = token.chars();
            chars.next().is_some_and(|c| c.is_ascii_alphabetic())
                && token.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        })
        .map(str::to_string)
        .collect();

    variables.into_iter().collect()
}

/// Operator tokens present anywhere in the expression.
fn extract_operators(expression: &str) -> Vec<String> {
    OPERATORS
        .iter()
        .filter(|op| expression.contains(*op))
        .map(|op| (*op).to_string())
        .collect()
}

fn evaluate_complexity(expression: &str, operators: &[String]) -> Complexity {
    let op_count: usize = operators
        .iter()
        .filter(|op| *op != "(" && *op != ")")
        .map(|op| expression.matches(op.as_str()).count())
        .sum();
    let depth = max_paren_depth(expression);

    if op_count <= 2 && depth <= 1 {
        Complexity::Simple
    } else if op_count <= 5 && depth <= 2 {
        Complexity::Medium
    } else {
        Complexity::Complex
    }
}

fn max_paren_depth(expression: &str) -> usize {
    let mut depth = 0i32;
    let mut max_depth = 0i32;
    for ch in expression.chars() {
        match ch {
            '(' => {
                depth += 1;
                max_depth = max_depth.max(depth);
            }
            ')' => depth -= 1,
            _ => {}
        }
    }
    max_depth.max(0) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ComputeStatement, RawStatement};

    fn compute(target: &str, expression: &str, rounded: bool) -> Statement {
        Statement::Compute(ComputeStatement {
            target: Some(target.to_string()),
            rounded,
            expression: Some(expression.to_string()),
        })
    }

    fn extract(expression: &str) -> Formula {
        FormulaExtractor::new()
            .extract_from_statement(&compute("H-OUT", expression, false))
            .expect("formula")
    }

    #[test]
    fn simple_boundary() {
        assert_eq!(extract("A + B").complexity, Complexity::Simple);
    }

    #[test]
    fn medium_boundary() {
        // 5 operators at depth 1.
        let f = extract("(A + B) * (C - D) / (E + F)");
        assert_eq!(f.complexity, Complexity::Medium);
    }

    #[test]
    fn one_more_operator_tips_to_complex() {
        let f = extract("(A + B) * (C - D) / (E + F) - G");
        assert_eq!(f.complexity, Complexity::Complex);
    }

    #[test]
    fn extra_nesting_tips_to_complex() {
        let f = extract("((A + B) * ((C - D) / E)) + F");
        assert_eq!(f.complexity, Complexity::Complex);
    }

    #[test]
    fn variables_are_sorted_and_unique() {
        let f = extract("H-RATE * H-FACTOR + H-RATE");
        assert_eq!(f.variables, vec!["H-FACTOR", "H-RATE"]);
    }

    #[test]
    fn numbers_are_not_variables() {
        let f = extract("BASE * 1.1400 + 22");
        assert_eq!(f.variables, vec!["BASE"]);
    }

    #[test]
    fn operators_reported_by_presence() {
        let f = extract("(A + B) * C");
        assert_eq!(f.operators, vec!["+", "*", "(", ")"]);
    }

    #[test]
    fn non_compute_statements_are_skipped() {
        let extractor = FormulaExtractor::new();
        assert!(extractor
            .extract_from_statement(&Statement::EndIf)
            .is_none());
        let empty = Statement::Compute(ComputeStatement::default());
        assert!(extractor.extract_from_statement(&empty).is_none());
    }

    #[test]
    fn paragraph_report_shape() {
        let paragraph = RawParagraph {
            name: "2000-CALCULATE".into(),
            sequence: String::new(),
            statements: vec![
                RawStatement {
                    sequence: String::new(),
                    statement: compute("H-PAY", "BASE-RATE * DRUG-ADDON", true),
                },
                RawStatement {
                    sequence: String::new(),
                    statement: Statement::EndIf,
                },
            ],
        };

        let report = FormulaExtractor::new().extract_from_paragraphs(&[paragraph]);
        assert_eq!(report["total_count"], 1);
        let listed = report["by_paragraph"]["2000-CALCULATE"].as_array().unwrap();
        assert_eq!(listed[0]["target"], "H-PAY");
        assert_eq!(listed[0]["rounded"], true);
        assert_eq!(listed[0]["complexity"], "simple");
    }
}
