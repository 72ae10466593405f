//! Semantic AST assembly.
//!
//! Post-processes the raw division parses into one business-logic-oriented
//! document: FILLER items are dropped, level-1 items with a literal VALUE
//! become named constants, boilerplate paragraphs are filtered out, and
//! the surviving paragraphs are nested via the control-flow builder and
//! classified heuristically by name.

use serde_json::{json, Map, Value as Json};
use tracing::debug;

use crate::ast::{DataItem, RawProgram, Value};
use crate::flow::{build_control_flow, ControlFlow};

/// Paragraph names containing one of these are non-business noise.
const GENERIC_PARAGRAPHS: [&str; 3] = ["DATE-COMPILED", "FILE-CONTROL", "GOBACK"];

/// The working-storage item whose VALUE is the program version.
const VERSION_ITEM: &str = "CAL-VERSION";

/// A working-storage variable with its nested fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub level: u8,
    pub picture: Option<String>,
    pub value: Option<Value>,
    pub occurs: Option<u32>,
    pub fields: Vec<Variable>,
}

impl Variable {
    fn from_item(item: &DataItem) -> Self {
        Self {
            name: item.name.clone(),
            level: item.level,
            picture: item.picture.clone(),
            value: item.value.clone(),
            occurs: item.occurs,
            fields: item
                .children
                .iter()
                .filter(|c| !c.is_filler)
                .map(Variable::from_item)
                .collect(),
        }
    }

    /// Coarse type tag from the PICTURE clause.
    fn inferred_type(&self) -> &'static str {
        let Some(picture) = &self.picture else {
            return "group";
        };
        let pic = picture.to_ascii_uppercase();
        if pic.contains('9') {
            if pic.contains('V') {
                "decimal"
            } else {
                "integer"
            }
        } else if pic.contains('X') {
            "string"
        } else {
            "unknown"
        }
    }

    pub fn to_json(&self) -> Json {
        let mut out = Map::new();
        out.insert("name".into(), json!(self.name));
        out.insert("level".into(), json!(self.level));
        if self.picture.is_some() {
            out.insert("type".into(), json!(self.inferred_type()));
        }
        if let Some(value) = &self.value {
            out.insert("value".into(), value.to_json());
        }
        if let Some(occurs) = self.occurs {
            out.insert("array_size".into(), json!(occurs));
        }
        if !self.fields.is_empty() {
            out.insert(
                "fields".into(),
                Json::Array(self.fields.iter().map(Variable::to_json).collect()),
            );
        }
        Json::Object(out)
    }
}

/// A business paragraph with its nested control flow.
#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    pub name: String,
    pub logic: Vec<ControlFlow>,
}

impl Paragraph {
    pub fn to_json(&self) -> Json {
        json!({
            "name": self.name,
            "logic": self.logic.iter().map(ControlFlow::to_json).collect::<Vec<_>>(),
        })
    }
}

/// Advisory paragraph classification by name pattern. A paragraph may
/// land in zero, one, or several buckets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BusinessLogic {
    pub main_flow: Vec<String>,
    pub calculations: Vec<String>,
    pub validations: Vec<String>,
}

/// The semantic document.
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticAst {
    pub program: Option<String>,
    pub version: Value,
    pub constants: Vec<(String, Value)>,
    pub data_structures: Vec<Variable>,
    pub procedures: Vec<Paragraph>,
    pub business_logic: BusinessLogic,
}

impl SemanticAst {
    /// Render the document. The six top-level keys are always present.
    pub fn to_json(&self) -> Json {
        let constants: Map<String, Json> = self
            .constants
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect();

        json!({
            "program": self.program,
            "version": self.version.to_json(),
            "constants": constants,
            "data_structures": self.data_structures.iter().map(Variable::to_json).collect::<Vec<_>>(),
            "procedures": self.procedures.iter().map(Paragraph::to_json).collect::<Vec<_>>(),
            "business_logic": {
                "main_flow": self.business_logic.main_flow,
                "calculations": self.business_logic.calculations,
                "validations": self.business_logic.validations,
            },
        })
    }
}

/// Build the semantic document from a raw parse.
pub fn build_semantic_ast(raw: &RawProgram) -> SemanticAst {
    let mut constants = Vec::new();
    let mut variables = Vec::new();

    if let Some(data) = &raw.data {
        for item in &data.working_storage {
            if item.is_filler {
                continue;
            }
            match &item.value {
                Some(value) if item.level == 1 => {
                    constants.push((item.name.clone(), value.clone()));
                }
                _ => variables.push(Variable::from_item(item)),
            }
        }
    }

    let mut procedures = Vec::new();
    if let Some(procedure) = &raw.procedure {
        for paragraph in &procedure.paragraphs {
            if paragraph.statements.is_empty() || is_generic_paragraph(&paragraph.name) {
                continue;
            }
            procedures.push(Paragraph {
                name: paragraph.name.clone(),
                logic: build_control_flow(&paragraph.statements),
            });
        }
    }
    debug!(
        constants = constants.len(),
        procedures = procedures.len(),
        "built semantic AST"
    );

    let business_logic = classify_paragraphs(&procedures);
    let version = raw
        .data
        .as_ref()
        .and_then(|d| find_version(&d.working_storage))
        .unwrap_or_else(|| Value::Str("unknown".to_string()));

    SemanticAst {
        program: raw.program_id.clone(),
        version,
        constants,
        data_structures: variables.into_iter().filter(|v| v.level == 1).collect(),
        procedures,
        business_logic,
    }
}

fn is_generic_paragraph(name: &str) -> bool {
    GENERIC_PARAGRAPHS.iter().any(|g| name.contains(g))
}

fn classify_paragraphs(procedures: &[Paragraph]) -> BusinessLogic {
    let mut logic = BusinessLogic::default();
    for paragraph in procedures {
        let name = &paragraph.name;
        if name.starts_with("0000") || name.contains("MAIN") || name.contains("START") {
            logic.main_flow.push(name.clone());
        }
        if ["CALC", "COMPUTE", "BUNDLED", "RATE"]
            .iter()
            .any(|kw| name.contains(kw))
        {
            logic.calculations.push(name.clone());
        }
        if ["VALIDATE", "CHECK", "EDIT"]
            .iter()
            .any(|kw| name.contains(kw))
        {
            logic.validations.push(name.clone());
        }
    }
    logic
}

/// Search the working-storage tree for the version item's VALUE.
fn find_version(items: &[DataItem]) -> Option<Value> {
    for item in items {
        if item.name == VERSION_ITEM {
            if let Some(value) = &item.value {
                return Some(value.clone());
            }
        }
        if let Some(found) = find_version(&item.children) {
            return Some(found);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_raw;

    #[test]
    fn constants_split_from_variables() {
        let raw = parse_raw(
            "IDENTIFICATION DIVISION.\n\
             PROGRAM-ID. SPLITTER.\n\
             DATA DIVISION.\n\
             WORKING-STORAGE SECTION.\n\
             01  BASE-RATE      PIC 9(03)V99 VALUE 145.20.\n\
             01  HOLD-AREA.\n\
             05  H-NAME         PIC X(20).\n\
             01  FILLER         PIC X(10).\n",
        );
        let ast = build_semantic_ast(&raw);

        assert_eq!(ast.constants.len(), 1);
        assert_eq!(ast.constants[0].0, "BASE-RATE");
        assert_eq!(ast.constants[0].1, Value::Float(145.20));

        assert_eq!(ast.data_structures.len(), 1);
        assert_eq!(ast.data_structures[0].name, "HOLD-AREA");
        assert_eq!(ast.data_structures[0].fields.len(), 1);
    }

    #[test]
    fn group_items_serialize_without_type() {
        let raw = parse_raw(
            "DATA DIVISION.\n\
             WORKING-STORAGE SECTION.\n\
             01  GROUP-ITEM.\n\
             05  G-NUM  PIC 9(04)V99.\n\
             05  G-TXT  PIC X(08).\n",
        );
        let ast = build_semantic_ast(&raw);
        let v = ast.data_structures[0].to_json();
        assert!(v.get("type").is_none());
        let fields = v["fields"].as_array().unwrap();
        assert_eq!(fields[0]["type"], "decimal");
        assert_eq!(fields[1]["type"], "string");
    }

    #[test]
    fn generic_and_empty_paragraphs_are_dropped() {
        let raw = parse_raw(
            "PROCEDURE DIVISION.\n\
             EMPTY-ONE.\n\
             DATE-COMPILED-NOTE.\n\
                 MOVE 1 TO X.\n\
             REAL-WORK.\n\
                 MOVE 2 TO Y.\n",
        );
        let ast = build_semantic_ast(&raw);
        let names: Vec<_> = ast.procedures.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["REAL-WORK"]);
    }

    #[test]
    fn business_logic_buckets_overlap() {
        let raw = parse_raw(
            "PROCEDURE DIVISION.\n\
             0000-START-TO-FINISH.\n\
                 GOBACK.\n\
             2000-CALCULATE-RATE.\n\
                 MOVE 1 TO X.\n\
             3000-CHECK-MAIN.\n\
                 MOVE 2 TO Y.\n",
        );
        let ast = build_semantic_ast(&raw);
        assert_eq!(
            ast.business_logic.main_flow,
            vec!["0000-START-TO-FINISH", "3000-CHECK-MAIN"]
        );
        assert_eq!(ast.business_logic.calculations, vec!["2000-CALCULATE-RATE"]);
        assert_eq!(ast.business_logic.validations, vec!["3000-CHECK-MAIN"]);
    }

    #[test]
    fn version_found_in_nested_items() {
        let raw = parse_raw(
            "DATA DIVISION.\n\
             WORKING-STORAGE SECTION.\n\
             01  VERSION-AREA.\n\
             05  CAL-VERSION  PIC X(05) VALUE 'C2601'.\n",
        );
        let ast = build_semantic_ast(&raw);
        assert_eq!(ast.version, Value::Str("C2601".into()));
    }

    #[test]
    fn version_defaults_to_unknown() {
        let raw = parse_raw("IDENTIFICATION DIVISION.\nPROGRAM-ID. NOVERSION.\n");
        let ast = build_semantic_ast(&raw);
        assert_eq!(ast.version, Value::Str("unknown".into()));
    }

    #[test]
    fn document_always_has_six_keys() {
        let ast = build_semantic_ast(&parse_raw(""));
        let v = ast.to_json();
        let obj = v.as_object().unwrap();
        for key in [
            "program",
            "version",
            "constants",
            "data_structures",
            "procedures",
            "business_logic",
        ] {
            assert!(obj.contains_key(key), "missing key {key}");
        }
        assert!(v["program"].is_null());
        assert_eq!(v["version"], "unknown");
    }
}
