//! End-to-end tests over a realistic 4GL source sample.

use codelift_windev::{parse_source, parse_to_json, Node};
use serde_json::json;

const SAMPLE: &str = r#"// Résumé : gestion des commandes
gCommandes est un tableau associatif
gTotalHT est un numérique

PROCÉDURE CalculeTotal(pRemise)
nTotal est un numérique = 0
POUR i = 1 _À_ 10
nTotal += gCommandes[i]
FIN
SI nTotal > 100 ALORS
gTotalHT = nTotal - pRemise
SINON
gTotalHT = nTotal
FIN
RENVOYER nTotal

PROCÉDURE Notifie(pMessage)
Dialogue("Erreur : montant invalide", dlgIcôneErreur)
_apiJournal(pMessage)
"#;

#[test]
fn program_root_metadata_is_always_present() {
    let v = parse_to_json(SAMPLE);
    let meta = v["metadata"].as_object().expect("program metadata");

    assert_eq!(meta["procedures_count"], 2);
    assert_eq!(meta["total_lines"], json!(SAMPLE.split('\n').count()));
    // Sorted, per the serialization contract.
    assert_eq!(
        meta["global_variables"],
        json!(["gCommandes", "gTotalHT"])
    );
    assert_eq!(
        meta["functions_called"],
        json!(["Dialogue", "_apiJournal"])
    );
}

#[test]
fn empty_source_still_carries_root_metadata() {
    let v = parse_to_json("");
    let meta = v["metadata"].as_object().expect("program metadata");
    assert_eq!(meta["procedures_count"], 0);
    assert_eq!(meta["global_variables"], json!([]));
    assert_eq!(meta["functions_called"], json!([]));
}

#[test]
fn procedure_analysis_summary() {
    let root = parse_source(SAMPLE);
    let children = match &root {
        Node::Program { children, .. } => children,
        _ => panic!("expected program root"),
    };

    let calcule = children
        .iter()
        .find_map(|n| match n {
            Node::Procedure { name, analysis, .. } if name == "CalculeTotal" => Some(analysis),
            _ => None,
        })
        .expect("CalculeTotal procedure");

    assert_eq!(calcule.parameters, vec!["pRemise"]);
    assert_eq!(calcule.global_reads, vec!["gCommandes"]);
    assert_eq!(calcule.global_writes, vec!["gTotalHT"]);
    assert_eq!(calcule.return_type, "inferred");
    assert_eq!(calcule.return_count, 1);
    assert!(!calcule.has_side_effects());

    let notifie = children
        .iter()
        .find_map(|n| match n {
            Node::Procedure { name, analysis, .. } if name == "Notifie" => Some(analysis),
            _ => None,
        })
        .expect("Notifie procedure");

    assert_eq!(notifie.return_type, "void");
    assert_eq!(notifie.api_calls, vec!["_apiJournal"]);
    assert_eq!(notifie.dialog_error_count, 1);
    assert!(notifie.has_side_effects());
}

#[test]
fn loop_and_branch_structure() {
    let root = parse_source(SAMPLE);
    let children = match &root {
        Node::Program { children, .. } => children,
        _ => panic!("expected program root"),
    };
    let body = children
        .iter()
        .find_map(|n| match n {
            Node::Procedure { name, body, .. } if name == "CalculeTotal" => Some(body),
            _ => None,
        })
        .expect("CalculeTotal procedure");

    let has_loop = body.iter().any(|n| {
        matches!(n, Node::ForLoop { iterator, body, .. } if iterator == "i" && body.len() == 1)
    });
    assert!(has_loop, "POUR loop missing from procedure body");

    let branch_ok = body.iter().any(|n| {
        matches!(
            n,
            Node::IfStatement {
                then_branch,
                else_branch,
                ..
            } if then_branch.len() == 1 && else_branch.len() == 1
        )
    });
    assert!(branch_ok, "SI/SINON branches misparsed");
}

#[test]
fn parsing_twice_yields_identical_trees() {
    assert_eq!(parse_to_json(SAMPLE), parse_to_json(SAMPLE));
}
