//! Structural validation tests for flow documents.
mod common;
use common::*;
use fluxo::error::{ElementRef, IssueCode, Severity};
use fluxo::prelude::*;
use serde_json::json;

fn codes(doc: &FlowDocument) -> Vec<IssueCode> {
    let report = CompiledFlow::compile(doc).expect_err("document should be rejected");
    report.issues.iter().map(|i| i.code).collect()
}

#[test]
fn test_unknown_edge_references() {
    let doc = document(
        vec![node("a", NodeKind::Message, json!({"message": "x"}))],
        vec![edge("e1", "ghost", "a", None), edge("e2", "a", "ghost", None)],
        "a",
    );
    assert_eq!(
        codes(&doc),
        vec![IssueCode::UnknownSourceNode, IssueCode::UnknownTargetNode]
    );
}

#[test]
fn test_unknown_start_node() {
    let doc = document(
        vec![node("a", NodeKind::Message, json!({"message": "x"}))],
        vec![],
        "ghost",
    );
    let report = CompiledFlow::compile(&doc).expect_err("document should be rejected");
    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues[0].code, IssueCode::UnknownStartNode);
    assert_eq!(report.issues[0].element, ElementRef::Document);
}

#[test]
fn test_edge_errors_reported_before_branch_errors() {
    // One dangling edge and one bad branch label: only the first failing
    // class is reported, with every instance inside it.
    let doc = document(
        vec![
            node(
                "check",
                NodeKind::Condition,
                json!({"field": "x", "operator": "equals", "value": "1"}),
            ),
            node("a", NodeKind::Message, json!({"message": "x"})),
        ],
        vec![
            edge("e1", "check", "ghost", Some("true")),
            edge("e2", "check", "a", Some("maybe")),
        ],
        "check",
    );
    assert_eq!(codes(&doc), vec![IssueCode::UnknownTargetNode]);
}

#[test]
fn test_invalid_condition_branch_label() {
    let doc = document(
        vec![
            node(
                "check",
                NodeKind::Condition,
                json!({"field": "x", "operator": "equals", "value": "1"}),
            ),
            node("a", NodeKind::Message, json!({"message": "x"})),
        ],
        vec![edge("e1", "check", "a", Some("maybe"))],
        "check",
    );
    assert_eq!(codes(&doc), vec![IssueCode::InvalidBranchLabel]);
}

#[test]
fn test_duplicate_condition_branch() {
    let doc = document(
        vec![
            node(
                "check",
                NodeKind::Condition,
                json!({"field": "x", "operator": "equals", "value": "1"}),
            ),
            node("a", NodeKind::Message, json!({"message": "x"})),
            node("b", NodeKind::Message, json!({"message": "y"})),
        ],
        vec![
            edge("e1", "check", "a", Some("true")),
            edge("e2", "check", "b", Some("true")),
        ],
        "check",
    );
    assert_eq!(codes(&doc), vec![IssueCode::DuplicateBranch]);
}

#[test]
fn test_duplicate_switch_case_and_default() {
    let doc = document(
        vec![
            node("pick", NodeKind::Switch, json!({"field": "x"})),
            node("a", NodeKind::Message, json!({"message": "x"})),
            node("b", NodeKind::Message, json!({"message": "y"})),
        ],
        vec![
            edge("e1", "pick", "a", Some("sim")),
            edge("e2", "pick", "b", Some("sim")),
            edge("e3", "pick", "a", None),
            edge("e4", "pick", "b", Some("default")),
        ],
        "pick",
    );
    let found = codes(&doc);
    assert!(found.contains(&IssueCode::DuplicateCase));
    assert!(found.contains(&IssueCode::DuplicateDefault));
}

#[test]
fn test_ambiguous_single_output() {
    let doc = document(
        vec![
            node("say", NodeKind::Message, json!({"message": "x"})),
            node("a", NodeKind::Message, json!({"message": "a"})),
            node("b", NodeKind::Message, json!({"message": "b"})),
        ],
        vec![edge("e1", "say", "a", None), edge("e2", "say", "b", None)],
        "say",
    );
    assert_eq!(codes(&doc), vec![IssueCode::AmbiguousTransition]);
}

#[test]
fn test_pause_free_cycle_rejected() {
    let doc = document(
        vec![
            node("a", NodeKind::Message, json!({"message": "a"})),
            node("b", NodeKind::Message, json!({"message": "b"})),
        ],
        vec![edge("e1", "a", "b", None), edge("e2", "b", "a", None)],
        "a",
    );
    assert_eq!(codes(&doc), vec![IssueCode::UnterminatedCycle]);
}

#[test]
fn test_pause_free_cycle_behind_question_rejected() {
    // The cycle sits past the pause point, not through it, so it still
    // spins without ever waiting for input once entered.
    let doc = document(
        vec![
            node("ask", NodeKind::Name, serde_json::Value::Null),
            node("a", NodeKind::Message, json!({"message": "a"})),
            node("b", NodeKind::Message, json!({"message": "b"})),
        ],
        vec![
            edge("e1", "ask", "a", None),
            edge("e2", "a", "b", None),
            edge("e3", "b", "a", None),
        ],
        "ask",
    );
    assert_eq!(codes(&doc), vec![IssueCode::UnterminatedCycle]);
}

#[test]
fn test_cycle_through_question_accepted() {
    // Questions pause the conversation, so looping back through one is fine.
    let doc = document(
        vec![
            node("say", NodeKind::Message, json!({"message": "a"})),
            node("ask", NodeKind::Name, serde_json::Value::Null),
        ],
        vec![edge("e1", "say", "ask", None), edge("e2", "ask", "say", None)],
        "say",
    );
    assert!(CompiledFlow::compile(&doc).is_ok());
}

#[test]
fn test_missing_condition_config_rejected() {
    let doc = document(
        vec![
            node("check", NodeKind::Condition, serde_json::Value::Null),
            node("a", NodeKind::Message, json!({"message": "x"})),
        ],
        vec![
            edge("e1", "check", "a", Some("true")),
            edge("e2", "check", "a", Some("false")),
        ],
        "check",
    );
    assert_eq!(codes(&doc), vec![IssueCode::InvalidConfig]);
}

#[test]
fn test_unknown_merge_node_rejected() {
    let doc = document(
        vec![
            node("split", NodeKind::Parallel, json!({"merge": "ghost"})),
            node("a", NodeKind::Message, json!({"message": "x"})),
            node("fin", NodeKind::End, serde_json::Value::Null),
        ],
        vec![edge("e1", "split", "a", None), edge("e2", "a", "fin", None)],
        "split",
    );
    assert_eq!(codes(&doc), vec![IssueCode::UnknownMergeNode]);
}

#[test]
fn test_orphan_and_empty_parallel_warnings() {
    let doc = document(
        vec![
            node("say", NodeKind::Message, json!({"message": "x"})),
            node("lost", NodeKind::Message, json!({"message": "y"})),
            node("split", NodeKind::Parallel, serde_json::Value::Null),
        ],
        vec![edge("e1", "say", "split", None)],
        "say",
    );
    let flow = CompiledFlow::compile(&doc).expect("warnings are not fatal");
    let warn_codes: Vec<IssueCode> = flow.warnings.iter().map(|w| w.code).collect();
    assert!(warn_codes.contains(&IssueCode::OrphanNode));
    assert!(warn_codes.contains(&IssueCode::EmptyParallel));
    assert!(flow.warnings.iter().all(|w| w.severity == Severity::Warning));
}

#[test]
fn test_valid_document_compiles() {
    let flow = compile(&lead_capture_flow());
    assert_eq!(flow.node_count(), 3);
    assert!(flow.warnings.is_empty());
    assert_eq!(flow.node(flow.start_ix()).id, "start");
}
