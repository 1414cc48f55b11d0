//! End-to-end tests: parse, compile and drive whole conversations.
mod common;
use chrono::{TimeZone, Utc};
use common::*;
use fluxo::prelude::*;
use serde_json::json;
use std::collections::HashSet;

fn now() -> chrono::DateTime<chrono::Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
}

fn sent_bodies(effects: &[Effect]) -> Vec<&str> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::SendText { body, .. } => Some(body.as_str()),
            _ => None,
        })
        .collect()
}

#[test]
fn test_greeting_question_message_scenario() {
    let interpreter = Interpreter::new(compile(&lead_capture_flow()));
    let mut session = Session::new(&interpreter);

    // First contact: greeting sends, flow runs on to the question and pauses.
    let (effects, evaluation) = session.advance(None, now()).unwrap();
    assert_eq!(
        sent_bodies(&effects),
        vec!["Ola! Bem-vindo.", "Qual e o seu nome?"]
    );
    assert_eq!(evaluation.transition, Transition::Stay);
    let awaiting = evaluation.awaiting.expect("flow should pause on the question");
    assert_eq!(awaiting.field, "nome");
    assert_eq!(
        session.state.current_node_id.as_deref(),
        Some("ask_name")
    );

    // The lead replies; the answer lands in the bag and the confirmation
    // message resolves its template.
    let (effects, evaluation) = session.advance(Some("Maria"), now()).unwrap();
    assert_eq!(
        session.state.bag.get("nome"),
        Some(&FieldValue::Text("Maria".to_string()))
    );
    assert_eq!(sent_bodies(&effects), vec!["Oi Maria"]);
    assert_eq!(evaluation.transition, Transition::Complete);
    assert!(session.is_finished());
}

#[test]
fn test_qualification_journey_with_branching() {
    let doc = document(
        vec![
            node("start", NodeKind::Greeting, serde_json::Value::Null),
            node("ask_budget", NodeKind::Budget, serde_json::Value::Null),
            node(
                "qualify",
                NodeKind::Condition,
                json!({"field": "orcamento", "operator": "greater_or_equal", "value": 1000}),
            ),
            node(
                "tag_hot",
                NodeKind::Action,
                json!({"action": "tag_lead", "tags": ["qualificado"]}),
            ),
            node("human", NodeKind::Handoff, json!({"reason": "Lead qualificado"})),
            node("fin", NodeKind::End, json!({"message": "Entendi, obrigado!"})),
        ],
        vec![
            edge("e1", "start", "ask_budget", None),
            edge("e2", "ask_budget", "qualify", None),
            edge("e3", "qualify", "tag_hot", Some("true")),
            edge("e4", "qualify", "fin", Some("false")),
            edge("e5", "tag_hot", "human", None),
        ],
        "start",
    );
    let interpreter = Interpreter::new(compile(&doc));

    // Qualified path: budget clears the bar, lead is tagged and handed off.
    let mut session = Session::new(&interpreter);
    session.advance(None, now()).unwrap();
    let (effects, evaluation) = session.advance(Some("R$ 2.500,00"), now()).unwrap();
    assert!(effects
        .iter()
        .any(|e| matches!(e, Effect::TagLead { tag } if tag == "qualificado")));
    assert!(effects
        .iter()
        .any(|e| matches!(e, Effect::RequestHandoff { .. })));
    assert_eq!(evaluation.transition, Transition::Handoff);

    // Unqualified path: the false branch says goodbye and completes.
    let mut session = Session::new(&interpreter);
    session.advance(None, now()).unwrap();
    let (effects, evaluation) = session.advance(Some("500"), now()).unwrap();
    assert_eq!(sent_bodies(&effects), vec!["Entendi, obrigado!"]);
    assert_eq!(evaluation.transition, Transition::Complete);
}

#[test]
fn test_retry_then_handoff_through_session() {
    let doc = document(
        vec![
            node("ask", NodeKind::Email, serde_json::Value::Null),
            node("fin", NodeKind::End, serde_json::Value::Null),
        ],
        vec![edge("e1", "ask", "fin", None)],
        "ask",
    );
    let interpreter = Interpreter::new(compile(&doc));
    let mut session = Session::new(&interpreter);

    session.advance(None, now()).unwrap();
    for _ in 0..2 {
        let (effects, evaluation) = session.advance(Some("not-an-email"), now()).unwrap();
        assert_eq!(evaluation.transition, Transition::Stay);
        assert_eq!(
            sent_bodies(&effects),
            vec!["Nao entendi. Pode tentar novamente?"]
        );
    }

    let (effects, evaluation) = session.advance(Some("still wrong"), now()).unwrap();
    assert_eq!(evaluation.transition, Transition::Handoff);
    assert!(effects
        .iter()
        .any(|e| matches!(e, Effect::RequestHandoff { .. })));
    assert!(session.is_finished());
}

#[test]
fn test_flow_document_json_round_trip() {
    let json = r#"{
        "nodes": [
            {"id": "n1", "type": "greeting", "name": "Boas-vindas",
             "config": {"message": "Ola!"}, "position": {"x": 10.0, "y": 20.0}},
            {"id": "n2", "type": "name", "config": null},
            {"id": "n3", "type": "end", "config": {"message": "Tchau"}}
        ],
        "edges": [
            {"id": "e1", "source": "n1", "target": "n2"},
            {"id": "e2", "source": "n2", "target": "n3"}
        ],
        "start_node_id": "n1",
        "version": 3
    }"#;
    let doc = FlowDocument::from_json(json).unwrap();
    let round_tripped = FlowDocument::from_json(&doc.to_json().unwrap()).unwrap();

    let ids = |d: &FlowDocument| -> (HashSet<String>, HashSet<String>) {
        (
            d.nodes.iter().map(|n| n.id.clone()).collect(),
            d.edges.iter().map(|e| e.id.clone()).collect(),
        )
    };
    assert_eq!(ids(&doc), ids(&round_tripped));
    assert_eq!(round_tripped.start_node_id, "n1");
    assert_eq!(round_tripped.version, Some(3));
    // Canvas positions survive the round-trip untouched.
    assert_eq!(
        round_tripped.node("n1").unwrap().position,
        doc.node("n1").unwrap().position
    );
}

#[test]
fn test_compiled_artifact_round_trip() {
    let flow = compile(&lead_capture_flow());
    let path = std::env::temp_dir().join(format!("fluxo-test-{}.bin", std::process::id()));

    flow.save(&path).unwrap();
    let loaded = CompiledFlow::from_file(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(flow, loaded);

    // The loaded artifact evaluates like the original.
    let interpreter = Interpreter::new(loaded);
    let mut session = Session::new(&interpreter);
    let (effects, _) = session.advance(None, now()).unwrap();
    assert_eq!(
        sent_bodies(&effects),
        vec!["Ola! Bem-vindo.", "Qual e o seu nome?"]
    );
}

#[test]
fn test_default_greeting_fills_empty_config() {
    let doc = document(
        vec![node("start", NodeKind::Greeting, serde_json::Value::Null)],
        vec![],
        "start",
    );
    let interpreter = Interpreter::new(compile(&doc));
    let mut session = Session::new(&interpreter);
    let (effects, evaluation) = session.advance(None, now()).unwrap();
    assert_eq!(sent_bodies(&effects), vec!["Ola! Como posso ajudar?"]);
    assert_eq!(evaluation.transition, Transition::Complete);
}
