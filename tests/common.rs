//! Common test utilities for building flow documents.
use fluxo::prelude::*;
use serde_json::json;

#[allow(dead_code)]
pub fn node(id: &str, kind: NodeKind, config: serde_json::Value) -> NodeDefinition {
    NodeDefinition {
        id: id.to_string(),
        kind,
        name: None,
        config,
        position: None,
    }
}

#[allow(dead_code)]
pub fn edge(id: &str, source: &str, target: &str, label: Option<&str>) -> EdgeDefinition {
    EdgeDefinition {
        id: id.to_string(),
        source: source.to_string(),
        target: target.to_string(),
        label: label.map(str::to_string),
    }
}

#[allow(dead_code)]
pub fn document(
    nodes: Vec<NodeDefinition>,
    edges: Vec<EdgeDefinition>,
    start: &str,
) -> FlowDocument {
    FlowDocument {
        nodes,
        edges,
        start_node_id: start.to_string(),
        version: Some(1),
        settings: FlowSettings::default(),
    }
}

/// Creates the canonical capture flow:
/// `greeting -> name question -> message "Oi {nome}"`.
#[allow(dead_code)]
pub fn lead_capture_flow() -> FlowDocument {
    document(
        vec![
            node("start", NodeKind::Greeting, json!({"message": "Ola! Bem-vindo."})),
            node("ask_name", NodeKind::Name, serde_json::Value::Null),
            node("confirm", NodeKind::Message, json!({"message": "Oi {nome}"})),
        ],
        vec![
            edge("e1", "start", "ask_name", None),
            edge("e2", "ask_name", "confirm", None),
        ],
        "start",
    )
}

/// Creates a condition flow:
/// `condition(field op value) -true-> yes_msg, -false-> no_msg`.
#[allow(dead_code)]
pub fn condition_flow(field: &str, operator: &str, value: serde_json::Value) -> FlowDocument {
    document(
        vec![
            node(
                "check",
                NodeKind::Condition,
                json!({"field": field, "operator": operator, "value": value}),
            ),
            node("yes", NodeKind::Message, json!({"message": "sim"})),
            node("no", NodeKind::Message, json!({"message": "nao"})),
        ],
        vec![
            edge("e1", "check", "yes", Some("true")),
            edge("e2", "check", "no", Some("false")),
        ],
        "check",
    )
}

#[allow(dead_code)]
pub fn compile(doc: &FlowDocument) -> CompiledFlow {
    CompiledFlow::compile(doc).expect("document should compile")
}

/// State parked on `node_id` with the given collected fields.
#[allow(dead_code)]
pub fn state_at(node_id: &str, fields: &[(&str, &str)]) -> ConversationState {
    ConversationState {
        current_node_id: Some(node_id.to_string()),
        bag: fields
            .iter()
            .map(|(k, v)| (k.to_string(), FieldValue::Text(v.to_string())))
            .collect(),
        retries: 0,
    }
}
