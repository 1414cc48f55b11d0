use super::catalog::Catalog;
use super::node::{
    ActionConfig, ConditionConfig, EndConfig, FollowupConfig, HandoffConfig, MessageConfig,
    NodeKind, NodeSpec, ParallelConfig, QuestionConfig, QuestionOverrides, SwitchConfig,
};
use crate::error::ParseError;
use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// Editor canvas coordinates. Preserved on round-trip, never consulted by
/// the interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// One step in the conversation graph, as persisted by the graph editor.
///
/// `config` stays a raw JSON bag at this level; it is parsed into the
/// strongly-typed [`NodeSpec`] when the document is compiled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDefinition {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Human-readable name, display-only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub config: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

impl NodeDefinition {
    /// Parses the loose config bag into the node's typed spec, merging in
    /// catalog defaults for question kinds.
    pub fn lower(&self) -> Result<NodeSpec, String> {
        let config = self.config.clone();
        let spec = match self.kind {
            NodeKind::Greeting => {
                let mut cfg: MessageConfig = parse_config(config)?;
                if cfg.message.is_empty() {
                    cfg.message = Catalog::default_greeting().to_string();
                }
                NodeSpec::Say(cfg)
            }
            NodeKind::Message => NodeSpec::Say(parse_config::<MessageConfig>(config)?),
            kind if kind.is_question() => {
                let overrides: QuestionOverrides = parse_config(config)?;
                let defaults = Catalog::question_defaults(kind)
                    .ok_or_else(|| format!("no question defaults for kind '{}'", kind))?;
                NodeSpec::Ask(QuestionConfig {
                    prompt: overrides.prompt.unwrap_or_else(|| defaults.prompt.to_string()),
                    field: overrides.field.unwrap_or_else(|| defaults.field.to_string()),
                    field_type: overrides.field_type.unwrap_or(defaults.field_type),
                    options: overrides.options.unwrap_or_else(|| {
                        defaults.options.iter().map(|o| o.to_string()).collect()
                    }),
                    retry_message: overrides.retry_message,
                    max_retries: overrides.max_retries,
                })
            }
            NodeKind::Condition => NodeSpec::Branch(require_config::<ConditionConfig>(config)?),
            NodeKind::Switch => NodeSpec::Cases(require_config::<SwitchConfig>(config)?),
            NodeKind::Parallel => NodeSpec::FanOut(parse_config::<ParallelConfig>(config)?),
            NodeKind::Action => NodeSpec::Act(require_config::<ActionConfig>(config)?),
            NodeKind::Handoff => NodeSpec::Handoff(parse_config::<HandoffConfig>(config)?),
            NodeKind::Followup => NodeSpec::Schedule(parse_config::<FollowupConfig>(config)?),
            NodeKind::End => NodeSpec::End(parse_config::<EndConfig>(config)?),
            // is_question covers the remaining kinds; unreachable by match order.
            other => return Err(format!("unhandled node kind '{}'", other)),
        };
        Ok(spec)
    }
}

fn parse_config<T: serde::de::DeserializeOwned + Default>(
    config: serde_json::Value,
) -> Result<T, String> {
    if config.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(config).map_err(|e| e.to_string())
}

fn require_config<T: serde::de::DeserializeOwned>(
    config: serde_json::Value,
) -> Result<T, String> {
    if config.is_null() {
        return Err("missing required config".to_string());
    }
    serde_json::from_value(config).map_err(|e| e.to_string())
}

/// A directed transition between two nodes. `label` is the discriminator
/// selecting which branch of a multi-output node this edge represents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeDefinition {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl EdgeDefinition {
    /// The normalized discriminator: `None` for an unconditional transition
    /// (absent, blank, or the literal "default" label).
    pub fn discriminator(&self) -> Option<String> {
        match &self.label {
            None => None,
            Some(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("default") {
                    None
                } else {
                    Some(trimmed.to_lowercase())
                }
            }
        }
    }
}

/// Document-level policies, with safe defaults when the editor writes none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct FlowSettings {
    /// Failed input attempts allowed on a question node before the
    /// conversation is handed to a human.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_message")]
    pub retry_message: String,
    #[serde(default = "default_handoff_message")]
    pub handoff_message: String,
    #[serde(default = "default_farewell")]
    pub farewell_message: String,
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_message() -> String {
    "Nao entendi. Pode tentar novamente?".to_string()
}

fn default_handoff_message() -> String {
    "Vou transferir voce para um de nossos atendentes.".to_string()
}

fn default_farewell() -> String {
    "Obrigado pelo contato. Ate logo!".to_string()
}

/// The whole persisted graph for one tenant's scripted conversation.
///
/// Immutable during a single evaluation step; all mutation happens in the
/// editor, between conversations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowDocument {
    pub nodes: Vec<NodeDefinition>,
    pub edges: Vec<EdgeDefinition>,
    pub start_node_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    #[serde(default)]
    pub settings: FlowSettings,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_message: default_retry_message(),
            handoff_message: default_handoff_message(),
            farewell_message: default_farewell(),
        }
    }
}

impl FlowDocument {
    pub fn from_json(json: &str) -> Result<Self, ParseError> {
        serde_json::from_str(json).map_err(|e| ParseError::Json(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, ParseError> {
        serde_json::to_string_pretty(self).map_err(|e| ParseError::Json(e.to_string()))
    }

    pub fn node(&self, id: &str) -> Option<&NodeDefinition> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Outgoing edges of a node, in declaration order.
    pub fn edges_from<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a EdgeDefinition> {
        self.edges.iter().filter(move |e| e.source == id)
    }
}
