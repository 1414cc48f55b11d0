use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// The closed set of node kinds a flow document may contain.
///
/// The shorthand collector kinds (`name`, `email`, ...) are question nodes
/// with catalog-supplied defaults; they are lowered to plain questions at
/// compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Greeting,
    Message,
    Question,
    Name,
    Email,
    Phone,
    City,
    Interest,
    Budget,
    Urgency,
    Condition,
    Switch,
    Parallel,
    Action,
    Handoff,
    #[serde(rename = "followup", alias = "follow_up")]
    Followup,
    End,
}

impl NodeKind {
    /// Question nodes, including the shorthand collector kinds.
    pub fn is_question(self) -> bool {
        matches!(
            self,
            NodeKind::Question
                | NodeKind::Name
                | NodeKind::Email
                | NodeKind::Phone
                | NodeKind::City
                | NodeKind::Interest
                | NodeKind::Budget
                | NodeKind::Urgency
        )
    }

    /// Kinds with a single undiscriminated outgoing transition.
    pub fn is_single_output(self) -> bool {
        !matches!(
            self,
            NodeKind::Condition | NodeKind::Switch | NodeKind::Parallel
        )
    }

    /// Kinds capable of terminating or pausing the conversation. A cycle that
    /// passes through none of these is an infinite-loop risk and is rejected
    /// at validation time.
    pub fn breaks_cycle(self) -> bool {
        self.is_question() || matches!(self, NodeKind::Condition | NodeKind::Handoff | NodeKind::End)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Matches the wire tag.
        let tag = match self {
            NodeKind::Greeting => "greeting",
            NodeKind::Message => "message",
            NodeKind::Question => "question",
            NodeKind::Name => "name",
            NodeKind::Email => "email",
            NodeKind::Phone => "phone",
            NodeKind::City => "city",
            NodeKind::Interest => "interest",
            NodeKind::Budget => "budget",
            NodeKind::Urgency => "urgency",
            NodeKind::Condition => "condition",
            NodeKind::Switch => "switch",
            NodeKind::Parallel => "parallel",
            NodeKind::Action => "action",
            NodeKind::Handoff => "handoff",
            NodeKind::Followup => "followup",
            NodeKind::End => "end",
        };
        write!(f, "{}", tag)
    }
}

/// Value types a question node can capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Number,
    Email,
    Phone,
    Date,
    Choice,
    Boolean,
}

impl Default for FieldType {
    fn default() -> Self {
        FieldType::Text
    }
}

/// Comparison operators available to condition nodes.
///
/// The aliases cover the operator spellings the visual editor historically
/// produced, including the Portuguese ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    #[serde(alias = "eq", alias = "==", alias = "igual")]
    Equals,
    #[serde(alias = "neq", alias = "!=", alias = "diferente")]
    NotEquals,
    #[serde(alias = "contem")]
    Contains,
    #[serde(alias = "nao_contem")]
    NotContains,
    #[serde(alias = "gt", alias = ">", alias = "maior", alias = "maior_que")]
    GreaterThan,
    #[serde(alias = "lt", alias = "<", alias = "menor", alias = "menor_que")]
    LessThan,
    #[serde(alias = "gte", alias = ">=", alias = "maior_ou_igual")]
    GreaterOrEqual,
    #[serde(alias = "lte", alias = "<=", alias = "menor_ou_igual")]
    LessOrEqual,
    #[serde(alias = "comeca_com")]
    StartsWith,
    #[serde(alias = "termina_com")]
    EndsWith,
    #[serde(alias = "vazio")]
    IsEmpty,
    #[serde(alias = "nao_vazio", alias = "preenchido")]
    IsNotEmpty,
    #[serde(alias = "existe")]
    Exists,
}

/// The literal a condition node compares a data-bag field against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
#[serde(untagged)]
pub enum Comparand {
    Text(String),
    Number(f64),
    Bool(bool),
    Null,
}

impl Default for Comparand {
    fn default() -> Self {
        Comparand::Null
    }
}

impl fmt::Display for Comparand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Comparand::Text(t) => write!(f, "{}", t),
            Comparand::Number(n) => {
                if n.fract() == 0.0 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Comparand::Bool(b) => write!(f, "{}", b),
            Comparand::Null => Ok(()),
        }
    }
}

// ---- Per-kind configuration ----

/// Configuration for greeting, message and end nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct MessageConfig {
    #[serde(default)]
    pub message: String,
    /// Simulated typing pause the runtime should honor before sending.
    /// The interpreter itself never sleeps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typing_delay_ms: Option<u64>,
}

/// Configuration for question nodes and their collector specializations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct QuestionConfig {
    pub prompt: String,
    /// Data-bag field the answer is written to.
    pub field: String,
    #[serde(default)]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    /// Re-prompt sent when input fails validation. Falls back to the
    /// document-level retry message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_message: Option<String>,
    /// Per-node override for the document-level retry limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
}

/// Partial question configuration as written in the document. Missing fields
/// are filled from the catalog defaults for the node's kind.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestionOverrides {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub field_type: Option<FieldType>,
    #[serde(default)]
    pub options: Option<Vec<String>>,
    #[serde(default)]
    pub retry_message: Option<String>,
    #[serde(default)]
    pub max_retries: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct ConditionConfig {
    pub field: String,
    pub operator: Operator,
    #[serde(default)]
    pub value: Comparand,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct SwitchConfig {
    pub field: String,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct ParallelConfig {
    /// Whether the runtime must track completion of every path before
    /// resuming at the merge node. Fan-out itself is the runtime's job.
    #[serde(default = "default_true")]
    pub wait_for_all: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge: Option<String>,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            wait_for_all: true,
            merge: None,
        }
    }
}

/// The external action an action node requests. The interpreter resolves all
/// templates and emits a data record; the runtime performs the call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionConfig {
    CallWebhook {
        url: String,
        #[serde(default = "default_method")]
        method: String,
        // Plain std map with the ahash hasher; the wrapper type has no
        // bincode support and this config rides along in the artifact.
        #[serde(default, skip_serializing_if = "HashMap::is_empty")]
        body: HashMap<String, String, ahash::RandomState>,
    },
    UpdateField {
        field: String,
        value: String,
    },
    TagLead {
        tags: Vec<String>,
    },
    MoveStatus {
        status_id: String,
    },
    NotifyTeam {
        message: String,
        #[serde(default = "default_channel")]
        channel: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        recipients: Vec<String>,
    },
}

fn default_method() -> String {
    "POST".to_string()
}

fn default_channel() -> String {
    "email".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct NotifyConfig {
    #[serde(default = "default_channel")]
    pub channel: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recipients: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct HandoffConfig {
    #[serde(default = "default_handoff_message")]
    pub message: String,
    #[serde(default = "default_handoff_reason")]
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notify: Option<NotifyConfig>,
}

fn default_handoff_message() -> String {
    "Transferindo para atendimento humano.".to_string()
}

fn default_handoff_reason() -> String {
    "Solicitacao do cliente".to_string()
}

impl Default for HandoffConfig {
    fn default() -> Self {
        Self {
            message: default_handoff_message(),
            reason: default_handoff_reason(),
            notify: None,
        }
    }
}

/// One scheduled follow-up message, fired `delay_seconds` after evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct ScheduleEntry {
    pub delay_seconds: u64,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct FollowupConfig {
    #[serde(default)]
    pub schedules: Vec<ScheduleEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct EndConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typing_delay_ms: Option<u64>,
}

/// The strongly-typed form of a node: one variant per behavior, each carrying
/// only its own configuration. Built from the loose wire config at compile
/// time so per-kind handling is exhaustive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub enum NodeSpec {
    Say(MessageConfig),
    Ask(QuestionConfig),
    Branch(ConditionConfig),
    Cases(SwitchConfig),
    FanOut(ParallelConfig),
    Act(ActionConfig),
    Handoff(HandoffConfig),
    Schedule(FollowupConfig),
    End(EndConfig),
}
