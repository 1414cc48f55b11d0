use crate::state::FieldValue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A side effect the interpreter wants performed.
///
/// Effects are plain data records consumed by the external conversation
/// runtime; the interpreter never performs I/O itself. All template
/// placeholders are already resolved by the time an effect is emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
    /// Send a text message. The recipient is implicit: an evaluation always
    /// belongs to exactly one conversation, so every text goes to its lead.
    SendText {
        body: String,
        /// Simulated typing pause before sending, if the node configured one.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        typing_delay_ms: Option<u64>,
    },
    /// Call an external webhook with fully resolved parameters.
    CallWebhook {
        url: String,
        method: String,
        #[serde(default, skip_serializing_if = "HashMap::is_empty")]
        body: HashMap<String, String, ahash::RandomState>,
    },
    /// Write a value to a lead field outside the data bag (CRM side).
    UpdateField { field: String, value: FieldValue },
    TagLead { tag: String },
    MoveStatus { status_id: String },
    NotifyTeam {
        message: String,
        channel: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        recipients: Vec<String>,
    },
    /// Schedule a message for later delivery. `id` is deterministic
    /// (`node_id#index`) so the runtime can deduplicate and cancel.
    ScheduleMessage {
        id: String,
        body: String,
        fire_at: DateTime<Utc>,
    },
    /// Drop a previously scheduled message.
    CancelScheduled { id: String },
    /// Hand the conversation to a human; no further automatic evaluation
    /// until an external actor resumes it.
    RequestHandoff { message: String, reason: String },
}
