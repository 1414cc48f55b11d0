//! The evaluation engine: one inbound event in, one decision out.
//!
//! Evaluation is pure. The interpreter reads a [`CompiledFlow`] and a
//! [`ConversationState`] snapshot and returns an [`Evaluation`]; the external
//! runtime sends the messages, performs the webhook calls and persists the
//! updated state. Time is passed in by the caller, so the same inputs always
//! produce the same decision.

use crate::compile::{CompiledFlow, CompiledNode, NodeIx, Routing};
use crate::effect::Effect;
use crate::error::EvaluationError;
use crate::flow::{
    ActionConfig, FieldType, HandoffConfig, MessageConfig, NodeSpec, QuestionConfig,
};
use crate::state::{ConversationState, FieldSpec, FieldValue};
use crate::template;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

mod condition;
mod input;

/// Upper bound on auto-advancing steps per inbound event. A validated flow
/// cannot loop without a pause point, so hitting this indicates a bug.
pub const MAX_STEPS: usize = 50;

/// Where the conversation moves after a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "transition", content = "target", rename_all = "snake_case")]
pub enum Transition {
    /// Remain on the current node, waiting for (better) input.
    Stay,
    /// Move to the named node.
    Advance(String),
    /// Split into parallel paths; the runtime drives each path and resumes
    /// at `merge` when done.
    Fanout {
        paths: Vec<String>,
        wait_for_all: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        merge: Option<String>,
    },
    /// The flow reached its end; the conversation is over.
    Complete,
    /// A human takes over; automatic evaluation stops.
    Handoff,
}

/// Input that failed validation for the awaited field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedInput {
    pub field: String,
    pub reason: String,
}

/// The complete outcome of evaluating one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub transition: Transition,
    pub effects: Vec<Effect>,
    /// Set when the step ended paused on a question node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub awaiting: Option<FieldSpec>,
    /// Field captured from the lead's input this step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collected: Option<(String, FieldValue)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejected: Option<RejectedInput>,
}

impl Evaluation {
    fn advance(effects: Vec<Effect>, transition: Transition) -> Self {
        Self {
            transition,
            effects,
            awaiting: None,
            collected: None,
            rejected: None,
        }
    }
}

impl ConversationState {
    /// Folds an evaluation back into the state. The runtime calls this after
    /// performing the effects, before the next event for the conversation.
    pub fn apply(&mut self, evaluation: &Evaluation) {
        if let Some((field, value)) = &evaluation.collected {
            self.bag.set(field.clone(), value.clone());
        }
        match &evaluation.transition {
            Transition::Stay => {
                if evaluation.rejected.is_some() {
                    self.retries += 1;
                }
            }
            Transition::Advance(id) => {
                self.current_node_id = Some(id.clone());
                self.retries = 0;
            }
            // The runtime owns per-path positions during a fan-out; the main
            // state stays parked on the parallel node until the merge.
            Transition::Fanout { .. } => {
                self.retries = 0;
            }
            Transition::Complete | Transition::Handoff => {
                self.current_node_id = None;
                self.retries = 0;
            }
        }
    }
}

/// Evaluates steps of a compiled flow.
pub struct Interpreter {
    flow: CompiledFlow,
}

impl Interpreter {
    pub fn new(flow: CompiledFlow) -> Self {
        Self { flow }
    }

    pub fn flow(&self) -> &CompiledFlow {
        &self.flow
    }

    /// Evaluates a single step.
    ///
    /// `input` is the lead's message, consumed only when the current node is
    /// a question; `now` anchors follow-up scheduling.
    pub fn evaluate(
        &self,
        state: &ConversationState,
        input: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Evaluation, EvaluationError> {
        let ix = match &state.current_node_id {
            Some(id) => self
                .flow
                .node_ix(id)
                .ok_or_else(|| EvaluationError::NodeNotFound {
                    node_id: id.clone(),
                })?,
            None => self.flow.start_ix(),
        };
        let node = self.flow.node(ix);
        debug!(node = %node.id, kind = %node.kind, "evaluating node");

        match &node.spec {
            NodeSpec::Say(cfg) => Ok(self.say(node, cfg, state)),
            NodeSpec::End(cfg) => {
                let message = cfg
                    .message
                    .as_deref()
                    .unwrap_or(&self.flow.settings.farewell_message);
                Ok(Evaluation::advance(
                    vec![Effect::SendText {
                        body: template::resolve(message, &state.bag),
                        typing_delay_ms: cfg.typing_delay_ms,
                    }],
                    Transition::Complete,
                ))
            }
            NodeSpec::Ask(cfg) => Ok(self.ask(node, cfg, state, input)),
            NodeSpec::Branch(cfg) => {
                let taken =
                    condition::evaluate(cfg.operator, state.bag.get(&cfg.field), &cfg.value);
                let Routing::Branch { on_true, on_false } = &node.routing else {
                    unreachable!("branch spec always compiles to branch routing");
                };
                let target = if taken { on_true } else { on_false };
                match target {
                    Some(next) => Ok(Evaluation::advance(
                        Vec::new(),
                        Transition::Advance(self.node_id(*next)),
                    )),
                    None => Err(EvaluationError::MissingBranch {
                        node_id: node.id.clone(),
                        branch: taken,
                    }),
                }
            }
            NodeSpec::Cases(cfg) => {
                let value = state
                    .bag
                    .get(&cfg.field)
                    .map(|v| v.to_string())
                    .unwrap_or_default();
                let needle = value.trim().to_lowercase();
                let Routing::Cases { cases, default } = &node.routing else {
                    unreachable!("switch spec always compiles to cases routing");
                };
                let target = cases
                    .iter()
                    .find(|(case, _)| *case == needle)
                    .map(|(_, ix)| *ix)
                    .or(*default);
                match target {
                    Some(next) => Ok(Evaluation::advance(
                        Vec::new(),
                        Transition::Advance(self.node_id(next)),
                    )),
                    None => Err(EvaluationError::NoMatchingCase {
                        node_id: node.id.clone(),
                        value,
                    }),
                }
            }
            NodeSpec::FanOut(cfg) => {
                let Routing::FanOut { paths, merge } = &node.routing else {
                    unreachable!("parallel spec always compiles to fan-out routing");
                };
                Ok(Evaluation::advance(
                    Vec::new(),
                    Transition::Fanout {
                        paths: paths.iter().map(|ix| self.node_id(*ix)).collect(),
                        wait_for_all: cfg.wait_for_all,
                        merge: merge.map(|ix| self.node_id(ix)),
                    },
                ))
            }
            NodeSpec::Act(cfg) => {
                let effects = self.act(cfg, state);
                Ok(Evaluation::advance(effects, self.next_transition(node)))
            }
            NodeSpec::Handoff(cfg) => Ok(self.handoff(cfg, state)),
            NodeSpec::Schedule(cfg) => {
                let mut effects = Vec::with_capacity(cfg.schedules.len() * 2);
                for (i, entry) in cfg.schedules.iter().enumerate() {
                    // Re-entering the node replaces its earlier schedules.
                    let id = format!("{}#{}", node.id, i);
                    effects.push(Effect::CancelScheduled { id: id.clone() });
                    effects.push(Effect::ScheduleMessage {
                        id,
                        body: template::resolve(&entry.message, &state.bag),
                        fire_at: now + Duration::seconds(entry.delay_seconds as i64),
                    });
                }
                Ok(Evaluation::advance(effects, self.next_transition(node)))
            }
        }
    }

    fn say(&self, node: &CompiledNode, cfg: &MessageConfig, state: &ConversationState) -> Evaluation {
        Evaluation::advance(
            vec![Effect::SendText {
                body: template::resolve(&cfg.message, &state.bag),
                typing_delay_ms: cfg.typing_delay_ms,
            }],
            self.next_transition(node),
        )
    }

    fn ask(
        &self,
        node: &CompiledNode,
        cfg: &QuestionConfig,
        state: &ConversationState,
        input: Option<&str>,
    ) -> Evaluation {
        let Some(raw) = input else {
            // First visit: send the prompt and pause.
            return Evaluation {
                transition: Transition::Stay,
                effects: vec![Effect::SendText {
                    body: self.prompt_body(cfg, state),
                    typing_delay_ms: None,
                }],
                awaiting: Some(self.field_spec(cfg)),
                collected: None,
                rejected: None,
            };
        };

        match input::validate(raw, cfg.field_type, &cfg.options) {
            Ok(value) => Evaluation {
                transition: self.next_transition(node),
                effects: Vec::new(),
                awaiting: None,
                collected: Some((cfg.field.clone(), value)),
                rejected: None,
            },
            Err(reason) => {
                debug!(node = %node.id, field = %cfg.field, %reason, "input rejected");
                let rejected = Some(RejectedInput {
                    field: cfg.field.clone(),
                    reason,
                });
                let max_retries = cfg.max_retries.unwrap_or(self.flow.settings.max_retries);
                if state.retries + 1 >= max_retries {
                    let message =
                        template::resolve(&self.flow.settings.handoff_message, &state.bag);
                    return Evaluation {
                        transition: Transition::Handoff,
                        effects: vec![
                            Effect::SendText {
                                body: message.clone(),
                                typing_delay_ms: None,
                            },
                            Effect::RequestHandoff {
                                message,
                                reason: "Limite de tentativas excedido".to_string(),
                            },
                        ],
                        awaiting: None,
                        collected: None,
                        rejected,
                    };
                }
                let retry = cfg
                    .retry_message
                    .as_deref()
                    .unwrap_or(&self.flow.settings.retry_message);
                Evaluation {
                    transition: Transition::Stay,
                    effects: vec![Effect::SendText {
                        body: template::resolve(retry, &state.bag),
                        typing_delay_ms: None,
                    }],
                    awaiting: Some(self.field_spec(cfg)),
                    collected: None,
                    rejected,
                }
            }
        }
    }

    fn act(&self, cfg: &ActionConfig, state: &ConversationState) -> Vec<Effect> {
        let bag = &state.bag;
        match cfg {
            ActionConfig::CallWebhook { url, method, body } => vec![Effect::CallWebhook {
                url: template::resolve(url, bag),
                method: method.clone(),
                body: body
                    .iter()
                    .map(|(k, v)| (k.clone(), template::resolve(v, bag)))
                    .collect(),
            }],
            ActionConfig::UpdateField { field, value } => vec![Effect::UpdateField {
                field: field.clone(),
                value: FieldValue::Text(template::resolve(value, bag)),
            }],
            ActionConfig::TagLead { tags } => tags
                .iter()
                .map(|tag| Effect::TagLead {
                    tag: template::resolve(tag, bag),
                })
                .collect(),
            ActionConfig::MoveStatus { status_id } => vec![Effect::MoveStatus {
                status_id: status_id.clone(),
            }],
            ActionConfig::NotifyTeam {
                message,
                channel,
                recipients,
            } => vec![Effect::NotifyTeam {
                message: template::resolve(message, bag),
                channel: channel.clone(),
                recipients: recipients.clone(),
            }],
        }
    }

    fn handoff(&self, cfg: &HandoffConfig, state: &ConversationState) -> Evaluation {
        let message = template::resolve(&cfg.message, &state.bag);
        let mut effects = vec![Effect::SendText {
            body: message.clone(),
            typing_delay_ms: None,
        }];
        if let Some(notify) = &cfg.notify {
            effects.push(Effect::NotifyTeam {
                message: notify
                    .message
                    .as_deref()
                    .map(|m| template::resolve(m, &state.bag))
                    .unwrap_or_else(|| message.clone()),
                channel: notify.channel.clone(),
                recipients: notify.recipients.clone(),
            });
        }
        effects.push(Effect::RequestHandoff {
            message,
            reason: cfg.reason.clone(),
        });
        Evaluation::advance(effects, Transition::Handoff)
    }

    fn prompt_body(&self, cfg: &QuestionConfig, state: &ConversationState) -> String {
        let prompt = template::resolve(&cfg.prompt, &state.bag);
        if cfg.field_type == FieldType::Choice && !cfg.options.is_empty() {
            let mut body = prompt;
            body.push_str("\n\nOpcoes:");
            for option in &cfg.options {
                body.push_str("\n- ");
                body.push_str(option);
            }
            body
        } else {
            prompt
        }
    }

    fn field_spec(&self, cfg: &QuestionConfig) -> FieldSpec {
        FieldSpec {
            field: cfg.field.clone(),
            field_type: cfg.field_type,
            options: cfg.options.clone(),
        }
    }

    /// The single-output transition of `node`: advance along its edge, or
    /// complete when it has none.
    fn next_transition(&self, node: &CompiledNode) -> Transition {
        match &node.routing {
            Routing::Next(Some(next)) => Transition::Advance(self.node_id(*next)),
            Routing::Next(None) => Transition::Complete,
            _ => unreachable!("single-output nodes always compile to next routing"),
        }
    }

    fn node_id(&self, ix: NodeIx) -> String {
        self.flow.node(ix).id.clone()
    }
}

/// Drives the interpreter through auto-advancing nodes until the flow pauses,
/// splits, or ends.
///
/// One `advance` call corresponds to one inbound event (or the conversation
/// start). The lead's input is consumed by the first step only; subsequent
/// steps run input-free until a question, parallel, handoff or end node.
pub struct Session<'a> {
    interpreter: &'a Interpreter,
    pub state: ConversationState,
    finished: bool,
}

impl<'a> Session<'a> {
    pub fn new(interpreter: &'a Interpreter) -> Self {
        Self {
            interpreter,
            state: ConversationState::new(),
            finished: false,
        }
    }

    pub fn resume(interpreter: &'a Interpreter, state: ConversationState) -> Self {
        Self {
            interpreter,
            state,
            finished: false,
        }
    }

    /// Processes one inbound event and returns every effect produced, in
    /// order, plus the evaluation the run stopped on.
    pub fn advance(
        &mut self,
        input: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<(Vec<Effect>, Evaluation), EvaluationError> {
        let mut effects = Vec::new();
        let mut input = input;
        for _ in 0..MAX_STEPS {
            let evaluation = self.interpreter.evaluate(&self.state, input.take(), now)?;
            self.state.apply(&evaluation);
            effects.extend(evaluation.effects.iter().cloned());
            match evaluation.transition {
                Transition::Advance(_) => continue,
                Transition::Complete | Transition::Handoff => {
                    self.finished = true;
                    return Ok((effects, evaluation));
                }
                _ => return Ok((effects, evaluation)),
            }
        }
        Err(EvaluationError::StepLimitExceeded { limit: MAX_STEPS })
    }

    /// Whether the conversation has terminated (completed or handed off).
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}
