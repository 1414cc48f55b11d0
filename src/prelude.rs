//! Prelude module for convenient imports
//!
//! Re-exports the types needed for the common parse, compile and evaluate
//! workflow, so callers can bring the core API in with a single `use`.

// Document model
pub use crate::flow::{EdgeDefinition, FlowDocument, FlowSettings, NodeDefinition, NodeKind};

// Compilation
pub use crate::compile::{CompiledFlow, CompiledNode};

// Evaluation
pub use crate::interpret::{Evaluation, Interpreter, Session, Transition};

// Effects and state
pub use crate::effect::Effect;
pub use crate::state::{ConversationState, DataBag, FieldValue};

// Error types
pub use crate::error::{EvaluationError, FlowIssue, ParseError, ValidationReport};
