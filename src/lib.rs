//! # Fluxo - Conversation Flow Compilation and Evaluation Engine
//!
//! **Fluxo** turns node-based conversation graphs, as drawn in a visual flow
//! editor, into validated, compiled flows and evaluates them one inbound
//! message at a time. The interpreter is deterministic and performs no I/O:
//! every side effect (messages to send, webhooks to call, follow-ups to
//! schedule) comes back as a data record for the hosting runtime to perform.
//!
//! ## Core Workflow
//!
//! 1. **Parse**: Load the editor's JSON into a [`flow::FlowDocument`].
//! 2. **Compile**: [`compile::CompiledFlow::compile`] validates the graph
//!    structure (dangling edges, bad branch labels, pause-free cycles, ...)
//!    and resolves it into an arena with typed per-node configuration.
//! 3. **Evaluate**: An [`interpret::Interpreter`] takes the conversation
//!    state and the lead's message and returns an [`interpret::Evaluation`]
//!    with the transition and the effects to perform.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fluxo::prelude::*;
//! use chrono::Utc;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let json = std::fs::read_to_string("flow.json")?;
//!     let document = FlowDocument::from_json(&json)?;
//!
//!     let flow = CompiledFlow::compile(&document)?;
//!     let interpreter = Interpreter::new(flow);
//!
//!     // Start the conversation: runs until the flow pauses on a question.
//!     let mut session = Session::new(&interpreter);
//!     let (effects, _evaluation) = session.advance(None, Utc::now())?;
//!     for effect in &effects {
//!         println!("{:?}", effect);
//!     }
//!
//!     // Feed the lead's reply into the paused flow.
//!     let (effects, _evaluation) = session.advance(Some("Maria"), Utc::now())?;
//!     for effect in &effects {
//!         println!("{:?}", effect);
//!     }
//!     Ok(())
//! }
//! ```

pub mod compile;
pub mod effect;
pub mod error;
pub mod flow;
pub mod interpret;
pub mod prelude;
pub mod state;
pub mod template;
