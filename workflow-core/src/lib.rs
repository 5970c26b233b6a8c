//! Public entry for the event-inquiry conversation engine.
//!
//! A single inbound client message is processed by [`orchestrator::Orchestrator`]:
//! load conversation/event state, run Unified Detection over the message,
//! dispatch through the seven-step state machine (§4.6 step handlers under
//! [`steps`]), enqueue a human-in-the-loop task when the resulting draft
//! needs manager approval (`hil`), and persist with optimistic-concurrency
//! retry.
//!
//! Step handlers never call each other or the store directly — they take a
//! [`context::StepContext`] and return a [`decision::StepDecision`], and the
//! orchestrator owns all control flow. No `async-trait`, no `Box<dyn
//! Trait>`: dispatch between steps, catalogs, and LLM adapters is all
//! enum-based.

pub mod context;
pub mod decision;
pub mod errors;
pub mod hil;
pub mod orchestrator;
pub mod reply;
pub mod steps;

pub use decision::{Draft, InboundMessage, StepDecision, StepResult};
pub use errors::{ClientOutcome, Env, WorkflowError, WorkflowResult};
pub use orchestrator::Orchestrator;
pub use reply::{DepositInfo, EventInfo, OperationResult, PendingAction, WorkflowReply};
