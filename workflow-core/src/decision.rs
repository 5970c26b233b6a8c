//! The shapes every step handler exchanges with the orchestrator (§9:
//! tagged variants instead of dynamic payload dictionaries, `StepDecision`
//! instead of cyclic handler/orchestrator references).

use chrono::{DateTime, Utc};
use event_llm::FallbackReason;

use catalog_store::model::{HilTaskType, Step};

/// One inbound message, already stripped of transport concerns (HTTP
/// headers, auth) by the caller.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub body: String,
    pub received_at: DateTime<Utc>,
}

impl InboundMessage {
    pub fn new(body: impl Into<String>, received_at: DateTime<Utc>) -> Self {
        Self {
            body: body.into(),
            received_at,
        }
    }
}

/// A handler's candidate output. `body` is always what the client would
/// see if released unedited; `body_markdown` is the manager-facing
/// summary used only when `requires_approval` is true — composition never
/// derives one from the other.
#[derive(Debug, Clone)]
pub struct Draft {
    pub body: String,
    pub body_markdown: String,
    pub requires_approval: bool,
    pub task_type: Option<HilTaskType>,
    pub fallback: Option<FallbackReason>,
}

impl Draft {
    pub fn released(body: impl Into<String>) -> Self {
        let body = body.into();
        Self {
            body_markdown: body.clone(),
            body,
            requires_approval: false,
            task_type: None,
            fallback: None,
        }
    }

    pub fn for_approval(body: impl Into<String>, body_markdown: impl Into<String>, task_type: HilTaskType) -> Self {
        Self {
            body: body.into(),
            body_markdown: body_markdown.into(),
            requires_approval: true,
            task_type: Some(task_type),
            fallback: None,
        }
    }

    pub fn with_fallback(mut self, fallback: FallbackReason) -> Self {
        self.fallback = Some(fallback);
        self
    }
}

/// What a step handler decided to do next. The orchestrator owns the
/// control-flow loop; handlers only ever report one of these four shapes
/// (§9's "cyclic references between handlers and orchestrator" note).
#[derive(Debug, Clone)]
pub enum StepDecision {
    /// Settle here: `draft` is the client-facing (or HIL-bound) output.
    Halt(Draft),
    /// Move forward to the next step in the same tick.
    Advance(Step),
    /// Jump to an earlier step, recording where to resume once it resolves.
    Detour { target: Step, caller_step: Step },
    /// The detour at `caller_step` is done; resume there.
    ReturnToCaller,
}

pub type StepResult = Result<StepDecision, crate::errors::WorkflowError>;
