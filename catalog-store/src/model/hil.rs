//! `HilTask`: a draft awaiting manager approval.

use serde::{Deserialize, Serialize};

use super::step::Step;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HilTaskType {
    AskForDate,
    ManualReview,
    OfferMessage,
    RoomAvailabilityMessage,
    DateConfirmationMessage,
    AiReplyApproval,
    ConfirmationMessage,
    TransitionMessage,
    SpecialRequest,
    TooManyAttempts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HilStatus {
    Pending,
    Approved,
    Rejected,
    Superseded,
}

/// The draft content a manager reviews. `body` is what the client will
/// see if approved unedited; `body_markdown` is the manager-facing
/// summary. Reply composition never rewrites `body` from `body_markdown`
/// or vice versa — they are two independent fields, never one reused.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HilPayload {
    pub body: String,
    pub body_markdown: String,
    pub event_summary: String,
    pub current_step: Step,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HilTask {
    pub task_id: String,
    pub thread_id: String,
    pub event_id: String,
    pub step: Step,
    pub task_type: HilTaskType,
    pub payload: HilPayload,
    pub status: HilStatus,
    pub notes: Option<String>,
    pub edited_message: Option<String>,
}

impl HilTask {
    /// Dedup/supersede key: identical `(thread_id, task_type)` pending
    /// tasks are superseded by the newer one, never duplicated.
    pub fn dedup_key(&self) -> (String, HilTaskType) {
        (self.thread_id.clone(), self.task_type)
    }
}
