//! `Conversation`: the thread state for one client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::step::Step;

/// Who wrote a message in the thread history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    Manager,
}

/// One entry in a conversation's message history. Only a 160-char preview
/// is retained for context snapshots; the full body lives in the draft/HIL
/// payload at the time it was produced, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEntry {
    pub role: Role,
    pub body: String,
    pub timestamp: DateTime<Utc>,
    pub intent_label: Option<String>,
    pub preview: String,
}

const PREVIEW_LEN: usize = 160;

impl MessageEntry {
    pub fn new(role: Role, body: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        let body = body.into();
        let preview = body.chars().take(PREVIEW_LEN).collect();
        Self {
            role,
            body,
            timestamp,
            intent_label: None,
            preview,
        }
    }

    pub fn with_intent_label(mut self, label: impl Into<String>) -> Self {
        self.intent_label = Some(label.into());
        self
    }
}

/// A pending HIL request key, `(step, action)`, tracked on the conversation
/// so re-entrant dispatch can tell what's already awaiting a manager.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PendingHilRef {
    pub step: Step,
    pub action: String,
}

/// Scratchpad for detours and cross-step signals. Named fields instead of
/// a stringly-typed map so a handler reading `extras.time_warning` gets a
/// compile error, not a typo'd key, if the shape ever changes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationExtras {
    pub hybrid_qna_response: Option<String>,
    pub room_confirmation_prefix: Option<String>,
    pub time_warning: Option<String>,
    pub deposit_just_paid: bool,
    pub locked_room_unavailable_on_new_date: bool,
    /// Set on every detour entry; cleared when control returns to `caller_step`.
    pub change_detour: Option<ChangeDetourMarker>,
    /// Set when Step 1 short-circuits acceptance straight to Step 5.
    pub intake_negotiation_accept: bool,
    /// Carries a room/product pairing awaiting an arrangement reply
    /// (e.g. "please arrange the flipchart") so Step 3 can resolve it
    /// before generic change detection runs.
    pub room_pending_arrangement: Option<String>,
    /// Set by Step 3 when a hybrid "room + catering Q&A" message is
    /// detected, so Step 4 can append the catering answer.
    pub sequential_catering_lookahead: Option<String>,
}

impl ConversationExtras {
    /// Clears the fields that must not leak across a detour boundary.
    pub fn clear_for_detour(&mut self) {
        self.hybrid_qna_response = None;
        self.room_confirmation_prefix = None;
    }
}

/// Marks which step a detour originated from and why, so routing can
/// decide whether a newly-entered step should skip its own Q&A guard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeDetourMarker {
    pub from_step: Step,
    pub reason: String,
}

/// A single client thread. Persisted and loaded whole on every inbound
/// message; the orchestrator mutates its own in-memory copy and writes it
/// back once the step loop halts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub thread_id: String,
    pub client_email: String,
    pub current_step: Step,
    pub caller_step: Option<Step>,
    pub message_history: Vec<MessageEntry>,
    pub pending_hil_requests: HashSet<PendingHilRef>,
    pub extras: ConversationExtras,
    /// Optimistic-concurrency version, bumped on every successful save.
    pub version: u64,
}

impl Conversation {
    pub fn new(thread_id: impl Into<String>, client_email: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            client_email: client_email.into(),
            current_step: Step::Intake,
            caller_step: None,
            message_history: Vec::new(),
            pending_hil_requests: HashSet::new(),
            extras: ConversationExtras::default(),
            version: 0,
        }
    }

    /// Enters a detour: records `caller_step` and stamps `extras.change_detour`.
    pub fn enter_detour(&mut self, target: Step, reason: impl Into<String>) {
        let from = self.current_step;
        self.caller_step = Some(from);
        self.extras.clear_for_detour();
        self.extras.change_detour = Some(ChangeDetourMarker {
            from_step: from,
            reason: reason.into(),
        });
        self.current_step = target;
    }

    /// Returns control to the recorded caller step, clearing the detour marker.
    pub fn return_to_caller(&mut self) {
        if let Some(caller) = self.caller_step.take() {
            self.current_step = caller;
        }
        self.extras.change_detour = None;
    }
}
