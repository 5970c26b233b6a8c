//! `WorkflowReply`: the one shape every external-interface operation in
//! §6 returns, built from the conversation/event state left behind by a
//! tick plus the [`crate::errors::ClientOutcome`] the tick produced.
//!
//! This lives in `workflow-core`, not `api`, because its shape (including
//! the "`deposit_info` only at `current_step >= 4`" rule) is a property of
//! the workflow, not of the HTTP transport wrapping it.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use catalog_store::model::{Conversation, Event, Step};

use crate::errors::ClientOutcome;

/// A pending client-facing action the front end may want to prompt for
/// (e.g. "pick one of these dates").
#[derive(Debug, Clone, Serialize)]
pub struct PendingAction {
    #[serde(rename = "type")]
    pub action_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

/// Compact event summary surfaced alongside a reply; not the full audit
/// trail, just enough for a client or UI to orient on.
#[derive(Debug, Clone, Serialize)]
pub struct EventInfo {
    pub event_id: String,
    pub status: &'static str,
    pub event_date: Option<NaiveDate>,
    pub room: Option<String>,
    pub participants_count: Option<u32>,
    pub offer_accepted: bool,
}

/// Deposit status, only attached once the workflow has reached Step 4 or
/// later (§6: "`deposit_info` is only emitted at `current_step >= 4`").
#[derive(Debug, Clone, Serialize)]
pub struct DepositInfo {
    pub deposit_required: bool,
    pub deposit_amount: Option<f64>,
    pub deposit_vat_included: bool,
    pub deposit_due_date: Option<NaiveDate>,
    pub deposit_paid: bool,
    pub deposit_paid_at: Option<DateTime<Utc>>,
    pub event_id: String,
    pub offer_accepted: bool,
}

/// The shape every `start_conversation`/`send_message`/`confirm_date`/HIL
/// operation in §6 returns to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowReply {
    pub session_id: String,
    pub workflow_type: &'static str,
    /// Empty exactly when a HIL task is pending and nothing else was
    /// released to the client this tick.
    pub response: String,
    pub is_complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_info: Option<EventInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_actions: Option<PendingAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deposit_info: Option<DepositInfo>,
}

fn status_label(status: catalog_store::model::EventStatus) -> &'static str {
    use catalog_store::model::EventStatus::*;
    match status {
        Lead => "lead",
        Option => "option",
        Confirmed => "confirmed",
        Cancelled => "cancelled",
    }
}

/// Builds the reply the caller sees from the conversation/event left after
/// a tick, given what the tick decided to show the client.
pub fn build_reply(conversation: &Conversation, event: &Event, outcome: &ClientOutcome) -> WorkflowReply {
    let (response, is_complete) = match outcome {
        ClientOutcome::Draft(body) => (body.clone(), matches!(conversation.current_step, Step::EventConfirmation) && matches!(event.status, catalog_store::model::EventStatus::Confirmed)),
        ClientOutcome::HilPending => (String::new(), false),
        ClientOutcome::Error { message, .. } => (message.clone(), false),
    };

    let event_info = Some(EventInfo {
        event_id: event.event_id.clone(),
        status: status_label(event.status),
        event_date: event.event_date,
        room: event.locked_room_id.clone(),
        participants_count: event.participants_count,
        offer_accepted: event.offer_accepted,
    });

    let pending_actions = if event.event_date.is_none() {
        Some(PendingAction {
            action_type: "confirm_date".to_string(),
            date: None,
        })
    } else if matches!(conversation.current_step, Step::EventConfirmation) && event.site_visit_state.status == catalog_store::model::SiteVisitStatus::Proposed {
        Some(PendingAction {
            action_type: "pick_site_visit_date".to_string(),
            date: None,
        })
    } else {
        None
    };

    let deposit_info = if conversation.current_step.as_u8() >= Step::OfferPreparation.as_u8() {
        Some(DepositInfo {
            deposit_required: event.deposit_state.required,
            deposit_amount: event.deposit_state.amount,
            deposit_vat_included: event.deposit_state.vat_included,
            deposit_due_date: event.deposit_state.deadline,
            deposit_paid: event.deposit_state.paid,
            deposit_paid_at: event.deposit_state.paid_at,
            event_id: event.event_id.clone(),
            offer_accepted: event.offer_accepted,
        })
    } else {
        None
    };

    WorkflowReply {
        session_id: conversation.thread_id.clone(),
        workflow_type: "event_inquiry",
        response,
        is_complete,
        event_info,
        pending_actions,
        deposit_info,
    }
}

/// Result of a terminal, non-conversational operation (`accept_booking`,
/// `reject_booking`) — these don't run the step loop, so they don't
/// produce a client-facing draft, just the event's new state.
#[derive(Debug, Clone, Serialize)]
pub struct OperationResult {
    pub thread_id: String,
    pub event_id: String,
    pub status: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deposit_info_absent_before_step_four() {
        let conversation = Conversation::new("t1", "a@b.com");
        let event = Event::new("ev1", "c1", "t1");
        let reply = build_reply(&conversation, &event, &ClientOutcome::Draft("hi".into()));
        assert!(reply.deposit_info.is_none());
    }

    #[test]
    fn deposit_info_present_from_step_four_onward() {
        let mut conversation = Conversation::new("t1", "a@b.com");
        conversation.current_step = Step::OfferPreparation;
        let event = Event::new("ev1", "c1", "t1");
        let reply = build_reply(&conversation, &event, &ClientOutcome::Draft("hi".into()));
        assert!(reply.deposit_info.is_some());
    }

    #[test]
    fn hil_pending_outcome_yields_empty_response() {
        let conversation = Conversation::new("t1", "a@b.com");
        let event = Event::new("ev1", "c1", "t1");
        let reply = build_reply(&conversation, &event, &ClientOutcome::HilPending);
        assert!(reply.response.is_empty());
        assert!(!reply.is_complete);
    }
}
