//! `Event`: a booking in progress, and everything attached to it.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Authoritative booking status. `Client` deliberately has no `status`
/// field of its own — only `Event::status` is ever consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Lead,
    Option,
    Confirmed,
    Cancelled,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoomPendingDecision {
    pub candidate_room_id: String,
    pub missing_products: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BillingDetails {
    pub name: Option<String>,
    pub company: Option<String>,
    pub street: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

impl BillingDetails {
    /// Billing gate completeness: `(name ∨ company) ∧ street ∧ postal ∧ city ∧ country`.
    pub fn is_complete(&self) -> bool {
        (self.name.as_ref().is_some_and(|s| !s.trim().is_empty())
            || self.company.as_ref().is_some_and(|s| !s.trim().is_empty()))
            && non_empty(&self.street)
            && non_empty(&self.postal_code)
            && non_empty(&self.city)
            && non_empty(&self.country)
    }

    /// Names which required fields are still missing, for prompting the client.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if !(self.name.as_ref().is_some_and(|s| !s.trim().is_empty())
            || self.company.as_ref().is_some_and(|s| !s.trim().is_empty()))
        {
            missing.push("name or company");
        }
        if !non_empty(&self.street) {
            missing.push("street");
        }
        if !non_empty(&self.postal_code) {
            missing.push("postal code");
        }
        if !non_empty(&self.city) {
            missing.push("city");
        }
        if !non_empty(&self.country) {
            missing.push("country");
        }
        missing
    }
}

fn non_empty(field: &Option<String>) -> bool {
    field.as_ref().is_some_and(|s| !s.trim().is_empty())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BillingRequirements {
    pub awaiting_billing_for_accept: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DepositState {
    pub required: bool,
    pub amount: Option<f64>,
    pub vat_included: bool,
    pub deadline: Option<NaiveDate>,
    pub paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
}

impl DepositState {
    /// Deposit gate: passes iff not required, or required and paid.
    pub fn gate_passed(&self) -> bool {
        !self.required || self.paid
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiteVisitStatus {
    Idle,
    Proposed,
    TimePending,
    Scheduled,
    Completed,
    Declined,
    NoShow,
}

impl Default for SiteVisitStatus {
    fn default() -> Self {
        Self::Idle
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteVisitState {
    pub status: SiteVisitStatus,
    pub proposed_dates: Vec<NaiveDate>,
    pub selected_date: Option<NaiveDate>,
    pub confirmed_time: Option<NaiveTime>,
}

impl SiteVisitState {
    /// A site visit gate is "resolved" if it was never required, or it
    /// reached a terminal state (scheduled/completed/declined/no-show).
    pub fn resolved(&self) -> bool {
        matches!(
            self.status,
            SiteVisitStatus::Idle
                | SiteVisitStatus::Scheduled
                | SiteVisitStatus::Completed
                | SiteVisitStatus::Declined
                | SiteVisitStatus::NoShow
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NegotiationPendingDecision {
    pub summary_body: String,
    pub summary_body_markdown: String,
    pub task_id: String,
}

/// One append-only audit entry. `data` is an open JSON payload since audit
/// shapes vary per action (offer composed, room locked, deposit recorded, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub step: super::step::Step,
    pub action: String,
    pub timestamp: DateTime<Utc>,
    pub data: serde_json::Value,
}

/// A booking in progress, one per active (or historical) client engagement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub event_id: String,
    pub client_id: String,
    pub thread_id: String,
    pub status: EventStatus,

    pub event_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub participants_count: Option<u32>,
    pub seating_layout: Option<String>,

    pub requirements_hash: Option<String>,
    pub room_eval_hash: Option<String>,

    pub locked_room_id: Option<String>,
    pub room_pending_decision: Option<RoomPendingDecision>,

    pub offer_sequence: u32,
    pub offer_status: Option<String>,
    pub offer_accepted: bool,
    pub current_offer_id: Option<String>,
    /// sku -> quantity. Exposed as a map so "increment on another X" is a
    /// single `entry(sku).or_insert(0) += qty` instead of a linear scan.
    pub offer_line_items: std::collections::BTreeMap<String, u32>,

    pub billing_details: BillingDetails,
    pub billing_requirements: BillingRequirements,

    pub deposit_state: DepositState,
    pub site_visit_state: SiteVisitState,

    pub negotiation_pending_decision: Option<NegotiationPendingDecision>,
    pub negotiation_counter_count: u32,

    /// Set once the auto-sent "Final Contract" HIL draft (§4.8) has been
    /// enqueued, so a later unrelated message never re-triggers it.
    pub final_contract_sent: bool,

    pub audit_log: Vec<AuditEntry>,

    /// Optimistic-concurrency version, bumped on every successful save.
    pub version: u64,
}

impl Event {
    pub fn new(event_id: impl Into<String>, client_id: impl Into<String>, thread_id: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            client_id: client_id.into(),
            thread_id: thread_id.into(),
            status: EventStatus::Lead,
            event_date: None,
            start_time: None,
            end_time: None,
            participants_count: None,
            seating_layout: None,
            requirements_hash: None,
            room_eval_hash: None,
            locked_room_id: None,
            room_pending_decision: None,
            offer_sequence: 0,
            offer_status: None,
            offer_accepted: false,
            current_offer_id: None,
            offer_line_items: std::collections::BTreeMap::new(),
            billing_details: BillingDetails::default(),
            billing_requirements: BillingRequirements::default(),
            deposit_state: DepositState::default(),
            site_visit_state: SiteVisitState::default(),
            negotiation_pending_decision: None,
            negotiation_counter_count: 0,
            final_contract_sent: false,
            audit_log: Vec::new(),
            version: 0,
        }
    }

    pub fn push_audit(&mut self, step: super::step::Step, action: impl Into<String>, data: serde_json::Value) {
        self.audit_log.push(AuditEntry {
            step,
            action: action.into(),
            timestamp: Utc::now(),
            data,
        });
    }

    /// §3 invariant: reuse terminates and whether a fresh event is required.
    pub fn must_start_fresh(&self, new_date: Option<NaiveDate>, is_change_request: bool) -> bool {
        if matches!(self.status, EventStatus::Confirmed | EventStatus::Cancelled) {
            return true;
        }
        if self.offer_accepted {
            return true;
        }
        if matches!(
            self.site_visit_state.status,
            SiteVisitStatus::Proposed | SiteVisitStatus::Scheduled
        ) {
            return true;
        }
        if let (Some(new_date), Some(existing)) = (new_date, self.event_date) {
            if new_date != existing && !is_change_request {
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn billing_complete_requires_name_or_company() {
        let mut b = BillingDetails {
            street: Some("Main 1".into()),
            postal_code: Some("8000".into()),
            city: Some("Zurich".into()),
            country: Some("CH".into()),
            ..Default::default()
        };
        assert!(!b.is_complete());
        b.company = Some("Acme".into());
        assert!(b.is_complete());
    }

    #[test]
    fn deposit_gate_passes_when_not_required() {
        let d = DepositState::default();
        assert!(d.gate_passed());
    }

    #[test]
    fn deposit_gate_blocks_until_paid() {
        let d = DepositState {
            required: true,
            paid: false,
            ..Default::default()
        };
        assert!(!d.gate_passed());
    }

    #[test]
    fn confirmed_event_always_needs_fresh_start() {
        let mut e = Event::new("ev1", "cl1", "th1");
        e.status = EventStatus::Confirmed;
        assert!(e.must_start_fresh(None, false));
    }

    #[test]
    fn new_concrete_date_without_change_request_forces_fresh_start() {
        let mut e = Event::new("ev1", "cl1", "th1");
        e.event_date = Some(NaiveDate::from_ymd_opt(2026, 8, 1).unwrap());
        let new_date = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();
        assert!(e.must_start_fresh(Some(new_date), false));
        assert!(!e.must_start_fresh(Some(new_date), true));
    }
}
