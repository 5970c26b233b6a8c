//! The single per-message signal bundle every downstream component reads.

use chrono::NaiveDate;
use event_llm::types::{Intent, QnaType};
use serde::{Deserialize, Serialize};

/// A date-like token found in the raw message text, normalized where possible.
/// Normalization to ISO happens once, downstream, in `event-routing`
/// (`normalize_date_to_iso`) so every comparison goes through one chokepoint;
/// this struct only carries what detection itself could resolve inline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateSignal {
    /// The exact substring that looked like a date.
    pub raw: String,
    /// Resolved ISO date, if the raw token was unambiguous (ISO or DD.MM.YYYY).
    pub iso: Option<NaiveDate>,
    /// True for relative phrases ("Thursday works", "Friday next week") that
    /// need `event-routing`'s relative-phrase resolver against "now".
    pub is_relative: bool,
}

/// One `UnifiedSignals` bundle per inbound message (§4.3, GLOSSARY).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnifiedSignals {
    pub has_question_signal: bool,
    pub qna_types: Vec<QnaType>,
    pub is_acceptance: bool,
    pub is_rejection: bool,
    pub is_change_request: bool,
    pub is_confirmation: bool,
    pub is_counter_offer: bool,
    pub billing_signal: bool,
    /// The literal "Room X" token, if the message names a specific room.
    pub room_choice_token: Option<String>,
    pub date_signal: Option<DateSignal>,
    pub confidence: f32,
    pub intent: Intent,
    pub secondary: Vec<Intent>,
}

impl Default for UnifiedSignals {
    fn default() -> Self {
        Self {
            has_question_signal: false,
            qna_types: Vec::new(),
            is_acceptance: false,
            is_rejection: false,
            is_change_request: false,
            is_confirmation: false,
            is_counter_offer: false,
            billing_signal: false,
            room_choice_token: None,
            date_signal: None,
            confidence: 0.0,
            intent: Intent::Other,
            secondary: Vec::new(),
        }
    }
}
