//! Stable output shapes for the three adapter entry points (§4.2).

use serde::{Deserialize, Serialize};

/// Coarse classification of what an inbound message is trying to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    EventRequest,
    ChangeRequest,
    Negotiation,
    Other,
}

/// Q&A sub-categories the keyword matcher and the LLM can both emit;
/// unified detection reconciles the two populations of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QnaType {
    Catering,
    Pricing,
    RoomFeatures,
    SiteVisit,
    Logistics,
    General,
}

/// Output of the intent classifier adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentSignal {
    pub intent: Intent,
    pub is_question: bool,
    pub is_acceptance: bool,
    pub is_rejection: bool,
    pub is_change_request: bool,
    pub is_confirmation: bool,
    pub confidence: f32,
    pub qna_types: Vec<QnaType>,
    pub room_preference: Option<String>,
    pub secondary: Vec<Intent>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

impl Default for IntentSignal {
    fn default() -> Self {
        Self {
            intent: Intent::Other,
            is_question: false,
            is_acceptance: false,
            is_rejection: false,
            is_change_request: false,
            is_confirmation: false,
            confidence: 0.0,
            qna_types: Vec::new(),
            room_preference: None,
            secondary: Vec::new(),
            start_time: None,
            end_time: None,
        }
    }
}

/// A billing address fragment extracted from free text. Every field is
/// optional: partial billing info across several messages is merged by
/// the caller, never invented here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BillingFragment {
    pub name: Option<String>,
    pub company: Option<String>,
    pub street: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

/// Output of the entity extractor adapter. Missing fields are `None`,
/// never invented.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityExtraction {
    pub date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub participants: Option<u32>,
    pub room: Option<String>,
    pub products_add: Vec<String>,
    pub products_remove: Vec<String>,
    pub billing: Option<BillingFragment>,
    pub vague_month: Option<String>,
    pub force_next_year: bool,
}

/// One verbatim fact the verbalizer output must preserve (§4.5, §8).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HardFact {
    Date(String),
    Amount { value: String, unit: String },
    RoomName(String),
    ParticipantCount(u32),
    TimeWindow { start: String, end: String },
}

impl HardFact {
    /// Unit aliasing: "per person" == "per guest", "per event" == "per booking".
    fn canonical_unit(unit: &str) -> String {
        let u = unit.trim().to_ascii_lowercase();
        match u.as_str() {
            "per guest" => "per person".to_string(),
            "per booking" => "per event".to_string(),
            other => other.to_string(),
        }
    }

    /// Equality that treats unit aliases as one equivalence class.
    pub fn equivalent(&self, other: &HardFact) -> bool {
        match (self, other) {
            (HardFact::Amount { value: v1, unit: u1 }, HardFact::Amount { value: v2, unit: u2 }) => {
                v1 == v2 && Self::canonical_unit(u1) == Self::canonical_unit(u2)
            }
            _ => self == other,
        }
    }
}

/// The structured input to the verbalizer; the contract between
/// deterministic logic and LLM prose (§4.5, GLOSSARY "Facts bundle").
#[derive(Debug, Clone, Default)]
pub struct FactsBundle {
    pub facts: Vec<HardFact>,
    /// Deterministic body the verbalizer is allowed to rewrite.
    pub deterministic_body: String,
}

impl FactsBundle {
    pub fn push(&mut self, fact: HardFact) {
        self.facts.push(fact);
    }
}
