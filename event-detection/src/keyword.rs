//! Regex/keyword matchers. Each is a small, independently testable pass;
//! `merge.rs` composes them with the LLM's `IntentSignal` per §4.3's
//! precedence rules.

use chrono::NaiveDate;
use event_llm::types::QnaType;
use lazy_static::lazy_static;
use regex::Regex;

use crate::signals::DateSignal;

lazy_static! {
    static ref QUESTION_MARK: Regex = Regex::new(r"\?").unwrap();
    static ref INTERROGATIVE_INITIAL: Regex =
        Regex::new(r"(?i)^\s*(what|which|when|who|why|how)\b").unwrap();

    static ref ROOM_CHOICE_TOKEN: Regex = Regex::new(r"(?i)\bRoom\s+[A-Za-z0-9][\w-]*\b").unwrap();
    static ref ROOM_AVAILABILITY_QUESTION: Regex =
        Regex::new(r"(?i)\bis\s+Room\s+[A-Za-z0-9][\w-]*\s+available\b").unwrap();
    static ref PROCEED_WITH_ROOM: Regex =
        Regex::new(r"(?i)\bproceed\s+with\s+Room\s+[A-Za-z0-9][\w-]*\b").unwrap();

    static ref ACCEPTANCE_PHRASES: Regex = Regex::new(
        r"(?i)\b(sounds?\s+good|that\s+works|looks?\s+perfect|go\s+ahead|we\s+accept|please\s+proceed|let'?s\s+proceed|please\s+send|that'?s\s+fine|we\s+confirm|confirmed|continue)\b"
    ).unwrap();
    static ref REJECTION_PHRASES: Regex = Regex::new(
        r"(?i)\b(not\s+interested|no\s+thanks|won'?t\s+work|can'?t\s+do\s+that|we\s+decline|declining|reject(ed)?|doesn'?t\s+work\s+for\s+us)\b"
    ).unwrap();
    static ref COUNTER_OFFER_PHRASES: Regex = Regex::new(
        r"(?i)\b(how\s+about|what\s+if\s+we|could\s+you\s+do|we'?d\s+prefer|can\s+you\s+lower|counter[- ]?offer|would\s+you\s+accept)\b"
    ).unwrap();
    static ref CONFIRMATION_PHRASES: Regex = Regex::new(
        r"(?i)\b(yes,?\s+that\s+works|confirmed|that\s+works\s+for\s+us|sounds\s+perfect|yes\s+please)\b"
    ).unwrap();
    static ref BILLING_PHRASES: Regex = Regex::new(
        r"(?i)\b(billing\s+address|invoice\s+(address|to)|company\s+name|vat\s+number|postal\s+code|zip\s+code|our\s+address\s+is)\b"
    ).unwrap();

    static ref QNA_CATERING: Regex = Regex::new(r"(?i)\bcatering|menu|food|dietary\b").unwrap();
    static ref QNA_PRICING: Regex = Regex::new(r"(?i)\bprice|cost|how\s+much|rate\b").unwrap();
    static ref QNA_ROOM_FEATURES: Regex =
        Regex::new(r"(?i)\b(room\s+)?(amenit|feature|capacity|layout|projector|wifi)\b").unwrap();
    static ref QNA_SITE_VISIT: Regex = Regex::new(r"(?i)\bsite\s+visit|tour\s+the\s+venue|come\s+see\s+the\s+room\b").unwrap();
    static ref QNA_LOGISTICS: Regex = Regex::new(r"(?i)\bparking|directions|accessib|public\s+transport\b").unwrap();

    static ref DATE_ISO: Regex = Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").unwrap();
    static ref DATE_DDMMYYYY: Regex = Regex::new(r"\b(\d{1,2})\.(\d{1,2})\.(\d{4})\b").unwrap();
    static ref DATE_RELATIVE: Regex = Regex::new(
        r"(?i)\b(monday|tuesday|wednesday|thursday|friday|saturday|sunday)(\s+(works|works\s+for\s+us|next\s+week|in\s+the\s+first\s+\w+\s+week))?\b"
    ).unwrap();
}

/// (a) contains a question mark, or (b) a single-word interrogative is
/// sentence-initial.
pub fn has_question_signal(text: &str) -> bool {
    if QUESTION_MARK.is_match(text) {
        return true;
    }
    text.split(['.', '!', '\n'])
        .any(|sentence| INTERROGATIVE_INITIAL.is_match(sentence.trim()))
}

/// Keyword-based Q&A sub-categories. Returns an empty vec if nothing matched.
pub fn keyword_qna_types(text: &str) -> Vec<QnaType> {
    let mut types = Vec::new();
    if QNA_CATERING.is_match(text) {
        types.push(QnaType::Catering);
    }
    if QNA_PRICING.is_match(text) {
        types.push(QnaType::Pricing);
    }
    if QNA_ROOM_FEATURES.is_match(text) {
        types.push(QnaType::RoomFeatures);
    }
    if QNA_SITE_VISIT.is_match(text) {
        types.push(QnaType::SiteVisit);
    }
    if QNA_LOGISTICS.is_match(text) {
        types.push(QnaType::Logistics);
    }
    if types.is_empty() && has_question_signal(text) {
        types.push(QnaType::General);
    }
    types
}

/// The literal "Room X" token in the message, if any.
pub fn room_choice_token(text: &str) -> Option<String> {
    ROOM_CHOICE_TOKEN.find(text).map(|m| m.as_str().to_string())
}

/// Acceptance keyword match, with the question guard from §4.3: a
/// "proceed with Room X" room-selection phrase or an "Is Room X
/// available?" question is never read as offer acceptance.
pub fn is_acceptance(text: &str) -> bool {
    if ROOM_AVAILABILITY_QUESTION.is_match(text) || PROCEED_WITH_ROOM.is_match(text) {
        return false;
    }
    ACCEPTANCE_PHRASES.is_match(text)
}

pub fn is_rejection(text: &str) -> bool {
    REJECTION_PHRASES.is_match(text)
}

pub fn is_counter_offer(text: &str) -> bool {
    COUNTER_OFFER_PHRASES.is_match(text)
}

pub fn is_confirmation(text: &str) -> bool {
    CONFIRMATION_PHRASES.is_match(text)
}

pub fn billing_signal(text: &str) -> bool {
    BILLING_PHRASES.is_match(text)
}

/// Extracts the first date-like token: ISO, DD.MM.YYYY, or a relative
/// weekday phrase. ISO/DD.MM.YYYY resolve to a concrete date here;
/// relative phrases are flagged `is_relative` for `event-routing` to
/// resolve against "now".
pub fn date_signal(text: &str) -> Option<DateSignal> {
    if let Some(m) = DATE_ISO.find(text) {
        let caps = DATE_ISO.captures(m.as_str()).unwrap();
        let (y, mo, d) = (
            caps[1].parse().ok()?,
            caps[2].parse().ok()?,
            caps[3].parse().ok()?,
        );
        return Some(DateSignal {
            raw: m.as_str().to_string(),
            iso: NaiveDate::from_ymd_opt(y, mo, d),
            is_relative: false,
        });
    }
    if let Some(m) = DATE_DDMMYYYY.find(text) {
        let caps = DATE_DDMMYYYY.captures(m.as_str()).unwrap();
        let (d, mo, y) = (
            caps[1].parse().ok()?,
            caps[2].parse().ok()?,
            caps[3].parse().ok()?,
        );
        return Some(DateSignal {
            raw: m.as_str().to_string(),
            iso: NaiveDate::from_ymd_opt(y, mo, d),
            is_relative: false,
        });
    }
    if let Some(m) = DATE_RELATIVE.find(text) {
        return Some(DateSignal {
            raw: m.as_str().to_string(),
            iso: None,
            is_relative: true,
        });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_mark_always_signals() {
        assert!(has_question_signal("What time works?"));
    }

    #[test]
    fn sentence_initial_interrogative_without_mark_signals() {
        assert!(has_question_signal("What time works for you"));
    }

    #[test]
    fn mid_sentence_interrogative_without_mark_does_not_signal() {
        assert!(!has_question_signal("I wonder what time works"));
    }

    #[test]
    fn acceptance_ignores_room_choice_question() {
        assert!(!is_acceptance("Is Room B available?"));
        assert!(!is_acceptance("Let's proceed with Room B."));
    }

    #[test]
    fn hybrid_accept_then_question_still_detects_acceptance() {
        let text = "Room B looks perfect. Do you offer catering services?";
        assert!(is_acceptance(text));
        assert!(has_question_signal(text));
    }

    #[test]
    fn room_choice_token_extracted() {
        assert_eq!(room_choice_token("We'll take Room B please"), Some("Room B".to_string()));
    }

    #[test]
    fn iso_date_parses() {
        let sig = date_signal("Book it for 2026-06-11 please").unwrap();
        assert_eq!(sig.iso, NaiveDate::from_ymd_opt(2026, 6, 11));
        assert!(!sig.is_relative);
    }

    #[test]
    fn ddmmyyyy_date_parses() {
        let sig = date_signal("on 05.09.2026 please").unwrap();
        assert_eq!(sig.iso, NaiveDate::from_ymd_opt(2026, 9, 5));
    }

    #[test]
    fn relative_weekday_is_flagged_relative() {
        let sig = date_signal("Thursday works for us").unwrap();
        assert!(sig.is_relative);
        assert!(sig.iso.is_none());
    }
}
