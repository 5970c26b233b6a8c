//! Merges pre-filter, regex/keyword, and LLM signals into one
//! [`UnifiedSignals`] bundle (§4.3).

use event_llm::types::{Intent, IntentSignal};
use tracing::debug;

use crate::keyword;
use crate::prefilter;
use crate::signals::UnifiedSignals;

/// Runs every detection pass over `body` and merges the result with the
/// LLM's [`IntentSignal`], applying the precedence rules from §4.3.
pub fn detect(body: &str, llm: &IntentSignal) -> UnifiedSignals {
    let stripped = prefilter::strip_quoted_history(body);
    let normalized = prefilter::normalize_apostrophes(&stripped);

    debug!(len = normalized.len(), "unified detection: stripped + normalized body");

    let ack_only = prefilter::is_acknowledgment_only(&normalized);

    let kw_question = keyword::has_question_signal(&normalized);
    let kw_qna_types = keyword::keyword_qna_types(&normalized);
    let room_choice_token = keyword::room_choice_token(&normalized);
    let date_signal = keyword::date_signal(&normalized);

    let kw_acceptance = keyword::is_acceptance(&normalized);
    let kw_rejection = keyword::is_rejection(&normalized);
    let kw_counter = keyword::is_counter_offer(&normalized);
    let kw_confirmation = keyword::is_confirmation(&normalized);
    let kw_billing = keyword::billing_signal(&normalized);

    // Acknowledgments short-circuit Q&A outright.
    let (has_question_signal, qna_types) = if ack_only {
        (false, Vec::new())
    } else if kw_question {
        // A real question-mark/sentence-initial signal: LLM wins over
        // keyword Q&A types, but keyword types are retained if the LLM
        // agrees there is a question, or produced Q&A types of its own.
        let retained = if llm.is_question || !llm.qna_types.is_empty() {
            let mut merged = kw_qna_types.clone();
            for t in &llm.qna_types {
                if !merged.contains(t) {
                    merged.push(*t);
                }
            }
            merged
        } else if llm.is_question {
            kw_qna_types.clone()
        } else {
            Vec::new()
        };
        (llm.is_question || kw_question, retained)
    } else if !kw_qna_types.is_empty() {
        // Pattern-only match (no "?", no sentence-initial interrogative):
        // defer entirely to the LLM's classification.
        if llm.is_question {
            (true, llm.qna_types.clone())
        } else {
            (false, Vec::new())
        }
    } else {
        (llm.is_question, llm.qna_types.clone())
    };

    // Confirmation language never suppresses Q&A: both signals survive
    // independently, so hybrid "accept + ask" messages preserve both.
    let is_acceptance = (kw_acceptance || llm.is_acceptance) && !ack_only_overrides_acceptance(&normalized, ack_only);
    let is_confirmation = kw_confirmation || llm.is_confirmation;
    let is_rejection = kw_rejection || llm.is_rejection;
    let is_counter_offer = kw_counter;
    let is_change_request = llm.is_change_request || date_signal.is_some();
    let billing_signal = kw_billing;

    UnifiedSignals {
        has_question_signal,
        qna_types,
        is_acceptance,
        is_rejection,
        is_change_request,
        is_confirmation,
        is_counter_offer,
        billing_signal,
        room_choice_token,
        date_signal,
        confidence: llm.confidence,
        intent: llm.intent,
        secondary: llm.secondary.clone(),
    }
}

/// An acknowledgment-only message ("thanks") carries no acceptance signal
/// of its own even though some acknowledgment phrasing overlaps
/// lexically with acceptance phrasing.
fn ack_only_overrides_acceptance(_text: &str, ack_only: bool) -> bool {
    ack_only
}

/// Convenience used by callers that have no LLM signal available (e.g. a
/// fallback path) and only want the deterministic portion of detection.
pub fn detect_deterministic_only(body: &str) -> UnifiedSignals {
    detect(
        body,
        &IntentSignal {
            intent: Intent::Other,
            ..Default::default()
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use event_llm::types::QnaType;

    fn llm(is_question: bool, is_acceptance: bool, qna: Vec<QnaType>) -> IntentSignal {
        IntentSignal {
            intent: Intent::EventRequest,
            is_question,
            is_acceptance,
            confidence: 0.9,
            qna_types: qna,
            ..Default::default()
        }
    }

    #[test]
    fn hybrid_accept_and_question_both_survive() {
        let signals = detect(
            "Room B looks perfect. Do you offer catering services?",
            &llm(true, true, vec![QnaType::Catering]),
        );
        assert!(signals.is_acceptance);
        assert!(signals.has_question_signal);
        assert!(signals.qna_types.contains(&QnaType::Catering));
    }

    #[test]
    fn acknowledgment_short_circuits_qna() {
        let signals = detect("Thanks!", &llm(false, false, vec![]));
        assert!(!signals.has_question_signal);
        assert!(signals.qna_types.is_empty());
    }

    #[test]
    fn pattern_only_qna_defers_to_llm() {
        // "catering" keyword, no "?" and no sentence-initial interrogative.
        let text = "we would like catering included in the package";
        let with_llm_question = detect(text, &llm(true, false, vec![QnaType::Catering]));
        assert!(with_llm_question.has_question_signal);

        let without_llm_question = detect(text, &llm(false, false, vec![]));
        assert!(!without_llm_question.has_question_signal);
    }

    #[test]
    fn confirmation_language_does_not_suppress_question() {
        let signals = detect(
            "Yes, that works. What time should we arrive?",
            &llm(true, false, vec![QnaType::General]),
        );
        assert!(signals.is_confirmation);
        assert!(signals.has_question_signal);
    }

    #[test]
    fn room_choice_question_guard_blocks_acceptance() {
        let signals = detect("Is Room B available?", &llm(true, false, vec![]));
        assert!(!signals.is_acceptance);
        assert_eq!(signals.room_choice_token.as_deref(), Some("Room B"));
    }
}
