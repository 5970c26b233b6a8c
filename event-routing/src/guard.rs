//! Out-of-context guard (§4.4): blocks a reply only when there is
//! positive intent evidence that it does not belong at the stored step,
//! and bypasses itself for billing flow / deposit-just-paid / Step 4-5
//! confirmation signals.

use catalog_store::model::Step;
use event_detection::UnifiedSignals;

/// Any of these signals counts as "intent evidence" worth routing on.
fn has_intent_evidence(signals: &UnifiedSignals) -> bool {
    signals.has_question_signal
        || signals.is_acceptance
        || signals.is_rejection
        || signals.is_counter_offer
        || signals.date_signal.is_some()
        || signals.billing_signal
}

/// Returns `true` when the reply should be routed to a clarification
/// response instead of being processed at `stored_step` as-is.
///
/// Bypassed entirely when `billing_flow_active`, `deposit_just_paid`, or
/// (confirmation language at Step 4/5, where a plain "yes" is always
/// in-context).
pub fn out_of_context_guard(
    stored_step: Step,
    signals: &UnifiedSignals,
    reply_matches_expected: bool,
    billing_flow_active: bool,
    deposit_just_paid: bool,
) -> bool {
    if billing_flow_active || deposit_just_paid {
        return false;
    }
    let step4_5_confirmation = signals.is_confirmation
        && matches!(stored_step, Step::OfferPreparation | Step::NegotiationClose);
    if step4_5_confirmation {
        return false;
    }
    has_intent_evidence(signals) && !reply_matches_expected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signals_with_question() -> UnifiedSignals {
        UnifiedSignals {
            has_question_signal: true,
            ..Default::default()
        }
    }

    #[test]
    fn blocks_when_evidence_present_and_reply_unexpected() {
        let blocked = out_of_context_guard(
            Step::DateConfirmation,
            &signals_with_question(),
            false,
            false,
            false,
        );
        assert!(blocked);
    }

    #[test]
    fn billing_flow_always_bypasses_guard() {
        let blocked = out_of_context_guard(
            Step::DateConfirmation,
            &signals_with_question(),
            false,
            true,
            false,
        );
        assert!(!blocked);
    }

    #[test]
    fn deposit_just_paid_bypasses_guard() {
        let blocked = out_of_context_guard(
            Step::EventConfirmation,
            &signals_with_question(),
            false,
            false,
            true,
        );
        assert!(!blocked);
    }

    #[test]
    fn step5_confirmation_language_is_never_out_of_context() {
        let signals = UnifiedSignals {
            is_confirmation: true,
            has_question_signal: true,
            ..Default::default()
        };
        let blocked = out_of_context_guard(Step::NegotiationClose, &signals, false, false, false);
        assert!(!blocked);
    }

    #[test]
    fn no_evidence_never_blocks() {
        let blocked = out_of_context_guard(
            Step::DateConfirmation,
            &UnifiedSignals::default(),
            false,
            false,
            false,
        );
        assert!(!blocked);
    }
}
