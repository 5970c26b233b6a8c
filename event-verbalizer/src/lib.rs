//! Verbalizer + Safety Verifier (C5): rewrites deterministic drafts into
//! empathetic prose and verifies every hard fact survives the rewrite,
//! falling back to the deterministic body on any violation (§4.5).

pub mod tone;
pub mod verify;

use catalog_store::model::Step;
use event_llm::{Adapters, FactsBundle, FallbackReason, FallbackSource, FallbackTrigger};
use tracing::{debug, warn};

pub use tone::VerbalizerTone;
pub use verify::{VerifyResult, patch_once, verify};

/// Outcome of a verbalize pass: either the LLM's (verified, possibly
/// patched) prose, or the deterministic body with a reason recorded for
/// why the LLM's output couldn't be trusted.
#[derive(Debug, Clone)]
pub struct VerbalizedDraft {
    pub body: String,
    pub used_llm: bool,
    pub fallback: Option<FallbackReason>,
}

fn step_system_prompt(step: Step) -> &'static str {
    match step {
        Step::Intake => {
            "You rewrite a venue-booking assistant's reply with empathy. Never invent or alter \
             dates, prices, room names, or participant counts — they must appear exactly as given."
        }
        Step::DateConfirmation => {
            "Rewrite this date-confirmation message with warmth, leading with acknowledging the \
             client's preferred date before any alternatives. Never invent or alter dates, prices, \
             room names, or participant counts."
        }
        Step::RoomAvailability => {
            "Rewrite this room-recommendation message leading with the recommendation itself. \
             Never invent or alter dates, prices, room names, or participant counts."
        }
        Step::OfferPreparation => {
            "Rewrite this offer message, justifying the total with its line items. Never invent or \
             alter dates, prices (including their units), room names, or participant counts."
        }
        Step::NegotiationClose => {
            "Rewrite this message acknowledging the client's decision empathetically. Never invent \
             or alter dates, prices, room names, or participant counts."
        }
        Step::TransitionCheckpoint => {
            "Rewrite this checkpoint message clearly and briefly. Never invent or alter dates, \
             prices, room names, or participant counts."
        }
        Step::EventConfirmation => {
            "Rewrite this confirmation message with a celebratory tone. Never invent or alter \
             dates, prices, room names, or participant counts."
        }
    }
}

/// Runs the full Safety Sandwich: generate → extract hard facts from the
/// output → compare to the bundle → patch-once → fallback-to-template.
pub async fn verbalize(
    adapters: &Adapters,
    bundle: &FactsBundle,
    tone: VerbalizerTone,
    step: Step,
    context: impl Into<String>,
) -> VerbalizedDraft {
    if tone == VerbalizerTone::Plain {
        debug!(step = %step, "verbalizer tone=plain, skipping LLM rewrite");
        return VerbalizedDraft {
            body: bundle.deterministic_body.clone(),
            used_llm: false,
            fallback: None,
        };
    }

    let context = context.into();
    let system_prompt = step_system_prompt(step);

    let raw = match adapters.verbalize(system_prompt, &bundle.deterministic_body).await {
        Ok(raw) if !raw.trim().is_empty() => raw,
        Ok(_) => {
            return fallback(
                bundle,
                FallbackReason::new(
                    FallbackSource::Verbalizer,
                    FallbackTrigger::EmptyOutput,
                    context,
                    "verbalizer returned empty output",
                ),
            );
        }
        Err(e) => {
            return fallback(
                bundle,
                FallbackReason::new(FallbackSource::Verbalizer, FallbackTrigger::LlmException, context, e.to_string()),
            );
        }
    };

    let result = verify(&bundle.facts, &raw);
    if result.is_clean() {
        return VerbalizedDraft {
            body: raw,
            used_llm: true,
            fallback: None,
        };
    }

    warn!(missing = result.missing.len(), invented = result.invented.len(), "verbalizer violation, attempting patch");
    let patched = patch_once(&raw, &result.missing);
    let re_check = verify(&bundle.facts, &patched);
    if re_check.is_clean() {
        return VerbalizedDraft {
            body: patched,
            used_llm: true,
            fallback: None,
        };
    }

    let mut failed_checks: Vec<String> = re_check.missing.iter().map(|f| format!("{f:?}")).collect();
    failed_checks.extend(re_check.invented.iter().cloned());
    fallback(
        bundle,
        FallbackReason::new(
            FallbackSource::Verbalizer,
            FallbackTrigger::VerifierViolation,
            context,
            "hard facts missing or invented after one patch pass",
        )
        .with_failed_checks(failed_checks),
    )
}

fn fallback(bundle: &FactsBundle, reason: FallbackReason) -> VerbalizedDraft {
    VerbalizedDraft {
        body: bundle.deterministic_body.clone(),
        used_llm: false,
        fallback: Some(reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use event_llm::types::HardFact;
    use event_llm::{Adapters, StubAdapters};

    fn bundle() -> FactsBundle {
        FactsBundle {
            facts: vec![
                HardFact::Date("11.06.2026".to_string()),
                HardFact::Amount {
                    value: "CHF 75.00".to_string(),
                    unit: "per event".to_string(),
                },
                HardFact::RoomName("Room B".to_string()),
            ],
            deterministic_body: "Room B is available on 11.06.2026 at CHF 75.00 per event.".to_string(),
        }
    }

    #[tokio::test]
    async fn plain_tone_never_calls_the_llm() {
        let stub = StubAdapters::new();
        let adapters = Adapters::Stub(stub);
        let draft = verbalize(&adapters, &bundle(), VerbalizerTone::Plain, Step::OfferPreparation, "test").await;
        assert!(!draft.used_llm);
        assert_eq!(draft.body, bundle().deterministic_body);
    }

    #[tokio::test]
    async fn clean_llm_output_is_used_verbatim() {
        let stub = StubAdapters::new();
        stub.push_verbalize("We're delighted Room B is free on 11.06.2026 for CHF 75.00 per event!");
        let adapters = Adapters::Stub(stub);
        let draft = verbalize(&adapters, &bundle(), VerbalizerTone::Empathetic, Step::OfferPreparation, "test").await;
        assert!(draft.used_llm);
        assert!(draft.fallback.is_none());
    }

    #[tokio::test]
    async fn missing_unit_gets_patched_once() {
        let stub = StubAdapters::new();
        stub.push_verbalize("We're delighted Room B is free on 11.06.2026 for CHF 75.00!");
        let adapters = Adapters::Stub(stub);
        let draft = verbalize(&adapters, &bundle(), VerbalizerTone::Empathetic, Step::OfferPreparation, "test").await;
        assert!(draft.used_llm);
        assert!(draft.body.contains("per event"));
    }

    #[tokio::test]
    async fn unpatchable_violation_falls_back_to_deterministic_body() {
        let stub = StubAdapters::new();
        stub.push_verbalize("We're delighted about your event, hope to see you soon!");
        let adapters = Adapters::Stub(stub);
        let draft = verbalize(&adapters, &bundle(), VerbalizerTone::Empathetic, Step::OfferPreparation, "test").await;
        assert!(!draft.used_llm);
        assert_eq!(draft.body, bundle().deterministic_body);
        assert!(draft.fallback.is_some());
    }
}
