//! Step 3 — Room Availability (§4.6.3). Never emits a HIL task: drafts
//! are always `requires_approval=false`, and this handler never
//! constructs a `task_type` for itself.

use event_llm::types::HardFact;
use event_llm::FactsBundle;
use tracing::debug;

use catalog_store::model::{RoomPendingDecision, RoomRequirements, RoomStatus, Step};

use crate::context::StepContext;
use crate::decision::{Draft, InboundMessage, StepDecision, StepResult};

fn prefixed(prefix: &Option<String>, body: String) -> String {
    match prefix {
        Some(p) if !p.is_empty() => format!("{p}\n\n{body}"),
        _ => body,
    }
}

/// Three stock alternatives offered whenever no single room fits.
fn capacity_exceeded_body(participants: u32) -> String {
    format!(
        "Unfortunately no single room fits your group of {participants}. A few options: \
         reduce the guest count, split the group across two rooms, or we can refer you to a \
         partner venue with larger capacity."
    )
}

pub async fn handle(ctx: &mut StepContext<'_>, msg: &InboundMessage) -> StepResult {
    let Some(event_date) = ctx.event.event_date else {
        return Ok(StepDecision::Detour {
            target: Step::DateConfirmation,
            caller_step: Step::RoomAvailability,
        });
    };

    // A pending "please arrange the flipchart"-style reply resolves before
    // generic change detection runs, so it never gets reinterpreted as a
    // fresh requirements change.
    if let Some(arrangement) = ctx.conversation.extras.room_pending_arrangement.take() {
        ctx.event.push_audit(
            Step::RoomAvailability,
            "room_arrangement_noted",
            serde_json::json!({ "arrangement": arrangement, "reply": msg.body }),
        );
    }

    let arrived_via_date_detour = ctx.conversation.caller_step.is_none()
        && ctx
            .conversation
            .extras
            .change_detour
            .as_ref()
            .map(|m| m.reason == "date_change")
            .unwrap_or(false);

    // Fast-skip on date detour: if a room is already locked, just check it
    // is still available on the new date and hand back to the caller
    // without re-presenting the room list.
    if arrived_via_date_detour {
        if let Some(locked) = ctx.event.locked_room_id.clone() {
            let statuses = ctx.catalog.room_status_on_date(event_date, Some(&ctx.event.event_id)).await;
            let still_free = !matches!(statuses.get(&locked), Some(RoomStatus::Confirmed));
            if still_free {
                let requirements_hash = super::support::compute_requirements_hash(
                    ctx.event.participants_count,
                    &ctx.event.seating_layout,
                    &ctx.event.offer_line_items,
                );
                ctx.event.room_eval_hash = Some(requirements_hash);
                ctx.conversation.return_to_caller();
                return Ok(StepDecision::ReturnToCaller);
            }
            // Cross-client conflict: someone else now holds the room on
            // the new date. Flag it, clear the lock, and present
            // alternatives instead of silently re-evaluating.
            ctx.conversation.extras.locked_room_unavailable_on_new_date = true;
            ctx.event.locked_room_id = None;
            ctx.event.room_eval_hash = None;
            ctx.event.push_audit(
                Step::RoomAvailability,
                "locked_room_unavailable_on_new_date",
                serde_json::json!({ "room_id": locked, "date": event_date.to_string() }),
            );

            let requirements = RoomRequirements {
                capacity: ctx.event.participants_count.unwrap_or(0),
                layout: ctx.event.seating_layout.clone(),
                amenities: Vec::new(),
            };
            let ranked = ctx.catalog.evaluate_room_statuses(&requirements, Some(&ctx.event.event_id)).await;
            let alternatives: Vec<String> = ranked
                .iter()
                .filter(|r| r.fits)
                .take(3)
                .map(|r| r.name.clone())
                .collect();
            let room_name = ctx.catalog.room(&locked).await.map(|r| r.name).unwrap_or(locked);
            let body = format!(
                "{room_name} is no longer available on {}. A few alternatives: {}.",
                event_date.format("%d.%m.%Y"),
                alternatives.join(", ")
            );
            return Ok(StepDecision::Halt(Draft::released(body)));
        }
    }

    if let Some(room_id) = ctx.signals.room_choice_token.clone() {
        if let Some(room) = ctx.catalog.room(&room_id).await {
            ctx.event.locked_room_id = Some(room.room_id.clone());
            ctx.event.room_pending_decision = None;
            ctx.conversation.extras.room_confirmation_prefix =
                Some(format!("Great choice! {} is confirmed.", room.name));
            ctx.event.push_audit(
                Step::RoomAvailability,
                "room_locked",
                serde_json::json!({ "room_id": room.room_id }),
            );
        }
    }

    let requirements = RoomRequirements {
        capacity: ctx.event.participants_count.unwrap_or(0),
        layout: ctx.event.seating_layout.clone(),
        amenities: Vec::new(),
    };
    let requirements_hash = super::support::compute_requirements_hash(
        ctx.event.participants_count,
        &ctx.event.seating_layout,
        &ctx.event.offer_line_items,
    );

    // Short-circuit: already locked against exactly these requirements.
    let needs_eval = ctx.event.room_eval_hash.as_deref() != Some(requirements_hash.as_str())
        || ctx.event.locked_room_id.is_none();
    if needs_eval {
        let statuses = ctx.catalog.room_status_on_date(event_date, Some(&ctx.event.event_id)).await;
        let ranked = ctx.catalog.evaluate_room_statuses(&requirements, Some(&ctx.event.event_id)).await;
        debug!(candidates = ranked.len(), "room evaluation refreshed");
        ctx.event.room_eval_hash = Some(requirements_hash.clone());

        if ctx.event.locked_room_id.is_none() {
            let best_fit = ranked.iter().find(|r| r.fits);
            match best_fit {
                None => {
                    let body = prefixed(
                        &ctx.conversation.extras.room_confirmation_prefix.take(),
                        capacity_exceeded_body(requirements.capacity),
                    );
                    return Ok(StepDecision::Halt(Draft::released(body)));
                }
                Some(best) => {
                    let available = !matches!(statuses.get(&best.room_id), Some(RoomStatus::Confirmed));
                    if available {
                        ctx.event.room_pending_decision = Some(RoomPendingDecision {
                            candidate_room_id: best.room_id.clone(),
                            missing_products: Vec::new(),
                        });
                    } else {
                        let body = prefixed(
                            &ctx.conversation.extras.room_confirmation_prefix.take(),
                            "Unfortunately no room currently fits your requirements on that date. \
                             Could you share an alternative date or adjust the guest count?"
                                .to_string(),
                        );
                        return Ok(StepDecision::Halt(Draft::released(body)));
                    }
                }
            }
        }
    }

    let Some(pending) = ctx.event.room_pending_decision.clone() else {
        // Already locked (from a prior tick or this one) with a prefix
        // already recorded above; Step 4 composes the actual offer.
        return Ok(StepDecision::Advance(Step::OfferPreparation));
    };

    let Some(room) = ctx.catalog.room(&pending.candidate_room_id).await else {
        return Ok(StepDecision::Advance(Step::OfferPreparation));
    };

    let mut bundle = FactsBundle::default();
    bundle.push(HardFact::RoomName(room.name.clone()));
    bundle.deterministic_body = format!(
        "{} is available on {} and fits your group of {}.",
        room.name,
        event_date.format("%d.%m.%Y"),
        ctx.event.participants_count.unwrap_or(0)
    );

    // Hybrid "room + catering Q&A" messages append the catering answer to
    // the room recommendation rather than handling it separately.
    if let Some(catering_note) = ctx.conversation.extras.sequential_catering_lookahead.take() {
        bundle.deterministic_body.push_str("\n\n");
        bundle.deterministic_body.push_str(&catering_note);
    }

    let verbalized = ctx.verbalize(&bundle, Step::RoomAvailability, "room recommendation").await;
    let body = prefixed(&ctx.conversation.extras.room_confirmation_prefix.take(), verbalized.body);

    let mut draft = Draft::released(body);
    draft.fallback = verbalized.fallback;
    Ok(StepDecision::Halt(draft))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixed_joins_with_blank_line() {
        let out = prefixed(&Some("Great, 11.06.2026 is confirmed.".to_string()), "Room B is free.".to_string());
        assert_eq!(out, "Great, 11.06.2026 is confirmed.\n\nRoom B is free.");
    }

    #[test]
    fn prefixed_passes_through_when_no_prefix() {
        let out = prefixed(&None, "Room B is free.".to_string());
        assert_eq!(out, "Room B is free.");
    }

    #[test]
    fn capacity_exceeded_offers_three_alternatives() {
        let body = capacity_exceeded_body(400);
        assert!(body.contains("reduce"));
        assert!(body.contains("split"));
        assert!(body.contains("partner venue"));
    }
}
