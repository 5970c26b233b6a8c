//! Step 7 — Event Confirmation (§4.6.7).

use event_llm::types::QnaType;

use catalog_store::model::{HilTaskType, SiteVisitStatus, Step};

use crate::context::StepContext;
use crate::decision::{Draft, InboundMessage, StepDecision, StepResult};

/// Routes a client-facing confirmation/decline/transition draft through
/// the manager-approval gate, exactly mirroring the `_process_hil_confirmation`
/// shape: every Step 7 outbound message is approved before it ships.
fn route_confirmation_hil(body: impl Into<String>, markdown: impl Into<String>, task_type: HilTaskType) -> Draft {
    Draft::for_approval(body, markdown, task_type)
}

fn wants_site_visit(ctx: &StepContext<'_>) -> bool {
    matches!(ctx.event.site_visit_state.status, SiteVisitStatus::Proposed) || ctx.signals.qna_types.contains(&QnaType::SiteVisit)
}

pub async fn handle(ctx: &mut StepContext<'_>, msg: &InboundMessage) -> StepResult {
    // An out-of-band deposit payment always routes straight to the
    // confirmation HIL, bypassing any misclassification of this reply.
    if ctx.conversation.extras.deposit_just_paid {
        ctx.conversation.extras.deposit_just_paid = false;
        ctx.event.push_audit(Step::EventConfirmation, "deposit_just_paid_routed", serde_json::json!({}));
        let draft = route_confirmation_hil(
            "Thank you — we've received your deposit. We'll be in touch to schedule a site visit.",
            format!("Deposit received for thread {}", ctx.conversation.thread_id),
            HilTaskType::ConfirmationMessage,
        );
        ctx.event.site_visit_state.status = SiteVisitStatus::Proposed;
        return Ok(StepDecision::Halt(draft));
    }

    if ctx.event.site_visit_state.status == SiteVisitStatus::TimePending {
        // Step B: a date was already selected; this reply should carry a
        // time. No auto-selection — the client must choose.
        let slots = suggest_times(ctx);
        let picked = pick_time(&msg.body, &slots);
        match picked {
            Some(time) => {
                ctx.event.site_visit_state.confirmed_time = Some(time);
                ctx.event.site_visit_state.status = SiteVisitStatus::Scheduled;
                let draft = route_confirmation_hil(
                    format!("Your site visit is scheduled at {time}."),
                    format!("Site visit scheduled for thread {}", ctx.conversation.thread_id),
                    HilTaskType::ConfirmationMessage,
                );
                return Ok(StepDecision::Halt(draft));
            }
            None => {
                let list = slots.iter().map(|t| t.format("%H:%M").to_string()).collect::<Vec<_>>().join(", ");
                return Ok(StepDecision::Halt(Draft::released(format!(
                    "Which time works for your visit? Options: {list}."
                ))));
            }
        }
    }

    if wants_site_visit(ctx) && ctx.event.site_visit_state.status != SiteVisitStatus::Scheduled {
        if ctx.event.site_visit_state.status == SiteVisitStatus::Proposed {
            // Step A already ran; look for a date pick in this reply.
            let dates = &ctx.event.site_visit_state.proposed_dates;
            if let Some(picked) = pick_date(&msg.body, dates) {
                ctx.event.site_visit_state.selected_date = Some(picked);
                ctx.event.site_visit_state.status = SiteVisitStatus::TimePending;
                return Ok(StepDecision::Halt(Draft::released(format!(
                    "Great, {} works. What time suits you best?",
                    picked.format("%d.%m.%Y")
                ))));
            }
        }
        let dates = suggest_site_visit_dates(ctx);
        ctx.event.site_visit_state.proposed_dates = dates.clone();
        ctx.event.site_visit_state.status = SiteVisitStatus::Proposed;
        let list = dates.iter().map(|d| d.format("%d.%m.%Y").to_string()).collect::<Vec<_>>().join(", ");
        return Ok(StepDecision::Halt(Draft::released(format!(
            "We'd be happy to arrange a site visit. A few available dates: {list}."
        ))));
    }

    if ctx.signals.is_rejection {
        let draft = route_confirmation_hil(
            "We're sorry to see this not move forward. Please reach out if anything changes.",
            format!("Client declined on thread {}", ctx.conversation.thread_id),
            HilTaskType::ConfirmationMessage,
        );
        return Ok(StepDecision::Halt(draft));
    }

    // Plain confirm / reserve.
    let draft = route_confirmation_hil(
        "Your event is confirmed! We look forward to hosting you.",
        format!("Final confirmation for thread {}", ctx.conversation.thread_id),
        HilTaskType::TransitionMessage,
    );
    ctx.event.status = catalog_store::model::EventStatus::Confirmed;
    ctx.event.push_audit(Step::EventConfirmation, "event_confirmed", serde_json::json!({}));
    Ok(StepDecision::Halt(draft))
}

fn suggest_site_visit_dates(ctx: &StepContext<'_>) -> Vec<chrono::NaiveDate> {
    use chrono::Duration;
    let max = ctx.venue_config.site_visit_max_dates_offered.max(3) as i64;
    (1..=max).map(|n| ctx.current_date + Duration::days(n * 2)).collect()
}

fn suggest_times(ctx: &StepContext<'_>) -> Vec<chrono::NaiveTime> {
    use chrono::Duration;
    let step = chrono::NaiveTime::from_hms_opt(0, ctx.venue_config.site_visit_slot_duration_minutes, 0)
        .map(|t| t.signed_duration_since(chrono::NaiveTime::from_hms_opt(0, 0, 0).unwrap()))
        .unwrap_or(Duration::minutes(30));
    let mut out = Vec::new();
    let mut t = ctx.venue_config.operating_hours_start;
    while t < ctx.venue_config.operating_hours_end && out.len() < 5 {
        out.push(t);
        t += step;
    }
    out
}

fn pick_date(body: &str, candidates: &[chrono::NaiveDate]) -> Option<chrono::NaiveDate> {
    candidates.iter().copied().find(|d| body.contains(&d.format("%d.%m.%Y").to_string()))
}

fn pick_time(body: &str, candidates: &[chrono::NaiveTime]) -> Option<chrono::NaiveTime> {
    candidates.iter().copied().find(|t| body.contains(&t.format("%H:%M").to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pick_date_matches_formatted_candidate() {
        let d = chrono::NaiveDate::from_ymd_opt(2026, 6, 11).unwrap();
        assert_eq!(pick_date("Let's do 11.06.2026 please", &[d]), Some(d));
        assert_eq!(pick_date("none of these work", &[d]), None);
    }
}
