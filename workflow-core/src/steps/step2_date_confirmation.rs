//! Step 2 — Date Confirmation (§4.6.2).

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use event_llm::types::HardFact;
use event_llm::FactsBundle;
use tracing::debug;

use catalog_store::model::Step;

use crate::context::StepContext;
use crate::decision::{Draft, InboundMessage, StepDecision, StepResult};

/// Up to five deterministic candidate Saturdays: within `month` if given,
/// otherwise the next five upcoming Fridays/Saturdays from `current_date`.
fn suggest_dates(current_date: NaiveDate, month: Option<u32>) -> Vec<NaiveDate> {
    let mut out = Vec::new();
    if let Some(month) = month {
        let year = if month >= current_date.month() {
            current_date.year()
        } else {
            current_date.year() + 1
        };
        let Some(mut d) = NaiveDate::from_ymd_opt(year, month, 1) else {
            return out;
        };
        while d.month() == month && out.len() < 5 {
            if d.weekday() == Weekday::Sat {
                out.push(d);
            }
            d += Duration::days(1);
        }
        return out;
    }
    let mut d = current_date + Duration::days(1);
    while out.len() < 5 {
        if matches!(d.weekday(), Weekday::Fri | Weekday::Sat) {
            out.push(d);
        }
        d += Duration::days(1);
    }
    out
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M").ok()
}

/// Drops an end time that doesn't make sense against the start, and
/// backfills a locked room's default slot when only a bare date arrived.
fn resolve_confirmation_window(
    start: Option<NaiveTime>,
    end: Option<NaiveTime>,
    has_locked_room: bool,
    date_only_message: bool,
) -> (Option<NaiveTime>, Option<NaiveTime>) {
    if start.is_none() && end.is_none() && has_locked_room && date_only_message {
        return (
            NaiveTime::from_hms_opt(14, 0, 0),
            NaiveTime::from_hms_opt(22, 0, 0),
        );
    }
    match (start, end) {
        (Some(s), Some(e)) if e <= s => (Some(s), None),
        other => other,
    }
}

pub async fn handle(ctx: &mut StepContext<'_>, msg: &InboundMessage) -> StepResult {
    let history = super::support::history_text(ctx.conversation);
    let entity = ctx.adapters.extract_entities(&history, &msg.body).await?;

    let arrived_via_detour = ctx.conversation.caller_step.is_some();

    let normalized = entity
        .date
        .as_deref()
        .or(ctx.signals.date_signal.as_ref().map(|d| d.raw.as_str()))
        .and_then(|raw| event_routing::normalize_date_to_iso(raw, ctx.current_date));

    if normalized.is_none() {
        // No concrete date yet. Month-only queries never apologize; they
        // just offer the month's Saturdays.
        let candidates = suggest_dates(ctx.current_date, entity.vague_month.as_deref().and_then(month_number));
        let list = candidates
            .iter()
            .map(|d| d.format("%d.%m.%Y").to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let body = if entity.vague_month.is_some() {
            format!("Here are some available Saturdays that month: {list}.")
        } else {
            format!(
                "Could you let us know which date works for you? A few upcoming options: {list}."
            )
        };
        return Ok(StepDecision::Halt(Draft::released(body)));
    }

    let iso = normalized.unwrap();
    ctx.event.event_date = Some(iso);

    let start = entity.start_time.as_deref().and_then(parse_time);
    let end = entity.end_time.as_deref().and_then(parse_time);
    let date_only_message = entity.start_time.is_none() && entity.end_time.is_none();
    let (start, end) = resolve_confirmation_window(start, end, ctx.event.locked_room_id.is_some(), date_only_message);
    if let Some(s) = start {
        ctx.event.start_time = Some(s);
    }
    if let Some(e) = end {
        ctx.event.end_time = Some(e);
    }

    if let Some(s) = ctx.event.start_time {
        if s < ctx.venue_config.operating_hours_start {
            ctx.conversation.extras.time_warning = Some(format!(
                "Requested start {s} is before our operating hours start at {}",
                ctx.venue_config.operating_hours_start
            ));
        }
    }
    if let Some(e) = ctx.event.end_time {
        if e > ctx.venue_config.operating_hours_end {
            ctx.conversation.extras.time_warning = Some(format!(
                "Requested end {e} is after our operating hours end at {}",
                ctx.venue_config.operating_hours_end
            ));
        }
    }

    debug!(date = %iso, arrived_via_detour, "date confirmation resolved");

    let mut bundle = FactsBundle::default();
    bundle.push(HardFact::Date(iso.format("%d.%m.%Y").to_string()));
    bundle.deterministic_body = format!("Great, {} is confirmed.", iso.format("%d.%m.%Y"));
    let verbalized = ctx.verbalize(&bundle, Step::DateConfirmation, "date confirmed").await;
    // Whichever step eventually halts this tick prepends this rather than
    // Step 2 halting on its own — a date confirmation is never the final
    // word to the client by itself.
    ctx.conversation.extras.room_confirmation_prefix = Some(verbalized.body);

    if arrived_via_detour {
        ctx.conversation.return_to_caller();
        return Ok(StepDecision::ReturnToCaller);
    }
    Ok(StepDecision::Advance(Step::RoomAvailability))
}

fn month_number(name: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "january", "february", "march", "april", "may", "june", "july", "august", "september",
        "october", "november", "december",
    ];
    let lower = name.to_ascii_lowercase();
    MONTHS.iter().position(|m| lower.contains(m)).map(|i| i as u32 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggest_dates_without_month_returns_upcoming_weekend_days() {
        let current = NaiveDate::from_ymd_opt(2026, 7, 29).unwrap();
        let dates = suggest_dates(current, None);
        assert_eq!(dates.len(), 5);
        assert!(dates.iter().all(|d| *d > current));
    }

    #[test]
    fn suggest_dates_with_month_returns_only_saturdays_in_that_month() {
        let current = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let dates = suggest_dates(current, Some(10));
        assert!(!dates.is_empty());
        assert!(dates.iter().all(|d| d.month() == 10 && d.weekday() == Weekday::Sat));
    }

    #[test]
    fn resolve_window_drops_end_at_or_before_start() {
        let start = NaiveTime::from_hms_opt(18, 0, 0);
        let end = NaiveTime::from_hms_opt(17, 0, 0);
        let (s, e) = resolve_confirmation_window(start, end, false, false);
        assert_eq!(s, start);
        assert_eq!(e, None);
    }

    #[test]
    fn resolve_window_backfills_default_slot_for_locked_room_date_only() {
        let (s, e) = resolve_confirmation_window(None, None, true, true);
        assert_eq!(s, NaiveTime::from_hms_opt(14, 0, 0));
        assert_eq!(e, NaiveTime::from_hms_opt(22, 0, 0));
    }
}
