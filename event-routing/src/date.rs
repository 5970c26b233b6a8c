//! Date normalization: the single chokepoint every date comparison in
//! change detection must go through (§4.4, testable property in §8).

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref ISO: Regex = Regex::new(r"^\s*(\d{4})-(\d{2})-(\d{2})\s*$").unwrap();
    static ref DDMMYYYY: Regex = Regex::new(r"^\s*(\d{1,2})\.(\d{1,2})\.(\d{4})\s*$").unwrap();
}

fn parse_weekday(text: &str) -> Option<Weekday> {
    let lower = text.to_ascii_lowercase();
    for (name, day) in [
        ("monday", Weekday::Mon),
        ("tuesday", Weekday::Tue),
        ("wednesday", Weekday::Wed),
        ("thursday", Weekday::Thu),
        ("friday", Weekday::Fri),
        ("saturday", Weekday::Sat),
        ("sunday", Weekday::Sun),
    ] {
        if lower.contains(name) {
            return Some(day);
        }
    }
    None
}

fn parse_month(text: &str) -> Option<u32> {
    let lower = text.to_ascii_lowercase();
    const MONTHS: [&str; 12] = [
        "january", "february", "march", "april", "may", "june", "july", "august", "september",
        "october", "november", "december",
    ];
    MONTHS
        .iter()
        .position(|m| lower.contains(m))
        .map(|i| i as u32 + 1)
}

fn next_weekday_on_or_after(from: NaiveDate, target: Weekday) -> NaiveDate {
    let mut d = from;
    loop {
        if d.weekday() == target {
            return d;
        }
        d += Duration::days(1);
    }
}

fn first_weekday_on_or_after(from: NaiveDate, target: Weekday) -> NaiveDate {
    next_weekday_on_or_after(from, target)
}

/// Resolves a relative phrase ("Thursday works", "Friday next week",
/// "Friday in the first October week") against an injected "current
/// date" (never `chrono::Local::now()` directly, so callers stay
/// reproducible in tests).
pub fn resolve_relative_phrase(raw: &str, current_date: NaiveDate) -> Option<NaiveDate> {
    let weekday = parse_weekday(raw)?;

    if let Some(month) = parse_month(raw) {
        let year = if month >= current_date.month() {
            current_date.year()
        } else {
            current_date.year() + 1
        };
        let first_of_month = NaiveDate::from_ymd_opt(year, month, 1)?;
        return Some(first_weekday_on_or_after(first_of_month, weekday));
    }

    let mut candidate = next_weekday_on_or_after(current_date + Duration::days(1), weekday);
    if raw.to_ascii_lowercase().contains("next week") {
        candidate += Duration::days(7);
    }
    Some(candidate)
}

/// Normalizes a raw date token (ISO, DD.MM.YYYY, or a relative phrase) to
/// a concrete ISO date. Every date comparison in change detection must
/// call through here first — never compare raw strings or two
/// differently-formatted dates directly.
pub fn normalize_date_to_iso(raw: &str, current_date: NaiveDate) -> Option<NaiveDate> {
    if let Some(caps) = ISO.captures(raw) {
        return NaiveDate::from_ymd_opt(
            caps[1].parse().ok()?,
            caps[2].parse().ok()?,
            caps[3].parse().ok()?,
        );
    }
    if let Some(caps) = DDMMYYYY.captures(raw) {
        return NaiveDate::from_ymd_opt(
            caps[3].parse().ok()?,
            caps[2].parse().ok()?,
            caps[1].parse().ok()?,
        );
    }
    resolve_relative_phrase(raw, current_date)
}

/// True iff the two raw date tokens normalize to different ISO dates. A
/// pure formatting difference (`2026-06-11` vs `11.06.2026`) is never a
/// change.
pub fn dates_differ(a: &str, b: &str, current_date: NaiveDate) -> bool {
    match (
        normalize_date_to_iso(a, current_date),
        normalize_date_to_iso(b, current_date),
    ) {
        (Some(a), Some(b)) => a != b,
        _ => a.trim() != b.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        // A fixed Wednesday, injected rather than read from the clock.
        NaiveDate::from_ymd_opt(2026, 7, 29).unwrap()
    }

    #[test]
    fn iso_and_ddmmyyyy_formatting_difference_is_not_a_change() {
        assert!(!dates_differ("2026-06-11", "11.06.2026", today()));
    }

    #[test]
    fn genuinely_different_dates_differ() {
        assert!(dates_differ("2026-06-11", "2026-07-20", today()));
    }

    #[test]
    fn thursday_resolves_to_upcoming_thursday() {
        let resolved = normalize_date_to_iso("Thursday works", today()).unwrap();
        assert_eq!(resolved.weekday(), Weekday::Thu);
        assert!(resolved > today());
    }

    #[test]
    fn friday_next_week_skips_the_immediate_friday() {
        let immediate = normalize_date_to_iso("Friday works", today()).unwrap();
        let next_week = normalize_date_to_iso("Friday next week", today()).unwrap();
        assert_eq!((next_week - immediate).num_days(), 7);
    }

    #[test]
    fn month_hint_resolves_within_first_week_of_month() {
        let resolved = normalize_date_to_iso("Friday in the first October week", today()).unwrap();
        assert_eq!(resolved.month(), 10);
        assert_eq!(resolved.weekday(), Weekday::Fri);
        assert!(resolved.day() <= 7);
    }
}
