//! Hard-fact extraction and verification: the safety verifier half of the
//! "Safety Sandwich" (§4.5, GLOSSARY).

use event_llm::types::HardFact;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref AMOUNT_RE: Regex = Regex::new(r"(?i)\b[A-Z]{3}\s?[0-9]+(?:\.[0-9]{2})?\b").unwrap();
    static ref DATE_RE: Regex = Regex::new(r"\b\d{1,2}\.\d{1,2}\.\d{4}\b").unwrap();
    static ref ROOM_RE: Regex = Regex::new(r"(?i)\bRoom\s+[A-Za-z0-9][\w-]*\b").unwrap();
}

fn canonical_unit(unit: &str) -> String {
    let u = unit.trim().to_ascii_lowercase();
    match u.as_str() {
        "per guest" => "per person".to_string(),
        "per booking" => "per event".to_string(),
        other => other.to_string(),
    }
}

fn unit_aliases(unit: &str) -> Vec<String> {
    match canonical_unit(unit).as_str() {
        "per person" => vec!["per person".to_string(), "per guest".to_string()],
        "per event" => vec!["per event".to_string(), "per booking".to_string()],
        other => vec![other.to_string()],
    }
}

/// Whether `output` contains everything `fact` requires verbatim.
fn fact_present(fact: &HardFact, output: &str) -> bool {
    let lower = output.to_ascii_lowercase();
    match fact {
        HardFact::Date(d) => output.contains(d.as_str()),
        HardFact::Amount { value, unit } => {
            output.contains(value.as_str())
                && unit_aliases(unit).iter().any(|alias| lower.contains(alias))
        }
        HardFact::RoomName(name) => output.contains(name.as_str()),
        HardFact::ParticipantCount(n) => output.contains(&n.to_string()),
        HardFact::TimeWindow { start, end } => output.contains(start.as_str()) && output.contains(end.as_str()),
    }
}

/// Result of comparing the verbalizer's output against the input facts
/// bundle: `missing` are bundle facts absent from the output, `invented`
/// are facts-shaped tokens in the output with no counterpart in the bundle.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct VerifyResult {
    pub missing: Vec<HardFact>,
    pub invented: Vec<String>,
}

impl VerifyResult {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.invented.is_empty()
    }
}

/// Extracts hard facts from verbalizer output and compares them against
/// `facts`: `hard_facts(output) ⊇ facts` and `hard_facts(output) \ facts = ∅`.
pub fn verify(facts: &[HardFact], output: &str) -> VerifyResult {
    let missing: Vec<HardFact> = facts
        .iter()
        .filter(|f| !fact_present(f, output))
        .cloned()
        .collect();

    let mut invented = Vec::new();

    for m in AMOUNT_RE.find_iter(output) {
        let token = m.as_str();
        let known = facts.iter().any(|f| matches!(f, HardFact::Amount { value, .. } if token.contains(value.as_str()) || value.contains(token)));
        if !known {
            invented.push(token.to_string());
        }
    }
    for m in DATE_RE.find_iter(output) {
        let token = m.as_str();
        let known = facts.iter().any(|f| matches!(f, HardFact::Date(d) if d == token));
        if !known {
            invented.push(token.to_string());
        }
    }
    for m in ROOM_RE.find_iter(output) {
        let token = m.as_str();
        let known = facts.iter().any(|f| matches!(f, HardFact::RoomName(r) if r == token));
        if !known {
            invented.push(token.to_string());
        }
    }

    VerifyResult { missing, invented }
}

/// One patch attempt: appends each missing fact's canonical token to the
/// output (e.g. re-appending a missing unit right after its price when
/// the value is present but the unit was dropped). Never invents a new
/// value — only restores what the bundle already specified.
pub fn patch_once(output: &str, missing: &[HardFact]) -> String {
    let mut patched = output.to_string();
    for fact in missing {
        match fact {
            HardFact::Amount { value, unit } if patched.contains(value.as_str()) => {
                patched = patched.replacen(value.as_str(), &format!("{value} {unit}"), 1);
            }
            HardFact::Date(d) => patched.push_str(&format!(" ({d})")),
            HardFact::Amount { value, unit } => patched.push_str(&format!(" ({value} {unit})")),
            HardFact::RoomName(name) => patched.push_str(&format!(" ({name})")),
            HardFact::ParticipantCount(n) => patched.push_str(&format!(" ({n} participants)")),
            HardFact::TimeWindow { start, end } => patched.push_str(&format!(" ({start}-{end})")),
        }
    }
    patched
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_alias_counts_as_present() {
        let facts = vec![HardFact::Amount {
            value: "CHF 75.00".to_string(),
            unit: "per event".to_string(),
        }];
        let output = "The room is CHF 75.00 per booking.";
        assert!(verify(&facts, output).is_clean());
    }

    #[test]
    fn missing_unit_is_flagged_and_patch_restores_it() {
        let facts = vec![HardFact::Amount {
            value: "CHF 75.00".to_string(),
            unit: "per event".to_string(),
        }];
        let output = "The room costs CHF 75.00.";
        let result = verify(&facts, output);
        assert_eq!(result.missing.len(), 1);

        let patched = patch_once(output, &result.missing);
        assert!(verify(&facts, &patched).is_clean());
    }

    #[test]
    fn invented_price_is_flagged() {
        let facts = vec![HardFact::Amount {
            value: "CHF 75.00".to_string(),
            unit: "per event".to_string(),
        }];
        let output = "The room costs CHF 75.00 per event, plus CHF 999.00 cleaning.";
        let result = verify(&facts, output);
        assert!(!result.invented.is_empty());
    }

    #[test]
    fn invented_room_name_is_flagged() {
        let facts = vec![HardFact::RoomName("Room B".to_string())];
        let output = "Room B is lovely, but Room C might also work.";
        let result = verify(&facts, output);
        assert!(result.invented.iter().any(|t| t.eq_ignore_ascii_case("Room C")));
    }
}
