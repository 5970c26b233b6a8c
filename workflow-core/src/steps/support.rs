//! Small helpers shared across step handlers. Nothing here owns
//! conversation/event state; each function takes what it needs and
//! returns a value for the caller to apply.

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use catalog_store::model::{Conversation, Event, Product};
use event_routing::SideEffect;

/// Applies a batch of routing side effects to the event in place. The
/// orchestrator never inlines this match itself — every step handler that
/// calls `classify_and_route` funnels its output through here so the
/// effect set stays exhaustive in one place.
pub fn apply_side_effects(event: &mut Event, effects: &[SideEffect]) {
    for effect in effects {
        match effect {
            SideEffect::ClearRoomEvalHash => event.room_eval_hash = None,
            SideEffect::PreserveLockedRoom => {}
            SideEffect::ClearLockedRoomAndEvalHash => {
                event.locked_room_id = None;
                event.room_eval_hash = None;
            }
            SideEffect::MergeProductLine { name, delta_qty } => {
                *event.offer_line_items.entry(name.clone()).or_insert(0) += delta_qty;
            }
        }
    }
}

/// Flattens recent message history into one prompt-ready string for the
/// intent/entity adapters. Uses the stored 160-char preview, never the full
/// body, to keep prompts bounded on long threads.
pub fn history_text(conversation: &Conversation) -> String {
    conversation
        .message_history
        .iter()
        .map(|m| format!("{:?}: {}", m.role, m.preview))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Hashes the normalized requirement set (participants + layout + product
/// lines) so Step 1 can detect "requirements changed" without re-running
/// room evaluation on every message (§4.6.1).
pub fn compute_requirements_hash(
    participants: Option<u32>,
    seating_layout: &Option<String>,
    products: &BTreeMap<String, u32>,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(participants.unwrap_or(0).to_le_bytes());
    hasher.update(seating_layout.as_deref().unwrap_or("").as_bytes());
    for (sku, qty) in products {
        hasher.update(sku.as_bytes());
        hasher.update(qty.to_le_bytes());
    }
    format!("{:x}", hasher.finalize())
}

const SHORT_ACCEPTANCE_PHRASES: &[&str] = &["continue", "please send", "that's fine", "that's fine.", "go ahead", "please proceed"];

/// Curly-apostrophe-normalized short acceptance replies are force-classified
/// as an event-request acceptance shortcut straight to Step 5 (§4.6.1).
pub fn is_short_acceptance_reply(body: &str) -> bool {
    let normalized: String = body
        .replace(['\u{2018}', '\u{2019}', '\u{02BC}'], "'")
        .trim()
        .trim_end_matches(['.', '!'])
        .to_ascii_lowercase();
    SHORT_ACCEPTANCE_PHRASES
        .iter()
        .any(|p| normalized == p.trim_end_matches(['.', '!']))
}

/// Detects "add another X" / "add an X" phrasing against the catalog's
/// actual product names, never a hardcoded string list (§4.1, §4.6.1).
/// Returns `(sku, delta_qty)` pairs.
pub fn detect_catalog_item_adds(body: &str, products: &[Product]) -> Vec<(String, u32)> {
    let lower = body.to_ascii_lowercase();
    let mut found = Vec::new();
    for product in products {
        let name_lower = product.name.to_ascii_lowercase();
        if lower.contains(&format!("another {name_lower}")) || lower.contains(&format!("add {name_lower}")) || lower.contains(&format!("add a {name_lower}")) || lower.contains(&format!("add an {name_lower}")) {
            found.push((product.sku.clone(), 1));
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_store::model::ProductUnit;

    #[test]
    fn same_inputs_hash_identically() {
        let mut a = BTreeMap::new();
        a.insert("mic-1".to_string(), 2u32);
        assert_eq!(
            compute_requirements_hash(Some(25), &Some("banquet".into()), &a),
            compute_requirements_hash(Some(25), &Some("banquet".into()), &a)
        );
    }

    #[test]
    fn different_participant_count_changes_hash() {
        let empty = BTreeMap::new();
        let h1 = compute_requirements_hash(Some(25), &None, &empty);
        let h2 = compute_requirements_hash(Some(30), &None, &empty);
        assert_ne!(h1, h2);
    }

    #[test]
    fn short_acceptance_recognizes_curly_apostrophe() {
        assert!(is_short_acceptance_reply("That\u{2019}s fine."));
        assert!(!is_short_acceptance_reply("That might work for us"));
    }

    #[test]
    fn catalog_item_add_detects_another_phrasing() {
        let products = vec![Product {
            sku: "mic-1".into(),
            name: "Wireless Microphone".into(),
            price: 25.0,
            unit: ProductUnit::PerEvent,
        }];
        let found = detect_catalog_item_adds("Can we add another wireless microphone please", &products);
        assert_eq!(found, vec![("mic-1".to_string(), 1)]);
    }
}
