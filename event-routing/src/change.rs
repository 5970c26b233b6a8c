//! Change Propagation & Routing (C4): classifies what changed and picks
//! the detour target, per the table in spec §4.4.

use catalog_store::model::Step;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeType {
    Date,
    Room,
    Requirements,
    Products,
    None,
}

/// Tagged side effects the orchestrator applies via an exhaustive match —
/// never a free-form string (§9's "dynamic payload dictionaries" note).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SideEffect {
    ClearRoomEvalHash,
    PreserveLockedRoom,
    ClearLockedRoomAndEvalHash,
    MergeProductLine { name: String, delta_qty: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub target: Step,
    pub change: ChangeType,
    pub side_effects: Vec<SideEffect>,
}

/// What changed in this message, already resolved by the caller (date
/// comparison via [`crate::date::dates_differ`], requirements hash
/// comparison, room-choice text presence).
#[derive(Debug, Clone, Default)]
pub struct ChangeInputs {
    pub date_changed: bool,
    pub room_changed: bool,
    pub requirements_changed: bool,
    pub products_add: Vec<(String, u32)>,
}

/// Picks one detour target for the current message. Precedence follows
/// the natural step order (2 before 3 before 4): a date change is
/// resolved first since Step 2's exit always re-runs Step 3's lock
/// check anyway, so routing straight to Step 2 never skips a room
/// re-evaluation a requirements/room change would have also triggered.
pub fn classify_and_route(current_step: Step, inputs: &ChangeInputs) -> RoutingDecision {
    if inputs.date_changed {
        return RoutingDecision {
            target: Step::DateConfirmation,
            change: ChangeType::Date,
            side_effects: vec![SideEffect::ClearRoomEvalHash, SideEffect::PreserveLockedRoom],
        };
    }
    if inputs.requirements_changed {
        return RoutingDecision {
            target: Step::RoomAvailability,
            change: ChangeType::Requirements,
            side_effects: vec![SideEffect::ClearLockedRoomAndEvalHash],
        };
    }
    if inputs.room_changed {
        return RoutingDecision {
            target: Step::RoomAvailability,
            change: ChangeType::Room,
            side_effects: Vec::new(),
        };
    }
    if !inputs.products_add.is_empty() {
        let side_effects = inputs
            .products_add
            .iter()
            .map(|(name, qty)| SideEffect::MergeProductLine {
                name: name.clone(),
                delta_qty: *qty,
            })
            .collect();
        return RoutingDecision {
            target: Step::OfferPreparation,
            change: ChangeType::Products,
            side_effects,
        };
    }
    RoutingDecision {
        target: current_step,
        change: ChangeType::None,
        side_effects: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_change_preserves_locked_room() {
        let decision = classify_and_route(
            Step::NegotiationClose,
            &ChangeInputs {
                date_changed: true,
                ..Default::default()
            },
        );
        assert_eq!(decision.target, Step::DateConfirmation);
        assert!(decision.side_effects.contains(&SideEffect::PreserveLockedRoom));
    }

    #[test]
    fn requirements_change_clears_lock_and_eval_hash() {
        let decision = classify_and_route(
            Step::OfferPreparation,
            &ChangeInputs {
                requirements_changed: true,
                ..Default::default()
            },
        );
        assert_eq!(decision.target, Step::RoomAvailability);
        assert!(decision
            .side_effects
            .contains(&SideEffect::ClearLockedRoomAndEvalHash));
    }

    #[test]
    fn products_only_routes_to_offer_and_merges_quantities() {
        let decision = classify_and_route(
            Step::OfferPreparation,
            &ChangeInputs {
                products_add: vec![("Wireless Microphone".to_string(), 1)],
                ..Default::default()
            },
        );
        assert_eq!(decision.target, Step::OfferPreparation);
        assert_eq!(decision.change, ChangeType::Products);
    }

    #[test]
    fn no_change_stays_on_current_step() {
        let decision = classify_and_route(Step::NegotiationClose, &ChangeInputs::default());
        assert_eq!(decision.target, Step::NegotiationClose);
        assert_eq!(decision.change, ChangeType::None);
    }
}
