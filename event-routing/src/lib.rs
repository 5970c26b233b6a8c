//! Change Propagation & Routing (C4): decides detour targets from
//! detected changes, and normalizes/compares dates through one
//! chokepoint.

pub mod change;
pub mod date;
pub mod guard;

pub use change::{ChangeInputs, ChangeType, RoutingDecision, SideEffect, classify_and_route};
pub use date::{dates_differ, normalize_date_to_iso, resolve_relative_phrase};
pub use guard::out_of_context_guard;
