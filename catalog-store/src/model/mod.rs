//! Data model shared by the catalog and persistence layers.

pub mod catalog_data;
pub mod client;
pub mod conversation;
pub mod event;
pub mod hil;
pub mod step;

pub use catalog_data::{Menu, Product, ProductUnit, RankedRoom, Room, RoomRequirements, RoomStatus, RoomStatusMap, VenueConfig};
pub use client::Client;
pub use conversation::{ChangeDetourMarker, Conversation, ConversationExtras, MessageEntry, PendingHilRef, Role};
pub use event::{
    AuditEntry, BillingDetails, BillingRequirements, DepositState, Event, EventStatus,
    NegotiationPendingDecision, RoomPendingDecision, SiteVisitState, SiteVisitStatus,
};
pub use hil::{HilPayload, HilStatus, HilTask, HilTaskType};
pub use step::Step;
