//! Catalog (rooms/products/menus/venue config) and conversation/event/HIL
//! persistence for the booking conversation engine.
//!
//! This crate owns every piece of state the orchestrator reads or writes:
//! the read-only catalog, and the mutable conversation/event/client/HIL
//! tables behind optimistic concurrency. It knows nothing about steps,
//! routing, or LLMs — those live in `workflow-core`, `event-routing`, and
//! `event-llm` respectively.

pub mod catalog;
pub mod error;
pub mod model;
pub mod store;

pub use catalog::{Catalog, InMemoryCatalog, SharedEvents};
pub use error::{CatalogError, StoreError};
pub use model::*;
pub use store::{ConversationStore, InMemoryStore};
