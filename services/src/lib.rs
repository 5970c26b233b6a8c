//! Small shared helpers with no business logic of their own.

pub mod uuid;

pub use uuid::stable_uuid;
