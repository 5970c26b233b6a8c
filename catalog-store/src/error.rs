//! Error types for `catalog-store`.

use thiserror::Error;

/// Errors from read-only catalog/config accessors.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("[catalog-store] venue config is not set")]
    MissingVenueConfig,

    #[error("[catalog-store] {kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
}

/// Errors from conversation/event/HIL persistence.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("[catalog-store] {kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Optimistic-concurrency violation: the caller's expected version no
    /// longer matches the stored version.
    #[error("[catalog-store] conflict saving {kind} {id}: expected version {expected}, store has {actual}")]
    Conflict {
        kind: &'static str,
        id: String,
        expected: u64,
        actual: u64,
    },
}
