// Copyright 2025 Cowboy AI, LLC.

//! Error types for the save pipeline

use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by the save pipeline and its collaborators
///
/// Every failure mode is typed; none of these are used for normal control
/// flow (an already-deleted entity, for example, is a no-op, not an error).
#[derive(Debug, Clone, Error)]
pub enum PersistenceError {
    /// Soft delete refused by the one-to-one relation guard
    ///
    /// The entity is exclusively referenced through a unique foreign key, so
    /// soft-deleting it would leave the key occupied and block re-creation.
    /// The delete is aborted with no state changes.
    #[error("integrity policy violation on {entity_kind} {entity_id}: {reason}")]
    IntegrityPolicyViolation {
        /// Kind of the entity that failed the guard
        entity_kind: String,
        /// Identity of the entity that failed the guard
        entity_id: Uuid,
        /// Why the guard refused the soft delete
        reason: String,
    },

    /// Stale concurrency token detected at commit
    ///
    /// Surfaced to the caller as-is; retry policy is a caller decision.
    #[error("concurrency conflict on {entity_id}: expected stamp {expected:?}, found {actual:?}")]
    ConcurrencyConflict {
        /// Identity of the conflicting entity
        entity_id: Uuid,
        /// Token captured when the entity entered the change set
        expected: Option<String>,
        /// Token currently held by the store
        actual: Option<String>,
    },

    /// Relationship metadata lookup or lazy load failed during a cascade walk
    ///
    /// Aborts the whole cascade for the top-level delete request; no partial
    /// soft-deletes are committed.
    #[error("relationship load failure on {entity_kind}.{navigation}: {reason}")]
    RelationshipLoadFailure {
        /// Kind of the entity whose navigation failed to load
        entity_kind: String,
        /// Navigation that failed ("*" for a metadata lookup failure)
        navigation: String,
        /// Underlying failure
        reason: String,
    },

    /// An event dispatch call failed
    ///
    /// Propagates from `save`. Events dispatched before the failing one have
    /// already been delivered; partial dispatch is documented behavior.
    #[error("event dispatch failed: {reason}")]
    DispatchFailure {
        /// Error reported by the external dispatcher
        reason: String,
    },

    /// A cancellation signal was observed before commit
    ///
    /// The save aborted without dispatching events or writing to the store.
    #[error("save cancelled before commit")]
    Cancelled,

    /// Store-side failure outside the concurrency check
    #[error("store error: {0}")]
    Store(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result type for pipeline operations
pub type PersistenceResult<T> = Result<T, PersistenceError>;

impl From<serde_json::Error> for PersistenceError {
    fn from(err: serde_json::Error) -> Self {
        PersistenceError::Serialization(err.to_string())
    }
}

impl PersistenceError {
    /// Check if this is a concurrency conflict
    pub fn is_concurrency_conflict(&self) -> bool {
        matches!(self, PersistenceError::ConcurrencyConflict { .. })
    }

    /// Check if this is an integrity policy violation
    pub fn is_integrity_violation(&self) -> bool {
        matches!(self, PersistenceError::IntegrityPolicyViolation { .. })
    }

    /// Check if this is a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, PersistenceError::Cancelled)
    }

    /// Check if this failure occurred during the cascade walk
    pub fn is_relationship_failure(&self) -> bool {
        matches!(self, PersistenceError::RelationshipLoadFailure { .. })
    }
}
