// Copyright 2025 Cowboy AI, LLC.

//! Capability traits an entity may opt into
//!
//! The pipeline never asks what an entity *is*, only what it *can do*. Each
//! capability is an independent trait composed per entity; an entity
//! implements any subset and exposes the implementations through its
//! [`PersistentEntity`](crate::PersistentEntity) accessors. This replaces a
//! chain of increasingly specific base classes with plain capability checks.

use crate::events::EventBuffer;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Creation-audit capability: the entity records when and by whom it was
/// created
///
/// The creation time is deferred until the entity is classified as Added; a
/// caller may pre-set it, in which case the stamper leaves it alone.
pub trait CreationAudited {
    /// When the entity was created, if stamped yet
    fn creation_time(&self) -> Option<DateTime<Utc>>;

    /// Set the creation time
    fn set_creation_time(&mut self, at: DateTime<Utc>);

    /// Who created the entity, if known
    fn creator_id(&self) -> Option<&str>;

    /// Set the creator
    fn set_creator_id(&mut self, actor: Option<String>);
}

/// Modification-audit capability: the entity records its last modification
///
/// Unlike creation audit, these fields are overwritten on every Modified
/// classification.
pub trait ModificationAudited {
    /// When the entity was last modified, if ever
    fn last_modification_time(&self) -> Option<DateTime<Utc>>;

    /// Set the last modification time
    fn set_last_modification_time(&mut self, at: DateTime<Utc>);

    /// Who last modified the entity, if known
    fn last_modifier_id(&self) -> Option<&str>;

    /// Set the last modifier
    fn set_last_modifier_id(&mut self, actor: Option<String>);
}

/// Soft-delete capability: the entity can be marked logically deleted
///
/// The flags are set only by the cascade resolver, never directly by callers
/// for soft-deletable types.
pub trait SoftDeletable {
    /// Whether the entity is marked deleted
    fn is_deleted(&self) -> bool;

    /// Mark or unmark the entity as deleted
    fn set_deleted(&mut self, deleted: bool);

    /// When the entity was deleted, if it was
    fn deletion_time(&self) -> Option<DateTime<Utc>>;

    /// Set the deletion time
    fn set_deletion_time(&mut self, at: Option<DateTime<Utc>>);

    /// Who deleted the entity, if known
    fn deleter_id(&self) -> Option<&str>;

    /// Set the deleter
    fn set_deleter_id(&mut self, actor: Option<String>);
}

/// Optimistic-concurrency capability
///
/// The stamp is an opaque token compared against the stored value at commit
/// time; a mismatch surfaces as a
/// [`ConcurrencyConflict`](crate::PersistenceError::ConcurrencyConflict).
/// It is regenerated on every Modified classification.
pub trait ConcurrencyTracked {
    /// The current concurrency stamp
    fn concurrency_stamp(&self) -> &str;

    /// Replace the concurrency stamp
    fn set_concurrency_stamp(&mut self, stamp: String);
}

/// Generate a fresh concurrency stamp
///
/// Uniform-random 32-character lowercase hex; collision probability is
/// negligible.
pub fn new_concurrency_stamp() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Domain-event capability: the entity buffers events for dispatch at save
/// time
pub trait EventSource {
    /// The entity's buffered events
    fn event_buffer(&self) -> &EventBuffer;

    /// Mutable access to the entity's buffered events
    fn event_buffer_mut(&mut self) -> &mut EventBuffer;
}

/// Free-form extension data attached to an entity
///
/// Stored and loaded with the entity; the pipeline does not interpret it.
pub type ExtraProperties = HashMap<String, serde_json::Value>;

/// Capability for entities carrying [`ExtraProperties`]
pub trait HasExtraProperties {
    /// The entity's extension data
    fn extra_properties(&self) -> &ExtraProperties;

    /// Mutable access to the entity's extension data
    fn extra_properties_mut(&mut self) -> &mut ExtraProperties;
}

/// Embeddable field block for creation audit
///
/// Entities compose capabilities by embedding these blocks and delegating the
/// trait methods to them.
///
/// # Examples
///
/// ```rust
/// use domain_persistence::{CreationAudit, CreationAudited};
/// use chrono::{DateTime, Utc};
///
/// #[derive(Debug, Clone, Default)]
/// struct Invoice {
///     creation: CreationAudit,
/// }
///
/// impl CreationAudited for Invoice {
///     fn creation_time(&self) -> Option<DateTime<Utc>> {
///         self.creation.creation_time
///     }
///     fn set_creation_time(&mut self, at: DateTime<Utc>) {
///         self.creation.creation_time = Some(at);
///     }
///     fn creator_id(&self) -> Option<&str> {
///         self.creation.creator_id.as_deref()
///     }
///     fn set_creator_id(&mut self, actor: Option<String>) {
///         self.creation.creator_id = actor;
///     }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreationAudit {
    /// When the entity was created; stamped at Added classification
    pub creation_time: Option<DateTime<Utc>>,
    /// Acting user at creation, if any
    pub creator_id: Option<String>,
}

/// Embeddable field block for modification audit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModificationAudit {
    /// When the entity was last modified
    pub last_modification_time: Option<DateTime<Utc>>,
    /// Acting user at last modification, if any
    pub last_modifier_id: Option<String>,
}

/// Embeddable field block for soft deletion
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeletionAudit {
    /// Logical-deletion flag
    pub is_deleted: bool,
    /// When the entity was soft-deleted
    pub deletion_time: Option<DateTime<Utc>>,
    /// Acting user at deletion, if any
    pub deleter_id: Option<String>,
}

/// Embeddable concurrency stamp, initialized fresh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcurrencyStamp {
    /// Current opaque token value
    pub value: String,
}

impl Default for ConcurrencyStamp {
    fn default() -> Self {
        Self {
            value: new_concurrency_stamp(),
        }
    }
}
