//! Entity identity and the type-erased entity surface the pipeline works on

use crate::capabilities::{
    ConcurrencyTracked, CreationAudited, EventSource, ModificationAudited, SoftDeletable,
};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use uuid::Uuid;

/// A typed entity ID using phantom types for type safety
///
/// IDs are globally unique and immutable after first assignment. The phantom
/// type parameter ensures that IDs for different entity types cannot be mixed
/// up at compile time.
///
/// # Examples
///
/// ```rust
/// use domain_persistence::EntityId;
///
/// struct Post;
/// struct Comment;
///
/// let post_id = EntityId::<Post>::new();
/// let comment_id = EntityId::<Comment>::new();
///
/// // These are different types - won't compile if mixed up:
/// // let _: EntityId<Post> = comment_id; // ERROR!
/// # let _ = (post_id, comment_id);
/// ```
#[derive(Serialize, Deserialize)]
pub struct EntityId<T> {
    id: Uuid,
    #[serde(skip)]
    _phantom: PhantomData<T>,
}

// Manual impls: the phantom parameter must not leak trait bounds onto
// marker types.
impl<T> fmt::Debug for EntityId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EntityId").field(&self.id).finish()
    }
}

impl<T> Clone for EntityId<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for EntityId<T> {}

impl<T> PartialEq for EntityId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for EntityId<T> {}

impl<T> std::hash::Hash for EntityId<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> EntityId<T> {
    /// Create a new random entity ID
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            _phantom: PhantomData,
        }
    }

    /// Create an entity ID from a UUID
    pub fn from_uuid(id: Uuid) -> Self {
        Self {
            id,
            _phantom: PhantomData,
        }
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.id
    }
}

impl<T> fmt::Display for EntityId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl<T> Default for EntityId<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> From<EntityId<T>> for Uuid {
    fn from(id: EntityId<T>) -> Self {
        id.id
    }
}

impl<T> From<&EntityId<T>> for Uuid {
    fn from(id: &EntityId<T>) -> Self {
        id.id
    }
}

/// Type-erased surface over a persistent entity
///
/// The pipeline tracks heterogeneous entities in one unit of work, so it
/// works against this object-safe trait rather than concrete types. Each
/// capability accessor defaults to `None`; an entity opts into a capability
/// by overriding the accessor pair to return its own implementation. The
/// classifier then performs plain capability checks instead of relying on a
/// fixed inheritance position.
///
/// # Examples
///
/// ```rust
/// use domain_persistence::{EntityId, PersistentEntity};
/// use std::any::Any;
/// use uuid::Uuid;
///
/// #[derive(Debug, Clone)]
/// struct Tag {
///     id: EntityId<Tag>,
///     label: String,
/// }
///
/// impl PersistentEntity for Tag {
///     fn entity_id(&self) -> Uuid {
///         *self.id.as_uuid()
///     }
///     fn entity_kind(&self) -> &'static str {
///         "tag"
///     }
///     fn clone_entity(&self) -> Box<dyn PersistentEntity> {
///         Box::new(self.clone())
///     }
///     fn as_any(&self) -> &dyn Any {
///         self
///     }
///     fn as_any_mut(&mut self) -> &mut dyn Any {
///         self
///     }
/// }
/// ```
pub trait PersistentEntity: Send + Sync + fmt::Debug {
    /// The entity's identity key, immutable after first assignment
    fn entity_id(&self) -> Uuid;

    /// Stable kind name used for relationship-metadata lookups
    fn entity_kind(&self) -> &'static str;

    /// Clone the entity into a box
    fn clone_entity(&self) -> Box<dyn PersistentEntity>;

    /// Get the entity as Any for downcasting
    fn as_any(&self) -> &dyn Any;

    /// Get the entity as mutable Any for downcasting
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Creation-audit capability, if implemented
    fn creation_audit(&self) -> Option<&dyn CreationAudited> {
        None
    }

    /// Mutable creation-audit capability, if implemented
    fn creation_audit_mut(&mut self) -> Option<&mut dyn CreationAudited> {
        None
    }

    /// Modification-audit capability, if implemented
    fn modification_audit(&self) -> Option<&dyn ModificationAudited> {
        None
    }

    /// Mutable modification-audit capability, if implemented
    fn modification_audit_mut(&mut self) -> Option<&mut dyn ModificationAudited> {
        None
    }

    /// Soft-delete capability, if implemented
    fn soft_delete(&self) -> Option<&dyn SoftDeletable> {
        None
    }

    /// Mutable soft-delete capability, if implemented
    fn soft_delete_mut(&mut self) -> Option<&mut dyn SoftDeletable> {
        None
    }

    /// Concurrency-token capability, if implemented
    fn concurrency(&self) -> Option<&dyn ConcurrencyTracked> {
        None
    }

    /// Mutable concurrency-token capability, if implemented
    fn concurrency_mut(&mut self) -> Option<&mut dyn ConcurrencyTracked> {
        None
    }

    /// Domain-event capability, if implemented
    fn event_source(&self) -> Option<&dyn EventSource> {
        None
    }

    /// Mutable domain-event capability, if implemented
    fn event_source_mut(&mut self) -> Option<&mut dyn EventSource> {
        None
    }
}

impl dyn PersistentEntity {
    /// Whether the entity is currently marked soft-deleted
    ///
    /// Entities without the soft-delete capability are never considered
    /// deleted.
    pub fn is_soft_deleted(&self) -> bool {
        self.soft_delete().map(|s| s.is_deleted()).unwrap_or(false)
    }
}
