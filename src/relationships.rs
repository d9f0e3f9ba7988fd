// Copyright 2025 Cowboy AI, LLC.

//! Statically registered relationship metadata
//!
//! The cascade resolver needs to know, for each entity kind, which
//! navigations exist, whether they are collections, their cascade-delete
//! behavior, and whether the target is an owned sub-entity. Instead of
//! discovering this by reflecting over a live ORM model, the application
//! registers it once at startup in a [`RelationshipRegistry`]; the resolver
//! consumes it through plain lookups.

use crate::errors::{PersistenceError, PersistenceResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Relationship-level delete policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CascadeBehavior {
    /// Dependents are left alone when their owner is deleted
    #[default]
    None,
    /// Dependents are removed or soft-deleted with their owner
    Cascade,
}

/// One navigation from an owning entity kind to a target kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationDescriptor {
    /// Navigation name, the query path used for lazy loads
    pub name: String,
    /// Entity kind on the far side
    pub target_kind: String,
    /// Whether this navigation holds many dependents
    pub is_collection: bool,
    /// Cascade-delete policy for this navigation
    pub cascade: CascadeBehavior,
    /// Whether the target is an owned sub-entity with no independent
    /// lifecycle; owned targets are deleted with their owner and excluded
    /// from the cascade walk
    pub target_is_owned: bool,
}

impl NavigationDescriptor {
    /// A to-one reference navigation with default policy
    pub fn reference(name: impl Into<String>, target_kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target_kind: target_kind.into(),
            is_collection: false,
            cascade: CascadeBehavior::None,
            target_is_owned: false,
        }
    }

    /// A to-many collection navigation with default policy
    pub fn collection(name: impl Into<String>, target_kind: impl Into<String>) -> Self {
        Self {
            is_collection: true,
            ..Self::reference(name, target_kind)
        }
    }

    /// Enable cascade delete on this navigation
    pub fn cascade(mut self) -> Self {
        self.cascade = CascadeBehavior::Cascade;
        self
    }

    /// Mark the target as an owned sub-entity
    pub fn owned(mut self) -> Self {
        self.target_is_owned = true;
        self
    }
}

/// An inbound reference: some other kind navigates to this one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InverseReference {
    /// Entity kind holding the navigation
    pub source_kind: String,
    /// Name of the navigation on the source kind
    pub navigation: String,
    /// Whether the source navigation is a collection
    pub is_collection: bool,
}

/// Everything known about one entity kind's relationships
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityRelationships {
    /// Outgoing navigations declared on this kind
    pub navigations: Vec<NavigationDescriptor>,
    /// Inbound references from other kinds, derived at registry build time
    pub referenced_by: Vec<InverseReference>,
}

impl EntityRelationships {
    /// Whether every relationship this entity participates in is a to-one,
    /// non-collection relationship
    ///
    /// True means the entity is exclusively referenced via a unique foreign
    /// key; soft-deleting it would leave that key occupied.
    pub fn participates_only_in_to_one(&self) -> bool {
        let has_any = !self.navigations.is_empty() || !self.referenced_by.is_empty();
        has_any
            && self.navigations.iter().all(|n| !n.is_collection)
            && self.referenced_by.iter().all(|r| !r.is_collection)
    }

    /// Navigations the cascade walk follows: cascade-configured and not
    /// pointing at owned sub-entities
    pub fn cascade_navigations(&self) -> impl Iterator<Item = &NavigationDescriptor> {
        self.navigations
            .iter()
            .filter(|n| n.cascade == CascadeBehavior::Cascade && !n.target_is_owned)
    }
}

/// Read-only provider of relationship metadata
///
/// A lookup failure is a cascade-walk failure
/// ([`RelationshipLoadFailure`](PersistenceError::RelationshipLoadFailure)),
/// not an empty result.
pub trait RelationshipMetadataProvider: Send + Sync {
    /// Relationship metadata for one entity kind
    fn for_entity(&self, entity_kind: &str) -> PersistenceResult<EntityRelationships>;
}

/// Relationship metadata table built once at startup
///
/// # Examples
///
/// ```rust
/// use domain_persistence::{
///     NavigationDescriptor, RelationshipMetadataProvider, RelationshipRegistry,
/// };
///
/// let registry = RelationshipRegistry::builder()
///     .navigation("author", NavigationDescriptor::collection("posts", "post").cascade())
///     .navigation("post", NavigationDescriptor::collection("comments", "comment").cascade())
///     .entity("tag")
///     .build();
///
/// let author = registry.for_entity("author").unwrap();
/// assert_eq!(author.navigations.len(), 1);
///
/// // Inbound references are derived automatically.
/// let post = registry.for_entity("post").unwrap();
/// assert_eq!(post.referenced_by[0].source_kind, "author");
/// ```
#[derive(Debug, Clone, Default)]
pub struct RelationshipRegistry {
    entities: HashMap<String, EntityRelationships>,
}

impl RelationshipRegistry {
    /// Start building a registry
    pub fn builder() -> RelationshipRegistryBuilder {
        RelationshipRegistryBuilder::default()
    }

    /// Whether the given kind is registered
    pub fn contains(&self, entity_kind: &str) -> bool {
        self.entities.contains_key(entity_kind)
    }
}

impl RelationshipMetadataProvider for RelationshipRegistry {
    fn for_entity(&self, entity_kind: &str) -> PersistenceResult<EntityRelationships> {
        self.entities.get(entity_kind).cloned().ok_or_else(|| {
            PersistenceError::RelationshipLoadFailure {
                entity_kind: entity_kind.to_string(),
                navigation: "*".to_string(),
                reason: "entity kind not registered".to_string(),
            }
        })
    }
}

/// Builder for [`RelationshipRegistry`]
#[derive(Debug, Default)]
pub struct RelationshipRegistryBuilder {
    navigations: HashMap<String, Vec<NavigationDescriptor>>,
}

impl RelationshipRegistryBuilder {
    /// Register an entity kind with no navigations of its own
    pub fn entity(mut self, kind: impl Into<String>) -> Self {
        self.navigations.entry(kind.into()).or_default();
        self
    }

    /// Register a navigation on `owner_kind`
    ///
    /// The target kind is registered implicitly.
    pub fn navigation(mut self, owner_kind: impl Into<String>, nav: NavigationDescriptor) -> Self {
        self.navigations
            .entry(nav.target_kind.clone())
            .or_default();
        self.navigations.entry(owner_kind.into()).or_default().push(nav);
        self
    }

    /// Finish the registry, deriving inbound references
    pub fn build(self) -> RelationshipRegistry {
        let mut entities: HashMap<String, EntityRelationships> = self
            .navigations
            .iter()
            .map(|(kind, navs)| {
                (
                    kind.clone(),
                    EntityRelationships {
                        navigations: navs.clone(),
                        referenced_by: Vec::new(),
                    },
                )
            })
            .collect();

        for (owner, navs) in &self.navigations {
            for nav in navs {
                if let Some(target) = entities.get_mut(&nav.target_kind) {
                    target.referenced_by.push(InverseReference {
                        source_kind: owner.clone(),
                        navigation: nav.name.clone(),
                        is_collection: nav.is_collection,
                    });
                }
            }
        }

        RelationshipRegistry { entities }
    }
}
