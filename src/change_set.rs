// Copyright 2025 Cowboy AI, LLC.

//! The unit of work: pending mutations and their classification
//!
//! A [`ChangeSet`] holds every entity touched in the current save cycle
//! together with its mutation kind, plus queued delete requests awaiting
//! resolution. Classification is snapshot-based per save cycle and discarded
//! after commit.

use crate::entity::PersistentEntity;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How an entity was touched in the current unit of work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MutationKind {
    /// New entity, to be inserted
    Added,
    /// Existing entity with updated state
    Modified,
    /// Entity to be physically removed
    Removed,
}

/// One tracked entity and its mutation kind
#[derive(Debug)]
pub struct PendingMutation {
    /// The tracked entity
    pub entity: Box<dyn PersistentEntity>,
    /// How it was touched
    pub kind: MutationKind,
    /// Concurrency stamp captured when the entity entered the change set,
    /// compared by the store's optimistic check at commit
    pub expected_stamp: Option<String>,
}

/// A delete queued for resolution at the next save
#[derive(Debug)]
pub struct DeleteRequest {
    /// The entity to delete
    pub entity: Box<dyn PersistentEntity>,
    /// Physical removal requested, bypassing soft-delete logic
    pub permanent: bool,
}

/// Insertion-ordered set of pending mutations for one save cycle
///
/// Owned exclusively by the save call for its duration; concurrent saves
/// against overlapping entities race at commit time and are arbitrated by
/// the concurrency-token check.
#[derive(Debug, Default)]
pub struct ChangeSet {
    entries: IndexMap<Uuid, PendingMutation>,
    deletes: Vec<DeleteRequest>,
}

impl ChangeSet {
    /// Create an empty change set
    pub fn new() -> Self {
        Self::default()
    }

    /// Track an entity as Added
    pub fn add(&mut self, entity: Box<dyn PersistentEntity>) {
        let id = entity.entity_id();
        self.entries.insert(
            id,
            PendingMutation {
                entity,
                kind: MutationKind::Added,
                expected_stamp: None,
            },
        );
    }

    /// Track an entity as Modified
    ///
    /// Captures the entity's current concurrency stamp as the commit-time
    /// expectation. An entity already tracked as Added stays Added: it has
    /// never been persisted, so there is nothing to conflict with.
    pub fn update(&mut self, entity: Box<dyn PersistentEntity>) {
        let id = entity.entity_id();
        if let Some(existing) = self.entries.get_mut(&id) {
            if existing.kind == MutationKind::Added {
                existing.entity = entity;
                return;
            }
        }
        let expected_stamp = entity
            .concurrency()
            .map(|c| c.concurrency_stamp().to_string());
        self.entries.insert(
            id,
            PendingMutation {
                entity,
                kind: MutationKind::Modified,
                expected_stamp,
            },
        );
    }

    /// Track an entity as Removed (physical delete)
    pub fn remove(&mut self, entity: Box<dyn PersistentEntity>) {
        let id = entity.entity_id();
        self.entries.insert(
            id,
            PendingMutation {
                entity,
                kind: MutationKind::Removed,
                expected_stamp: None,
            },
        );
    }

    /// Queue a delete for resolution at the next save
    pub fn request_delete(&mut self, entity: Box<dyn PersistentEntity>, permanent: bool) {
        self.deletes.push(DeleteRequest { entity, permanent });
    }

    /// Take the queued delete requests, leaving none behind
    pub fn take_delete_requests(&mut self) -> Vec<DeleteRequest> {
        std::mem::take(&mut self.deletes)
    }

    /// Queued delete requests awaiting resolution
    pub fn delete_requests(&self) -> &[DeleteRequest] {
        &self.deletes
    }

    /// Tracked mutations in insertion order
    pub fn entries(&self) -> impl Iterator<Item = &PendingMutation> {
        self.entries.values()
    }

    /// Mutable access to tracked mutations in insertion order
    pub fn entries_mut(&mut self) -> impl Iterator<Item = &mut PendingMutation> {
        self.entries.values_mut()
    }

    /// Mutable access to one tracked mutation
    pub fn get_mut(&mut self, id: &Uuid) -> Option<&mut PendingMutation> {
        self.entries.get_mut(id)
    }

    /// Number of tracked mutations (delete requests not included)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is tracked and no deletes are queued
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.deletes.is_empty()
    }

    /// Discard all tracked state after a successful commit
    pub fn clear(&mut self) {
        self.entries.clear();
        self.deletes.clear();
    }
}

/// Partitions produced by [`classify`]
#[derive(Debug, Default)]
pub struct ClassifiedChanges {
    /// Entities to stamp: Added or Modified with at least one audit or
    /// concurrency capability
    pub to_stamp: Vec<(Uuid, MutationKind)>,
    /// Identities of entities with delete requests queued
    pub to_delete: Vec<Uuid>,
    /// Entities carrying the event-source capability with buffered events
    pub event_sources: Vec<Uuid>,
}

/// Bucket each tracked entity by capability and mutation kind
///
/// Pure and side-effect-free with respect to storage; may be called
/// repeatedly within one save cycle. Entities without a relevant capability
/// are simply excluded from the corresponding partition.
pub fn classify(changes: &ChangeSet) -> ClassifiedChanges {
    let mut classified = ClassifiedChanges::default();

    for mutation in changes.entries() {
        let entity = mutation.entity.as_ref();
        let stampable = match mutation.kind {
            MutationKind::Added => entity.creation_audit().is_some(),
            MutationKind::Modified => {
                entity.modification_audit().is_some() || entity.concurrency().is_some()
            }
            MutationKind::Removed => false,
        };
        if stampable {
            classified.to_stamp.push((entity.entity_id(), mutation.kind));
        }

        if let Some(source) = entity.event_source() {
            if !source.event_buffer().is_empty() {
                classified.event_sources.push(entity.entity_id());
            }
        }
    }

    for request in changes.delete_requests() {
        classified.to_delete.push(request.entity.entity_id());
    }

    classified
}
