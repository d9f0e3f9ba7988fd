// Copyright 2025 Cowboy AI, LLC.

//! Cascading soft-delete resolution
//!
//! A delete request resolves to one of two terminal states: the entity is
//! physically removed, or it and every cascade-reachable dependent are marked
//! logically deleted. The walk is an explicit worklist with a visited set
//! keyed by entity identity, so deep and cyclic relationship graphs cannot
//! overflow the stack or loop forever.
//!
//! The resolver accumulates its updates and hands them back only after the
//! full walk succeeds; any metadata-lookup or load failure aborts the whole
//! cascade with no partial soft-deletes.

use crate::change_set::DeleteRequest;
use crate::entity::PersistentEntity;
use crate::errors::{PersistenceError, PersistenceResult};
use crate::relationships::RelationshipMetadataProvider;
use crate::store::QueryExecutor;
use chrono::Utc;
use std::collections::HashSet;
use tracing::debug;
use uuid::Uuid;

/// Terminal state of one resolved delete request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The entity leaves the store physically
    PermanentlyRemoved,
    /// The entity (and cascade-reachable dependents) stay as logically
    /// deleted rows
    SoftDeleted,
}

/// Accumulated result of resolving one delete request
///
/// Handed to the commit step only after the full walk succeeded.
#[derive(Debug)]
pub struct DeleteResolution {
    /// Terminal state reached by the top-level request
    pub outcome: DeleteOutcome,
    /// Entities to remove physically
    pub removals: Vec<Box<dyn PersistentEntity>>,
    /// Entities marked deleted, to be registered as Modified mutations
    pub soft_deleted: Vec<Box<dyn PersistentEntity>>,
}

/// Converts delete requests into permanent removals or soft-delete walks
pub struct SoftDeleteResolver<'a> {
    metadata: &'a dyn RelationshipMetadataProvider,
    queries: &'a dyn QueryExecutor,
}

impl<'a> SoftDeleteResolver<'a> {
    /// Create a resolver over the given metadata and query collaborators
    pub fn new(
        metadata: &'a dyn RelationshipMetadataProvider,
        queries: &'a dyn QueryExecutor,
    ) -> Self {
        Self { metadata, queries }
    }

    /// Resolve one delete request
    ///
    /// A permanent request, or an entity that cannot represent soft deletion,
    /// resolves to physical removal. Otherwise the entity's cascade graph is
    /// walked depth-first: each reachable dependent is guarded, loaded lazily
    /// where needed, and marked deleted with deletion time and deleter id.
    /// An entity already marked deleted is a no-op, not an error.
    pub async fn resolve(
        &self,
        request: DeleteRequest,
        actor: Option<&str>,
    ) -> PersistenceResult<DeleteResolution> {
        let DeleteRequest { entity, permanent } = request;

        // Permanent removal bypasses all soft-delete logic.
        if permanent {
            return Ok(DeleteResolution {
                outcome: DeleteOutcome::PermanentlyRemoved,
                removals: vec![entity],
                soft_deleted: Vec::new(),
            });
        }

        // Soft delete is not representable; fail open to physical removal.
        if entity.soft_delete().is_none() {
            return Ok(DeleteResolution {
                outcome: DeleteOutcome::PermanentlyRemoved,
                removals: vec![entity],
                soft_deleted: Vec::new(),
            });
        }

        let mut removals: Vec<Box<dyn PersistentEntity>> = Vec::new();
        let mut soft_deleted: Vec<Box<dyn PersistentEntity>> = Vec::new();
        let mut visited: HashSet<Uuid> = HashSet::new();
        let mut worklist: Vec<Box<dyn PersistentEntity>> = vec![entity];

        while let Some(mut node) = worklist.pop() {
            let id = node.entity_id();
            if !visited.insert(id) {
                continue;
            }

            // A dependent that cannot represent soft deletion is removed
            // physically, same as a top-level request would be.
            if node.soft_delete().is_none() {
                removals.push(node);
                continue;
            }

            let relationships = self.metadata.for_entity(node.entity_kind())?;

            // One-to-one guard: an entity exclusively referenced via a unique
            // foreign key must not be soft-deleted, since the occupied key
            // would block re-creation. Aborts the whole request.
            if relationships.participates_only_in_to_one() {
                return Err(PersistenceError::IntegrityPolicyViolation {
                    entity_kind: node.entity_kind().to_string(),
                    entity_id: id,
                    reason: "entity participates only in to-one relations; \
                             soft delete would permanently occupy its unique foreign key"
                        .to_string(),
                });
            }

            // Idempotent short-circuit: already deleted, nothing to re-stamp.
            if node.is_soft_deleted() {
                continue;
            }

            for navigation in relationships.cascade_navigations() {
                let dependents = self.queries.load_related(node.as_ref(), navigation).await?;
                debug!(
                    entity_id = %id,
                    navigation = %navigation.name,
                    dependents = dependents.len(),
                    "cascade walk loaded dependents"
                );
                for dependent in dependents {
                    // The executor filters soft-deleted rows; re-check so a
                    // permissive implementation cannot re-stamp them.
                    if dependent.is_soft_deleted() {
                        continue;
                    }
                    if !visited.contains(&dependent.entity_id()) {
                        worklist.push(dependent);
                    }
                }
            }

            if let Some(flags) = node.soft_delete_mut() {
                flags.set_deletion_time(Some(Utc::now()));
                flags.set_deleter_id(actor.map(str::to_string));
                flags.set_deleted(true);
            }
            soft_deleted.push(node);
        }

        Ok(DeleteResolution {
            outcome: DeleteOutcome::SoftDeleted,
            removals,
            soft_deleted,
        })
    }
}
