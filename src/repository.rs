// Copyright 2025 Cowboy AI, LLC.

//! Repository facade over the save pipeline
//!
//! A [`Repository`] pairs one change set with one pipeline and offers the
//! typed entry points callers actually use: register, look up, save. Reads
//! through [`find`](Repository::find) apply the soft-delete filter, so a
//! logically deleted row is invisible here even though the store still
//! holds it.

use crate::change_set::ChangeSet;
use crate::entity::PersistentEntity;
use crate::errors::PersistenceResult;
use crate::pipeline::{CancellationFlag, SavePipeline, SaveReport};
use std::sync::Arc;
use uuid::Uuid;

/// A unit of work bound to a shared save pipeline
///
/// Not shareable across tasks; each caller owns its repository and with it
/// the change set a save operates on.
pub struct Repository {
    pipeline: Arc<SavePipeline>,
    changes: ChangeSet,
}

impl Repository {
    /// Create a repository over the given pipeline
    pub fn new(pipeline: Arc<SavePipeline>) -> Self {
        Self {
            pipeline,
            changes: ChangeSet::new(),
        }
    }

    /// Track a new entity for insertion at the next save
    pub fn add<E: PersistentEntity + 'static>(&mut self, entity: E) {
        self.changes.add(Box::new(entity));
    }

    /// Track an existing entity as modified
    pub fn update<E: PersistentEntity + 'static>(&mut self, entity: E) {
        self.changes.update(Box::new(entity));
    }

    /// Queue a delete request for resolution at the next save
    ///
    /// A non-permanent request against a soft-deletable entity marks it (and
    /// its cascade-reachable dependents) deleted instead of removing rows.
    pub fn request_delete<E: PersistentEntity + 'static>(&mut self, entity: E, permanent: bool) {
        self.changes.request_delete(Box::new(entity), permanent);
    }

    /// Look up an entity by id, hiding soft-deleted rows
    pub async fn find(&self, id: Uuid) -> PersistenceResult<Option<Box<dyn PersistentEntity>>> {
        let row = self.pipeline.store().fetch(id).await?;
        Ok(row.filter(|entity| !entity.as_ref().is_soft_deleted()))
    }

    /// Run the save pipeline over everything tracked so far
    pub async fn save(&mut self) -> PersistenceResult<SaveReport> {
        self.pipeline.save(&mut self.changes).await
    }

    /// Run the save pipeline, observing a cancellation flag
    pub async fn save_with_cancellation(
        &mut self,
        cancel: &CancellationFlag,
    ) -> PersistenceResult<SaveReport> {
        self.pipeline
            .save_with_cancellation(&mut self.changes, cancel)
            .await
    }

    /// Number of mutations currently tracked
    pub fn tracked(&self) -> usize {
        self.changes.len()
    }

    /// Whether nothing is tracked and no deletes are queued
    pub fn is_clean(&self) -> bool {
        self.changes.is_empty() && self.changes.delete_requests().is_empty()
    }
}
