// Copyright 2025 Cowboy AI, LLC.

//! Storage seams: the commit executor and the navigation query executor
//!
//! The pipeline owns no wire or file format; persisted layout is the
//! underlying store's responsibility. These traits are the whole surface the
//! pipeline consumes, plus an in-memory store used by tests and demos.

use crate::change_set::{ChangeSet, MutationKind};
use crate::entity::PersistentEntity;
use crate::errors::{PersistenceError, PersistenceResult};
use crate::relationships::NavigationDescriptor;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// One update slated for commit, with its optimistic-concurrency expectation
#[derive(Debug)]
pub struct CommitUpdate {
    /// The entity state to write
    pub entity: Box<dyn PersistentEntity>,
    /// Stamp the store must currently hold for the write to proceed; `None`
    /// when the entity is not concurrency-tracked
    pub expected_stamp: Option<String>,
}

/// The finalized mutation set handed to the store in one commit
#[derive(Debug, Default)]
pub struct CommitBatch {
    /// New rows
    pub inserts: Vec<Box<dyn PersistentEntity>>,
    /// Updated rows with their concurrency expectations
    pub updates: Vec<CommitUpdate>,
    /// Identities of rows to physically remove
    pub removals: Vec<Uuid>,
}

impl CommitBatch {
    /// Build a batch from a resolved change set, cloning tracked entities
    pub fn from_change_set(changes: &ChangeSet) -> Self {
        let mut batch = CommitBatch::default();
        for mutation in changes.entries() {
            match mutation.kind {
                MutationKind::Added => batch.inserts.push(mutation.entity.clone_entity()),
                MutationKind::Modified => batch.updates.push(CommitUpdate {
                    entity: mutation.entity.clone_entity(),
                    expected_stamp: mutation.expected_stamp.clone(),
                }),
                MutationKind::Removed => batch.removals.push(mutation.entity.entity_id()),
            }
        }
        batch
    }

    /// Total number of row mutations in the batch
    pub fn len(&self) -> usize {
        self.inserts.len() + self.updates.len() + self.removals.len()
    }

    /// Whether the batch mutates nothing
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Commit executor for the underlying store
///
/// `commit` performs the store's own optimistic-concurrency check: an update
/// whose expected stamp does not match the stored row must fail with
/// [`ConcurrencyConflict`](PersistenceError::ConcurrencyConflict) and leave
/// the store unchanged.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Apply a finalized mutation set, returning the number of committed
    /// row mutations
    async fn commit(&self, batch: CommitBatch) -> PersistenceResult<u64>;

    /// Fetch one row by identity, soft-deleted rows included
    async fn fetch(&self, id: Uuid) -> PersistenceResult<Option<Box<dyn PersistentEntity>>>;
}

/// Load-by-navigation capability used by the cascade walk
///
/// Implementations must filter out rows already marked soft-deleted; the
/// resolver re-checks, but the contract keeps load sizes bounded.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Load the related entities reachable from `owner` through `navigation`
    async fn load_related(
        &self,
        owner: &(dyn PersistentEntity + 'static),
        navigation: &NavigationDescriptor,
    ) -> PersistenceResult<Vec<Box<dyn PersistentEntity>>>;
}

/// Query executor for object graphs without navigations to walk
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRelatedRows;

#[async_trait]
impl QueryExecutor for NoRelatedRows {
    async fn load_related(
        &self,
        _owner: &dyn PersistentEntity,
        _navigation: &NavigationDescriptor,
    ) -> PersistenceResult<Vec<Box<dyn PersistentEntity>>> {
        Ok(Vec::new())
    }
}

/// In-memory entity store for tests and demos
///
/// Rows live in a map keyed by identity; the optimistic check compares the
/// stored row's concurrency stamp against each update's expectation.
#[derive(Default)]
pub struct InMemoryStore {
    rows: Arc<RwLock<HashMap<Uuid, Box<dyn PersistentEntity>>>>,
}

impl InMemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows currently held, soft-deleted rows included
    pub fn row_count(&self) -> usize {
        self.rows.read().unwrap().len()
    }

    /// Snapshot one row for assertions
    pub fn snapshot(&self, id: Uuid) -> Option<Box<dyn PersistentEntity>> {
        self.rows.read().unwrap().get(&id).map(|e| e.clone_entity())
    }

    /// Overwrite a row directly, bypassing the pipeline
    ///
    /// Test hook for simulating writes from a competing unit of work.
    pub fn put_raw(&self, entity: Box<dyn PersistentEntity>) {
        self.rows.write().unwrap().insert(entity.entity_id(), entity);
    }
}

#[async_trait]
impl EntityStore for InMemoryStore {
    async fn commit(&self, batch: CommitBatch) -> PersistenceResult<u64> {
        let mut rows = self.rows.write().unwrap();

        // Validate the whole batch before touching anything so a conflict
        // leaves the store unchanged.
        for update in &batch.updates {
            let id = update.entity.entity_id();
            let current = rows.get(&id).ok_or_else(|| {
                PersistenceError::Store(format!("update of missing row {id}"))
            })?;
            if let Some(expected) = &update.expected_stamp {
                let actual = current
                    .concurrency()
                    .map(|c| c.concurrency_stamp().to_string());
                if actual.as_deref() != Some(expected.as_str()) {
                    return Err(PersistenceError::ConcurrencyConflict {
                        entity_id: id,
                        expected: Some(expected.clone()),
                        actual,
                    });
                }
            }
        }
        for insert in &batch.inserts {
            let id = insert.entity_id();
            if rows.contains_key(&id) {
                return Err(PersistenceError::Store(format!(
                    "insert of existing row {id}"
                )));
            }
        }

        let committed = batch.len() as u64;
        for insert in batch.inserts {
            rows.insert(insert.entity_id(), insert);
        }
        for update in batch.updates {
            rows.insert(update.entity.entity_id(), update.entity);
        }
        for id in batch.removals {
            rows.remove(&id);
        }
        Ok(committed)
    }

    async fn fetch(&self, id: Uuid) -> PersistenceResult<Option<Box<dyn PersistentEntity>>> {
        Ok(self.rows.read().unwrap().get(&id).map(|e| e.clone_entity()))
    }
}
