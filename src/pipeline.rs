// Copyright 2025 Cowboy AI, LLC.

//! The save pipeline
//!
//! One save call runs every stage sequentially over the unit of work it
//! exclusively owns: classify, stamp, resolve deletes, dispatch buffered
//! events, commit. Each stage sees the complete, stable mutation set the
//! previous stage produced. Suspension happens only at the I/O boundaries
//! (lazy navigation loads during the cascade walk, the dispatch calls, the
//! commit itself).
//!
//! Events are dispatched *before* the commit is finalized: subscribers may
//! observe an event for a change that is never durably persisted if the
//! commit subsequently fails. Dispatch is the last pre-commit step precisely
//! so that a cancellation observed earlier aborts without any event having
//! left the process.

use crate::change_set::{classify, ChangeSet, MutationKind};
use crate::errors::{PersistenceError, PersistenceResult};
use crate::events::EventDispatcher;
use crate::identity::{Anonymous, IdentityProvider};
use crate::relationships::{RelationshipMetadataProvider, RelationshipRegistry};
use crate::soft_delete::SoftDeleteResolver;
use crate::stamper::AuditStamper;
use crate::store::{CommitBatch, EntityStore, NoRelatedRows, QueryExecutor};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Cooperative cancellation signal for an in-flight save
///
/// Observed before dispatch; a cancelled save aborts without having
/// dispatched events or written to the store. A signal raised after commit
/// has no effect.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    /// Create an unraised flag
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether the flag has been raised
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Outcome of a successful save
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveReport {
    /// Number of row mutations the store committed
    pub committed: u64,
}

/// The save pipeline over its external collaborators
///
/// Built once and shared; each [`save`](SavePipeline::save) call owns its
/// change set exclusively for the duration. Concurrent saves against
/// overlapping entities race at commit time and are arbitrated by the
/// store's concurrency-token check, not by this pipeline. There is no retry
/// anywhere in it: conflicts and cancellation surface to the caller.
pub struct SavePipeline {
    metadata: Arc<dyn RelationshipMetadataProvider>,
    queries: Arc<dyn QueryExecutor>,
    identity: Arc<dyn IdentityProvider>,
    dispatcher: Arc<dyn EventDispatcher>,
    store: Arc<dyn EntityStore>,
}

impl SavePipeline {
    /// Start assembling a pipeline
    pub fn builder() -> SavePipelineBuilder {
        SavePipelineBuilder::default()
    }

    /// The commit store this pipeline writes to
    pub fn store(&self) -> &Arc<dyn EntityStore> {
        &self.store
    }

    /// Run the full save cycle over `changes`
    ///
    /// On success the change set is cleared and the number of committed row
    /// mutations reported. On failure the change set is left as-is; whether
    /// any events were already dispatched depends on where the failure
    /// occurred (a [`DispatchFailure`](PersistenceError::DispatchFailure)
    /// may follow earlier successful dispatches).
    pub async fn save(&self, changes: &mut ChangeSet) -> PersistenceResult<SaveReport> {
        self.save_with_cancellation(changes, &CancellationFlag::new())
            .await
    }

    /// Run the full save cycle, observing a cancellation flag before the
    /// dispatch stage
    #[instrument(
        skip_all,
        fields(tracked = changes.len(), deletes = changes.delete_requests().len())
    )]
    pub async fn save_with_cancellation(
        &self,
        changes: &mut ChangeSet,
        cancel: &CancellationFlag,
    ) -> PersistenceResult<SaveReport> {
        let actor = self.identity.current_actor_id();

        // Classify and stamp the caller-registered mutations.
        let classified = classify(changes);
        let mut stamper = AuditStamper::new();
        for (id, kind) in &classified.to_stamp {
            let Some(mutation) = changes.get_mut(id) else {
                continue;
            };
            match kind {
                MutationKind::Added => {
                    stamper.stamp_created(mutation.entity.as_mut(), actor.as_deref());
                }
                MutationKind::Modified => {
                    stamper.stamp_modified(mutation.entity.as_mut(), actor.as_deref());
                    stamper.rotate_concurrency_token(mutation.entity.as_mut());
                }
                MutationKind::Removed => {}
            }
        }

        // Resolve queued deletes, rewriting the mutation set. A resolver
        // failure aborts before anything it marked reaches the change set.
        let requests = changes.take_delete_requests();
        if !requests.is_empty() {
            let resolver = SoftDeleteResolver::new(self.metadata.as_ref(), self.queries.as_ref());
            for request in requests {
                let resolution = resolver.resolve(request, actor.as_deref()).await?;
                for removal in resolution.removals {
                    changes.remove(removal);
                }
                for marked in resolution.soft_deleted {
                    let id = marked.entity_id();
                    // Register first so the pre-rotation stamp becomes the
                    // commit-time expectation, then stamp like any other
                    // Modified classification.
                    changes.update(marked);
                    if let Some(mutation) = changes.get_mut(&id) {
                        stamper.stamp_modified(mutation.entity.as_mut(), actor.as_deref());
                        stamper.rotate_concurrency_token(mutation.entity.as_mut());
                    }
                }
            }
        }

        // Dispatch is the last pre-commit step; a cancellation observed here
        // aborts with no events having left the process.
        if cancel.is_cancelled() {
            warn!("save cancelled before dispatch");
            return Err(PersistenceError::Cancelled);
        }
        self.flush_events(changes).await?;

        // A signal raised during dispatch still aborts the commit; the
        // already-delivered events mirror what a failed commit produces.
        if cancel.is_cancelled() {
            warn!("save cancelled before commit");
            return Err(PersistenceError::Cancelled);
        }
        let batch = CommitBatch::from_change_set(changes);
        let committed = self.store.commit(batch).await?;
        debug!(committed, "save cycle committed");
        changes.clear();
        Ok(SaveReport { committed })
    }

    /// Flush buffered domain events across the whole unit of work
    ///
    /// All local events are delivered first, ordered by their global
    /// sequence numbers, then all distributed events, likewise ordered.
    /// Queues are cleared exactly once per successful flush of their
    /// category; a failure propagates after earlier events have already
    /// been delivered.
    async fn flush_events(&self, changes: &mut ChangeSet) -> PersistenceResult<()> {
        let mut local = Vec::new();
        let mut distributed = Vec::new();
        for mutation in changes.entries() {
            if let Some(source) = mutation.entity.event_source() {
                local.extend_from_slice(source.event_buffer().local());
                distributed.extend_from_slice(source.event_buffer().distributed());
            }
        }
        if local.is_empty() && distributed.is_empty() {
            return Ok(());
        }
        local.sort_by_key(|r| r.sequence);
        distributed.sort_by_key(|r| r.sequence);
        debug!(
            local = local.len(),
            distributed = distributed.len(),
            "dispatching buffered domain events"
        );

        for record in &local {
            self.dispatcher
                .dispatch(&record.payload)
                .await
                .map_err(|reason| PersistenceError::DispatchFailure { reason })?;
        }
        for mutation in changes.entries_mut() {
            if let Some(source) = mutation.entity.event_source_mut() {
                source.event_buffer_mut().clear_local();
            }
        }

        for record in &distributed {
            self.dispatcher
                .dispatch(&record.payload)
                .await
                .map_err(|reason| PersistenceError::DispatchFailure { reason })?;
        }
        for mutation in changes.entries_mut() {
            if let Some(source) = mutation.entity.event_source_mut() {
                source.event_buffer_mut().clear_distributed();
            }
        }
        Ok(())
    }
}

/// Builder for [`SavePipeline`]
///
/// The store and dispatcher are required; relationship metadata defaults to
/// an empty registry, the query executor to
/// [`NoRelatedRows`](crate::store::NoRelatedRows), and the identity context
/// to [`Anonymous`].
#[derive(Default)]
pub struct SavePipelineBuilder {
    metadata: Option<Arc<dyn RelationshipMetadataProvider>>,
    queries: Option<Arc<dyn QueryExecutor>>,
    identity: Option<Arc<dyn IdentityProvider>>,
    dispatcher: Option<Arc<dyn EventDispatcher>>,
    store: Option<Arc<dyn EntityStore>>,
}

impl SavePipelineBuilder {
    /// Set the relationship-metadata provider
    pub fn metadata(mut self, metadata: Arc<dyn RelationshipMetadataProvider>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Set the navigation query executor
    pub fn queries(mut self, queries: Arc<dyn QueryExecutor>) -> Self {
        self.queries = Some(queries);
        self
    }

    /// Set the identity context
    pub fn identity(mut self, identity: Arc<dyn IdentityProvider>) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Set the event dispatcher
    pub fn dispatcher(mut self, dispatcher: Arc<dyn EventDispatcher>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    /// Set the commit store
    pub fn store(mut self, store: Arc<dyn EntityStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Assemble the pipeline
    pub fn build(self) -> PersistenceResult<SavePipeline> {
        Ok(SavePipeline {
            metadata: self
                .metadata
                .unwrap_or_else(|| Arc::new(RelationshipRegistry::builder().build())),
            queries: self.queries.unwrap_or_else(|| Arc::new(NoRelatedRows)),
            identity: self.identity.unwrap_or_else(|| Arc::new(Anonymous)),
            dispatcher: self
                .dispatcher
                .ok_or_else(|| PersistenceError::Store("pipeline dispatcher not configured".into()))?,
            store: self
                .store
                .ok_or_else(|| PersistenceError::Store("pipeline store not configured".into()))?,
        })
    }
}
