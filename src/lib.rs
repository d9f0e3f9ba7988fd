// Copyright 2025 Cowboy AI, LLC.

//! # Domain Persistence
//!
//! Write-side persistence pipeline for domain entities: audit stamping,
//! optimistic concurrency, cascading soft delete, and buffered domain-event
//! dispatch, all orchestrated by a single save cycle.
//!
//! The building blocks:
//! - **Entities**: Type-erased [`PersistentEntity`] with opt-in capability
//!   accessors, plus phantom-typed [`EntityId`] for compile-time identity
//! - **Capabilities**: Creation/modification/deletion audit fields,
//!   concurrency stamps, event buffers, extra properties
//! - **Change Set**: An insertion-ordered unit of work classifying tracked
//!   mutations as Added, Modified, or Removed
//! - **Save Pipeline**: classify, stamp, resolve deletes, dispatch events,
//!   commit, in that order, with cooperative cancellation before dispatch
//! - **Soft Delete**: Cascade walk over declared relationship metadata with
//!   a one-to-one integrity guard
//! - **Events**: Globally sequenced local and distributed queues flushed at
//!   save time, before the commit is finalized
//!
//! ## Design Principles
//!
//! 1. **Capabilities over hierarchy**: Entities declare what they support;
//!    the pipeline probes accessors instead of downcasting
//! 2. **All-or-nothing resolution**: A delete walk that trips an integrity
//!    guard changes nothing
//! 3. **No hidden retries**: Concurrency conflicts and cancellations surface
//!    to the caller as errors
//! 4. **Sequenced events**: One process-wide counter orders events across
//!    every aggregate

#![warn(missing_docs)]

mod capabilities;
mod change_set;
mod entity;
mod errors;
mod events;
mod identity;
mod pipeline;
mod relationships;
mod repository;
mod soft_delete;
mod stamper;
mod store;

#[cfg(test)]
mod test_support;

// Re-export core types
pub use capabilities::{
    new_concurrency_stamp, ConcurrencyStamp, ConcurrencyTracked, CreationAudit, CreationAudited,
    DeletionAudit, EventSource, ExtraProperties, HasExtraProperties, ModificationAudit,
    ModificationAudited, SoftDeletable,
};
pub use change_set::{
    classify, ChangeSet, ClassifiedChanges, DeleteRequest, MutationKind, PendingMutation,
};
pub use entity::{EntityId, PersistentEntity};
pub use errors::{PersistenceError, PersistenceResult};
pub use events::{
    next_event_sequence, DomainEventRecord, EventBuffer, EventDispatcher, RecordingDispatcher,
};
pub use identity::{Anonymous, FixedIdentity, IdentityProvider};
pub use pipeline::{CancellationFlag, SavePipeline, SavePipelineBuilder, SaveReport};
pub use relationships::{
    CascadeBehavior, EntityRelationships, InverseReference, NavigationDescriptor,
    RelationshipMetadataProvider, RelationshipRegistry, RelationshipRegistryBuilder,
};
pub use repository::Repository;
pub use soft_delete::{DeleteOutcome, DeleteResolution, SoftDeleteResolver};
pub use stamper::AuditStamper;
pub use store::{
    CommitBatch, CommitUpdate, EntityStore, InMemoryStore, NoRelatedRows, QueryExecutor,
};
