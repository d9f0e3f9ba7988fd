// Copyright 2025 Cowboy AI, LLC.

//! Domain-event buffering and the dispatch seam
//!
//! Aggregates buffer events in two independently ordered queues: *local*
//! events for intra-process side effects and *distributed* events for
//! cross-boundary integration. Every record carries a sequence number drawn
//! from one process-wide counter, so relative ordering across different
//! aggregates in the same unit of work is preserved. The counter is not
//! persisted and resets on restart; the guarantee is relative ordering within
//! a process lifetime, not global uniqueness across restarts.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// Process-wide event order counter
static EVENT_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Draw the next event sequence number
///
/// Monotonically increasing for the lifetime of the process, shared across
/// all aggregates.
pub fn next_event_sequence() -> u64 {
    EVENT_SEQUENCE.fetch_add(1, Ordering::SeqCst) + 1
}

/// A buffered domain event awaiting dispatch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainEventRecord {
    /// Opaque event payload; the pipeline does not interpret it
    pub payload: serde_json::Value,
    /// Globally monotonic sequence number assigned at buffering time
    pub sequence: u64,
}

/// Per-aggregate event queues
///
/// Filled by domain logic during a unit of work and cleared exactly once per
/// successful flush.
///
/// # Examples
///
/// ```rust
/// use domain_persistence::EventBuffer;
/// use serde_json::json;
///
/// let mut buffer = EventBuffer::default();
/// buffer.add_local(json!({"kind": "OrderPlaced"}));
/// buffer.add_distributed(json!({"kind": "OrderPlacedIntegration"}));
///
/// assert_eq!(buffer.local().len(), 1);
/// assert!(buffer.local()[0].sequence < buffer.distributed()[0].sequence);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventBuffer {
    local: Vec<DomainEventRecord>,
    distributed: Vec<DomainEventRecord>,
}

impl EventBuffer {
    /// Buffer a local event with the next global sequence number
    pub fn add_local(&mut self, payload: serde_json::Value) {
        self.local.push(DomainEventRecord {
            payload,
            sequence: next_event_sequence(),
        });
    }

    /// Buffer a distributed event with the next global sequence number
    pub fn add_distributed(&mut self, payload: serde_json::Value) {
        self.distributed.push(DomainEventRecord {
            payload,
            sequence: next_event_sequence(),
        });
    }

    /// Buffered local events in buffering order
    pub fn local(&self) -> &[DomainEventRecord] {
        &self.local
    }

    /// Buffered distributed events in buffering order
    pub fn distributed(&self) -> &[DomainEventRecord] {
        &self.distributed
    }

    /// Clear the local queue
    pub fn clear_local(&mut self) {
        self.local.clear();
    }

    /// Clear the distributed queue
    pub fn clear_distributed(&mut self) {
        self.distributed.clear();
    }

    /// Whether both queues are empty
    pub fn is_empty(&self) -> bool {
        self.local.is_empty() && self.distributed.is_empty()
    }
}

/// External dispatch capability consumed by the pipeline
///
/// The pipeline hands over each payload in sequence order and does not
/// interpret it. Dispatch happens *before* the underlying commit is
/// finalized, so implementations may observe events for changes that are
/// never durably persisted if the commit subsequently fails.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventDispatcher: Send + Sync {
    /// Deliver one event payload
    async fn dispatch(&self, payload: &serde_json::Value) -> Result<(), String>;
}

/// Dispatcher that records every payload it receives, for tests and demos
#[derive(Debug, Clone, Default)]
pub struct RecordingDispatcher {
    delivered: Arc<RwLock<Vec<serde_json::Value>>>,
}

impl RecordingDispatcher {
    /// Create a new recording dispatcher
    pub fn new() -> Self {
        Self::default()
    }

    /// All payloads delivered so far, in dispatch order
    pub fn delivered(&self) -> Vec<serde_json::Value> {
        self.delivered.read().unwrap().clone()
    }
}

#[async_trait]
impl EventDispatcher for RecordingDispatcher {
    async fn dispatch(&self, payload: &serde_json::Value) -> Result<(), String> {
        self.delivered.write().unwrap().push(payload.clone());
        Ok(())
    }
}
