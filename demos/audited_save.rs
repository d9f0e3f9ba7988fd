// Copyright 2025 Cowboy AI, LLC.

//! Audited Save Example
//!
//! Walks a document through its write-side lifecycle:
//! - First save stamps creation time and creator
//! - A later save stamps the modification block and rotates the
//!   concurrency token
//! - Buffered domain events are dispatched as part of the save cycle
//!
//! Run with: cargo run --example audited_save

use chrono::{DateTime, Utc};
use domain_persistence::{
    ChangeSet, ConcurrencyStamp, ConcurrencyTracked, CreationAudit, CreationAudited, EventBuffer,
    EventSource, FixedIdentity, InMemoryStore, ModificationAudit, ModificationAudited,
    PersistentEntity, RecordingDispatcher, SavePipeline,
};
use serde_json::json;
use std::any::Any;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct Document {
    id: Uuid,
    title: String,
    body: String,
    creation: CreationAudit,
    modification: ModificationAudit,
    stamp: ConcurrencyStamp,
    events: EventBuffer,
}

impl Document {
    fn new(title: &str, body: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.to_string(),
            body: body.to_string(),
            creation: CreationAudit::default(),
            modification: ModificationAudit::default(),
            stamp: ConcurrencyStamp::default(),
            events: EventBuffer::default(),
        }
    }
}

impl PersistentEntity for Document {
    fn entity_id(&self) -> Uuid {
        self.id
    }
    fn entity_kind(&self) -> &'static str {
        "document"
    }
    fn clone_entity(&self) -> Box<dyn PersistentEntity> {
        Box::new(self.clone())
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
    fn creation_audit(&self) -> Option<&dyn CreationAudited> {
        Some(self)
    }
    fn creation_audit_mut(&mut self) -> Option<&mut dyn CreationAudited> {
        Some(self)
    }
    fn modification_audit(&self) -> Option<&dyn ModificationAudited> {
        Some(self)
    }
    fn modification_audit_mut(&mut self) -> Option<&mut dyn ModificationAudited> {
        Some(self)
    }
    fn concurrency(&self) -> Option<&dyn ConcurrencyTracked> {
        Some(self)
    }
    fn concurrency_mut(&mut self) -> Option<&mut dyn ConcurrencyTracked> {
        Some(self)
    }
    fn event_source(&self) -> Option<&dyn EventSource> {
        Some(self)
    }
    fn event_source_mut(&mut self) -> Option<&mut dyn EventSource> {
        Some(self)
    }
}

impl CreationAudited for Document {
    fn creation_time(&self) -> Option<DateTime<Utc>> {
        self.creation.creation_time
    }
    fn set_creation_time(&mut self, at: DateTime<Utc>) {
        self.creation.creation_time = Some(at);
    }
    fn creator_id(&self) -> Option<&str> {
        self.creation.creator_id.as_deref()
    }
    fn set_creator_id(&mut self, actor: Option<String>) {
        self.creation.creator_id = actor;
    }
}

impl ModificationAudited for Document {
    fn last_modification_time(&self) -> Option<DateTime<Utc>> {
        self.modification.last_modification_time
    }
    fn set_last_modification_time(&mut self, at: DateTime<Utc>) {
        self.modification.last_modification_time = Some(at);
    }
    fn last_modifier_id(&self) -> Option<&str> {
        self.modification.last_modifier_id.as_deref()
    }
    fn set_last_modifier_id(&mut self, actor: Option<String>) {
        self.modification.last_modifier_id = actor;
    }
}

impl ConcurrencyTracked for Document {
    fn concurrency_stamp(&self) -> &str {
        &self.stamp.value
    }
    fn set_concurrency_stamp(&mut self, stamp: String) {
        self.stamp.value = stamp;
    }
}

impl EventSource for Document {
    fn event_buffer(&self) -> &EventBuffer {
        &self.events
    }
    fn event_buffer_mut(&mut self) -> &mut EventBuffer {
        &mut self.events
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Audited Save Example ===\n");

    let store = Arc::new(InMemoryStore::new());
    let dispatcher = Arc::new(RecordingDispatcher::new());
    let pipeline = SavePipeline::builder()
        .store(store.clone())
        .dispatcher(dispatcher.clone())
        .identity(Arc::new(FixedIdentity::new("demo-user")))
        .build()?;

    // Create a document and buffer a domain event on it.
    let mut doc = Document::new("Persistence Notes", "draft");
    doc.events.add_local(json!({"kind": "DocumentDrafted", "title": doc.title}));
    let id = doc.id;

    let mut changes = ChangeSet::new();
    changes.add(Box::new(doc));
    let report = pipeline.save(&mut changes).await?;
    println!("First save committed {} mutation(s)", report.committed);

    let row = store.snapshot(id).unwrap();
    let saved = row.as_any().downcast_ref::<Document>().unwrap().clone();
    println!("  created at : {:?}", saved.creation.creation_time);
    println!("  created by : {:?}", saved.creation.creator_id);
    println!("  token      : {}", saved.stamp.value);
    println!("  dispatched : {:?}\n", dispatcher.delivered());

    // Edit and save again: modification stamps land, the token rotates.
    let mut edit = saved.clone();
    edit.body = "revised".to_string();
    changes.update(Box::new(edit));
    let report = pipeline.save(&mut changes).await?;
    println!("Second save committed {} mutation(s)", report.committed);

    let row = store.snapshot(id).unwrap();
    let revised = row.as_any().downcast_ref::<Document>().unwrap();
    println!("  modified at: {:?}", revised.modification.last_modification_time);
    println!("  modified by: {:?}", revised.modification.last_modifier_id);
    println!(
        "  token rotated: {} -> {}",
        saved.stamp.value, revised.stamp.value
    );

    Ok(())
}
