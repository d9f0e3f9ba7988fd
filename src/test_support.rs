//! Shared fixtures for unit tests

use crate::capabilities::{
    ConcurrencyStamp, ConcurrencyTracked, CreationAudit, CreationAudited, DeletionAudit,
    EventSource, ExtraProperties, HasExtraProperties, ModificationAudit, ModificationAudited,
    SoftDeletable,
};
use crate::entity::PersistentEntity;
use crate::events::EventBuffer;
use chrono::{DateTime, Utc};
use std::any::Any;
use uuid::Uuid;

/// Fully capable fixture: audited, soft-deletable, concurrency-tracked,
/// event-generating.
#[derive(Debug, Clone)]
pub struct Article {
    pub id: Uuid,
    pub title: String,
    pub creation: CreationAudit,
    pub modification: ModificationAudit,
    pub deletion: DeletionAudit,
    pub stamp: ConcurrencyStamp,
    pub events: EventBuffer,
    pub extras: ExtraProperties,
}

impl Article {
    pub fn new(title: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.to_string(),
            creation: CreationAudit::default(),
            modification: ModificationAudit::default(),
            deletion: DeletionAudit::default(),
            stamp: ConcurrencyStamp::default(),
            events: EventBuffer::default(),
            extras: ExtraProperties::default(),
        }
    }
}

impl PersistentEntity for Article {
    fn entity_id(&self) -> Uuid {
        self.id
    }
    fn entity_kind(&self) -> &'static str {
        "article"
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
    fn soft_delete(&self) -> Option<&dyn SoftDeletable> {
        Some(self)
    }
    fn soft_delete_mut(&mut self) -> Option<&mut dyn SoftDeletable> {
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

impl CreationAudited for Article {
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

impl ModificationAudited for Article {
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

impl SoftDeletable for Article {
    fn is_deleted(&self) -> bool {
        self.deletion.is_deleted
    }
    fn set_deleted(&mut self, deleted: bool) {
        self.deletion.is_deleted = deleted;
    }
    fn deletion_time(&self) -> Option<DateTime<Utc>> {
        self.deletion.deletion_time
    }
    fn set_deletion_time(&mut self, at: Option<DateTime<Utc>>) {
        self.deletion.deletion_time = at;
    }
    fn deleter_id(&self) -> Option<&str> {
        self.deletion.deleter_id.as_deref()
    }
    fn set_deleter_id(&mut self, actor: Option<String>) {
        self.deletion.deleter_id = actor;
    }
}

impl ConcurrencyTracked for Article {
    fn concurrency_stamp(&self) -> &str {
        &self.stamp.value
    }
    fn set_concurrency_stamp(&mut self, stamp: String) {
        self.stamp.value = stamp;
    }
}

impl EventSource for Article {
    fn event_buffer(&self) -> &EventBuffer {
        &self.events
    }
    fn event_buffer_mut(&mut self) -> &mut EventBuffer {
        &mut self.events
    }
}

impl HasExtraProperties for Article {
    fn extra_properties(&self) -> &ExtraProperties {
        &self.extras
    }
    fn extra_properties_mut(&mut self) -> &mut ExtraProperties {
        &mut self.extras
    }
}

/// Fixture with no capabilities at all.
#[derive(Debug, Clone)]
pub struct Plain {
    pub id: Uuid,
}

impl Plain {
    pub fn new() -> Self {
        Self { id: Uuid::new_v4() }
    }
}

impl PersistentEntity for Plain {
    fn entity_id(&self) -> Uuid {
        self.id
    }
    fn entity_kind(&self) -> &'static str {
        "plain"
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
}
