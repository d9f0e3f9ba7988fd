// Copyright 2025 Cowboy AI, LLC.

//! Shared fixtures for the integration suite: a small blog domain with
//! authors, posts, comments, and one-to-one profiles, plus an in-memory
//! graph-backed query executor for the cascade walk.

#![allow(dead_code)]

use async_trait::async_trait;
use domain_persistence::{
    ConcurrencyStamp, ConcurrencyTracked, CreationAudit, CreationAudited, DeletionAudit,
    EventBuffer, EventSource, ModificationAudit, ModificationAudited, NavigationDescriptor,
    PersistenceError, PersistenceResult, PersistentEntity, QueryExecutor, RelationshipRegistry,
    SoftDeletable,
};
use chrono::{DateTime, Utc};
use std::any::Any;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

/// Implements [`PersistentEntity`] plus the full capability set for a fixture
/// struct carrying the standard field block names.
macro_rules! full_capabilities {
    ($ty:ty, $kind:literal) => {
        impl PersistentEntity for $ty {
            fn entity_id(&self) -> Uuid {
                self.id
            }
            fn entity_kind(&self) -> &'static str {
                $kind
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

        impl CreationAudited for $ty {
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

        impl ModificationAudited for $ty {
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

        impl SoftDeletable for $ty {
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

        impl ConcurrencyTracked for $ty {
            fn concurrency_stamp(&self) -> &str {
                &self.stamp.value
            }
            fn set_concurrency_stamp(&mut self, stamp: String) {
                self.stamp.value = stamp;
            }
        }

        impl EventSource for $ty {
            fn event_buffer(&self) -> &EventBuffer {
                &self.events
            }
            fn event_buffer_mut(&mut self) -> &mut EventBuffer {
                &mut self.events
            }
        }
    };
}

#[derive(Debug, Clone)]
pub struct Author {
    pub id: Uuid,
    pub name: String,
    pub creation: CreationAudit,
    pub modification: ModificationAudit,
    pub deletion: DeletionAudit,
    pub stamp: ConcurrencyStamp,
    pub events: EventBuffer,
}

impl Author {
    pub fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            creation: CreationAudit::default(),
            modification: ModificationAudit::default(),
            deletion: DeletionAudit::default(),
            stamp: ConcurrencyStamp::default(),
            events: EventBuffer::default(),
        }
    }
}

full_capabilities!(Author, "author");

#[derive(Debug, Clone)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub creation: CreationAudit,
    pub modification: ModificationAudit,
    pub deletion: DeletionAudit,
    pub stamp: ConcurrencyStamp,
    pub events: EventBuffer,
}

impl Post {
    pub fn new(author_id: Uuid, title: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            author_id,
            title: title.to_string(),
            creation: CreationAudit::default(),
            modification: ModificationAudit::default(),
            deletion: DeletionAudit::default(),
            stamp: ConcurrencyStamp::default(),
            events: EventBuffer::default(),
        }
    }
}

full_capabilities!(Post, "post");

#[derive(Debug, Clone)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub body: String,
    pub creation: CreationAudit,
    pub modification: ModificationAudit,
    pub deletion: DeletionAudit,
    pub stamp: ConcurrencyStamp,
    pub events: EventBuffer,
}

impl Comment {
    pub fn new(post_id: Uuid, body: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            post_id,
            body: body.to_string(),
            creation: CreationAudit::default(),
            modification: ModificationAudit::default(),
            deletion: DeletionAudit::default(),
            stamp: ConcurrencyStamp::default(),
            events: EventBuffer::default(),
        }
    }
}

full_capabilities!(Comment, "comment");

/// Participates only in a required one-to-one with its author; the cascade
/// walk must refuse to soft-delete it.
#[derive(Debug, Clone)]
pub struct Profile {
    pub id: Uuid,
    pub author_id: Uuid,
    pub bio: String,
    pub creation: CreationAudit,
    pub modification: ModificationAudit,
    pub deletion: DeletionAudit,
    pub stamp: ConcurrencyStamp,
    pub events: EventBuffer,
}

impl Profile {
    pub fn new(author_id: Uuid, bio: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            author_id,
            bio: bio.to_string(),
            creation: CreationAudit::default(),
            modification: ModificationAudit::default(),
            deletion: DeletionAudit::default(),
            stamp: ConcurrencyStamp::default(),
            events: EventBuffer::default(),
        }
    }
}

full_capabilities!(Profile, "profile");

/// The blog domain's relationship table
///
/// Authors cascade to their posts and their profile; posts cascade to
/// comments and to related posts (which lets tests build cycles). The
/// profile side is exclusively to-one in both directions.
pub fn blog_registry() -> RelationshipRegistry {
    RelationshipRegistry::builder()
        .navigation(
            "author",
            NavigationDescriptor::collection("posts", "post").cascade(),
        )
        .navigation(
            "author",
            NavigationDescriptor::reference("profile", "profile").cascade(),
        )
        .navigation(
            "post",
            NavigationDescriptor::collection("comments", "comment").cascade(),
        )
        .navigation(
            "post",
            NavigationDescriptor::collection("related", "post").cascade(),
        )
        .navigation("profile", NavigationDescriptor::reference("owner", "author"))
        .build()
}

/// Lazy-load executor over an explicit link graph
///
/// Rows marked deleted are filtered out of every load, matching the query
/// filter a real store would apply.
#[derive(Default)]
pub struct GraphQueryExecutor {
    entities: RwLock<HashMap<Uuid, Box<dyn PersistentEntity>>>,
    links: RwLock<HashMap<(Uuid, String), Vec<Uuid>>>,
    fail_navigation: Option<String>,
}

impl GraphQueryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// An executor that fails every load of the named navigation
    pub fn failing_on(navigation: &str) -> Self {
        Self {
            fail_navigation: Some(navigation.to_string()),
            ..Self::default()
        }
    }

    pub fn insert(&self, entity: Box<dyn PersistentEntity>) {
        self.entities
            .write()
            .unwrap()
            .insert(entity.entity_id(), entity);
    }

    pub fn link(&self, source: Uuid, navigation: &str, target: Uuid) {
        self.links
            .write()
            .unwrap()
            .entry((source, navigation.to_string()))
            .or_default()
            .push(target);
    }
}

#[async_trait]
impl QueryExecutor for GraphQueryExecutor {
    async fn load_related(
        &self,
        entity: &dyn PersistentEntity,
        navigation: &NavigationDescriptor,
    ) -> PersistenceResult<Vec<Box<dyn PersistentEntity>>> {
        if self.fail_navigation.as_deref() == Some(navigation.name.as_str()) {
            return Err(PersistenceError::RelationshipLoadFailure {
                entity_kind: entity.entity_kind().to_string(),
                navigation: navigation.name.clone(),
                reason: "simulated load failure".to_string(),
            });
        }
        let ids = self
            .links
            .read()
            .unwrap()
            .get(&(entity.entity_id(), navigation.name.clone()))
            .cloned()
            .unwrap_or_default();
        let entities = self.entities.read().unwrap();
        Ok(ids
            .iter()
            .filter_map(|id| entities.get(id))
            .filter(|row| !row.as_ref().is_soft_deleted())
            .map(|row| row.clone_entity())
            .collect())
    }
}
