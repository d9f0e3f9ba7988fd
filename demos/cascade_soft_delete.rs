// Copyright 2025 Cowboy AI, LLC.

//! Cascade Soft Delete Example
//!
//! Declares a project/task relationship with cascade delete, soft-deletes
//! the project, and shows every task going down with it. Rows stay in the
//! store but carry deletion stamps and disappear from filtered reads.
//!
//! Run with: cargo run --example cascade_soft_delete

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain_persistence::{
    ChangeSet, ConcurrencyStamp, ConcurrencyTracked, DeletionAudit, FixedIdentity, InMemoryStore,
    ModificationAudit, ModificationAudited, NavigationDescriptor, PersistenceResult,
    PersistentEntity, QueryExecutor, RecordingDispatcher, RelationshipRegistry, SavePipeline,
    SoftDeletable,
};
use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

#[derive(Debug, Clone)]
struct Project {
    id: Uuid,
    name: String,
    modification: ModificationAudit,
    deletion: DeletionAudit,
    stamp: ConcurrencyStamp,
}

#[derive(Debug, Clone)]
struct Task {
    id: Uuid,
    project_id: Uuid,
    summary: String,
    modification: ModificationAudit,
    deletion: DeletionAudit,
    stamp: ConcurrencyStamp,
}

macro_rules! deletable_entity {
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
    };
}

deletable_entity!(Project, "project");
deletable_entity!(Task, "task");

/// Lazy-load executor over an explicit id-link table
#[derive(Default)]
struct LinkedLoader {
    entities: RwLock<HashMap<Uuid, Box<dyn PersistentEntity>>>,
    links: RwLock<HashMap<(Uuid, String), Vec<Uuid>>>,
}

impl LinkedLoader {
    fn insert(&self, entity: Box<dyn PersistentEntity>) {
        self.entities
            .write()
            .unwrap()
            .insert(entity.entity_id(), entity);
    }

    fn link(&self, source: Uuid, navigation: &str, target: Uuid) {
        self.links
            .write()
            .unwrap()
            .entry((source, navigation.to_string()))
            .or_default()
            .push(target);
    }
}

#[async_trait]
impl QueryExecutor for LinkedLoader {
    async fn load_related(
        &self,
        entity: &dyn PersistentEntity,
        navigation: &NavigationDescriptor,
    ) -> PersistenceResult<Vec<Box<dyn PersistentEntity>>> {
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

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Cascade Soft Delete Example ===\n");

    let registry = RelationshipRegistry::builder()
        .navigation(
            "project",
            NavigationDescriptor::collection("tasks", "task").cascade(),
        )
        .build();

    let store = Arc::new(InMemoryStore::new());
    let loader = Arc::new(LinkedLoader::default());
    let pipeline = SavePipeline::builder()
        .store(store.clone())
        .metadata(Arc::new(registry))
        .queries(loader.clone())
        .dispatcher(Arc::new(RecordingDispatcher::new()))
        .identity(Arc::new(FixedIdentity::new("project-admin")))
        .build()?;

    // Seed a project with three tasks.
    let project = Project {
        id: Uuid::new_v4(),
        name: "Decommission legacy importer".to_string(),
        modification: ModificationAudit::default(),
        deletion: DeletionAudit::default(),
        stamp: ConcurrencyStamp::default(),
    };
    let tasks: Vec<Task> = ["inventory jobs", "port schedules", "archive outputs"]
        .iter()
        .map(|summary| Task {
            id: Uuid::new_v4(),
            project_id: project.id,
            summary: summary.to_string(),
            modification: ModificationAudit::default(),
            deletion: DeletionAudit::default(),
            stamp: ConcurrencyStamp::default(),
        })
        .collect();

    store.put_raw(project.clone_entity());
    loader.insert(project.clone_entity());
    for task in &tasks {
        store.put_raw(task.clone_entity());
        loader.insert(task.clone_entity());
        loader.link(project.id, "tasks", task.id);
    }
    println!(
        "Seeded project '{}' with {} task(s)\n",
        project.name,
        tasks.len()
    );

    // One delete request takes the whole graph down softly.
    let mut changes = ChangeSet::new();
    changes.request_delete(Box::new(project.clone()), false);
    let report = pipeline.save(&mut changes).await?;
    println!("Save committed {} mutation(s)\n", report.committed);

    for id in std::iter::once(project.id).chain(tasks.iter().map(|t| t.id)) {
        let row = store.snapshot(id).unwrap();
        let soft = row.as_ref().soft_delete().unwrap();
        println!(
            "  {:>8} {} deleted={} at={:?} by={:?}",
            row.entity_kind(),
            id,
            soft.is_deleted(),
            soft.deletion_time(),
            soft.deleter_id()
        );
    }

    Ok(())
}
