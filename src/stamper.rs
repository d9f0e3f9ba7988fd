// Copyright 2025 Cowboy AI, LLC.

//! Audit stamping for one save cycle
//!
//! The stamper applies creation/modification timestamps and actor ids and
//! rotates concurrency tokens. One stamper instance lives for exactly one
//! save cycle; it tracks which identities it has touched so that no entity
//! is stamped twice within the cycle.

use crate::capabilities::new_concurrency_stamp;
use crate::entity::PersistentEntity;
use chrono::Utc;
use std::collections::HashSet;
use tracing::trace;
use uuid::Uuid;

/// Applies audit metadata to classified entities
#[derive(Debug, Default)]
pub struct AuditStamper {
    stamped: HashSet<Uuid>,
    rotated: HashSet<Uuid>,
}

impl AuditStamper {
    /// Create a stamper for a new save cycle
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp a newly added entity's creation audit
    ///
    /// Applicable only if the entity implements creation audit. The creation
    /// time is set to now unless the caller already set one; the creator id
    /// is always recorded. Applied at Added classification only, never
    /// re-applied on update.
    pub fn stamp_created(&mut self, entity: &mut dyn PersistentEntity, actor: Option<&str>) {
        if !self.stamped.insert(entity.entity_id()) {
            return;
        }
        if let Some(audit) = entity.creation_audit_mut() {
            if audit.creation_time().is_none() {
                audit.set_creation_time(Utc::now());
            }
            audit.set_creator_id(actor.map(str::to_string));
            trace!(entity_id = %entity.entity_id(), "stamped creation audit");
        }
    }

    /// Stamp a modified entity's modification audit
    ///
    /// Applicable only if the entity implements modification audit. The
    /// modification time and modifier id are overwritten on every Modified
    /// classification.
    pub fn stamp_modified(&mut self, entity: &mut dyn PersistentEntity, actor: Option<&str>) {
        if !self.stamped.insert(entity.entity_id()) {
            return;
        }
        if let Some(audit) = entity.modification_audit_mut() {
            audit.set_last_modification_time(Utc::now());
            audit.set_last_modifier_id(actor.map(str::to_string));
            trace!(entity_id = %entity.entity_id(), "stamped modification audit");
        }
    }

    /// Rotate a concurrency-tracked entity's token
    ///
    /// Generates a fresh opaque token on every Modified classification. The
    /// token the entity carried when it entered the change set remains the
    /// commit-time expectation; the store compares it against the stored
    /// value and surfaces a mismatch as a
    /// [`ConcurrencyConflict`](crate::PersistenceError::ConcurrencyConflict).
    pub fn rotate_concurrency_token(&mut self, entity: &mut dyn PersistentEntity) {
        if !self.rotated.insert(entity.entity_id()) {
            return;
        }
        if let Some(tracked) = entity.concurrency_mut() {
            tracked.set_concurrency_stamp(new_concurrency_stamp());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::{ConcurrencyTracked, CreationAudited, ModificationAudited};
    use crate::test_support::Article;
    use chrono::{Duration, Utc};

    #[test]
    fn creation_time_set_once_creator_recorded() {
        let mut stamper = AuditStamper::new();
        let mut article = Article::new("draft");

        stamper.stamp_created(&mut article, Some("user-1"));
        let first = article.creation_time().unwrap();
        assert_eq!(article.creator_id(), Some("user-1"));

        // Second attempt within the same cycle is a no-op.
        stamper.stamp_created(&mut article, Some("user-2"));
        assert_eq!(article.creation_time(), Some(first));
        assert_eq!(article.creator_id(), Some("user-1"));
    }

    #[test]
    fn preset_creation_time_is_respected() {
        let mut stamper = AuditStamper::new();
        let mut article = Article::new("imported");
        let preset = Utc::now() - Duration::days(30);
        article.creation.creation_time = Some(preset);

        stamper.stamp_created(&mut article, None);
        assert_eq!(article.creation_time(), Some(preset));
        assert_eq!(article.creator_id(), None);
    }

    #[test]
    fn modification_audit_overwrites() {
        let mut article = Article::new("v1");

        let mut first_cycle = AuditStamper::new();
        first_cycle.stamp_modified(&mut article, Some("alice"));
        let first = article.last_modification_time().unwrap();

        std::thread::sleep(std::time::Duration::from_millis(2));

        let mut second_cycle = AuditStamper::new();
        second_cycle.stamp_modified(&mut article, Some("bob"));
        let second = article.last_modification_time().unwrap();

        assert!(second > first);
        assert_eq!(article.last_modifier_id(), Some("bob"));
    }

    #[test]
    fn token_rotates_once_per_cycle() {
        let mut stamper = AuditStamper::new();
        let mut article = Article::new("tracked");
        let original = article.concurrency_stamp().to_string();

        stamper.rotate_concurrency_token(&mut article);
        let rotated = article.concurrency_stamp().to_string();
        assert_ne!(rotated, original);

        stamper.rotate_concurrency_token(&mut article);
        assert_eq!(article.concurrency_stamp(), rotated);
    }

    #[test]
    fn stamping_ignores_missing_capabilities() {
        let mut stamper = AuditStamper::new();
        let mut plain = crate::test_support::Plain::new();

        // Nothing to stamp; must not panic or record anything.
        stamper.stamp_created(&mut plain, Some("user"));
        stamper.stamp_modified(&mut plain, Some("user"));
        stamper.rotate_concurrency_token(&mut plain);
    }
}
