//! The identity context supplying the acting user

/// Supplies the acting user id stamped into audit fields
///
/// The pipeline asks once per save cycle; an anonymous context returns
/// `None` and audit fields record no actor.
pub trait IdentityProvider: Send + Sync {
    /// The current acting user, if any
    fn current_actor_id(&self) -> Option<String>;
}

/// Identity context with a fixed acting user
#[derive(Debug, Clone)]
pub struct FixedIdentity {
    actor_id: String,
}

impl FixedIdentity {
    /// Create an identity context that always reports `actor_id`
    pub fn new(actor_id: impl Into<String>) -> Self {
        Self {
            actor_id: actor_id.into(),
        }
    }
}

impl IdentityProvider for FixedIdentity {
    fn current_actor_id(&self) -> Option<String> {
        Some(self.actor_id.clone())
    }
}

/// Identity context with no acting user
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl IdentityProvider for Anonymous {
    fn current_actor_id(&self) -> Option<String> {
        None
    }
}
