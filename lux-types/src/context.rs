use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity resolved from request credentials, passed explicitly into
/// every handler that needs one. Handlers never reach back into headers
/// or session storage once this exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthContext {
    pub actor: Actor,
}

/// Who is making the request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Actor {
    /// A company authenticated through a session token
    Company { id: Uuid, name: String },
    /// The operator, authenticated through the configured admin token
    Admin,
}

impl AuthContext {
    /// Context for a session-authenticated company
    pub fn company(id: Uuid, name: String) -> Self {
        Self {
            actor: Actor::Company { id, name },
        }
    }

    /// Context for the configured admin token
    pub fn admin() -> Self {
        Self {
            actor: Actor::Admin,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self.actor, Actor::Admin)
    }

    /// The acting company's id, if the actor is a company
    pub fn company_id(&self) -> Option<Uuid> {
        match &self.actor {
            Actor::Company { id, .. } => Some(*id),
            Actor::Admin => None,
        }
    }

    /// The acting company's name, if the actor is a company
    pub fn company_name(&self) -> Option<&str> {
        match &self.actor {
            Actor::Company { name, .. } => Some(name),
            Actor::Admin => None,
        }
    }

    /// Whether this actor may modify a resource owned by `owner_id`.
    /// Admins may modify anything, companies only their own rows.
    pub fn can_modify(&self, owner_id: &Uuid) -> bool {
        match &self.actor {
            Actor::Admin => true,
            Actor::Company { id, .. } => id == owner_id,
        }
    }
}
