//! Role model.
//!
//! # Invariants
//! - Equality, ordering and hashing use `id` only, so a role set is unique
//!   by identity even if two copies carry different names.
//! - `name` is never blank once persisted.

use crate::model::{require_non_blank, Entity, ModelValidationError};
use crate::query::Queryable;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use uuid::Uuid;

pub type RoleId = Uuid;

/// Named permission group attachable to users.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    /// Authority name, e.g. `ROLE_ADMIN`.
    pub name: String,
}

impl Role {
    /// Creates a role with a freshly generated id.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), name)
    }

    /// Creates a role with a caller-provided id.
    pub fn with_id(id: RoleId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_non_blank(Self::RESOURCE_TYPE, "name", &self.name)
    }
}

impl Entity for Role {
    type Id = RoleId;
    const RESOURCE_TYPE: &'static str = "roles";

    fn id(&self) -> RoleId {
        self.id
    }
}

impl Queryable for Role {
    fn attribute(&self, name: &str) -> Option<String> {
        match name {
            "id" => Some(self.id.to_string()),
            "name" => Some(self.name.clone()),
            _ => None,
        }
    }
}

impl PartialEq for Role {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Role {}

impl Hash for Role {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for Role {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Role {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}
