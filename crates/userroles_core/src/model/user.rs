//! User account model.
//!
//! # Responsibility
//! - Hold account identity plus the set of roles granted to it.
//!
//! # Invariants
//! - `roles` is unique by role id; insertion order carries no meaning.
//! - An empty role set is valid.

use crate::model::role::{Role, RoleId};
use crate::model::{require_non_blank, Entity, ModelValidationError};
use crate::query::Queryable;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+$").expect("valid email regex"));

pub type UserId = Uuid;

/// Account holding a set of role references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub roles: BTreeSet<Role>,
}

impl User {
    /// Creates a user with a generated id and no roles.
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), username, email)
    }

    /// Creates a user with a caller-provided id and no roles.
    pub fn with_id(id: UserId, username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            email: email.into(),
            roles: BTreeSet::new(),
        }
    }

    /// Builder-style helper used by seeding and tests.
    pub fn with_roles(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.roles = roles.into_iter().collect();
        self
    }

    /// Returns whether a role with `role_id` is attached.
    pub fn has_role(&self, role_id: RoleId) -> bool {
        self.roles.iter().any(|role| role.id == role_id)
    }

    /// Role names sorted alphabetically.
    pub fn role_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.roles.iter().map(|role| role.name.clone()).collect();
        names.sort();
        names
    }

    /// Checks account fields. Attached roles are validated by the role store.
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_non_blank(Self::RESOURCE_TYPE, "username", &self.username)?;
        require_non_blank(Self::RESOURCE_TYPE, "email", &self.email)?;
        if !EMAIL_RE.is_match(self.email.trim()) {
            return Err(ModelValidationError::InvalidEmail(self.email.clone()));
        }
        Ok(())
    }
}

impl Entity for User {
    type Id = UserId;
    const RESOURCE_TYPE: &'static str = "users";

    fn id(&self) -> UserId {
        self.id
    }
}

impl Queryable for User {
    fn attribute(&self, name: &str) -> Option<String> {
        match name {
            "id" => Some(self.id.to_string()),
            "username" => Some(self.username.clone()),
            "email" => Some(self.email.clone()),
            _ => None,
        }
    }
}
