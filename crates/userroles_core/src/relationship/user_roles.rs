//! `users.roles` relationship adapter.
//!
//! # Responsibility
//! - Serve the many-to-many `roles` field of a user over generic user and
//!   role stores.
//!
//! # Invariants
//! - Mutations on an unknown user fail with `RepoError::NotFound`.
//! - Role ids are resolved through `find_all_by_id`; unknown ids vanish.
//! - Reads on an unknown user return an empty list.
//! - Resolve and save are separate store calls; a concurrent writer between
//!   them is overwritten (last write wins).

use crate::model::role::{Role, RoleId};
use crate::model::user::{User, UserId};
use crate::query::{QuerySpec, ResourceList};
use crate::relationship::{RelationArity, RelationshipRepository};
use crate::repo::{CrudRepository, RepoResult};
use log::{error, info};
use std::collections::BTreeSet;
use std::time::Instant;

/// Relation field name on the user resource.
pub const ROLES_FIELD: &str = "roles";

#[derive(Debug, Clone, Copy)]
enum RoleSetChange {
    Replace,
    Add,
    Remove,
}

impl RoleSetChange {
    fn event(self) -> &'static str {
        match self {
            Self::Replace => "relation_set",
            Self::Add => "relation_add",
            Self::Remove => "relation_remove",
        }
    }

    fn apply(self, current: &mut BTreeSet<Role>, resolved: Vec<Role>) {
        match self {
            Self::Replace => *current = resolved.into_iter().collect(),
            Self::Add => current.extend(resolved),
            Self::Remove => {
                let resolved: BTreeSet<Role> = resolved.into_iter().collect();
                current.retain(|role| !resolved.contains(role));
            }
        }
    }
}

/// Relationship repository for `User -> roles -> Role`.
pub struct UserToRoleRelationshipRepository<U, R> {
    users: U,
    roles: R,
}

impl<U, R> UserToRoleRelationshipRepository<U, R>
where
    U: CrudRepository<User>,
    R: CrudRepository<Role>,
{
    pub fn new(users: U, roles: R) -> Self {
        Self { users, roles }
    }

    fn change_roles(
        &self,
        change: RoleSetChange,
        user_id: UserId,
        role_ids: &[RoleId],
        field_name: &str,
    ) -> RepoResult<()> {
        let started_at = Instant::now();
        match self.apply_change(change, user_id, role_ids) {
            Ok((resolved, role_count)) => {
                info!(
                    "event={} module=relationship status=ok user_id={} field={} requested={} resolved={} role_count={} duration_ms={}",
                    change.event(),
                    user_id,
                    field_name,
                    role_ids.len(),
                    resolved,
                    role_count,
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event={} module=relationship status=error user_id={} field={} requested={} duration_ms={} error_code={} error={}",
                    change.event(),
                    user_id,
                    field_name,
                    role_ids.len(),
                    started_at.elapsed().as_millis(),
                    if err.is_not_found() { "user_not_found" } else { "store_failed" },
                    err
                );
                Err(err)
            }
        }
    }

    fn apply_change(
        &self,
        change: RoleSetChange,
        user_id: UserId,
        role_ids: &[RoleId],
    ) -> RepoResult<(usize, usize)> {
        let mut user = self.users.get_by_id(user_id)?;
        let resolved = self.roles.find_all_by_id(role_ids)?;
        let resolved_count = resolved.len();

        change.apply(&mut user.roles, resolved);
        let saved = self.users.save(&user)?;
        Ok((resolved_count, saved.roles.len()))
    }
}

impl<U, R> RelationshipRepository for UserToRoleRelationshipRepository<U, R>
where
    U: CrudRepository<User>,
    R: CrudRepository<Role>,
{
    type Source = User;
    type Target = Role;

    const ARITY: RelationArity = RelationArity::ToMany;

    fn field_name(&self) -> &'static str {
        ROLES_FIELD
    }

    fn set_relations(
        &self,
        user_id: UserId,
        role_ids: &[RoleId],
        field_name: &str,
    ) -> RepoResult<()> {
        self.change_roles(RoleSetChange::Replace, user_id, role_ids, field_name)
    }

    fn add_relations(
        &self,
        user_id: UserId,
        role_ids: &[RoleId],
        field_name: &str,
    ) -> RepoResult<()> {
        self.change_roles(RoleSetChange::Add, user_id, role_ids, field_name)
    }

    fn remove_relations(
        &self,
        user_id: UserId,
        role_ids: &[RoleId],
        field_name: &str,
    ) -> RepoResult<()> {
        self.change_roles(RoleSetChange::Remove, user_id, role_ids, field_name)
    }

    fn find_many_targets(
        &self,
        user_id: UserId,
        field_name: &str,
        query: &QuerySpec,
    ) -> RepoResult<ResourceList<Role>> {
        let roles = match self.users.find_by_id(user_id)? {
            Some(user) => user.roles,
            None => {
                info!(
                    "event=relation_read module=relationship status=ok user_id={} field={} user_found=false",
                    user_id, field_name
                );
                return Ok(ResourceList::empty());
            }
        };

        let list = query.apply(roles);
        info!(
            "event=relation_read module=relationship status=ok user_id={} field={} user_found=true total={} returned={}",
            user_id,
            field_name,
            list.total,
            list.len()
        );
        Ok(list)
    }
}
