//! Core of the user/role demo service.
//!
//! Owns storage bootstrap, the role and user stores, the `users.roles`
//! relationship adapter and demo data seeding.

pub mod db;
pub mod logging;
pub mod model;
pub mod query;
pub mod relationship;
pub mod repo;
pub mod service;

pub use logging::{
    default_log_level, init_logging, logging_status, normalize_level, normalize_log_dir,
};
pub use model::role::{Role, RoleId};
pub use model::user::{User, UserId};
pub use model::{Entity, ModelValidationError};
pub use query::{
    FilterOperator, FilterSpec, QuerySpec, Queryable, ResourceList, SortDirection, SortSpec,
};
pub use relationship::user_roles::{UserToRoleRelationshipRepository, ROLES_FIELD};
pub use relationship::{RelationArity, RelationshipRepository};
pub use repo::role_repo::SqliteRoleRepository;
pub use repo::user_repo::SqliteUserRepository;
pub use repo::{CrudRepository, RepoError, RepoResult};
pub use service::seed::{seed_demo_data, SeedReport, ROLE_ADMIN, ROLE_USER};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
