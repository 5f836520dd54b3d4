//! Demonstration data bootstrap.
//!
//! # Responsibility
//! - Create the two demo roles and two demo users at process start.
//!
//! # Invariants
//! - Runs unconditionally: a second run against the same store adds a
//!   second copy of every record.
//! - Roles are saved before the users that reference them.

use crate::model::role::Role;
use crate::model::user::User;
use crate::repo::{CrudRepository, RepoResult};
use log::{error, info};
use std::time::Instant;

pub const ROLE_USER: &str = "ROLE_USER";
pub const ROLE_ADMIN: &str = "ROLE_ADMIN";

/// Records created by one `seed_demo_data` run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub role_user: Role,
    pub role_admin: Role,
    /// `john`, holding both roles.
    pub john: User,
    /// `tom`, holding `ROLE_USER` only.
    pub tom: User,
}

/// Seeds `ROLE_USER`, `ROLE_ADMIN`, `john` and `tom`.
///
/// # Side effects
/// - Four role/user saves through the given stores.
/// - Emits one `seed` event with duration and status.
pub fn seed_demo_data<U, R>(users: &U, roles: &R) -> RepoResult<SeedReport>
where
    U: CrudRepository<User>,
    R: CrudRepository<Role>,
{
    let started_at = Instant::now();
    info!("event=seed module=service status=start");

    match create_demo_records(users, roles) {
        Ok(report) => {
            info!(
                "event=seed module=service status=ok roles=2 users=2 duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(report)
        }
        Err(err) => {
            error!(
                "event=seed module=service status=error duration_ms={} error_code=seed_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn create_demo_records<U, R>(users: &U, roles: &R) -> RepoResult<SeedReport>
where
    U: CrudRepository<User>,
    R: CrudRepository<Role>,
{
    let role_user = roles.save(&Role::new(ROLE_USER))?;
    let role_admin = roles.save(&Role::new(ROLE_ADMIN))?;

    let john = users.save(
        &User::new("john", "john@test.com").with_roles([role_user.clone(), role_admin.clone()]),
    )?;
    let tom = users.save(&User::new("tom", "tom@test.com").with_roles([role_user.clone()]))?;

    Ok(SeedReport {
        role_user,
        role_admin,
        john,
        tom,
    })
}
