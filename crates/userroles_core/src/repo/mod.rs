//! Generic persistence contract and its SQLite implementations.
//!
//! # Responsibility
//! - Define the CRUD contract the relationship adapter and seeding use.
//! - Keep SQL details behind per-entity repositories.
//!
//! # Invariants
//! - Writes validate the model before touching storage.
//! - `find_all_by_id` silently omits ids that do not resolve and binds at
//!   most `ID_LOOKUP_CHUNK` ids per statement.
//! - Lookups by one id return `Option`; `get_by_id` turns absence into
//!   `RepoError::NotFound`.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::{Entity, ModelValidationError};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod role_repo;
pub mod user_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by every entity store.
#[derive(Debug)]
pub enum RepoError {
    /// Model failed field validation before a write.
    Validation(ModelValidationError),
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Requested record does not exist.
    NotFound { resource: &'static str, id: String },
    /// Persisted data cannot be decoded into a valid model.
    InvalidData(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl RepoError {
    pub fn not_found<E: Entity>(id: E::Id) -> Self {
        Self::NotFound {
            resource: E::RESOURCE_TYPE,
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { resource, id } => write!(f, "{resource} not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "repository requires column `{column}` in table `{table}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ModelValidationError> for RepoError {
    fn from(value: ModelValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Generic create/read/update/delete contract for one entity type.
pub trait CrudRepository<E: Entity> {
    /// Loads one entity, `None` when absent.
    fn find_by_id(&self, id: E::Id) -> RepoResult<Option<E>>;

    /// Loads one entity, failing with `NotFound` when absent.
    fn get_by_id(&self, id: E::Id) -> RepoResult<E> {
        self.find_by_id(id)?
            .ok_or_else(|| RepoError::not_found::<E>(id))
    }

    /// Loads every entity whose id resolves. Unknown and repeated ids are
    /// skipped, so the result holds each entity at most once.
    fn find_all_by_id(&self, ids: &[E::Id]) -> RepoResult<Vec<E>>;

    /// Loads every entity in a deterministic order.
    fn find_all(&self) -> RepoResult<Vec<E>>;

    /// Inserts or updates by id and returns the persisted state.
    fn save(&self, entity: &E) -> RepoResult<E>;

    /// Deletes one entity, failing with `NotFound` when absent.
    fn delete_by_id(&self, id: E::Id) -> RepoResult<()>;

    fn count(&self) -> RepoResult<u64>;
}

impl<E, R> CrudRepository<E> for &R
where
    E: Entity,
    R: CrudRepository<E> + ?Sized,
{
    fn find_by_id(&self, id: E::Id) -> RepoResult<Option<E>> {
        (**self).find_by_id(id)
    }

    fn get_by_id(&self, id: E::Id) -> RepoResult<E> {
        (**self).get_by_id(id)
    }

    fn find_all_by_id(&self, ids: &[E::Id]) -> RepoResult<Vec<E>> {
        (**self).find_all_by_id(ids)
    }

    fn find_all(&self) -> RepoResult<Vec<E>> {
        (**self).find_all()
    }

    fn save(&self, entity: &E) -> RepoResult<E> {
        (**self).save(entity)
    }

    fn delete_by_id(&self, id: E::Id) -> RepoResult<()> {
        (**self).delete_by_id(id)
    }

    fn count(&self) -> RepoResult<u64> {
        (**self).count()
    }
}

pub(crate) fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

/// Upper bound on ids bound into one `IN (...)` lookup. SQLite rejects
/// statements with more than 32766 variables.
pub(crate) const ID_LOOKUP_CHUNK: usize = 500;

/// `?1, ?2, ...` placeholder list for an `IN (...)` clause.
pub(crate) fn placeholders(count: usize) -> String {
    (1..=count)
        .map(|index| format!("?{index}"))
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) const ROLE_COLUMNS: &[&str] = &["id", "name", "created_at"];
pub(crate) const USER_COLUMNS: &[&str] = &["id", "username", "email", "created_at", "updated_at"];
pub(crate) const USER_ROLE_COLUMNS: &[&str] = &["user_id", "role_id"];

pub(crate) fn ensure_connection_ready(
    conn: &Connection,
    required: &[(&'static str, &[&'static str])],
) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for &(table, columns) in required {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(RepoError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::placeholders;

    #[test]
    fn placeholders_are_numbered_from_one() {
        assert_eq!(placeholders(3), "?1, ?2, ?3");
        assert_eq!(placeholders(0), "");
    }
}
