//! SQLite-backed role store.
//!
//! # Invariants
//! - Role names are validated before every write.
//! - Deleting a role detaches it from every user through the
//!   `user_roles` foreign key cascade; users themselves are untouched.

use crate::model::role::{Role, RoleId};
use crate::repo::{
    ensure_connection_ready, parse_uuid, placeholders, CrudRepository, RepoError, RepoResult,
    ID_LOOKUP_CHUNK, ROLE_COLUMNS,
};
use rusqlite::{params, params_from_iter, Connection, Row};
use std::collections::BTreeSet;

const ROLE_SELECT_SQL: &str = "SELECT id, name FROM roles";

/// SQLite-backed role repository.
pub struct SqliteRoleRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRoleRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[("roles", ROLE_COLUMNS)])?;
        Ok(Self { conn })
    }

    /// Looks up roles by exact name, oldest first.
    pub fn find_by_name(&self, name: &str) -> RepoResult<Vec<Role>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ROLE_SELECT_SQL} WHERE name = ?1 ORDER BY created_at ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([name])?;
        let mut roles = Vec::new();
        while let Some(row) = rows.next()? {
            roles.push(parse_role_row(row)?);
        }
        Ok(roles)
    }

    fn query_roles(&self, sql: &str, values: Vec<String>) -> RepoResult<Vec<Role>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(values))?;
        let mut roles = Vec::new();
        while let Some(row) = rows.next()? {
            roles.push(parse_role_row(row)?);
        }
        Ok(roles)
    }
}

impl CrudRepository<Role> for SqliteRoleRepository<'_> {
    fn find_by_id(&self, id: RoleId) -> RepoResult<Option<Role>> {
        let roles = self.query_roles(
            &format!("{ROLE_SELECT_SQL} WHERE id = ?1;"),
            vec![id.to_string()],
        )?;
        Ok(roles.into_iter().next())
    }

    fn find_all_by_id(&self, ids: &[RoleId]) -> RepoResult<Vec<Role>> {
        let unique: BTreeSet<RoleId> = ids.iter().copied().collect();
        if unique.is_empty() {
            return Ok(Vec::new());
        }

        let unique: Vec<RoleId> = unique.into_iter().collect();
        let mut roles = Vec::with_capacity(unique.len().min(ID_LOOKUP_CHUNK));
        for chunk in unique.chunks(ID_LOOKUP_CHUNK) {
            let sql = format!("{ROLE_SELECT_SQL} WHERE id IN ({});", placeholders(chunk.len()));
            roles.extend(self.query_roles(&sql, chunk.iter().map(RoleId::to_string).collect())?);
        }
        roles.sort_by(|left, right| (&left.name, left.id).cmp(&(&right.name, right.id)));
        Ok(roles)
    }

    fn find_all(&self) -> RepoResult<Vec<Role>> {
        self.query_roles(
            &format!("{ROLE_SELECT_SQL} ORDER BY name ASC, id ASC;"),
            Vec::new(),
        )
    }

    fn save(&self, role: &Role) -> RepoResult<Role> {
        role.validate()?;

        self.conn.execute(
            "INSERT INTO roles (id, name) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET name = excluded.name;",
            params![role.id.to_string(), role.name.as_str()],
        )?;

        self.find_by_id(role.id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("saved role {} missing on read-back", role.id))
        })
    }

    fn delete_by_id(&self, id: RoleId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM roles WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::not_found::<Role>(id));
        }
        Ok(())
    }

    fn count(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM roles;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative role count {count}")))
    }
}

pub(crate) fn parse_role_row(row: &Row<'_>) -> RepoResult<Role> {
    let id_text: String = row.get("id")?;
    let role = Role {
        id: parse_uuid(&id_text, "roles.id")?,
        name: row.get("name")?,
    };
    role.validate()?;
    Ok(role)
}
