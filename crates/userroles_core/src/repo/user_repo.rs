//! SQLite-backed user store, including the user-to-role join rows.
//!
//! # Responsibility
//! - Persist account rows in `users`.
//! - Persist `User::roles` as `user_roles` rows, replaced as a whole on save.
//!
//! # Invariants
//! - Saving a user writes the account row and its full role set in one
//!   immediate transaction.
//! - A user may only reference roles that already exist in `roles`;
//!   anything else fails on the foreign key.
//! - Loaded role sets reflect `roles` at read time, so a deleted role
//!   disappears from every user.

use crate::model::role::Role;
use crate::model::user::{User, UserId};
use crate::repo::role_repo::parse_role_row;
use crate::repo::{
    ensure_connection_ready, parse_uuid, placeholders, CrudRepository, RepoError, RepoResult,
    ID_LOOKUP_CHUNK, ROLE_COLUMNS, USER_COLUMNS, USER_ROLE_COLUMNS,
};
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use std::collections::BTreeSet;

const USER_SELECT_SQL: &str = "SELECT id, username, email FROM users";

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[
                ("roles", ROLE_COLUMNS),
                ("users", USER_COLUMNS),
                ("user_roles", USER_ROLE_COLUMNS),
            ],
        )?;
        Ok(Self { conn })
    }

    /// Looks up users by exact username, oldest first.
    pub fn find_by_username(&self, username: &str) -> RepoResult<Vec<User>> {
        self.query_users(
            &format!("{USER_SELECT_SQL} WHERE username = ?1 ORDER BY created_at ASC, id ASC;"),
            vec![username.to_string()],
        )
    }

    fn query_users(&self, sql: &str, values: Vec<String>) -> RepoResult<Vec<User>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(values))?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            let mut user = parse_user_row(row)?;
            user.roles = load_roles_for_user(self.conn, user.id)?;
            users.push(user);
        }
        Ok(users)
    }
}

impl CrudRepository<User> for SqliteUserRepository<'_> {
    fn find_by_id(&self, id: UserId) -> RepoResult<Option<User>> {
        let users = self.query_users(
            &format!("{USER_SELECT_SQL} WHERE id = ?1;"),
            vec![id.to_string()],
        )?;
        Ok(users.into_iter().next())
    }

    fn find_all_by_id(&self, ids: &[UserId]) -> RepoResult<Vec<User>> {
        let unique: BTreeSet<UserId> = ids.iter().copied().collect();
        if unique.is_empty() {
            return Ok(Vec::new());
        }

        let unique: Vec<UserId> = unique.into_iter().collect();
        let mut users = Vec::with_capacity(unique.len().min(ID_LOOKUP_CHUNK));
        for chunk in unique.chunks(ID_LOOKUP_CHUNK) {
            let sql = format!("{USER_SELECT_SQL} WHERE id IN ({});", placeholders(chunk.len()));
            users.extend(self.query_users(&sql, chunk.iter().map(UserId::to_string).collect())?);
        }
        users.sort_by(|left, right| (&left.username, left.id).cmp(&(&right.username, right.id)));
        Ok(users)
    }

    fn find_all(&self) -> RepoResult<Vec<User>> {
        self.query_users(
            &format!("{USER_SELECT_SQL} ORDER BY username ASC, id ASC;"),
            Vec::new(),
        )
    }

    fn save(&self, user: &User) -> RepoResult<User> {
        user.validate()?;

        let user_id = user.id.to_string();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO users (id, username, email) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET
                username = excluded.username,
                email = excluded.email,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![user_id.as_str(), user.username.as_str(), user.email.as_str()],
        )?;
        tx.execute(
            "DELETE FROM user_roles WHERE user_id = ?1;",
            [user_id.as_str()],
        )?;
        for role in &user.roles {
            tx.execute(
                "INSERT INTO user_roles (user_id, role_id) VALUES (?1, ?2);",
                params![user_id.as_str(), role.id.to_string()],
            )?;
        }
        tx.commit()?;

        self.find_by_id(user.id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("saved user {} missing on read-back", user.id))
        })
    }

    fn delete_by_id(&self, id: UserId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM users WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::not_found::<User>(id));
        }
        Ok(())
    }

    fn count(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM users;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative user count {count}")))
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let id_text: String = row.get("id")?;
    let user = User::with_id(
        parse_uuid(&id_text, "users.id")?,
        row.get::<_, String>("username")?,
        row.get::<_, String>("email")?,
    );
    user.validate()?;
    Ok(user)
}

fn load_roles_for_user(conn: &Connection, user_id: UserId) -> RepoResult<BTreeSet<Role>> {
    let mut stmt = conn.prepare(
        "SELECT r.id AS id, r.name AS name
         FROM user_roles ur
         INNER JOIN roles r ON r.id = ur.role_id
         WHERE ur.user_id = ?1;",
    )?;
    let mut rows = stmt.query([user_id.to_string()])?;
    let mut roles = BTreeSet::new();
    while let Some(row) = rows.next()? {
        roles.insert(parse_role_row(row)?);
    }
    Ok(roles)
}
