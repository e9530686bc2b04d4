//! Group persistence with get-or-create resolution

use async_trait::async_trait;
use songlib_common::uuid_utils::parse_stored;
use songlib_common::{Error, Group, Result};
use sqlx::{Row, SqliteConnection};
use tracing::debug;

#[async_trait]
pub trait GroupStore: Send + Sync {
    async fn exists(&self, conn: &mut SqliteConnection, name: &str) -> Result<bool>;

    async fn find_by_name(&self, conn: &mut SqliteConnection, name: &str) -> Result<Option<Group>>;

    /// Insert `group`; returns false when another group with the same name
    /// already holds the UNIQUE slot
    async fn insert(&self, conn: &mut SqliteConnection, group: &Group) -> Result<bool>;

    /// Get-or-create by name
    ///
    /// Always re-reads the stored row, so a caller that lost an insert race
    /// still receives the winner's id.
    async fn resolve(&self, conn: &mut SqliteConnection, name: &str) -> Result<Group> {
        if !self.exists(conn, name).await? {
            let group = Group::new(name);
            if self.insert(conn, &group).await? {
                debug!(group_id = %group.id, group_name = %name, "Created group");
            } else {
                debug!(group_name = %name, "Group created concurrently, re-fetching");
            }
        }

        self.find_by_name(conn, name)
            .await?
            .ok_or_else(|| Error::Internal(format!("group '{}' missing after get-or-create", name)))
    }
}

/// SQLite-backed group store
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteGroupStore;

#[async_trait]
impl GroupStore for SqliteGroupStore {
    async fn exists(&self, conn: &mut SqliteConnection, name: &str) -> Result<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM groups WHERE name = ?")
            .bind(name)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(found.is_some())
    }

    async fn find_by_name(&self, conn: &mut SqliteConnection, name: &str) -> Result<Option<Group>> {
        let row = sqlx::query("SELECT id, name FROM groups WHERE name = ?")
            .bind(name)
            .fetch_optional(&mut *conn)
            .await?;

        match row {
            Some(row) => {
                let id: String = row.try_get("id")?;
                Ok(Some(Group {
                    id: parse_stored("groups.id", &id)?,
                    name: row.try_get("name")?,
                }))
            }
            None => Ok(None),
        }
    }

    async fn insert(&self, conn: &mut SqliteConnection, group: &Group) -> Result<bool> {
        let result = sqlx::query("INSERT INTO groups (id, name) VALUES (?, ?)")
            .bind(group.id.to_string())
            .bind(&group.name)
            .execute(&mut *conn)
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(e) => {
                let err = Error::from(e);
                if err.is_unique_violation() {
                    Ok(false)
                } else {
                    Err(err)
                }
            }
        }
    }
}
