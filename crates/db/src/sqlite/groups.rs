//! SQLite-Implementierung des GruppenRepository

use chrono::Utc;
use kurier_core::zeit::zeitstempel_text;
use sqlx::Row as _;

use crate::error::{ist_unique_verletzung, DbError};
use crate::models::{GruppenRecord, NeueGruppe};
use crate::repository::{DbResult, GruppenRepository};
use crate::sqlite::pool::SqliteDb;
use crate::sqlite::zeit_lesen;

impl GruppenRepository for SqliteDb {
    async fn create(&self, data: NeueGruppe<'_>) -> DbResult<GruppenRecord> {
        let now_str = zeitstempel_text(&Utc::now());
        let now = zeit_lesen(&now_str)?;

        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO chat_groups (name, creator, created_at) VALUES (?, ?, ?)")
            .bind(data.name)
            .bind(data.creator)
            .bind(&now_str)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if ist_unique_verletzung(&e) {
                    DbError::Eindeutigkeit(format!("Gruppe '{}' existiert bereits", data.name))
                } else {
                    DbError::Sqlx(e)
                }
            })?;

        for (position, mitglied) in data.members.iter().enumerate() {
            sqlx::query(
                "INSERT INTO group_members (group_name, username, position) VALUES (?, ?, ?)",
            )
            .bind(data.name)
            .bind(mitglied)
            .bind(position as i64 + 1)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(GruppenRecord {
            name: data.name.to_string(),
            creator: data.creator.to_string(),
            members: data.members.to_vec(),
            created_at: now,
        })
    }

    async fn get(&self, name: &str) -> DbResult<Option<GruppenRecord>> {
        let row = sqlx::query("SELECT name, creator, created_at FROM chat_groups WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mitglieder = sqlx::query(
            "SELECT username FROM group_members WHERE group_name = ? ORDER BY position",
        )
        .bind(name)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(|r| r.try_get::<String, _>("username"))
        .collect::<Result<Vec<_>, _>>()?;

        let created_at: String = row.try_get("created_at")?;
        Ok(Some(GruppenRecord {
            name: row.try_get("name")?,
            creator: row.try_get("creator")?,
            members: mitglieder,
            created_at: zeit_lesen(&created_at)?,
        }))
    }

    async fn add_member(&self, name: &str, username: &str) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO group_members (group_name, username, position)
             SELECT ?, ?, COALESCE(MAX(position), 0) + 1
             FROM group_members WHERE group_name = ?",
        )
        .bind(name)
        .bind(username)
        .bind(name)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if ist_unique_verletzung(&e) {
                DbError::Eindeutigkeit(format!("'{username}' ist bereits Mitglied von '{name}'"))
            } else {
                DbError::Sqlx(e)
            }
        })?;
        Ok(())
    }

    async fn is_member(&self, name: &str, username: &str) -> DbResult<bool> {
        let row = sqlx::query("SELECT 1 FROM group_members WHERE group_name = ? AND username = ?")
            .bind(name)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn groups_of(&self, username: &str) -> DbResult<Vec<String>> {
        let rows = sqlx::query(
            "SELECT group_name FROM group_members WHERE username = ? ORDER BY group_name",
        )
        .bind(username)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|r| r.try_get::<String, _>("group_name").map_err(DbError::from))
            .collect()
    }
}
