//! SQLite-Implementierung des IdentitaetRepository

use chrono::Utc;
use kurier_core::zeit::zeitstempel_text;
use sqlx::Row as _;

use crate::error::{ist_unique_verletzung, DbError};
use crate::models::{IdentitaetRecord, NeueIdentitaet, ProfilUpdate};
use crate::repository::{DbResult, IdentitaetRepository};
use crate::sqlite::pool::SqliteDb;
use crate::sqlite::zeit_lesen;

impl IdentitaetRepository for SqliteDb {
    async fn create(&self, data: NeueIdentitaet<'_>) -> DbResult<IdentitaetRecord> {
        let now_str = zeitstempel_text(&Utc::now());
        let now = zeit_lesen(&now_str)?;

        sqlx::query(
            "INSERT INTO identities
             (username, password_hash, public_key, encrypted_private_key, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(data.username)
        .bind(data.password_hash)
        .bind(data.public_key)
        .bind(data.encrypted_private_key)
        .bind(&now_str)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if ist_unique_verletzung(&e) {
                DbError::Eindeutigkeit(format!("Benutzername '{}' bereits vergeben", data.username))
            } else {
                DbError::Sqlx(e)
            }
        })?;

        Ok(IdentitaetRecord {
            username: data.username.to_string(),
            password_hash: data.password_hash.to_string(),
            public_key: data.public_key.map(str::to_string),
            encrypted_private_key: data.encrypted_private_key.map(str::to_string),
            display_name: None,
            avatar_ref: None,
            friends: Vec::new(),
            created_at: now,
        })
    }

    async fn get_by_name(&self, username: &str) -> DbResult<Option<IdentitaetRecord>> {
        let row = sqlx::query(
            "SELECT username, password_hash, public_key, encrypted_private_key,
                    display_name, avatar_ref, created_at
             FROM identities WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let created_at: String = row.try_get("created_at")?;
        Ok(Some(IdentitaetRecord {
            username: row.try_get("username")?,
            password_hash: row.try_get("password_hash")?,
            public_key: row.try_get("public_key")?,
            encrypted_private_key: row.try_get("encrypted_private_key")?,
            display_name: row.try_get("display_name")?,
            avatar_ref: row.try_get("avatar_ref")?,
            friends: self.friends_of(username).await?,
            created_at: zeit_lesen(&created_at)?,
        }))
    }

    async fn exists(&self, username: &str) -> DbResult<bool> {
        let row = sqlx::query("SELECT 1 FROM identities WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn update_public_key(&self, username: &str, public_key: &str) -> DbResult<bool> {
        let affected = sqlx::query("UPDATE identities SET public_key = ? WHERE username = ?")
            .bind(public_key)
            .bind(username)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(affected > 0)
    }

    async fn update_profile(&self, username: &str, data: ProfilUpdate) -> DbResult<bool> {
        // Dynamisches UPDATE – nur gesetzte Felder aendern
        let mut sets: Vec<&str> = Vec::new();
        if data.display_name.is_some() {
            sets.push("display_name = ?");
        }
        if data.avatar_ref.is_some() {
            sets.push("avatar_ref = ?");
        }

        if sets.is_empty() {
            return self.exists(username).await;
        }

        let sql = format!("UPDATE identities SET {} WHERE username = ?", sets.join(", "));
        let mut q = sqlx::query(&sql);
        if let Some(ref v) = data.display_name {
            q = q.bind(v);
        }
        if let Some(ref v) = data.avatar_ref {
            q = q.bind(v);
        }
        q = q.bind(username);

        let affected = q.execute(&self.pool).await?.rows_affected();
        Ok(affected > 0)
    }

    async fn add_friendship(&self, a: &str, b: &str) -> DbResult<bool> {
        let mut tx = self.pool.begin().await?;

        let hin = sqlx::query("INSERT OR IGNORE INTO friends (username, friend) VALUES (?, ?)")
            .bind(a)
            .bind(b)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let rueck = sqlx::query("INSERT OR IGNORE INTO friends (username, friend) VALUES (?, ?)")
            .bind(b)
            .bind(a)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(hin + rueck > 0)
    }

    async fn friends_of(&self, username: &str) -> DbResult<Vec<String>> {
        let rows = sqlx::query("SELECT friend FROM friends WHERE username = ? ORDER BY friend")
            .bind(username)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|r| r.try_get::<String, _>("friend").map_err(DbError::from))
            .collect()
    }
}
