//! SQLite-Implementierung des GruppennachrichtRepository (Gruppen-Log)

use chrono::{DateTime, Utc};
use kurier_core::zeit::zeitstempel_text;

use crate::models::{GruppennachrichtRecord, NeueGruppennachricht};
use crate::repository::{DbResult, GruppennachrichtRepository};
use crate::sqlite::pool::SqliteDb;
use crate::sqlite::zeit_lesen;

impl GruppennachrichtRepository for SqliteDb {
    async fn create(&self, data: NeueGruppennachricht<'_>) -> DbResult<GruppennachrichtRecord> {
        let now_str = zeitstempel_text(&Utc::now());
        let now = zeit_lesen(&now_str)?;

        let result = sqlx::query(
            "INSERT INTO group_messages (group_name, sender, ciphertext, created_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(data.group_name)
        .bind(data.sender)
        .bind(data.ciphertext)
        .bind(&now_str)
        .execute(&self.pool)
        .await?;

        Ok(GruppennachrichtRecord {
            seq: result.last_insert_rowid(),
            group_name: data.group_name.to_string(),
            sender: data.sender.to_string(),
            ciphertext: data.ciphertext.to_vec(),
            created_at: now,
        })
    }

    async fn since(
        &self,
        group_name: &str,
        since: Option<DateTime<Utc>>,
    ) -> DbResult<Vec<GruppennachrichtRecord>> {
        let rows = match since {
            Some(seit) => {
                sqlx::query(
                    "SELECT seq, group_name, sender, ciphertext, created_at
                     FROM group_messages
                     WHERE group_name = ? AND created_at > ?
                     ORDER BY created_at ASC, seq ASC",
                )
                .bind(group_name)
                .bind(zeitstempel_text(&seit))
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT seq, group_name, sender, ciphertext, created_at
                     FROM group_messages
                     WHERE group_name = ?
                     ORDER BY created_at ASC, seq ASC",
                )
                .bind(group_name)
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.iter().map(row_to_gruppennachricht).collect()
    }
}

fn row_to_gruppennachricht(row: &sqlx::sqlite::SqliteRow) -> DbResult<GruppennachrichtRecord> {
    use sqlx::Row as _;

    let created_at: String = row.try_get("created_at")?;
    Ok(GruppennachrichtRecord {
        seq: row.try_get("seq")?,
        group_name: row.try_get("group_name")?,
        sender: row.try_get("sender")?,
        ciphertext: row.try_get("ciphertext")?,
        created_at: zeit_lesen(&created_at)?,
    })
}
