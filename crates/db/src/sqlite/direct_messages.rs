//! SQLite-Implementierung des DirektnachrichtRepository (Postfach)

use chrono::Utc;
use kurier_core::zeit::zeitstempel_text;
use uuid::Uuid;

use crate::models::{DirektnachrichtRecord, NeueDirektnachricht};
use crate::repository::{DbResult, DirektnachrichtRepository};
use crate::sqlite::pool::SqliteDb;
use crate::sqlite::{uuid_lesen, zeit_lesen};

impl DirektnachrichtRepository for SqliteDb {
    async fn create(&self, data: NeueDirektnachricht<'_>) -> DbResult<DirektnachrichtRecord> {
        let id = Uuid::new_v4();
        let now_str = zeitstempel_text(&Utc::now());
        let now = zeit_lesen(&now_str)?;

        let result = sqlx::query(
            "INSERT INTO direct_messages
             (id, sender, recipient, ciphertext, delivered, read, created_at)
             VALUES (?, ?, ?, ?, 0, 0, ?)",
        )
        .bind(id.to_string())
        .bind(data.sender)
        .bind(data.recipient)
        .bind(data.ciphertext)
        .bind(&now_str)
        .execute(&self.pool)
        .await?;

        Ok(DirektnachrichtRecord {
            id,
            sender: data.sender.to_string(),
            recipient: data.recipient.to_string(),
            ciphertext: data.ciphertext.to_vec(),
            delivered: false,
            read: false,
            created_at: now,
            seq: result.last_insert_rowid(),
        })
    }

    async fn get_by_id(&self, id: Uuid) -> DbResult<Option<DirektnachrichtRecord>> {
        let row = sqlx::query(
            "SELECT seq, id, sender, recipient, ciphertext, delivered, read, created_at
             FROM direct_messages WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_direktnachricht(&r)).transpose()
    }

    async fn drain_undelivered(&self, recipient: &str) -> DbResult<Vec<DirektnachrichtRecord>> {
        // Auswahl und Markierung in einer Anweisung: parallele Aufrufe
        // koennen dieselbe Nachricht nicht doppelt erhalten
        let rows = sqlx::query(
            "UPDATE direct_messages SET delivered = 1
             WHERE recipient = ? AND delivered = 0
             RETURNING seq, id, sender, recipient, ciphertext, delivered, read, created_at",
        )
        .bind(recipient)
        .fetch_all(&self.pool)
        .await?;

        let mut nachrichten = rows
            .iter()
            .map(row_to_direktnachricht)
            .collect::<DbResult<Vec<_>>>()?;

        // RETURNING garantiert keine Reihenfolge
        nachrichten.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.seq.cmp(&b.seq)));
        Ok(nachrichten)
    }

    async fn mark_read(&self, id: Uuid) -> DbResult<bool> {
        let id_str = id.to_string();
        let affected = sqlx::query("UPDATE direct_messages SET read = 1 WHERE id = ? AND read = 0")
            .bind(&id_str)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if affected > 0 {
            return Ok(true);
        }

        // Bereits gelesen oder unbekannt
        let row = sqlx::query("SELECT 1 FROM direct_messages WHERE id = ?")
            .bind(&id_str)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn count_undelivered(&self, recipient: &str) -> DbResult<i64> {
        let anzahl: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM direct_messages WHERE recipient = ? AND delivered = 0",
        )
        .bind(recipient)
        .fetch_one(&self.pool)
        .await?;
        Ok(anzahl)
    }
}

fn row_to_direktnachricht(row: &sqlx::sqlite::SqliteRow) -> DbResult<DirektnachrichtRecord> {
    use sqlx::Row as _;

    let id_str: String = row.try_get("id")?;
    let created_at: String = row.try_get("created_at")?;
    let delivered: i64 = row.try_get("delivered")?;
    let read: i64 = row.try_get("read")?;

    Ok(DirektnachrichtRecord {
        id: uuid_lesen(&id_str)?,
        sender: row.try_get("sender")?,
        recipient: row.try_get("recipient")?,
        ciphertext: row.try_get("ciphertext")?,
        delivered: delivered != 0,
        read: read != 0,
        created_at: zeit_lesen(&created_at)?,
        seq: row.try_get("seq")?,
    })
}
