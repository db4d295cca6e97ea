//! SQLite-Backend-Implementierungen fuer alle Repository-Traits

pub mod direct_messages;
pub mod group_messages;
pub mod groups;
pub mod identities;
pub mod pool;

pub use pool::SqliteDb;

use chrono::{DateTime, Utc};
use kurier_core::zeit::zeitstempel_lesen;
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::DbResult;

/// Liest einen gespeicherten Zeitstempel
pub(crate) fn zeit_lesen(text: &str) -> DbResult<DateTime<Utc>> {
    zeitstempel_lesen(text).ok_or_else(|| DbError::intern(format!("Ungueltige Zeitangabe '{text}'")))
}

/// Liest eine gespeicherte UUID
pub(crate) fn uuid_lesen(text: &str) -> DbResult<Uuid> {
    Uuid::parse_str(text).map_err(|e| DbError::intern(format!("Ungueltige UUID '{text}': {e}")))
}
