//! kurier-chat – Postfach und Gruppen
//!
//! Dieses Crate implementiert:
//! - Postfach: Direktnachrichten ablegen, abholen (einmalig), als gelesen
//!   markieren; Gruppen-Log anhaengen und ab Zeitpunkt lesen
//! - GruppenVerwaltung: Gruppen anlegen, Mitglieder hinzufuegen, abfragen
//!
//! # Beispiel
//!
//! ```no_run
//! use std::sync::Arc;
//! use kurier_chat::{GruppenVerwaltung, Postfach};
//! use kurier_db::SqliteDb;
//!
//! #[tokio::main]
//! async fn main() {
//!     let db = Arc::new(SqliteDb::in_memory().await.unwrap());
//!     let postfach = Postfach::neu(db.clone());
//!     let gruppen = GruppenVerwaltung::neu(db);
//! }
//! ```

pub mod error;
pub mod gruppen;
pub mod postfach;
pub mod types;

#[cfg(test)]
mod tests;

// Bequeme Re-Exporte
pub use error::{ChatError, ChatResult};
pub use gruppen::GruppenVerwaltung;
pub use postfach::Postfach;
pub use types::{Direktnachricht, Gruppe, Gruppennachricht};
