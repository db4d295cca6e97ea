//! kurier-db – Persistenz
//!
//! Dieses Crate stellt das Repository-Pattern bereit: Traits fuer
//! Identitaeten, Direktnachrichten (Postfach), Gruppen und das Gruppen-Log,
//! sowie deren SQLite-Implementierung auf `SqliteDb`.

pub mod error;
pub mod models;
pub mod repository;
pub mod sqlite;

pub use error::DbError;
pub use repository::{
    DatabaseConfig, DbResult, DirektnachrichtRepository, GruppenRepository,
    GruppennachrichtRepository, IdentitaetRepository,
};
pub use sqlite::SqliteDb;
