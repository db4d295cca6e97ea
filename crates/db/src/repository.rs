//! Repository-Trait-Definitionen
//!
//! Das Repository-Pattern entkoppelt die Geschaeftslogik von der konkreten
//! Datenbank-Implementierung. Die Traits verwenden `async fn` ohne
//! `Send`-Garantie; Aufrufer laufen daher in einer `LocalSet`.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DbError;
use crate::models::{
    DirektnachrichtRecord, GruppenRecord, GruppennachrichtRecord, IdentitaetRecord,
    NeueDirektnachricht, NeueGruppe, NeueGruppennachricht, NeueIdentitaet, ProfilUpdate,
};

/// Result-Alias fuer Datenbankoperationen
pub type DbResult<T> = Result<T, DbError>;

/// Konfiguration fuer die Datenbankverbindung
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Verbindungs-URL (z.B. "sqlite://kurier.db")
    pub url: String,
    /// Maximale Anzahl gleichzeitiger Verbindungen im Pool
    pub max_verbindungen: u32,
    /// Ob WAL-Modus bei SQLite aktiviert werden soll
    pub sqlite_wal: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://kurier.db".into(),
            max_verbindungen: 5,
            sqlite_wal: true,
        }
    }
}

/// Repository fuer Identitaeten und Freundschaften
#[allow(async_fn_in_trait)]
pub trait IdentitaetRepository: Send + Sync {
    /// Legt eine Identitaet an; `Eindeutigkeit` wenn der Name vergeben ist
    async fn create(&self, data: NeueIdentitaet<'_>) -> DbResult<IdentitaetRecord>;

    /// Laedt eine Identitaet inkl. Freundesliste
    async fn get_by_name(&self, username: &str) -> DbResult<Option<IdentitaetRecord>>;

    /// Prueft ob ein Benutzername registriert ist
    async fn exists(&self, username: &str) -> DbResult<bool>;

    /// Ersetzt den oeffentlichen Schluessel; `false` wenn unbekannt
    async fn update_public_key(&self, username: &str, public_key: &str) -> DbResult<bool>;

    /// Aktualisiert Anzeigename/Avatar; `false` wenn unbekannt
    async fn update_profile(&self, username: &str, data: ProfilUpdate) -> DbResult<bool>;

    /// Traegt eine Freundschaft in beide Richtungen ein (idempotent)
    ///
    /// Gibt `true` zurueck wenn die Freundschaft neu ist.
    async fn add_friendship(&self, a: &str, b: &str) -> DbResult<bool>;

    /// Freunde eines Benutzers, alphabetisch sortiert
    async fn friends_of(&self, username: &str) -> DbResult<Vec<String>>;
}

/// Repository fuer das Postfach (Direktnachrichten)
#[allow(async_fn_in_trait)]
pub trait DirektnachrichtRepository: Send + Sync {
    /// Speichert eine Nachricht mit `delivered = false, read = false`
    async fn create(&self, data: NeueDirektnachricht<'_>) -> DbResult<DirektnachrichtRecord>;

    /// Laedt eine Nachricht anhand ihrer ID
    async fn get_by_id(&self, id: Uuid) -> DbResult<Option<DirektnachrichtRecord>>;

    /// Liefert alle unzugestellten Nachrichten des Empfaengers und markiert
    /// sie im selben Schritt als zugestellt (nach `created_at` sortiert)
    async fn drain_undelivered(&self, recipient: &str) -> DbResult<Vec<DirektnachrichtRecord>>;

    /// Setzt `read = true`; `false` wenn die ID nicht existiert
    async fn mark_read(&self, id: Uuid) -> DbResult<bool>;

    /// Anzahl unzugestellter Nachrichten eines Empfaengers
    async fn count_undelivered(&self, recipient: &str) -> DbResult<i64>;
}

/// Repository fuer Gruppen und Mitgliedschaften
#[allow(async_fn_in_trait)]
pub trait GruppenRepository: Send + Sync {
    /// Legt Gruppe und Mitglieder atomar an; `Eindeutigkeit` bei Namenskonflikt
    async fn create(&self, data: NeueGruppe<'_>) -> DbResult<GruppenRecord>;

    /// Laedt eine Gruppe inkl. geordneter Mitgliederliste
    async fn get(&self, name: &str) -> DbResult<Option<GruppenRecord>>;

    /// Haengt ein Mitglied an; `Eindeutigkeit` wenn bereits Mitglied
    async fn add_member(&self, name: &str, username: &str) -> DbResult<()>;

    /// Prueft die Mitgliedschaft
    async fn is_member(&self, name: &str, username: &str) -> DbResult<bool>;

    /// Namen aller Gruppen eines Benutzers, alphabetisch sortiert
    async fn groups_of(&self, username: &str) -> DbResult<Vec<String>>;
}

/// Repository fuer das Gruppen-Log
#[allow(async_fn_in_trait)]
pub trait GruppennachrichtRepository: Send + Sync {
    /// Haengt eine Nachricht an das Log an
    async fn create(&self, data: NeueGruppennachricht<'_>) -> DbResult<GruppennachrichtRecord>;

    /// Nachrichten einer Gruppe mit `created_at > since`, aufsteigend sortiert
    async fn since(
        &self,
        group_name: &str,
        since: Option<DateTime<Utc>>,
    ) -> DbResult<Vec<GruppennachrichtRecord>>;
}
