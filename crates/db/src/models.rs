//! Datenbankmodelle fuer Kurier
//!
//! Diese Typen repraesentieren Datensaetze aus der Datenbank.
//! Sie sind von den Domain-Typen getrennt und dienen als reine
//! Datenuebertragungsobjekte.

use chrono::{DateTime, Utc};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Identitaeten
// ---------------------------------------------------------------------------

/// Identitaets-Datensatz aus der Datenbank
#[derive(Debug, Clone)]
pub struct IdentitaetRecord {
    pub username: String,
    pub password_hash: String,
    pub public_key: Option<String>,
    pub encrypted_private_key: Option<String>,
    pub display_name: Option<String>,
    pub avatar_ref: Option<String>,
    /// Freunde, alphabetisch sortiert
    pub friends: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Daten zum Anlegen einer neuen Identitaet
#[derive(Debug, Clone)]
pub struct NeueIdentitaet<'a> {
    pub username: &'a str,
    pub password_hash: &'a str,
    pub public_key: Option<&'a str>,
    pub encrypted_private_key: Option<&'a str>,
}

/// Profil-Aenderung (nur gesetzte Felder werden geschrieben)
#[derive(Debug, Clone, Default)]
pub struct ProfilUpdate {
    pub display_name: Option<String>,
    pub avatar_ref: Option<String>,
}

// ---------------------------------------------------------------------------
// Direktnachrichten (Postfach)
// ---------------------------------------------------------------------------

/// Direktnachricht-Datensatz aus der Datenbank
#[derive(Debug, Clone)]
pub struct DirektnachrichtRecord {
    pub id: Uuid,
    pub sender: String,
    pub recipient: String,
    pub ciphertext: Vec<u8>,
    pub delivered: bool,
    pub read: bool,
    pub created_at: DateTime<Utc>,
    /// Einfuege-Reihenfolge (Tie-Breaker bei gleichem Zeitstempel)
    pub seq: i64,
}

/// Daten zum Anlegen einer Direktnachricht
#[derive(Debug, Clone)]
pub struct NeueDirektnachricht<'a> {
    pub sender: &'a str,
    pub recipient: &'a str,
    pub ciphertext: &'a [u8],
}

// ---------------------------------------------------------------------------
// Gruppen
// ---------------------------------------------------------------------------

/// Gruppen-Datensatz inkl. geordneter Mitgliederliste
#[derive(Debug, Clone)]
pub struct GruppenRecord {
    pub name: String,
    pub creator: String,
    /// Mitglieder in Beitrittsreihenfolge
    pub members: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Daten zum Anlegen einer Gruppe
#[derive(Debug, Clone)]
pub struct NeueGruppe<'a> {
    pub name: &'a str,
    pub creator: &'a str,
    /// Bereits dedupliziert, Ersteller an erster Stelle
    pub members: &'a [String],
}

/// Gruppennachricht-Datensatz aus dem Gruppen-Log
#[derive(Debug, Clone)]
pub struct GruppennachrichtRecord {
    pub seq: i64,
    pub group_name: String,
    pub sender: String,
    pub ciphertext: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

/// Daten zum Anhaengen an das Gruppen-Log
#[derive(Debug, Clone)]
pub struct NeueGruppennachricht<'a> {
    pub group_name: &'a str,
    pub sender: &'a str,
    pub ciphertext: &'a [u8],
}
