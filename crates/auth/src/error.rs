//! Fehlertypen fuer das Schluesselregister

use thiserror::Error;

/// Alle moeglichen Fehler im Schluesselregister
#[derive(Debug, Error)]
pub enum AuthError {
    // --- Passwort ---
    #[error("Passwort-Hashing fehlgeschlagen: {0}")]
    PasswortHashing(String),

    // --- Authentifizierung ---
    #[error("Benutzername oder Passwort falsch")]
    UngueltigeAnmeldedaten,

    // --- Identitaeten ---
    #[error("Benutzername bereits vergeben: {0}")]
    IdentitaetVergeben(String),

    #[error("Benutzer nicht gefunden: {0}")]
    BenutzerNichtGefunden(String),

    #[error("Kein Schluesselmaterial hinterlegt fuer: {0}")]
    KeinSchluesselmaterial(String),

    #[error("Ungueltige Eingabe: {0}")]
    UngueltigeEingabe(String),

    // --- Datenbank ---
    #[error("Datenbankfehler: {0}")]
    Datenbank(#[from] kurier_db::DbError),
}

impl AuthError {
    pub fn ungueltig(msg: impl Into<String>) -> Self {
        Self::UngueltigeEingabe(msg.into())
    }
}

/// Result-Alias fuer das Schluesselregister
pub type AuthResult<T> = Result<T, AuthError>;
