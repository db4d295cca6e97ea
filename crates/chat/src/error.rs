//! Fehlertypen fuer das Chat-Crate

use thiserror::Error;

/// Chat-Fehlertypen
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Gruppe nicht gefunden: {0}")]
    GruppeNichtGefunden(String),

    #[error("Gruppe existiert bereits: {0}")]
    GruppeExistiert(String),

    #[error("'{username}' ist bereits Mitglied von '{gruppe}'")]
    BereitsMitglied { gruppe: String, username: String },

    #[error("Unbekanntes Mitglied: {0}")]
    UnbekanntesMitglied(String),

    #[error("'{username}' ist kein Mitglied von '{gruppe}'")]
    KeinMitglied { gruppe: String, username: String },

    #[error("Nachricht nicht gefunden: {0}")]
    NachrichtNichtGefunden(String),

    #[error("Ungueltige Eingabe: {0}")]
    UngueltigeEingabe(String),

    #[error("Datenbank-Fehler: {0}")]
    Datenbank(#[from] kurier_db::DbError),
}

pub type ChatResult<T> = Result<T, ChatError>;
