//! Fehlertypen fuer die Zustellung

use kurier_auth::AuthError;
use kurier_chat::ChatError;
use thiserror::Error;

/// Fehler des Zustellrouters und des Presence-Trackers
#[derive(Debug, Error)]
pub enum ZustellFehler {
    #[error("Absender unbekannt: {0}")]
    AbsenderUnbekannt(String),

    #[error("Empfaenger unbekannt: {0}")]
    UnbekannterEmpfaenger(String),

    #[error("Benutzer nicht gefunden: {0}")]
    BenutzerNichtGefunden(String),

    #[error("Ungueltige Eingabe: {0}")]
    UngueltigeEingabe(String),

    #[error("Bereits verbunden: {0}")]
    BereitsVerbunden(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Chat(#[from] ChatError),
}

pub type ZustellResult<T> = Result<T, ZustellFehler>;
