//! Fehlertypen fuer den Signaling-Service
//!
//! Jeder Fehler bildet auf einen stabilen `ErrorCode` ab, den der Client
//! auswerten kann. Interne Details verlassen den Server nicht.

use kurier_auth::AuthError;
use kurier_chat::ChatError;
use kurier_delivery::ZustellFehler;
use kurier_protocol::ErrorCode;
use thiserror::Error;

/// Fehlertyp fuer den Signaling-Service
#[derive(Debug, Error)]
pub enum SignalingError {
    /// IO-Fehler (TCP, Socket)
    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Chat(#[from] ChatError),

    #[error(transparent)]
    Zustellung(#[from] ZustellFehler),

    /// Anfrage erfordert eine Anmeldung
    #[error("Nicht angemeldet")]
    NichtAngemeldet,

    /// Protokollfehler (unerwartete Nachricht, falscher Zustand)
    #[error("Protokollfehler: {0}")]
    Protokoll(String),
}

impl SignalingError {
    /// Erstellt einen Protokollfehler
    pub fn protokoll(msg: impl Into<String>) -> Self {
        Self::Protokoll(msg.into())
    }

    /// Stabiler Fehler-Code fuer die Antwort an den Client
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Io(_) => ErrorCode::InternalError,
            Self::Auth(e) => auth_code(e),
            Self::Chat(e) => chat_code(e),
            Self::Zustellung(e) => match e {
                ZustellFehler::AbsenderUnbekannt(_) | ZustellFehler::BenutzerNichtGefunden(_) => {
                    ErrorCode::NotFound
                }
                ZustellFehler::UnbekannterEmpfaenger(_) => ErrorCode::UnknownRecipient,
                ZustellFehler::UngueltigeEingabe(_) => ErrorCode::InvalidRequest,
                ZustellFehler::BereitsVerbunden(_) => ErrorCode::AlreadyConnected,
                ZustellFehler::Auth(e) => auth_code(e),
                ZustellFehler::Chat(e) => chat_code(e),
            },
            Self::NichtAngemeldet => ErrorCode::NotLoggedIn,
            Self::Protokoll(_) => ErrorCode::InvalidRequest,
        }
    }

    /// Text fuer den Client; interne Fehler werden nicht im Detail gemeldet
    pub fn client_meldung(&self) -> String {
        match self.code() {
            ErrorCode::InternalError => "Interner Fehler".to_string(),
            _ => self.to_string(),
        }
    }
}

fn auth_code(e: &AuthError) -> ErrorCode {
    match e {
        AuthError::UngueltigeAnmeldedaten => ErrorCode::InvalidCredentials,
        AuthError::IdentitaetVergeben(_) => ErrorCode::DuplicateIdentity,
        AuthError::BenutzerNichtGefunden(_) => ErrorCode::NotFound,
        AuthError::KeinSchluesselmaterial(_) => ErrorCode::NoKeyMaterial,
        AuthError::UngueltigeEingabe(_) => ErrorCode::InvalidRequest,
        AuthError::PasswortHashing(_) | AuthError::Datenbank(_) => ErrorCode::InternalError,
    }
}

fn chat_code(e: &ChatError) -> ErrorCode {
    match e {
        ChatError::GruppeNichtGefunden(_) | ChatError::NachrichtNichtGefunden(_) => {
            ErrorCode::NotFound
        }
        ChatError::GruppeExistiert(_) => ErrorCode::DuplicateGroup,
        ChatError::BereitsMitglied { .. } => ErrorCode::AlreadyMember,
        ChatError::UnbekanntesMitglied(_) => ErrorCode::UnknownMember,
        ChatError::KeinMitglied { .. } => ErrorCode::NotAMember,
        ChatError::UngueltigeEingabe(_) => ErrorCode::InvalidRequest,
        ChatError::Datenbank(_) => ErrorCode::InternalError,
    }
}

/// Result-Typ fuer den Signaling-Service
pub type SignalingResult<T> = Result<T, SignalingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zustellfehler_codes() {
        let e: SignalingError = ZustellFehler::UnbekannterEmpfaenger("ghost".into()).into();
        assert_eq!(e.code(), ErrorCode::UnknownRecipient);

        let e: SignalingError = ZustellFehler::Chat(ChatError::KeinMitglied {
            gruppe: "G".into(),
            username: "eve".into(),
        })
        .into();
        assert_eq!(e.code(), ErrorCode::NotAMember);
    }

    #[test]
    fn anmeldefehler_unterscheidbar() {
        let falsch: SignalingError = AuthError::UngueltigeAnmeldedaten.into();
        let unbekannt: SignalingError = AuthError::BenutzerNichtGefunden("ghost".into()).into();
        assert_eq!(falsch.code(), ErrorCode::InvalidCredentials);
        assert_eq!(unbekannt.code(), ErrorCode::NotFound);
    }

    #[test]
    fn interne_fehler_ohne_details() {
        let e: SignalingError = AuthError::PasswortHashing("geheimes Detail".into()).into();
        assert_eq!(e.code(), ErrorCode::InternalError);
        assert_eq!(e.client_meldung(), "Interner Fehler");
    }
}
