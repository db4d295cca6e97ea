//! Fehlertypen fuer das Kryptografie-Subsystem
//!
//! Die beiden Fehler beim Oeffnen (`EntschluesselungFehlgeschlagen`,
//! `FalschePassphraseOderBeschaedigt`) tragen keine Details: Aufrufer
//! erfahren nicht, welcher Schritt gescheitert ist.

use thiserror::Error;

/// Fehler im Kryptografie-Subsystem
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Ungueltiger Schluessel: {0}")]
    UngueltigerSchluessel(String),

    #[error("Klartext zu lang: maximal {max} Bytes, erhalten {erhalten}")]
    KlartextZuLang { max: usize, erhalten: usize },

    #[error("Entschluesselung fehlgeschlagen")]
    EntschluesselungFehlgeschlagen,

    #[error("Falsche Passphrase oder beschaedigte Daten")]
    FalschePassphraseOderBeschaedigt,

    #[error("Verschluesselung fehlgeschlagen: {0}")]
    Verschluesselung(String),

    #[error("Key Derivation fehlgeschlagen: {0}")]
    KeyDerivation(String),
}

pub type CryptoResult<T> = Result<T, CryptoError>;
