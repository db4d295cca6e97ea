//! # kurier-crypto
//!
//! Ende-zu-Ende-Umschlag fuer Kurier-Nachrichten. Alle Funktionen sind
//! zustandslos und laufen beim Client; der Server sieht nur Chiffrat.
//!
//! ## Module
//! - `keys` - Schluessel-Paar aus einem Seed (X25519 + Ed25519)
//! - `envelope` - Versiegeln/Oeffnen von Nachrichten (fester Block)
//! - `passphrase` - Argon2id + AES-256-GCM Schutz des privaten Schluessels
//! - `signatur` - Ed25519 Signieren/Pruefen
//! - `types` - Schluesseltypen
//! - `error` - Fehlertypen

pub mod envelope;
pub mod error;
pub mod keys;
pub mod passphrase;
pub mod signatur;
pub mod types;

// Bequeme Re-Exports
pub use envelope::{
    nachricht_oeffnen, nachricht_versiegeln, nachricht_versiegeln_fuer, MAX_KLARTEXT_BYTES,
    UMSCHLAG_BYTES,
};
pub use error::{CryptoError, CryptoResult};
pub use keys::{oeffentlicher_schluessel, schluesselpaar_erzeugen};
pub use passphrase::{schluessel_auspacken, schluessel_einpacken, schluessel_einpacken_mit, KdfParameter};
pub use signatur::{signatur_pruefen, signieren};
pub use types::{OeffentlicherSchluessel, PrivaterSchluessel, Schluesselpaar};
