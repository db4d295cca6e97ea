//! Ed25519-Signaturen ueber Klartext
//!
//! Unabhaengig vom Umschlag; `signatur_pruefen` wirft nie, ungueltige
//! Schluessel oder Signaturen ergeben `false`.

use ed25519_dalek::{Signature, Signer, Verifier, VerifyingKey};

use crate::error::CryptoResult;
use crate::keys::signatur_schluessel;
use crate::types::{OeffentlicherSchluessel, PrivaterSchluessel};

/// Signiert Daten mit dem aus dem privaten Schluessel abgeleiteten Ed25519-Key
pub fn signieren(daten: &[u8], privat: &PrivaterSchluessel) -> CryptoResult<Vec<u8>> {
    let signatur = signatur_schluessel(privat)?.sign(daten);
    Ok(signatur.to_bytes().to_vec())
}

/// Verifiziert eine Signatur gegen den oeffentlichen Schluessel
pub fn signatur_pruefen(daten: &[u8], signatur: &[u8], oeffentlich: &OeffentlicherSchluessel) -> bool {
    let Ok(verifying_key) = VerifyingKey::from_bytes(&oeffentlich.ed25519) else {
        return false;
    };
    let Ok(sig_array) = <[u8; 64]>::try_from(signatur) else {
        return false;
    };
    let signatur = Signature::from_bytes(&sig_array);
    verifying_key.verify(daten, &signatur).is_ok()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
