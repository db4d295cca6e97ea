//! Schluessel-Erzeugung und -Ableitung
//!
//! Ein 32-Byte-Seed ist der einzige private Schluessel. Daraus werden per
//! HKDF-SHA256 ein X25519-Schluessel (Verschluesselung) und ein
//! Ed25519-Schluessel (Signaturen) abgeleitet.

use ed25519_dalek::SigningKey;
use hkdf::Hkdf;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};

use crate::error::{CryptoError, CryptoResult};
use crate::types::{
    OeffentlicherSchluessel, PrivaterSchluessel, Schluesselpaar, PRIVATER_SCHLUESSEL_BYTES,
};

const INFO_X25519: &[u8] = b"kurier/x25519";
const INFO_ED25519: &[u8] = b"kurier/ed25519";

/// Erzeugt ein neues Schluessel-Paar aus einem zufaelligen Seed
pub fn schluesselpaar_erzeugen() -> CryptoResult<Schluesselpaar> {
    let mut seed = [0u8; PRIVATER_SCHLUESSEL_BYTES];
    OsRng.fill_bytes(&mut seed);
    let privat = PrivaterSchluessel::aus_bytes(seed);
    seed.iter_mut().for_each(|b| *b = 0);

    let oeffentlich = oeffentlicher_schluessel(&privat)?;
    Ok(Schluesselpaar {
        privat,
        oeffentlich,
    })
}

/// Berechnet den oeffentlichen Schluessel zu einem privaten
pub fn oeffentlicher_schluessel(privat: &PrivaterSchluessel) -> CryptoResult<OeffentlicherSchluessel> {
    let x25519 = X25519PublicKey::from(&x25519_geheimnis(privat)?).to_bytes();
    let ed25519 = signatur_schluessel(privat)?.verifying_key().to_bytes();
    Ok(OeffentlicherSchluessel { x25519, ed25519 })
}

pub(crate) fn x25519_geheimnis(privat: &PrivaterSchluessel) -> CryptoResult<StaticSecret> {
    Ok(StaticSecret::from(ableiten(privat, INFO_X25519)?))
}

pub(crate) fn signatur_schluessel(privat: &PrivaterSchluessel) -> CryptoResult<SigningKey> {
    Ok(SigningKey::from_bytes(&ableiten(privat, INFO_ED25519)?))
}

fn ableiten(privat: &PrivaterSchluessel, info: &[u8]) -> CryptoResult<[u8; 32]> {
    let hk = Hkdf::<Sha256>::new(None, privat.als_bytes());
    let mut out = [0u8; 32];
    hk.expand(info, &mut out)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
    Ok(out)
}
