//! Nachrichten-Umschlag (Public-Key-Verschluesselung)
//!
//! ## Format
//! ```text
//! [version(1)] [ephemeral_pub(32)] [nonce(12)] [ciphertext + auth_tag(274)]
//! ```
//!
//! Der Klartext wird vor dem Verschluesseln auf einen festen Block
//! aufgefuellt:
//! ```text
//! [laenge(2, BE)] [klartext] [nullen bis 258 Bytes]
//! ```
//! Alle Umschlaege sind damit gleich lang. Schluessel fuer
//! ChaCha20-Poly1305 = HKDF-SHA256(X25519(ephemeral, empfaenger)),
//! Salt = ephemeral_pub || empfaenger_pub.

use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    ChaCha20Poly1305, Key, Nonce,
};
use hkdf::Hkdf;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use x25519_dalek::{EphemeralSecret, PublicKey as X25519PublicKey, SharedSecret};

use crate::error::{CryptoError, CryptoResult};
use crate::keys::x25519_geheimnis;
use crate::types::{OeffentlicherSchluessel, PrivaterSchluessel};

/// Maximale Klartextlaenge pro Nachricht in Bytes
pub const MAX_KLARTEXT_BYTES: usize = 256;

/// Aktuelle Format-Version
pub const UMSCHLAG_VERSION: u8 = 1;

const BLOCK_BYTES: usize = 2 + MAX_KLARTEXT_BYTES;
const TAG_BYTES: usize = 16;
const KOPF_BYTES: usize = 1 + 32 + 12;

/// Gesamtlaenge jedes Umschlags
pub const UMSCHLAG_BYTES: usize = KOPF_BYTES + BLOCK_BYTES + TAG_BYTES;

const INFO_UMSCHLAG: &[u8] = b"kurier/envelope/v1";

/// Verschluesselt einen Klartext fuer den Inhaber von `empfaenger`
///
/// Jeder Aufruf nutzt einen frischen ephemeren Schluessel und eine frische
/// Nonce; gleiche Klartexte ergeben daher nicht verknuepfbare Umschlaege.
pub fn nachricht_versiegeln(
    klartext: &[u8],
    empfaenger: &OeffentlicherSchluessel,
) -> CryptoResult<Vec<u8>> {
    if klartext.len() > MAX_KLARTEXT_BYTES {
        return Err(CryptoError::KlartextZuLang {
            max: MAX_KLARTEXT_BYTES,
            erhalten: klartext.len(),
        });
    }

    let ephemeral = EphemeralSecret::random_from_rng(OsRng);
    let ephemeral_pub = X25519PublicKey::from(&ephemeral);
    let empfaenger_pub = X25519PublicKey::from(empfaenger.x25519);

    let geteilt = ephemeral.diffie_hellman(&empfaenger_pub);
    if !geteilt.was_contributory() {
        return Err(CryptoError::UngueltigerSchluessel(
            "X25519-Schluessel mit niedriger Ordnung".into(),
        ));
    }
    let cipher = cipher_ableiten(&geteilt, ephemeral_pub.as_bytes(), &empfaenger.x25519)?;

    let mut nonce = [0u8; 12];
    OsRng.fill_bytes(&mut nonce);

    let mut kopf = Vec::with_capacity(UMSCHLAG_BYTES);
    kopf.push(UMSCHLAG_VERSION);
    kopf.extend_from_slice(ephemeral_pub.as_bytes());

    let mut block = auffuellen(klartext);
    let chiffrat = cipher
        .encrypt(
            Nonce::from_slice(&nonce),
            Payload {
                msg: &block,
                aad: &kopf,
            },
        )
        .map_err(|e| CryptoError::Verschluesselung(e.to_string()));
    block.iter_mut().for_each(|b| *b = 0);
    let chiffrat = chiffrat?;

    let mut umschlag = kopf;
    umschlag.extend_from_slice(&nonce);
    umschlag.extend_from_slice(&chiffrat);
    Ok(umschlag)
}

/// Wie [`nachricht_versiegeln`], mit dem Schluessel in Base64-Textform
pub fn nachricht_versiegeln_fuer(klartext: &[u8], empfaenger_text: &str) -> CryptoResult<Vec<u8>> {
    let empfaenger = OeffentlicherSchluessel::aus_text(empfaenger_text)?;
    nachricht_versiegeln(klartext, &empfaenger)
}

/// Oeffnet einen Umschlag mit dem eigenen privaten Schluessel
///
/// Jeder Fehler (falscher Schluessel, Laenge, Version, Tag, Auffuellung)
/// ergibt `EntschluesselungFehlgeschlagen`.
pub fn nachricht_oeffnen(umschlag: &[u8], eigener: &PrivaterSchluessel) -> CryptoResult<Vec<u8>> {
    oeffnen_intern(umschlag, eigener).ok_or(CryptoError::EntschluesselungFehlgeschlagen)
}

fn oeffnen_intern(umschlag: &[u8], eigener: &PrivaterSchluessel) -> Option<Vec<u8>> {
    if umschlag.len() != UMSCHLAG_BYTES || umschlag[0] != UMSCHLAG_VERSION {
        return None;
    }

    let (kopf, rest) = umschlag.split_at(1 + 32);
    let (nonce, chiffrat) = rest.split_at(12);
    let ephemeral_pub: [u8; 32] = kopf[1..].try_into().ok()?;

    let geheimnis = x25519_geheimnis(eigener).ok()?;
    let eigener_pub = X25519PublicKey::from(&geheimnis);
    let geteilt = geheimnis.diffie_hellman(&X25519PublicKey::from(ephemeral_pub));
    if !geteilt.was_contributory() {
        return None;
    }
    let cipher = cipher_ableiten(&geteilt, &ephemeral_pub, eigener_pub.as_bytes()).ok()?;

    let mut block = cipher
        .decrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: chiffrat,
                aad: kopf,
            },
        )
        .ok()?;

    let klartext = abschneiden(&block);
    block.iter_mut().for_each(|b| *b = 0);
    klartext
}

fn cipher_ableiten(
    geteilt: &SharedSecret,
    ephemeral_pub: &[u8; 32],
    empfaenger_pub: &[u8; 32],
) -> CryptoResult<ChaCha20Poly1305> {
    let mut salt = [0u8; 64];
    salt[..32].copy_from_slice(ephemeral_pub);
    salt[32..].copy_from_slice(empfaenger_pub);

    let hk = Hkdf::<Sha256>::new(Some(&salt), geteilt.as_bytes());
    let mut schluessel = [0u8; 32];
    hk.expand(INFO_UMSCHLAG, &mut schluessel)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;

    let cipher = ChaCha20Poly1305::new(Key::from_slice(&schluessel));
    schluessel.iter_mut().for_each(|b| *b = 0);
    Ok(cipher)
}

fn auffuellen(klartext: &[u8]) -> Vec<u8> {
    let mut block = vec![0u8; BLOCK_BYTES];
    block[..2].copy_from_slice(&(klartext.len() as u16).to_be_bytes());
    block[2..2 + klartext.len()].copy_from_slice(klartext);
    block
}

fn abschneiden(block: &[u8]) -> Option<Vec<u8>> {
    if block.len() != BLOCK_BYTES {
        return None;
    }
    let laenge = u16::from_be_bytes([block[0], block[1]]) as usize;
    if laenge > MAX_KLARTEXT_BYTES {
        return None;
    }
    // Auffuellung muss aus Nullen bestehen
    if block[2 + laenge..].iter().any(|&b| b != 0) {
        return None;
    }
    Some(block[2..2 + laenge].to_vec())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
