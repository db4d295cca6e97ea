//! Passphrasen-Schutz fuer den privaten Schluessel
//!
//! Argon2id leitet aus Passphrase und Salt einen AES-256-GCM-Schluessel ab.
//! Der Blob beschreibt sich selbst:
//! ```text
//! [version(1)] [m_kib(4)] [t(4)] [p(4)] [salt(16)] [nonce(12)] [ciphertext + tag(16)]
//! ```
//! Alle Zahlen big-endian; der Blob wird als Base64-Text weitergegeben.

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Key, Nonce,
};
use argon2::{Algorithm, Argon2, Params, Version};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::{CryptoError, CryptoResult};
use crate::types::{PrivaterSchluessel, PRIVATER_SCHLUESSEL_BYTES};

const BLOB_VERSION: u8 = 1;
const SALT_BYTES: usize = 16;
const KOPF_BYTES: usize = 1 + 4 + 4 + 4 + SALT_BYTES;

/// Obergrenzen fuer die Kosten aus dem Blob-Kopf (m = 1 GiB, t = 16, p = 16)
const MAX_SPEICHER_KIB: u32 = 1024 * 1024;
const MAX_ITERATIONEN: u32 = 16;
const MAX_PARALLELITAET: u32 = 16;

/// Argon2id-Kosten fuer die Schluesselableitung
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParameter {
    pub speicher_kib: u32,
    pub iterationen: u32,
    pub parallelitaet: u32,
}

impl Default for KdfParameter {
    /// m = 19 MiB, t = 2, p = 1
    fn default() -> Self {
        Self {
            speicher_kib: 19 * 1024,
            iterationen: 2,
            parallelitaet: 1,
        }
    }
}

impl KdfParameter {
    /// Kosten innerhalb der Grenzen, die `schluessel_auspacken` akzeptiert
    pub fn zulaessig(&self) -> bool {
        self.speicher_kib <= MAX_SPEICHER_KIB
            && self.iterationen <= MAX_ITERATIONEN
            && self.parallelitaet <= MAX_PARALLELITAET
    }

    fn schluessel_ableiten(&self, passphrase: &str, salt: &[u8]) -> CryptoResult<[u8; 32]> {
        let params = Params::new(self.speicher_kib, self.iterationen, self.parallelitaet, Some(32))
            .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
        let mut schluessel = [0u8; 32];
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
            .hash_password_into(passphrase.as_bytes(), salt, &mut schluessel)
            .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
        Ok(schluessel)
    }
}

/// Verpackt den privaten Schluessel mit einer Passphrase (Standardkosten)
pub fn schluessel_einpacken(privat: &PrivaterSchluessel, passphrase: &str) -> CryptoResult<String> {
    schluessel_einpacken_mit(privat, passphrase, &KdfParameter::default())
}

/// Verpackt den privaten Schluessel mit expliziten Argon2-Kosten
pub fn schluessel_einpacken_mit(
    privat: &PrivaterSchluessel,
    passphrase: &str,
    parameter: &KdfParameter,
) -> CryptoResult<String> {
    if !parameter.zulaessig() {
        return Err(CryptoError::KeyDerivation(format!(
            "Argon2-Kosten ueber der Obergrenze: {parameter:?}"
        )));
    }

    let mut salt = [0u8; SALT_BYTES];
    OsRng.fill_bytes(&mut salt);
    let mut nonce = [0u8; 12];
    OsRng.fill_bytes(&mut nonce);

    let mut blob = Vec::with_capacity(KOPF_BYTES + 12 + PRIVATER_SCHLUESSEL_BYTES + 16);
    blob.push(BLOB_VERSION);
    blob.extend_from_slice(&parameter.speicher_kib.to_be_bytes());
    blob.extend_from_slice(&parameter.iterationen.to_be_bytes());
    blob.extend_from_slice(&parameter.parallelitaet.to_be_bytes());
    blob.extend_from_slice(&salt);

    let mut schluessel = parameter.schluessel_ableiten(passphrase, &salt)?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&schluessel));
    schluessel.iter_mut().for_each(|b| *b = 0);

    let chiffrat = cipher
        .encrypt(
            Nonce::from_slice(&nonce),
            Payload {
                msg: privat.als_bytes(),
                aad: &blob,
            },
        )
        .map_err(|e| CryptoError::Verschluesselung(e.to_string()))?;

    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(&chiffrat);
    Ok(STANDARD.encode(blob))
}

/// Entpackt einen privaten Schluessel
///
/// Falsche Passphrase und beschaedigter Blob sind nicht unterscheidbar:
/// beide ergeben `FalschePassphraseOderBeschaedigt`.
pub fn schluessel_auspacken(blob: &str, passphrase: &str) -> CryptoResult<PrivaterSchluessel> {
    auspacken_intern(blob, passphrase).ok_or(CryptoError::FalschePassphraseOderBeschaedigt)
}

fn auspacken_intern(blob: &str, passphrase: &str) -> Option<PrivaterSchluessel> {
    let bytes = STANDARD.decode(blob.trim()).ok()?;
    if bytes.len() != KOPF_BYTES + 12 + PRIVATER_SCHLUESSEL_BYTES + 16 || bytes[0] != BLOB_VERSION {
        return None;
    }

    let parameter = KdfParameter {
        speicher_kib: zahl_lesen(&bytes, 1)?,
        iterationen: zahl_lesen(&bytes, 5)?,
        parallelitaet: zahl_lesen(&bytes, 9)?,
    };
    // Kosten aus einem fremden Blob vor jeder Ableitung begrenzen
    if !parameter.zulaessig() {
        return None;
    }

    let (kopf, rest) = bytes.split_at(KOPF_BYTES);
    let (nonce, chiffrat) = rest.split_at(12);
    let salt = &kopf[13..];

    let mut schluessel = parameter.schluessel_ableiten(passphrase, salt).ok()?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&schluessel));
    schluessel.iter_mut().for_each(|b| *b = 0);

    let mut klartext = cipher
        .decrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: chiffrat,
                aad: kopf,
            },
        )
        .ok()?;
    let privat = PrivaterSchluessel::aus_slice(&klartext).ok();
    klartext.iter_mut().for_each(|b| *b = 0);
    privat
}

fn zahl_lesen(bytes: &[u8], von: usize) -> Option<u32> {
    Some(u32::from_be_bytes(bytes.get(von..von + 4)?.try_into().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::schluesselpaar_erzeugen;

    fn schnell() -> KdfParameter {
        KdfParameter {
            speicher_kib: 1024,
            iterationen: 1,
            parallelitaet: 1,
        }
    }

    #[test]
    fn einpacken_und_auspacken() {
        let paar = schluesselpaar_erzeugen().unwrap();
        let blob = schluessel_einpacken_mit(&paar.privat, "pw", &schnell()).unwrap();
        let zurueck = schluessel_auspacken(&blob, "pw").unwrap();
        assert_eq!(zurueck, paar.privat);
    }

    #[test]
    fn standardparameter_einpacken() {
        let paar = schluesselpaar_erzeugen().unwrap();
        let blob = schluessel_einpacken(&paar.privat, "lange passphrase").unwrap();
        let bytes = STANDARD.decode(&blob).unwrap();
        assert_eq!(u32::from_be_bytes(bytes[1..5].try_into().unwrap()), 19 * 1024);
        assert_eq!(schluessel_auspacken(&blob, "lange passphrase").unwrap(), paar.privat);
    }

    #[test]
    fn falsche_passphrase_einheitlicher_fehler() {
        let paar = schluesselpaar_erzeugen().unwrap();
        let blob = schluessel_einpacken_mit(&paar.privat, "pw", &schnell()).unwrap();

        let err = schluessel_auspacken(&blob, "wrong").unwrap_err();
        assert!(matches!(err, CryptoError::FalschePassphraseOderBeschaedigt));
    }

    #[test]
    fn beschaedigter_blob_gleicher_fehler() {
        let paar = schluesselpaar_erzeugen().unwrap();
        let blob = schluessel_einpacken_mit(&paar.privat, "pw", &schnell()).unwrap();
        let mut bytes = STANDARD.decode(&blob).unwrap();
        let letzte = bytes.len() - 1;
        bytes[letzte] ^= 0x80;
        let manipuliert = STANDARD.encode(&bytes);

        // Manipulierte Parameter im Kopf werden ueber die AAD erkannt
        let mut kopf = STANDARD.decode(&blob).unwrap();
        kopf[8] ^= 0x01;
        let kopf_manipuliert = STANDARD.encode(&kopf);

        for kandidat in [manipuliert.as_str(), kopf_manipuliert.as_str(), "", "!!kein base64"] {
            assert!(matches!(
                schluessel_auspacken(kandidat, "pw"),
                Err(CryptoError::FalschePassphraseOderBeschaedigt)
            ));
        }
    }

    #[test]
    fn ueberhoehte_kosten_im_kopf_werden_sofort_abgelehnt() {
        let paar = schluesselpaar_erzeugen().unwrap();
        let blob = schluessel_einpacken_mit(&paar.privat, "pw", &schnell()).unwrap();

        // m, t und p jeweils einzeln auf u32::MAX
        for offset in [1usize, 5, 9] {
            let mut bytes = STANDARD.decode(&blob).unwrap();
            bytes[1..5].copy_from_slice(&(19 * 1024u32).to_be_bytes());
            bytes[offset..offset + 4].copy_from_slice(&u32::MAX.to_be_bytes());
            let manipuliert = STANDARD.encode(&bytes);

            let start = std::time::Instant::now();
            assert!(matches!(
                schluessel_auspacken(&manipuliert, "pw"),
                Err(CryptoError::FalschePassphraseOderBeschaedigt)
            ));
            assert!(start.elapsed() < std::time::Duration::from_secs(2));
        }
    }

    #[test]
    fn einpacken_mit_ueberhoehten_kosten_schlaegt_fehl() {
        let paar = schluesselpaar_erzeugen().unwrap();
        let teuer = KdfParameter {
            iterationen: MAX_ITERATIONEN + 1,
            ..schnell()
        };
        assert!(matches!(
            schluessel_einpacken_mit(&paar.privat, "pw", &teuer),
            Err(CryptoError::KeyDerivation(_))
        ));
        assert!(KdfParameter::default().zulaessig());
    }

    #[test]
    fn blobs_sind_gesalzen() {
        let paar = schluesselpaar_erzeugen().unwrap();
        let a = schluessel_einpacken_mit(&paar.privat, "pw", &schnell()).unwrap();
        let b = schluessel_einpacken_mit(&paar.privat, "pw", &schnell()).unwrap();
        assert_ne!(a, b);
    }
}
