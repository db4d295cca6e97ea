//! Gemeinsame Typen fuer das Kryptografie-Subsystem

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{CryptoError, CryptoResult};

/// Laenge des privaten Schluessels (Seed) in Bytes
pub const PRIVATER_SCHLUESSEL_BYTES: usize = 32;

/// Laenge des oeffentlichen Schluessels (X25519 || Ed25519) in Bytes
pub const OEFFENTLICHER_SCHLUESSEL_BYTES: usize = 64;

/// Privater Schluessel: 32-Byte-Seed, aus dem X25519- und Ed25519-Schluessel
/// abgeleitet werden (wird beim Drop genullt)
#[derive(Clone, PartialEq, Eq)]
pub struct PrivaterSchluessel(pub(crate) [u8; PRIVATER_SCHLUESSEL_BYTES]);

impl PrivaterSchluessel {
    pub fn aus_bytes(bytes: [u8; PRIVATER_SCHLUESSEL_BYTES]) -> Self {
        Self(bytes)
    }

    pub fn aus_slice(bytes: &[u8]) -> CryptoResult<Self> {
        let seed: [u8; PRIVATER_SCHLUESSEL_BYTES] = bytes.try_into().map_err(|_| {
            CryptoError::UngueltigerSchluessel(format!(
                "privater Schluessel muss {PRIVATER_SCHLUESSEL_BYTES} Bytes lang sein, erhalten {}",
                bytes.len()
            ))
        })?;
        Ok(Self(seed))
    }

    pub fn als_bytes(&self) -> &[u8; PRIVATER_SCHLUESSEL_BYTES] {
        &self.0
    }
}

impl Drop for PrivaterSchluessel {
    fn drop(&mut self) {
        self.0.iter_mut().for_each(|b| *b = 0);
    }
}

impl std::fmt::Debug for PrivaterSchluessel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PrivaterSchluessel([REDACTED])")
    }
}

/// Oeffentlicher Schluessel: X25519 fuer Verschluesselung, Ed25519 fuer
/// Signaturen. Textform ist Base64 ueber beide Haelften.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OeffentlicherSchluessel {
    pub x25519: [u8; 32],
    pub ed25519: [u8; 32],
}

impl OeffentlicherSchluessel {
    pub fn to_bytes(&self) -> [u8; OEFFENTLICHER_SCHLUESSEL_BYTES] {
        let mut out = [0u8; OEFFENTLICHER_SCHLUESSEL_BYTES];
        out[..32].copy_from_slice(&self.x25519);
        out[32..].copy_from_slice(&self.ed25519);
        out
    }

    pub fn aus_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        if bytes.len() != OEFFENTLICHER_SCHLUESSEL_BYTES {
            return Err(CryptoError::UngueltigerSchluessel(format!(
                "oeffentlicher Schluessel muss {OEFFENTLICHER_SCHLUESSEL_BYTES} Bytes lang sein, erhalten {}",
                bytes.len()
            )));
        }
        let mut x25519 = [0u8; 32];
        let mut ed25519 = [0u8; 32];
        x25519.copy_from_slice(&bytes[..32]);
        ed25519.copy_from_slice(&bytes[32..]);
        Ok(Self { x25519, ed25519 })
    }

    /// Base64-Textform fuer Registrierung und Austausch
    pub fn als_text(&self) -> String {
        STANDARD.encode(self.to_bytes())
    }

    pub fn aus_text(text: &str) -> CryptoResult<Self> {
        let bytes = STANDARD
            .decode(text.trim())
            .map_err(|e| CryptoError::UngueltigerSchluessel(format!("kein gueltiges Base64: {e}")))?;
        Self::aus_bytes(&bytes)
    }
}

impl Serialize for OeffentlicherSchluessel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.als_text())
    }
}

impl<'de> Deserialize<'de> for OeffentlicherSchluessel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::aus_text(&text).map_err(serde::de::Error::custom)
    }
}

/// Ein Schluessel-Paar (oeffentlich + privat)
#[derive(Debug, Clone)]
pub struct Schluesselpaar {
    pub privat: PrivaterSchluessel,
    pub oeffentlich: OeffentlicherSchluessel,
}
