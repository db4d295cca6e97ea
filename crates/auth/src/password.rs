//! Passwort-Hashing mit Argon2id
//!
//! Die Kostenparameter sind konfigurierbar; der PHC-String speichert sie
//! mit, sodass bestehende Hashes nach einer Aenderung weiter pruefbar sind.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, AuthResult};

/// Argon2id-Kostenparameter fuer Passwort-Hashes
///
/// Standardwerte gemaess OWASP-Empfehlungen:
/// - Speicher: 64 MiB
/// - Iterationen: 3
/// - Parallelismus: 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswortParameter {
    pub speicher_kib: u32,
    pub iterationen: u32,
    pub parallelitaet: u32,
}

impl Default for PasswortParameter {
    fn default() -> Self {
        Self {
            speicher_kib: 64 * 1024,
            iterationen: 3,
            parallelitaet: 1,
        }
    }
}

impl PasswortParameter {
    fn argon2(&self) -> AuthResult<Argon2<'static>> {
        let params = Params::new(self.speicher_kib, self.iterationen, self.parallelitaet, None)
            .map_err(|e| AuthError::PasswortHashing(format!("Argon2-Parameter ungueltig: {e}")))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

/// Hasht ein Passwort mit Argon2id und einem zufaelligen Salt
///
/// Gibt den PHC-String zurueck (inkl. Algorithmus, Parameter und Salt).
pub fn passwort_hashen(passwort: &str, parameter: &PasswortParameter) -> AuthResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    parameter
        .argon2()?
        .hash_password(passwort.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::PasswortHashing(e.to_string()))
}

/// Verifiziert ein Passwort gegen einen gespeicherten PHC-Hash
///
/// Die Parameter werden aus dem Hash gelesen.
pub fn passwort_verifizieren(passwort: &str, hash: &str) -> AuthResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AuthError::PasswortHashing(format!("Ungueltiges Hash-Format: {e}")))?;

    match Argon2::default().verify_password(passwort.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::PasswortHashing(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schnell() -> PasswortParameter {
        PasswortParameter {
            speicher_kib: 1024,
            iterationen: 1,
            parallelitaet: 1,
        }
    }

    #[test]
    fn passwort_hashen_und_verifizieren() {
        let hash = passwort_hashen("sicheres_passwort_123!", &schnell()).unwrap();

        assert!(hash.starts_with("$argon2id$"), "Hash muss mit $argon2id$ beginnen");
        assert!(hash.contains("m=1024,t=1,p=1"));
        assert!(passwort_verifizieren("sicheres_passwort_123!", &hash).unwrap());
    }

    #[test]
    fn falsches_passwort_wird_abgelehnt() {
        let hash = passwort_hashen("richtiges_passwort", &schnell()).unwrap();
        assert!(!passwort_verifizieren("falsches_passwort", &hash).unwrap());
    }

    #[test]
    fn gleiche_passwoerter_unterschiedliche_hashes() {
        let hash1 = passwort_hashen("gleich", &schnell()).unwrap();
        let hash2 = passwort_hashen("gleich", &schnell()).unwrap();
        assert_ne!(hash1, hash2, "Salt muss Hashes unterscheiden");
    }

    #[test]
    fn ungueltige_parameter_geben_fehler() {
        let parameter = PasswortParameter {
            speicher_kib: 1,
            iterationen: 0,
            parallelitaet: 1,
        };
        assert!(matches!(
            passwort_hashen("pw", &parameter),
            Err(AuthError::PasswortHashing(_))
        ));
    }

    #[test]
    fn ungueltiges_hash_format_gibt_fehler() {
        assert!(passwort_verifizieren("passwort", "kein_gueltiger_hash").is_err());
    }
}
