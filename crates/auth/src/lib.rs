//! kurier-auth – Schluesselregister
//!
//! Dieses Crate implementiert:
//! - Passwort-Hashing mit Argon2id (konfigurierbare Kosten)
//! - SchluesselRegister (Registrierung, Anmeldung, oeffentliche Schluessel,
//!   Profil, Freundesliste)

pub mod error;
pub mod password;
pub mod service;

// Bequeme Re-Exporte
pub use error::{AuthError, AuthResult};
pub use password::{passwort_hashen, passwort_verifizieren, PasswortParameter};
pub use service::SchluesselRegister;
