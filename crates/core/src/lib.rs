//! kurier-core – Gemeinsame Typen und Ereignisse
//!
//! Dieses Crate stellt die Bausteine bereit, die von allen anderen
//! Kurier-Crates gemeinsam genutzt werden: ID-Newtypes, das Live-Push-
//! Ereignis `Zustellung` und das gemeinsame Zeitstempel-Format.

pub mod event;
pub mod serde_b64;
pub mod types;
pub mod zeit;

// Re-Exporte fuer bequemen Zugriff
pub use event::Zustellung;
pub use types::{NachrichtId, SitzungsId};
