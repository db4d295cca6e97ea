//! kurier-delivery – Presence und Zustellung
//!
//! - `PresenceTracker`: hoechstens eine Live-Sitzung pro Benutzername
//! - `Zustellrouter`: Live-Push oder Postfach fuer Direktnachrichten,
//!   Gruppen-Log plus Fanout fuer Gruppennachrichten

pub mod config;
pub mod error;
pub mod presence;
pub mod router;

pub use config::{FanoutPolitik, PresencePolitik, ZustellConfig};
pub use error::{ZustellFehler, ZustellResult};
pub use presence::{
    PresenceEvent, PresenceTracker, Sitzung, SitzungsHandle, ZustellKanal, ZustellungVerpasst,
};
pub use router::{GruppenZustellung, ZustellRepository, Zustellrouter, Zustellstatus};
