//! kurier-signaling – TCP-Transport
//!
//! Bildet die Request/Response-Operationen und Live-Pushes auf
//! Laengen-praefixierte JSON-Frames ab.
//!
//! ## Architektur
//!
//! ```text
//! TCP Listener (SignalingServer)
//!     |
//!     v
//! ClientConnection (pro Verbindung ein lokaler Task)
//!     |  Login -> PresenceTracker.verbinden, Ende -> trennen
//!     |  Push-Queue der Sitzung -> Delivery-Frames (request_id 0)
//!     v
//! MessageDispatcher
//!     |
//!     +-- SchluesselRegister (Register, Login, Schluessel, Profil, Freunde)
//!     +-- Zustellrouter      (Direkt, Gruppe, Abholen, Gelesen)
//!     +-- GruppenVerwaltung  (Anlegen, Beitreten, Abfragen)
//! ```

pub mod connection;
pub mod dispatcher;
pub mod error;
pub mod server_state;
pub mod tcp;

// Bequeme Re-Exporte
pub use connection::ClientConnection;
pub use dispatcher::{DispatcherContext, MessageDispatcher};
pub use error::{SignalingError, SignalingResult};
pub use server_state::{SignalingConfig, SignalingState};
pub use tcp::SignalingServer;
