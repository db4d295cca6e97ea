//! kurier-protocol – Netzwerkprotokoll-Definitionen
//!
//! Dieses Crate definiert alle Nachrichtentypen die zwischen Client und
//! Server ausgetauscht werden, sowie das Frame-Format auf der TCP-Leitung.

pub mod control;
pub mod wire;

pub use control::{ControlMessage, ControlPayload, DeliveryOutcome, ErrorCode};
pub use wire::FrameCodec;
