//! Gemeinsamer Zustand fuer den Signaling-Service

use std::time::Duration;

use kurier_delivery::{ZustellRepository, Zustellrouter};
use kurier_protocol::wire::DEFAULT_MAX_FRAME_SIZE;

/// Konfiguration fuer den Signaling-Service
#[derive(Debug, Clone)]
pub struct SignalingConfig {
    /// Maximale gleichzeitig angemeldete Sitzungen
    pub max_clients: usize,
    /// Inaktive Verbindungen werden nach dieser Zeit geschlossen
    pub verbindungs_timeout: Duration,
    /// Groesster angenommener Frame in Bytes
    pub max_frame_bytes: usize,
}

impl Default for SignalingConfig {
    fn default() -> Self {
        Self {
            max_clients: 512,
            verbindungs_timeout: Duration::from_secs(300),
            max_frame_bytes: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

/// Von allen Verbindungs-Tasks geteilter Zustand (per `Arc`)
pub struct SignalingState<R: ZustellRepository> {
    pub config: SignalingConfig,
    pub router: Zustellrouter<R>,
}

impl<R: ZustellRepository> SignalingState<R> {
    pub fn neu(config: SignalingConfig, router: Zustellrouter<R>) -> Self {
        Self { config, router }
    }
}
