//! Health-Check-Endpunkt fuer Kurier
//!
//! Endpoint: `GET /health`
//! Response: JSON mit Status, Version, Uptime, DB-Status und Anzahl
//! verbundener Sitzungen

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use prometheus::IntGauge;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Status des Health-Checks
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

/// Antwort des Health-Check-Endpunkts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    pub db_connected: bool,
    pub online_sessions: i64,
}

/// Geteilter Zustand fuer den Health-Check-Handler
#[derive(Clone)]
pub struct HealthState {
    start_time: Instant,
    db_connected: Arc<AtomicBool>,
    online_sessions: Option<IntGauge>,
}

impl HealthState {
    pub fn neu() -> Self {
        Self {
            start_time: Instant::now(),
            db_connected: Arc::new(AtomicBool::new(true)),
            online_sessions: None,
        }
    }

    /// Meldet die Sitzungsanzahl aus dem Gauge der Metriken
    pub fn mit_sitzungs_gauge(mut self, gauge: IntGauge) -> Self {
        self.online_sessions = Some(gauge);
        self
    }

    pub fn db_status_setzen(&self, verbunden: bool) {
        self.db_connected.store(verbunden, Ordering::Relaxed);
    }

    /// Momentaufnahme fuer die Antwort
    pub fn bericht(&self) -> HealthResponse {
        let db_connected = self.db_connected.load(Ordering::Relaxed);
        HealthResponse {
            status: if db_connected {
                HealthStatus::Healthy
            } else {
                HealthStatus::Degraded
            },
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            db_connected,
            online_sessions: self.online_sessions.as_ref().map_or(0, |g| g.get()),
        }
    }
}

impl Default for HealthState {
    fn default() -> Self {
        Self::neu()
    }
}

/// Axum-Router fuer den `/health`-Endpunkt
pub fn health_router(state: HealthState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .with_state(state)
}

/// `GET /health` – 200 auch bei `degraded`, damit die Probe nicht scheitert
async fn health_handler(State(state): State<HealthState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.bericht()))
}
