//! Prometheus-kompatible Metriken fuer Kurier
//!
//! Registrierte Metriken:
//! - `kurier_online_sessions` – Gauge: Aktuell verbundene Sitzungen
//! - `kurier_direct_live_total` – Counter: Live zugestellte Direktnachrichten
//! - `kurier_direct_stored_total` – Counter: Im Postfach abgelegte Direktnachrichten
//! - `kurier_group_messages_total` – Counter: Gruppennachrichten im Log
//! - `kurier_fanout_pushes_total` – Counter: Erfolgreiche Fanout-Pushes
//! - `kurier_delivery_misses_total` – Counter: Verpasste Live-Zustellungen
//! - `kurier_drained_messages_total` – Counter: Aus dem Postfach abgeholte Nachrichten

use anyhow::Result;
use axum::{extract::State, response::IntoResponse, routing::get, Router};
use prometheus::{Encoder, IntCounter, IntGauge, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Alle Kurier-Prometheus-Metriken
#[derive(Clone)]
pub struct KurierMetriken {
    pub registry: Arc<Registry>,

    pub online_sessions: IntGauge,
    pub direct_live_total: IntCounter,
    pub direct_stored_total: IntCounter,
    pub group_messages_total: IntCounter,
    pub fanout_pushes_total: IntCounter,
    pub delivery_misses_total: IntCounter,
    pub drained_messages_total: IntCounter,
}

impl KurierMetriken {
    /// Erstellt und registriert alle Metriken in einer neuen Registry
    pub fn neu() -> Result<Self> {
        let registry = Registry::new();

        let online_sessions = IntGauge::with_opts(Opts::new(
            "kurier_online_sessions",
            "Anzahl aktuell verbundener Sitzungen",
        ))?;
        registry.register(Box::new(online_sessions.clone()))?;

        let zaehler = |name: &str, hilfe: &str| -> Result<IntCounter> {
            let counter = IntCounter::with_opts(Opts::new(name, hilfe))?;
            registry.register(Box::new(counter.clone()))?;
            Ok(counter)
        };

        let direct_live_total = zaehler(
            "kurier_direct_live_total",
            "Live an eine Sitzung zugestellte Direktnachrichten",
        )?;
        let direct_stored_total = zaehler(
            "kurier_direct_stored_total",
            "Im Postfach abgelegte Direktnachrichten",
        )?;
        let group_messages_total = zaehler(
            "kurier_group_messages_total",
            "An ein Gruppen-Log angehaengte Nachrichten",
        )?;
        let fanout_pushes_total = zaehler(
            "kurier_fanout_pushes_total",
            "Erfolgreiche Live-Pushes von Gruppennachrichten",
        )?;
        let delivery_misses_total = zaehler(
            "kurier_delivery_misses_total",
            "Live-Pushes, die trotz Online-Status scheiterten",
        )?;
        let drained_messages_total = zaehler(
            "kurier_drained_messages_total",
            "Aus dem Postfach abgeholte Direktnachrichten",
        )?;

        Ok(Self {
            registry: Arc::new(registry),
            online_sessions,
            direct_live_total,
            direct_stored_total,
            group_messages_total,
            fanout_pushes_total,
            delivery_misses_total,
            drained_messages_total,
        })
    }

    /// Exportiert alle Metriken im Prometheus-Textformat
    pub fn exportieren(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Axum-Router fuer den `/metrics`-Endpunkt
pub fn metrics_router(metriken: KurierMetriken) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metriken)
}

async fn metrics_handler(State(metriken): State<KurierMetriken>) -> impl IntoResponse {
    match metriken.exportieren() {
        Ok(text) => (
            axum::http::StatusCode::OK,
            [(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(err) => {
            tracing::error!("Metriken-Export fehlgeschlagen: {err}");
            axum::http::StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
