//! kurier-server – Bibliotheks-Root
//!
//! Verdrahtet Datenbank, Zustellung, TCP-Transport und Observability und
//! stellt den oeffentlichen Einstiegspunkt fuer Integrationstests bereit.

pub mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use config::ServerConfig;
use kurier_db::SqliteDb;
use kurier_delivery::{PresenceTracker, Zustellrouter};
use kurier_observability::{observability_server_starten, HealthState, KurierMetriken};
use kurier_signaling::{SignalingServer, SignalingState};
use tokio::sync::{broadcast::error::RecvError, watch};

/// Haelt den Server-Zustand vor dem Binden zusammen
pub struct Server {
    pub config: ServerConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Oeffnet die Datenbank und bindet den TCP-Socket
    ///
    /// Reihenfolge:
    /// 1. Datenbankverbindung herstellen (inkl. Migrationen)
    /// 2. Metriken und PresenceTracker anlegen
    /// 3. Zustellrouter aufbauen
    /// 4. TCP-Listener binden
    pub async fn binden(self) -> Result<GebundenerServer> {
        let config = self.config;

        tracing::info!(
            server_name = %config.server.name,
            tcp = %config.tcp_bind_adresse(),
            "Server startet"
        );

        let db = SqliteDb::oeffnen(&config.datenbank_config())
            .await
            .with_context(|| format!("Datenbank '{}' nicht verfuegbar", config.datenbank.url))?;
        tracing::info!(url = %config.datenbank.url, "Datenbankverbindung hergestellt");

        let metriken = KurierMetriken::neu()?;
        let presence = PresenceTracker::neu(
            config.zustellung.presence_politik,
            config.zustellung.push_queue_groesse,
        );
        let router = Zustellrouter::neu(
            Arc::new(db),
            presence,
            config.zustellung.clone(),
            config.sicherheit,
        )
        .mit_metriken(metriken.clone());

        let state = Arc::new(SignalingState::neu(config.signaling_config(), router));
        let tcp_adresse: SocketAddr = config
            .tcp_bind_adresse()
            .parse()
            .with_context(|| format!("Ungueltige TCP-Adresse '{}'", config.tcp_bind_adresse()))?;
        let signaling = SignalingServer::binden(Arc::clone(&state), tcp_adresse)
            .await
            .with_context(|| format!("TCP-Port {tcp_adresse} nicht verfuegbar"))?;

        Ok(GebundenerServer {
            config,
            state,
            signaling,
            metriken,
        })
    }

    /// Startet alle Subsysteme und laeuft bis Ctrl-C
    pub async fn starten(self) -> Result<()> {
        let gebunden = self.binden().await?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => tracing::info!("Shutdown-Signal empfangen, Server wird beendet"),
                Err(e) => tracing::error!(fehler = %e, "Signal-Handler nicht verfuegbar"),
            }
            let _ = shutdown_tx.send(true);
        });

        gebunden.laufen(shutdown_rx).await
    }
}

/// Server mit offener Datenbank und gebundenem TCP-Socket
pub struct GebundenerServer {
    config: ServerConfig,
    state: Arc<SignalingState<SqliteDb>>,
    signaling: SignalingServer<SqliteDb>,
    metriken: KurierMetriken,
}

impl GebundenerServer {
    /// Tatsaechlich gebundene TCP-Adresse (Port 0 waehlt einen freien Port)
    pub fn tcp_adresse(&self) -> std::io::Result<SocketAddr> {
        self.signaling.lokale_adresse()
    }

    pub fn state(&self) -> &Arc<SignalingState<SqliteDb>> {
        &self.state
    }

    pub fn metriken(&self) -> &KurierMetriken {
        &self.metriken
    }

    /// Laeuft bis `shutdown_rx` `true` meldet
    ///
    /// Muss auf dem Thread des Aufrufers laufen: der TCP-Transport nutzt
    /// eine `LocalSet`.
    pub async fn laufen(self, shutdown_rx: watch::Receiver<bool>) -> Result<()> {
        let gauge_task = tokio::spawn(sitzungs_gauge_nachfuehren(
            self.state.router.presence().clone(),
            self.metriken.clone(),
        ));

        let observability_task = if self.config.observability.aktiviert {
            let adresse: SocketAddr = self
                .config
                .observability_bind_adresse()
                .parse()
                .context("Ungueltige Observability-Adresse")?;
            let health = HealthState::neu().mit_sitzungs_gauge(self.metriken.online_sessions.clone());
            let mut rx = shutdown_rx.clone();
            let shutdown = async move {
                let _ = rx.wait_for(|beenden| *beenden).await;
            };
            Some(tokio::spawn(observability_server_starten(
                adresse,
                self.metriken.clone(),
                health,
                shutdown,
            )))
        } else {
            None
        };

        tracing::info!("Server laeuft. Warte auf Shutdown-Signal (Ctrl-C)...");
        let ergebnis = self.signaling.starten(shutdown_rx).await;

        gauge_task.abort();
        if let Some(task) = observability_task {
            match task.await {
                Ok(Err(e)) => tracing::warn!(fehler = %e, "Observability-Server beendet mit Fehler"),
                Err(e) => tracing::warn!(fehler = %e, "Observability-Task abgebrochen"),
                Ok(Ok(())) => {}
            }
        }

        ergebnis.context("TCP-Transport beendet mit Fehler")?;
        tracing::info!("Server beendet");
        Ok(())
    }
}

/// Haelt den Gauge `kurier_online_sessions` aus den Presence-Events aktuell
pub async fn sitzungs_gauge_nachfuehren(presence: PresenceTracker, metriken: KurierMetriken) {
    let mut events = presence.events_abonnieren();
    metriken.online_sessions.set(presence.online_anzahl() as i64);

    loop {
        match events.recv().await {
            Ok(event) => {
                tracing::trace!(?event, "Presence-Event");
                metriken.online_sessions.set(presence.online_anzahl() as i64);
            }
            Err(RecvError::Lagged(verpasst)) => {
                tracing::debug!(verpasst, "Presence-Events uebersprungen");
                metriken.online_sessions.set(presence.online_anzahl() as i64);
            }
            Err(RecvError::Closed) => break,
        }
    }
}
