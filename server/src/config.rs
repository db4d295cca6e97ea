//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Server ohne Konfigurationsdatei
//! lauffaehig ist.

use std::time::Duration;

use anyhow::{bail, Context};
use kurier_auth::PasswortParameter;
use kurier_db::DatabaseConfig;
use kurier_delivery::ZustellConfig;
use kurier_observability::logging::{log_format_gueltig, log_level_gueltig};
use kurier_protocol::wire::DEFAULT_MAX_FRAME_SIZE;
use kurier_signaling::SignalingConfig;
use serde::{Deserialize, Serialize};

/// Vollstaendige Server-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Allgemeine Server-Einstellungen
    pub server: ServerEinstellungen,
    /// Netzwerk-Einstellungen
    pub netzwerk: NetzwerkEinstellungen,
    /// Datenbank-Einstellungen
    pub datenbank: DatenbankEinstellungen,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
    /// Presence- und Fanout-Politik, Chiffrat-Grenzen
    pub zustellung: ZustellConfig,
    /// Argon2-Parameter fuer Passwort-Hashes
    pub sicherheit: PasswortParameter,
    /// Observability-Einstellungen (Metriken, Health)
    pub observability: ObservabilityEinstellungen,
}

/// Allgemeine Server-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerEinstellungen {
    /// Anzeigename des Servers (nur fuer Logs)
    pub name: String,
    /// Maximale Anzahl gleichzeitig angemeldeter Sitzungen
    pub max_clients: usize,
}

impl Default for ServerEinstellungen {
    fn default() -> Self {
        Self {
            name: "Kurier Server".into(),
            max_clients: 512,
        }
    }
}

/// Netzwerk-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetzwerkEinstellungen {
    /// Bind-Adresse fuer TCP und Observability
    pub bind_adresse: String,
    /// Port fuer das Frame-Protokoll
    pub tcp_port: u16,
    /// Inaktive Verbindungen werden nach so vielen Sekunden geschlossen
    pub verbindungs_timeout_sek: u64,
    /// Groesster angenommener Frame in Bytes
    pub max_frame_bytes: usize,
}

impl Default for NetzwerkEinstellungen {
    fn default() -> Self {
        Self {
            bind_adresse: "0.0.0.0".into(),
            tcp_port: 7420,
            verbindungs_timeout_sek: 300,
            max_frame_bytes: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

/// Datenbank-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatenbankEinstellungen {
    /// Verbindungs-URL
    pub url: String,
    /// Maximale Verbindungspool-Groesse
    pub max_verbindungen: u32,
    /// WAL-Journal aktivieren
    pub wal: bool,
}

impl Default for DatenbankEinstellungen {
    fn default() -> Self {
        let standard = DatabaseConfig::default();
        Self {
            url: standard.url,
            max_verbindungen: standard.max_verbindungen,
            wal: standard.sqlite_wal,
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

/// Observability-Einstellungen (Metriken + Health-Check)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityEinstellungen {
    /// Aktiviert den Observability-Server
    pub aktiviert: bool,
    /// Port fuer Metriken und Health (Standard: 9300)
    pub port: u16,
}

impl Default for ObservabilityEinstellungen {
    fn default() -> Self {
        Self {
            aktiviert: true,
            port: 9300,
        }
    }
}

impl ServerConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        let config = match std::fs::read_to_string(pfad) {
            Ok(inhalt) => toml::from_str::<Self>(&inhalt)
                .with_context(|| format!("Konfigurationsfehler in '{pfad}'"))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Self::default()
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Konfigurationsdatei '{pfad}' nicht lesbar"))
            }
        };
        config.validieren()?;
        Ok(config)
    }

    /// Prueft Werte, die serde allein nicht abfangen kann
    pub fn validieren(&self) -> anyhow::Result<()> {
        if !log_level_gueltig(&self.logging.level) {
            bail!("Unbekanntes Log-Level '{}'", self.logging.level);
        }
        if !log_format_gueltig(&self.logging.format) {
            bail!("Unbekanntes Log-Format '{}'", self.logging.format);
        }
        if self.zustellung.max_chiffrat_bytes == 0 {
            bail!("zustellung.max_chiffrat_bytes muss groesser als 0 sein");
        }
        if self.zustellung.push_queue_groesse == 0 {
            bail!("zustellung.push_queue_groesse muss groesser als 0 sein");
        }
        // Base64 blaeht das Chiffrat im JSON-Frame um ein Drittel auf
        let chiffrat_im_frame = self.zustellung.max_chiffrat_bytes.div_ceil(3) * 4;
        if chiffrat_im_frame >= self.netzwerk.max_frame_bytes {
            bail!(
                "netzwerk.max_frame_bytes ({}) zu klein fuer zustellung.max_chiffrat_bytes ({})",
                self.netzwerk.max_frame_bytes,
                self.zustellung.max_chiffrat_bytes
            );
        }
        if self.server.max_clients == 0 {
            bail!("server.max_clients muss groesser als 0 sein");
        }
        Ok(())
    }

    /// Gibt die vollstaendige Bind-Adresse fuer TCP zurueck
    pub fn tcp_bind_adresse(&self) -> String {
        format!("{}:{}", self.netzwerk.bind_adresse, self.netzwerk.tcp_port)
    }

    /// Gibt die Bind-Adresse fuer den Observability-Server zurueck
    pub fn observability_bind_adresse(&self) -> String {
        format!("{}:{}", self.netzwerk.bind_adresse, self.observability.port)
    }

    pub fn datenbank_config(&self) -> DatabaseConfig {
        DatabaseConfig {
            url: self.datenbank.url.clone(),
            max_verbindungen: self.datenbank.max_verbindungen,
            sqlite_wal: self.datenbank.wal,
        }
    }

    pub fn signaling_config(&self) -> SignalingConfig {
        SignalingConfig {
            max_clients: self.server.max_clients,
            verbindungs_timeout: Duration::from_secs(self.netzwerk.verbindungs_timeout_sek),
            max_frame_bytes: self.netzwerk.max_frame_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurier_delivery::{FanoutPolitik, PresencePolitik};

    #[test]
    fn standard_config_ist_valide() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.server.max_clients, 512);
        assert_eq!(cfg.netzwerk.tcp_port, 7420);
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.zustellung.presence_politik, PresencePolitik::Ersetzen);
        assert_eq!(cfg.sicherheit, PasswortParameter::default());
        cfg.validieren().unwrap();
    }

    #[test]
    fn bind_adressen() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.tcp_bind_adresse(), "0.0.0.0:7420");
        assert_eq!(cfg.observability_bind_adresse(), "0.0.0.0:9300");
    }

    #[test]
    fn config_aus_toml_string() {
        let toml = r#"
            [server]
            name = "Mein Server"
            max_clients = 100

            [netzwerk]
            tcp_port = 10000
            verbindungs_timeout_sek = 30

            [zustellung]
            presence_politik = "ablehnen"
            fanout_politik = "absender_einschliessen"

            [sicherheit]
            speicher_kib = 19456
            iterationen = 2
        "#;
        let cfg: ServerConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.server.name, "Mein Server");
        assert_eq!(cfg.netzwerk.tcp_port, 10000);
        assert_eq!(cfg.zustellung.presence_politik, PresencePolitik::Ablehnen);
        assert_eq!(cfg.zustellung.fanout_politik, FanoutPolitik::AbsenderEinschliessen);
        assert_eq!(cfg.sicherheit.speicher_kib, 19456);
        // Nicht angegebene Felder behalten Standardwerte
        assert_eq!(cfg.sicherheit.parallelitaet, 1);
        assert_eq!(cfg.zustellung.max_chiffrat_bytes, 64 * 1024);
        assert_eq!(cfg.netzwerk.bind_adresse, "0.0.0.0");

        let signaling = cfg.signaling_config();
        assert_eq!(signaling.max_clients, 100);
        assert_eq!(signaling.verbindungs_timeout, Duration::from_secs(30));
    }

    #[test]
    fn validierung_lehnt_unsinnige_werte_ab() {
        let mut cfg = ServerConfig::default();
        cfg.logging.level = "verbose".into();
        assert!(cfg.validieren().is_err());

        let mut cfg = ServerConfig::default();
        cfg.zustellung.push_queue_groesse = 0;
        assert!(cfg.validieren().is_err());

        let mut cfg = ServerConfig::default();
        cfg.netzwerk.max_frame_bytes = 1024;
        assert!(cfg.validieren().is_err());
    }

    #[test]
    fn fehlende_datei_liefert_standardwerte() {
        let cfg = ServerConfig::laden("/nicht/vorhanden/kurier.toml").unwrap();
        assert_eq!(cfg.server.name, "Kurier Server");
    }

    #[test]
    fn kaputte_datei_ist_ein_fehler() {
        let pfad = std::env::temp_dir().join(format!("kurier-config-{}.toml", std::process::id()));
        std::fs::write(&pfad, "[server\nname = ").unwrap();
        let ergebnis = ServerConfig::laden(pfad.to_str().unwrap());
        std::fs::remove_file(&pfad).ok();
        assert!(ergebnis.is_err());
    }

    #[test]
    fn datenbank_config_wird_uebernommen() {
        let mut cfg = ServerConfig::default();
        cfg.datenbank.url = "sqlite://test.db".into();
        cfg.datenbank.wal = false;
        let db = cfg.datenbank_config();
        assert_eq!(db.url, "sqlite://test.db");
        assert!(!db.sqlite_wal);
    }
}
