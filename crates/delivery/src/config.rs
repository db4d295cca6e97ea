//! Konfigurationspunkte der Zustellung

use serde::{Deserialize, Serialize};

/// Verhalten bei einem zweiten `verbinden` fuer einen bereits verbundenen Namen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresencePolitik {
    /// Neue Sitzung ersetzt die alte (last write wins), die alte wird nicht benachrichtigt
    #[default]
    Ersetzen,
    /// Neue Sitzung wird mit `BereitsVerbunden` abgelehnt
    Ablehnen,
}

/// Ob der Absender einer Gruppennachricht selbst einen Push erhaelt
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FanoutPolitik {
    #[default]
    AbsenderAusschliessen,
    AbsenderEinschliessen,
}

/// Zustell-Konfiguration (`[zustellung]` in der Server-Konfiguration)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ZustellConfig {
    pub presence_politik: PresencePolitik,
    pub fanout_politik: FanoutPolitik,
    /// Groesstes angenommenes Chiffrat in Bytes
    pub max_chiffrat_bytes: usize,
    /// Kapazitaet der Push-Queue pro Sitzung
    pub push_queue_groesse: usize,
}

impl Default for ZustellConfig {
    fn default() -> Self {
        Self {
            presence_politik: PresencePolitik::default(),
            fanout_politik: FanoutPolitik::default(),
            max_chiffrat_bytes: 64 * 1024,
            push_queue_groesse: 64,
        }
    }
}
