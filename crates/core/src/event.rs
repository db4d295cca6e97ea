//! Live-Push-Ereignisse
//!
//! Eine `Zustellung` ist das, was der Zustellrouter in den Live-Kanal einer
//! Sitzung schiebt. Der Inhalt bleibt ein opakes Chiffrat.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ein an eine Live-Sitzung gepushtes Chiffrat
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "art", rename_all = "snake_case")]
pub enum Zustellung {
    /// Direktnachricht (nicht persistiert, kein Zustellbeleg)
    Direkt {
        absender: String,
        #[serde(with = "crate::serde_b64")]
        chiffrat: Vec<u8>,
        gesendet_am: DateTime<Utc>,
    },
    /// Gruppennachricht (bereits im Gruppen-Log persistiert)
    Gruppe {
        gruppe: String,
        absender: String,
        #[serde(with = "crate::serde_b64")]
        chiffrat: Vec<u8>,
        erstellt_am: DateTime<Utc>,
    },
}

impl Zustellung {
    /// Gibt den Absender der Zustellung zurueck
    pub fn absender(&self) -> &str {
        match self {
            Self::Direkt { absender, .. } | Self::Gruppe { absender, .. } => absender,
        }
    }

    /// Gibt das Chiffrat der Zustellung zurueck
    pub fn chiffrat(&self) -> &[u8] {
        match self {
            Self::Direkt { chiffrat, .. } | Self::Gruppe { chiffrat, .. } => chiffrat,
        }
    }
}
