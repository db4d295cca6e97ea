//! Oeffentliche Typen fuer Postfach und Gruppen

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use kurier_core::NachrichtId;
use kurier_db::models::{DirektnachrichtRecord, GruppenRecord, GruppennachrichtRecord};

/// Eine Direktnachricht aus dem Postfach (Domain-Typ, nicht DB-Record)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Direktnachricht {
    pub id: NachrichtId,
    pub absender: String,
    pub empfaenger: String,
    #[serde(with = "kurier_core::serde_b64")]
    pub chiffrat: Vec<u8>,
    pub zugestellt: bool,
    pub gelesen: bool,
    pub erstellt_am: DateTime<Utc>,
}

impl From<DirektnachrichtRecord> for Direktnachricht {
    fn from(record: DirektnachrichtRecord) -> Self {
        Self {
            id: NachrichtId(record.id),
            absender: record.sender,
            empfaenger: record.recipient,
            chiffrat: record.ciphertext,
            zugestellt: record.delivered,
            gelesen: record.read,
            erstellt_am: record.created_at,
        }
    }
}

/// Eine Gruppe mit Mitgliedern in Beitrittsreihenfolge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gruppe {
    pub name: String,
    pub ersteller: String,
    pub mitglieder: Vec<String>,
    pub erstellt_am: DateTime<Utc>,
}

impl From<GruppenRecord> for Gruppe {
    fn from(record: GruppenRecord) -> Self {
        Self {
            name: record.name,
            ersteller: record.creator,
            mitglieder: record.members,
            erstellt_am: record.created_at,
        }
    }
}

/// Ein Eintrag im Gruppen-Log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gruppennachricht {
    pub gruppe: String,
    pub absender: String,
    #[serde(with = "kurier_core::serde_b64")]
    pub chiffrat: Vec<u8>,
    pub erstellt_am: DateTime<Utc>,
}

impl From<GruppennachrichtRecord> for Gruppennachricht {
    fn from(record: GruppennachrichtRecord) -> Self {
        Self {
            gruppe: record.group_name,
            absender: record.sender,
            chiffrat: record.ciphertext,
            erstellt_am: record.created_at,
        }
    }
}
