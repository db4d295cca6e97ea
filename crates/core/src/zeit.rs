//! Gemeinsames Zeitstempel-Format
//!
//! Zeitstempel werden als UTC RFC 3339 mit Mikrosekunden und `Z`-Suffix
//! gespeichert. Damit entspricht die Textreihenfolge der Zeitreihenfolge.

use chrono::{DateTime, SecondsFormat, Utc};

/// Formatiert einen Zeitstempel im sortierbaren Speicherformat
pub fn zeitstempel_text(zeit: &DateTime<Utc>) -> String {
    zeit.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Liest einen Zeitstempel im Speicherformat (oder beliebigem RFC 3339)
pub fn zeitstempel_lesen(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
