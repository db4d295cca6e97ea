//! Presence-Tracker – wer ist gerade live erreichbar?
//!
//! Bildet jeden Benutzernamen auf hoechstens eine Live-Sitzung ab. Jede
//! Sitzung besitzt eine begrenzte Push-Queue; Pushes sind nicht-blockierend
//! und scheitern sofort, wenn die Queue voll oder geschlossen ist.
//! Aenderungen werden als `PresenceEvent` an Subscriber verteilt.

use std::collections::BTreeSet;
use std::sync::Arc;

use dashmap::{mapref::entry::Entry, DashMap};
use kurier_core::{SitzungsId, Zustellung};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};

use crate::config::PresencePolitik;
use crate::error::{ZustellFehler, ZustellResult};

// ---------------------------------------------------------------------------
// Presence-Events
// ---------------------------------------------------------------------------

/// Events die der PresenceTracker versendet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenceEvent {
    /// Benutzer war offline und hat jetzt eine Sitzung
    Verbunden { username: String, sitzung: SitzungsId },
    /// Eine neue Sitzung hat die bisherige ersetzt
    Ersetzt {
        username: String,
        alt: SitzungsId,
        neu: SitzungsId,
    },
    /// Die aktuelle Sitzung eines Benutzers wurde beendet
    Getrennt { username: String, sitzung: SitzungsId },
}

// ---------------------------------------------------------------------------
// Sitzungen und Zustellkanaele
// ---------------------------------------------------------------------------

/// Identifiziert genau eine Sitzung eines Benutzers
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SitzungsHandle {
    pub sitzung_id: SitzungsId,
    pub username: String,
}

/// Ergebnis von `verbinden`: Handle plus Empfangsseite der Push-Queue
///
/// Die Transportschicht liest aus `empfaenger` und schreibt auf die Leitung.
#[derive(Debug)]
pub struct Sitzung {
    pub handle: SitzungsHandle,
    pub empfaenger: mpsc::Receiver<Zustellung>,
}

/// Live-Push gescheitert, obwohl der Empfaenger online erschien
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ZustellungVerpasst {
    #[error("Push-Queue der Sitzung ist voll")]
    QueueVoll,
    #[error("Sitzung wurde bereits geschlossen")]
    Geschlossen,
}

/// Sendeseite der Push-Queue einer Sitzung
#[derive(Debug, Clone)]
pub struct ZustellKanal {
    sitzung_id: SitzungsId,
    username: String,
    tx: mpsc::Sender<Zustellung>,
}

impl ZustellKanal {
    pub fn sitzung_id(&self) -> SitzungsId {
        self.sitzung_id
    }

    /// Reiht eine Zustellung nicht-blockierend ein
    pub fn zustellen(&self, zustellung: Zustellung) -> Result<(), ZustellungVerpasst> {
        match self.tx.try_send(zustellung) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(
                    username = %self.username,
                    sitzung = %self.sitzung_id,
                    "Push-Queue voll – Zustellung verworfen"
                );
                Err(ZustellungVerpasst::QueueVoll)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(
                    username = %self.username,
                    sitzung = %self.sitzung_id,
                    "Push-Queue geschlossen (Sitzung beendet)"
                );
                Err(ZustellungVerpasst::Geschlossen)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// PresenceTracker
// ---------------------------------------------------------------------------

/// Groesse des Broadcast-Kanals fuer Presence-Events
const EVENT_KANAL_GROESSE: usize = 256;

/// Verwaltet die Live-Sitzungen aller Benutzer
///
/// Thread-safe via Arc + DashMap. Clone teilt den inneren Zustand.
#[derive(Clone)]
pub struct PresenceTracker {
    inner: Arc<PresenceTrackerInner>,
}

struct PresenceTrackerInner {
    /// Aktuelle Sitzung je Benutzername
    sitzungen: DashMap<String, ZustellKanal>,
    event_tx: broadcast::Sender<PresenceEvent>,
    politik: PresencePolitik,
    queue_groesse: usize,
}

impl PresenceTracker {
    /// Erstellt einen neuen PresenceTracker
    pub fn neu(politik: PresencePolitik, queue_groesse: usize) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_KANAL_GROESSE);
        Self {
            inner: Arc::new(PresenceTrackerInner {
                sitzungen: DashMap::new(),
                event_tx,
                politik,
                queue_groesse: queue_groesse.max(1),
            }),
        }
    }

    /// Registriert eine neue Live-Sitzung fuer `username`
    ///
    /// Ist der Name bereits verbunden, entscheidet die `PresencePolitik`:
    /// `Ersetzen` verdraengt die alte Sitzung ohne sie zu benachrichtigen,
    /// `Ablehnen` liefert `BereitsVerbunden`.
    pub fn verbinden(&self, username: &str) -> ZustellResult<Sitzung> {
        let (tx, rx) = mpsc::channel(self.inner.queue_groesse);
        let sitzung_id = SitzungsId::new();
        let kanal = ZustellKanal {
            sitzung_id,
            username: username.to_string(),
            tx,
        };

        // Pruefen und Einfuegen unter derselben Shard-Sperre
        let event = match self.inner.sitzungen.entry(username.to_string()) {
            Entry::Occupied(mut eintrag) => match self.inner.politik {
                PresencePolitik::Ablehnen => {
                    return Err(ZustellFehler::BereitsVerbunden(username.to_string()));
                }
                PresencePolitik::Ersetzen => {
                    let alt = eintrag.insert(kanal);
                    PresenceEvent::Ersetzt {
                        username: username.to_string(),
                        alt: alt.sitzung_id,
                        neu: sitzung_id,
                    }
                }
            },
            Entry::Vacant(eintrag) => {
                eintrag.insert(kanal);
                PresenceEvent::Verbunden {
                    username: username.to_string(),
                    sitzung: sitzung_id,
                }
            }
        };

        tracing::info!(username = %username, sitzung = %sitzung_id, "Sitzung verbunden");
        let _ = self.inner.event_tx.send(event);

        Ok(Sitzung {
            handle: SitzungsHandle {
                sitzung_id,
                username: username.to_string(),
            },
            empfaenger: rx,
        })
    }

    /// Beendet eine Sitzung
    ///
    /// Entfernt den Eintrag nur, wenn er noch zu `handle` gehoert; eine
    /// veraltete Trennung verdraengt keine neuere Sitzung.
    pub fn trennen(&self, handle: &SitzungsHandle) -> bool {
        let entfernt = self
            .inner
            .sitzungen
            .remove_if(&handle.username, |_, kanal| {
                kanal.sitzung_id == handle.sitzung_id
            })
            .is_some();

        if entfernt {
            tracing::info!(
                username = %handle.username,
                sitzung = %handle.sitzung_id,
                "Sitzung getrennt"
            );
            let _ = self.inner.event_tx.send(PresenceEvent::Getrennt {
                username: handle.username.clone(),
                sitzung: handle.sitzung_id,
            });
        } else {
            tracing::debug!(
                username = %handle.username,
                sitzung = %handle.sitzung_id,
                "Veraltete Trennung ignoriert"
            );
        }
        entfernt
    }

    /// Liefert den Zustellkanal der aktuellen Sitzung, falls online
    pub fn ist_online(&self, username: &str) -> Option<ZustellKanal> {
        self.inner.sitzungen.get(username).map(|e| e.value().clone())
    }

    /// Momentaufnahme aller verbundenen Benutzer, alphabetisch
    pub fn online_liste(&self) -> BTreeSet<String> {
        self.inner
            .sitzungen
            .iter()
            .map(|e| e.key().clone())
            .collect()
    }

    /// Gibt die Anzahl der verbundenen Benutzer zurueck
    pub fn online_anzahl(&self) -> usize {
        self.inner.sitzungen.len()
    }

    pub fn politik(&self) -> PresencePolitik {
        self.inner.politik
    }

    /// Abonniert Presence-Events
    pub fn events_abonnieren(&self) -> broadcast::Receiver<PresenceEvent> {
        self.inner.event_tx.subscribe()
    }
}

impl Default for PresenceTracker {
    fn default() -> Self {
        Self::neu(PresencePolitik::default(), 64)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
