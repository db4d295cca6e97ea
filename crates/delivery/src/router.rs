//! Zustellrouter – entscheidet zwischen Live-Push und Postfach
//!
//! Pro Direktnachricht: `Eingereicht -> {LiveZugestellt | Gespeichert}`.
//! Gruppennachrichten landen immer im Gruppen-Log und werden danach an alle
//! erreichbaren Mitglieder verteilt. Validierungsfehler brechen vor jeder
//! Persistenz und jedem Push ab; Fehler einzelner Live-Kanaele nicht.
//!
//! Zwischen Presence-Pruefung und Schreiben gibt es keine Transaktion.
//! Wechselt der Empfaenger genau dazwischen den Status, kann eine Nachricht
//! gespeichert und zusaetzlich live verpasst werden (best effort).

use std::sync::Arc;

use chrono::{DateTime, Utc};

use kurier_auth::{PasswortParameter, SchluesselRegister};
use kurier_chat::{
    ChatError, Direktnachricht, GruppenVerwaltung, Gruppennachricht, Postfach,
};
use kurier_core::{NachrichtId, Zustellung};
use kurier_db::{
    DirektnachrichtRepository, GruppenRepository, GruppennachrichtRepository,
    IdentitaetRepository,
};
use kurier_observability::KurierMetriken;

use crate::config::{FanoutPolitik, ZustellConfig};
use crate::error::{ZustellFehler, ZustellResult};
use crate::presence::PresenceTracker;

// ---------------------------------------------------------------------------
// Ergebnistypen
// ---------------------------------------------------------------------------

/// Endzustand einer eingereichten Direktnachricht
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zustellstatus {
    /// In die Push-Queue der Empfaenger-Sitzung eingereiht, nicht persistiert
    LiveZugestellt,
    /// Im Postfach des Empfaengers abgelegt
    Gespeichert { nachricht_id: NachrichtId },
}

/// Ergebnis einer Gruppen-Sendung
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GruppenZustellung {
    /// Der persistierte Log-Eintrag
    pub nachricht: Gruppennachricht,
    /// Anzahl erfolgreicher Live-Pushes
    pub live_zugestellt: usize,
    /// Mitglieder die online erschienen, deren Push aber scheiterte
    pub verpasst: usize,
}

/// Bound fuer alle Repositories, die der Router braucht
pub trait ZustellRepository:
    IdentitaetRepository
    + DirektnachrichtRepository
    + GruppenRepository
    + GruppennachrichtRepository
{
}

impl<T> ZustellRepository for T where
    T: IdentitaetRepository
        + DirektnachrichtRepository
        + GruppenRepository
        + GruppennachrichtRepository
{
}

// ---------------------------------------------------------------------------
// Zustellrouter
// ---------------------------------------------------------------------------

/// Orchestriert Schluesselregister, Gruppen, Postfach und Presence
pub struct Zustellrouter<R: ZustellRepository> {
    register: SchluesselRegister<R>,
    gruppen: GruppenVerwaltung<R>,
    postfach: Postfach<R>,
    presence: PresenceTracker,
    config: ZustellConfig,
    metriken: Option<KurierMetriken>,
}

impl<R: ZustellRepository> Zustellrouter<R> {
    /// Erstellt einen Router; der PresenceTracker wird von aussen injiziert
    pub fn neu(
        repo: Arc<R>,
        presence: PresenceTracker,
        config: ZustellConfig,
        passwort_parameter: PasswortParameter,
    ) -> Self {
        Self {
            register: SchluesselRegister::neu(Arc::clone(&repo), passwort_parameter),
            gruppen: GruppenVerwaltung::neu(Arc::clone(&repo)),
            postfach: Postfach::neu(repo),
            presence,
            config,
            metriken: None,
        }
    }

    /// Haengt Prometheus-Zaehler an
    pub fn mit_metriken(mut self, metriken: KurierMetriken) -> Self {
        self.metriken = Some(metriken);
        self
    }

    pub fn register(&self) -> &SchluesselRegister<R> {
        &self.register
    }

    pub fn gruppen(&self) -> &GruppenVerwaltung<R> {
        &self.gruppen
    }

    pub fn postfach(&self) -> &Postfach<R> {
        &self.postfach
    }

    pub fn presence(&self) -> &PresenceTracker {
        &self.presence
    }

    pub fn config(&self) -> &ZustellConfig {
        &self.config
    }

    fn zaehlen(&self, f: impl FnOnce(&KurierMetriken)) {
        if let Some(m) = &self.metriken {
            f(m);
        }
    }

    fn chiffrat_pruefen(&self, chiffrat: &[u8]) -> ZustellResult<()> {
        if chiffrat.is_empty() {
            return Err(ZustellFehler::UngueltigeEingabe(
                "Chiffrat darf nicht leer sein".into(),
            ));
        }
        if chiffrat.len() > self.config.max_chiffrat_bytes {
            return Err(ZustellFehler::UngueltigeEingabe(format!(
                "Chiffrat zu gross: {} > {} Bytes",
                chiffrat.len(),
                self.config.max_chiffrat_bytes
            )));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Direktnachrichten
    // -----------------------------------------------------------------------

    /// Sendet eine Direktnachricht
    ///
    /// Ist der Empfaenger online, wird nur gepusht und nichts gespeichert.
    /// Scheitert der Push trotzdem (Queue voll oder Sitzung gerade
    /// geschlossen), wird die Nachricht ins Postfach gelegt.
    pub async fn direkt_senden(
        &self,
        absender: &str,
        empfaenger: &str,
        chiffrat: Vec<u8>,
    ) -> ZustellResult<Zustellstatus> {
        self.chiffrat_pruefen(&chiffrat)?;
        if !self.register.existiert(absender).await? {
            return Err(ZustellFehler::AbsenderUnbekannt(absender.to_string()));
        }
        if !self.register.existiert(empfaenger).await? {
            return Err(ZustellFehler::UnbekannterEmpfaenger(empfaenger.to_string()));
        }

        let status = match self.presence.ist_online(empfaenger) {
            Some(kanal) => {
                let zustellung = Zustellung::Direkt {
                    absender: absender.to_string(),
                    chiffrat: chiffrat.clone(),
                    gesendet_am: Utc::now(),
                };
                match kanal.zustellen(zustellung) {
                    Ok(()) => {
                        tracing::debug!(
                            absender = %absender,
                            empfaenger = %empfaenger,
                            sitzung = %kanal.sitzung_id(),
                            "Direktnachricht live zugestellt"
                        );
                        self.zaehlen(|m| m.direct_live_total.inc());
                        Zustellstatus::LiveZugestellt
                    }
                    Err(verpasst) => {
                        tracing::warn!(
                            empfaenger = %empfaenger,
                            sitzung = %kanal.sitzung_id(),
                            grund = %verpasst,
                            "Live-Zustellung verpasst, lege im Postfach ab"
                        );
                        self.zaehlen(|m| m.delivery_misses_total.inc());
                        self.speichern(absender, empfaenger, &chiffrat).await?
                    }
                }
            }
            None => self.speichern(absender, empfaenger, &chiffrat).await?,
        };

        self.freundschaft_vermerken(absender, empfaenger).await;
        Ok(status)
    }

    async fn speichern(
        &self,
        absender: &str,
        empfaenger: &str,
        chiffrat: &[u8],
    ) -> ZustellResult<Zustellstatus> {
        let nachricht = self.postfach.anhaengen(absender, empfaenger, chiffrat).await?;
        self.zaehlen(|m| m.direct_stored_total.inc());
        Ok(Zustellstatus::Gespeichert {
            nachricht_id: nachricht.id,
        })
    }

    /// Freundschaft nach erfolgreicher Zustellung eintragen; Fehler nur loggen
    async fn freundschaft_vermerken(&self, absender: &str, empfaenger: &str) {
        if absender == empfaenger {
            return;
        }
        if let Err(e) = self.register.freundschaft_eintragen(absender, empfaenger).await {
            tracing::warn!(
                absender = %absender,
                empfaenger = %empfaenger,
                fehler = %e,
                "Freundschaft konnte nicht eingetragen werden"
            );
        }
    }

    /// Holt alle wartenden Direktnachrichten ab (jede genau einmal)
    pub async fn direkt_abholen(&self, username: &str) -> ZustellResult<Vec<Direktnachricht>> {
        if !self.register.existiert(username).await? {
            return Err(ZustellFehler::BenutzerNichtGefunden(username.to_string()));
        }
        let nachrichten = self.postfach.abholen(username).await?;
        let anzahl = nachrichten.len() as u64;
        self.zaehlen(|m| m.drained_messages_total.inc_by(anzahl));
        Ok(nachrichten)
    }

    /// Lesebestaetigung des Empfaengers
    ///
    /// Fremde Nachrichten werden wie unbekannte behandelt.
    pub async fn gelesen_bestaetigen(&self, username: &str, id: NachrichtId) -> ZustellResult<()> {
        let nachricht = self.postfach.nachricht_laden(id).await?;
        if nachricht.empfaenger != username {
            return Err(ChatError::NachrichtNichtGefunden(id.to_string()).into());
        }
        self.postfach.als_gelesen_markieren(id).await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Gruppennachrichten
    // -----------------------------------------------------------------------

    /// Sendet eine Gruppennachricht: erst ins Log, dann Fanout
    pub async fn gruppe_senden(
        &self,
        gruppe: &str,
        absender: &str,
        chiffrat: Vec<u8>,
    ) -> ZustellResult<GruppenZustellung> {
        self.chiffrat_pruefen(&chiffrat)?;
        let g = self.gruppen.laden(gruppe).await?;
        if !g.mitglieder.iter().any(|m| m == absender) {
            return Err(ChatError::KeinMitglied {
                gruppe: gruppe.to_string(),
                username: absender.to_string(),
            }
            .into());
        }

        let nachricht = self
            .postfach
            .gruppennachricht_anhaengen(gruppe, absender, &chiffrat)
            .await?;
        self.zaehlen(|m| m.group_messages_total.inc());

        let zustellung = Zustellung::Gruppe {
            gruppe: gruppe.to_string(),
            absender: absender.to_string(),
            chiffrat,
            erstellt_am: nachricht.erstellt_am,
        };

        let mut live_zugestellt = 0;
        let mut verpasst = 0;
        for mitglied in &g.mitglieder {
            if mitglied == absender
                && self.config.fanout_politik == FanoutPolitik::AbsenderAusschliessen
            {
                continue;
            }
            let Some(kanal) = self.presence.ist_online(mitglied) else {
                continue;
            };
            match kanal.zustellen(zustellung.clone()) {
                Ok(()) => live_zugestellt += 1,
                Err(grund) => {
                    verpasst += 1;
                    tracing::warn!(
                        gruppe = %gruppe,
                        username = %mitglied,
                        grund = %grund,
                        "Fanout an Mitglied verpasst"
                    );
                }
            }
        }

        self.zaehlen(|m| {
            m.fanout_pushes_total.inc_by(live_zugestellt as u64);
            m.delivery_misses_total.inc_by(verpasst as u64);
        });
        tracing::debug!(
            gruppe = %gruppe,
            absender = %absender,
            live = live_zugestellt,
            verpasst,
            "Gruppennachricht verteilt"
        );

        Ok(GruppenZustellung {
            nachricht,
            live_zugestellt,
            verpasst,
        })
    }

    /// Gruppen-Log ab `seit` (exklusiv); nur fuer Mitglieder
    pub async fn gruppennachrichten_seit(
        &self,
        username: &str,
        gruppe: &str,
        seit: Option<DateTime<Utc>>,
    ) -> ZustellResult<Vec<Gruppennachricht>> {
        let g = self.gruppen.laden(gruppe).await?;
        if !g.mitglieder.iter().any(|m| m == username) {
            return Err(ChatError::KeinMitglied {
                gruppe: gruppe.to_string(),
                username: username.to_string(),
            }
            .into());
        }
        Ok(self.postfach.gruppennachrichten_seit(gruppe, seit).await?)
    }
}
