//! Postfach – dauerhafte Ablage fuer Direktnachrichten und Gruppen-Log
//!
//! Direktnachrichten werden mit `zugestellt = false` abgelegt und beim
//! Abholen in einem Schritt geliefert und markiert. Das Gruppen-Log kennt
//! keinen Zustellstatus und bleibt jederzeit abrufbar.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use kurier_core::NachrichtId;
use kurier_db::{
    models::{NeueDirektnachricht, NeueGruppennachricht},
    DirektnachrichtRepository, GruppennachrichtRepository,
};

use crate::{
    error::{ChatError, ChatResult},
    types::{Direktnachricht, Gruppennachricht},
};

/// Postfach ueber einem Repository fuer Direkt- und Gruppennachrichten
pub struct Postfach<R: DirektnachrichtRepository + GruppennachrichtRepository> {
    repo: Arc<R>,
}

impl<R: DirektnachrichtRepository + GruppennachrichtRepository> Postfach<R> {
    pub fn neu(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Legt eine Direktnachricht unzugestellt und ungelesen ab
    pub async fn anhaengen(
        &self,
        absender: &str,
        empfaenger: &str,
        chiffrat: &[u8],
    ) -> ChatResult<Direktnachricht> {
        let record = DirektnachrichtRepository::create(
            self.repo.as_ref(),
            NeueDirektnachricht {
                sender: absender,
                recipient: empfaenger,
                ciphertext: chiffrat,
            },
        )
        .await?;

        tracing::debug!(
            nachricht = %record.id,
            absender = %absender,
            empfaenger = %empfaenger,
            "Direktnachricht im Postfach abgelegt"
        );
        Ok(record.into())
    }

    /// Holt alle unzugestellten Nachrichten ab (aelteste zuerst)
    ///
    /// Jede Nachricht wird genau einmal geliefert.
    pub async fn abholen(&self, username: &str) -> ChatResult<Vec<Direktnachricht>> {
        let records = self.repo.drain_undelivered(username).await?;
        if !records.is_empty() {
            tracing::debug!(username = %username, anzahl = records.len(), "Postfach abgeholt");
        }
        Ok(records.into_iter().map(Direktnachricht::from).collect())
    }

    /// Markiert eine Nachricht als gelesen (idempotent)
    pub async fn als_gelesen_markieren(&self, id: NachrichtId) -> ChatResult<()> {
        if !self.repo.mark_read(id.inner()).await? {
            return Err(ChatError::NachrichtNichtGefunden(id.to_string()));
        }
        Ok(())
    }

    /// Laedt eine einzelne Direktnachricht
    pub async fn nachricht_laden(&self, id: NachrichtId) -> ChatResult<Direktnachricht> {
        DirektnachrichtRepository::get_by_id(self.repo.as_ref(), id.inner())
            .await?
            .map(Direktnachricht::from)
            .ok_or_else(|| ChatError::NachrichtNichtGefunden(id.to_string()))
    }

    /// Anzahl wartender Nachrichten eines Empfaengers
    pub async fn unzugestellt_anzahl(&self, username: &str) -> ChatResult<i64> {
        Ok(self.repo.count_undelivered(username).await?)
    }

    /// Haengt eine Nachricht an das Gruppen-Log an
    pub async fn gruppennachricht_anhaengen(
        &self,
        gruppe: &str,
        absender: &str,
        chiffrat: &[u8],
    ) -> ChatResult<Gruppennachricht> {
        let record = GruppennachrichtRepository::create(
            self.repo.as_ref(),
            NeueGruppennachricht {
                group_name: gruppe,
                sender: absender,
                ciphertext: chiffrat,
            },
        )
        .await?;
        Ok(record.into())
    }

    /// Gruppen-Log ab einem Zeitpunkt (exklusiv), aufsteigend sortiert
    pub async fn gruppennachrichten_seit(
        &self,
        gruppe: &str,
        seit: Option<DateTime<Utc>>,
    ) -> ChatResult<Vec<Gruppennachricht>> {
        let records = self.repo.since(gruppe, seit).await?;
        Ok(records.into_iter().map(Gruppennachricht::from).collect())
    }
}
