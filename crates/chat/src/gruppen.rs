//! Gruppenverwaltung – Existenz und Mitgliederlisten benannter Gruppen
//!
//! Mitglieder werden nur hinzugefuegt, nie entfernt. Der Ersteller ist
//! immer erstes Mitglied.

use std::sync::Arc;

use kurier_db::{models::NeueGruppe, GruppenRepository, IdentitaetRepository};

use crate::{
    error::{ChatError, ChatResult},
    types::Gruppe,
};

/// Verwaltet Gruppen und prueft Mitglieder gegen die Identitaeten
pub struct GruppenVerwaltung<R: GruppenRepository + IdentitaetRepository> {
    repo: Arc<R>,
}

impl<R: GruppenRepository + IdentitaetRepository> GruppenVerwaltung<R> {
    pub fn neu(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Legt eine Gruppe an
    ///
    /// Der Ersteller wird immer aufgenommen, auch wenn er in
    /// `initiale_mitglieder` fehlt. Doppelte Namen werden ignoriert.
    pub async fn erstellen(
        &self,
        name: &str,
        ersteller: &str,
        initiale_mitglieder: &[String],
    ) -> ChatResult<Gruppe> {
        if name.trim().is_empty() {
            return Err(ChatError::UngueltigeEingabe(
                "Gruppenname darf nicht leer sein".into(),
            ));
        }

        if GruppenRepository::get(self.repo.as_ref(), name).await?.is_some() {
            return Err(ChatError::GruppeExistiert(name.to_string()));
        }

        let mut mitglieder = vec![ersteller.to_string()];
        for mitglied in initiale_mitglieder {
            if !mitglieder.contains(mitglied) {
                mitglieder.push(mitglied.clone());
            }
        }

        for mitglied in &mitglieder {
            if !self.repo.exists(mitglied).await? {
                return Err(ChatError::UnbekanntesMitglied(mitglied.clone()));
            }
        }

        let record = GruppenRepository::create(
            self.repo.as_ref(),
            NeueGruppe {
                name,
                creator: ersteller,
                members: &mitglieder,
            },
        )
        .await
        .map_err(|e| {
            if e.ist_eindeutigkeit() {
                ChatError::GruppeExistiert(name.to_string())
            } else {
                ChatError::Datenbank(e)
            }
        })?;

        tracing::info!(
            gruppe = %name,
            ersteller = %ersteller,
            mitglieder = record.members.len(),
            "Gruppe erstellt"
        );
        Ok(record.into())
    }

    /// Tritt einer Gruppe bei
    pub async fn beitreten(&self, name: &str, username: &str) -> ChatResult<Gruppe> {
        self.mitglied_hinzufuegen(name, username).await
    }

    /// Fuegt ein Mitglied am Ende der Mitgliederliste hinzu
    pub async fn mitglied_hinzufuegen(&self, name: &str, username: &str) -> ChatResult<Gruppe> {
        let gruppe = self.laden(name).await?;

        if gruppe.mitglieder.iter().any(|m| m == username) {
            return Err(bereits_mitglied(name, username));
        }
        if !self.repo.exists(username).await? {
            return Err(ChatError::UnbekanntesMitglied(username.to_string()));
        }

        self.repo.add_member(name, username).await.map_err(|e| {
            if e.ist_eindeutigkeit() {
                bereits_mitglied(name, username)
            } else {
                ChatError::Datenbank(e)
            }
        })?;

        tracing::info!(gruppe = %name, username = %username, "Mitglied hinzugefuegt");
        self.laden(name).await
    }

    /// Laedt eine Gruppe
    pub async fn laden(&self, name: &str) -> ChatResult<Gruppe> {
        GruppenRepository::get(self.repo.as_ref(), name)
            .await?
            .map(Gruppe::from)
            .ok_or_else(|| ChatError::GruppeNichtGefunden(name.to_string()))
    }

    /// Mitglieder in Beitrittsreihenfolge
    pub async fn mitglieder_von(&self, name: &str) -> ChatResult<Vec<String>> {
        Ok(self.laden(name).await?.mitglieder)
    }

    /// Gruppen eines Benutzers, alphabetisch sortiert
    pub async fn gruppen_von(&self, username: &str) -> ChatResult<Vec<String>> {
        Ok(self.repo.groups_of(username).await?)
    }

    pub async fn ist_mitglied(&self, name: &str, username: &str) -> ChatResult<bool> {
        Ok(self.repo.is_member(name, username).await?)
    }
}

fn bereits_mitglied(gruppe: &str, username: &str) -> ChatError {
    ChatError::BereitsMitglied {
        gruppe: gruppe.to_string(),
        username: username.to_string(),
    }
}
