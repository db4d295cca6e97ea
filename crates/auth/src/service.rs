//! Schluesselregister fuer Kurier
//!
//! Verwaltet Identitaeten: Registrierung mit Passwort-Hash und oeffentlichem
//! Schluessel, Anmeldung, Schluessel- und Profilpflege sowie die
//! Freundesliste. Alle anderen Komponenten loesen Benutzernamen hierueber auf.

use std::sync::Arc;

use kurier_db::{
    models::{IdentitaetRecord, NeueIdentitaet, ProfilUpdate},
    repository::IdentitaetRepository,
};

use crate::{
    error::{AuthError, AuthResult},
    password::{passwort_hashen, passwort_verifizieren, PasswortParameter},
};

/// Schluesselregister – zentraler Einstiegspunkt fuer Identitaeten
pub struct SchluesselRegister<R: IdentitaetRepository> {
    repo: Arc<R>,
    parameter: PasswortParameter,
}

impl<R: IdentitaetRepository> SchluesselRegister<R> {
    /// Erstellt ein neues Register mit den gegebenen Argon2-Kosten
    pub fn neu(repo: Arc<R>, parameter: PasswortParameter) -> Self {
        Self { repo, parameter }
    }

    /// Registriert eine neue Identitaet
    ///
    /// Das Passwort wird nur als Argon2id-Hash gespeichert.
    pub async fn registrieren(
        &self,
        username: &str,
        passwort: &str,
        public_key: &str,
        encrypted_private_key: Option<&str>,
    ) -> AuthResult<IdentitaetRecord> {
        if username.trim().is_empty() {
            return Err(AuthError::ungueltig("Benutzername darf nicht leer sein"));
        }
        if passwort.is_empty() {
            return Err(AuthError::ungueltig("Passwort darf nicht leer sein"));
        }
        if public_key.trim().is_empty() {
            return Err(AuthError::ungueltig("Oeffentlicher Schluessel fehlt"));
        }

        if self.repo.exists(username).await? {
            return Err(AuthError::IdentitaetVergeben(username.to_string()));
        }

        let passwort_hash = passwort_hashen(passwort, &self.parameter)?;

        let identitaet = self
            .repo
            .create(NeueIdentitaet {
                username,
                password_hash: &passwort_hash,
                public_key: Some(public_key),
                encrypted_private_key,
            })
            .await
            .map_err(|e| {
                // Paralleles Registrieren desselben Namens
                if e.ist_eindeutigkeit() {
                    AuthError::IdentitaetVergeben(username.to_string())
                } else {
                    AuthError::Datenbank(e)
                }
            })?;

        tracing::info!(username = %identitaet.username, "Neue Identitaet registriert");

        Ok(identitaet)
    }

    /// Prueft Benutzername und Passwort
    ///
    /// Unbekannte Namen liefern `BenutzerNichtGefunden`, ein falsches Passwort
    /// `UngueltigeAnmeldedaten`.
    pub async fn authentifizieren(
        &self,
        username: &str,
        passwort: &str,
    ) -> AuthResult<IdentitaetRecord> {
        let identitaet = self.laden(username).await?;

        if !passwort_verifizieren(passwort, &identitaet.password_hash)? {
            tracing::warn!(username = %username, "Fehlgeschlagener Anmeldeversuch");
            return Err(AuthError::UngueltigeAnmeldedaten);
        }

        tracing::debug!(username = %username, "Identitaet authentifiziert");
        Ok(identitaet)
    }

    /// Gibt den oeffentlichen Schluessel einer Identitaet zurueck
    pub async fn public_key_von(&self, username: &str) -> AuthResult<String> {
        self.laden(username)
            .await?
            .public_key
            .filter(|k| !k.is_empty())
            .ok_or_else(|| AuthError::KeinSchluesselmaterial(username.to_string()))
    }

    /// Ersetzt den oeffentlichen Schluessel einer Identitaet
    pub async fn public_key_aktualisieren(&self, username: &str, public_key: &str) -> AuthResult<()> {
        if public_key.trim().is_empty() {
            return Err(AuthError::ungueltig("Oeffentlicher Schluessel fehlt"));
        }
        if !self.repo.update_public_key(username, public_key).await? {
            return Err(AuthError::BenutzerNichtGefunden(username.to_string()));
        }
        tracing::info!(username = %username, "Oeffentlicher Schluessel aktualisiert");
        Ok(())
    }

    /// Aktualisiert Anzeigename und/oder Avatar-Referenz
    pub async fn profil_aktualisieren(
        &self,
        username: &str,
        display_name: Option<String>,
        avatar_ref: Option<String>,
    ) -> AuthResult<IdentitaetRecord> {
        let gefunden = self
            .repo
            .update_profile(
                username,
                ProfilUpdate {
                    display_name,
                    avatar_ref,
                },
            )
            .await?;
        if !gefunden {
            return Err(AuthError::BenutzerNichtGefunden(username.to_string()));
        }
        self.laden(username).await
    }

    /// Traegt zwei Identitaeten gegenseitig als Freunde ein (idempotent)
    ///
    /// Gibt `true` zurueck wenn die Freundschaft neu ist.
    pub async fn freundschaft_eintragen(&self, a: &str, b: &str) -> AuthResult<bool> {
        if a == b {
            return Err(AuthError::ungueltig("Freundschaft mit sich selbst"));
        }
        for name in [a, b] {
            if !self.repo.exists(name).await? {
                return Err(AuthError::BenutzerNichtGefunden(name.to_string()));
            }
        }

        let neu = self.repo.add_friendship(a, b).await?;
        if neu {
            tracing::debug!(a = %a, b = %b, "Freundschaft eingetragen");
        }
        Ok(neu)
    }

    /// Freunde einer Identitaet, alphabetisch sortiert
    pub async fn freunde_von(&self, username: &str) -> AuthResult<Vec<String>> {
        if !self.repo.exists(username).await? {
            return Err(AuthError::BenutzerNichtGefunden(username.to_string()));
        }
        Ok(self.repo.friends_of(username).await?)
    }

    /// Prueft ob eine Identitaet registriert ist
    pub async fn existiert(&self, username: &str) -> AuthResult<bool> {
        Ok(self.repo.exists(username).await?)
    }

    /// Laedt eine Identitaet
    pub async fn laden(&self, username: &str) -> AuthResult<IdentitaetRecord> {
        self.repo
            .get_by_name(username)
            .await?
            .ok_or_else(|| AuthError::BenutzerNichtGefunden(username.to_string()))
    }
}
