//! Message-Dispatcher – Routet ControlMessages an Register, Router und Gruppen
//!
//! ## Zustandspruefung
//! - `Register`, `Login`, `PublicKeyGet` und `Ping` sind immer erlaubt
//! - Alle anderen Anfragen erfordern eine angemeldete Sitzung; der
//!   Benutzername stammt dann aus der Sitzung, nie aus der Anfrage

use std::net::SocketAddr;
use std::sync::Arc;

use kurier_chat::{Direktnachricht, Gruppe, Gruppennachricht};
use kurier_core::Zustellung;
use kurier_delivery::{PresencePolitik, SitzungsHandle, ZustellRepository, Zustellstatus};
use kurier_protocol::control::{
    ControlMessage, ControlPayload, DeliveryOutcome, DirectMessageInfo, GroupInfo,
    GroupMessageInfo, LoginResponse, ProfileInfo, SendGroupResponse,
};
use tokio::sync::mpsc;

use crate::error::{SignalingError, SignalingResult};
use crate::server_state::SignalingState;

/// Zustand einer einzelnen Verbindung
pub struct DispatcherContext {
    pub peer_addr: SocketAddr,
    /// Aktuelle Live-Sitzung (None wenn nicht angemeldet)
    pub sitzung: Option<SitzungsHandle>,
    /// Push-Queue einer gerade angemeldeten Sitzung; die Verbindung holt sie ab
    pub neue_push_queue: Option<mpsc::Receiver<Zustellung>>,
}

impl DispatcherContext {
    pub fn neu(peer_addr: SocketAddr) -> Self {
        Self {
            peer_addr,
            sitzung: None,
            neue_push_queue: None,
        }
    }

    fn username(&self) -> SignalingResult<&str> {
        self.sitzung
            .as_ref()
            .map(|s| s.username.as_str())
            .ok_or(SignalingError::NichtAngemeldet)
    }
}

/// Zentraler Message-Dispatcher
pub struct MessageDispatcher<R: ZustellRepository> {
    state: Arc<SignalingState<R>>,
}

impl<R: ZustellRepository> MessageDispatcher<R> {
    pub fn neu(state: Arc<SignalingState<R>>) -> Self {
        Self { state }
    }

    /// Verarbeitet eine eingehende ControlMessage und gibt die Antwort zurueck
    ///
    /// Gibt `None` zurueck wenn keine Antwort gesendet werden soll (Pong).
    pub async fn dispatch(
        &self,
        message: ControlMessage,
        ctx: &mut DispatcherContext,
    ) -> Option<ControlMessage> {
        let request_id = message.request_id;

        if let ControlPayload::Pong(_) = message.payload {
            tracing::trace!(peer = %ctx.peer_addr, "Pong empfangen");
            return None;
        }

        match self.verarbeiten(message.payload, ctx).await {
            Ok(payload) => Some(ControlMessage::new(request_id, payload)),
            Err(e) => {
                let code = e.code();
                tracing::debug!(
                    peer = %ctx.peer_addr,
                    request_id,
                    code = ?code,
                    fehler = %e,
                    "Anfrage abgelehnt"
                );
                Some(ControlMessage::error(request_id, code, e.client_meldung()))
            }
        }
    }

    async fn verarbeiten(
        &self,
        payload: ControlPayload,
        ctx: &mut DispatcherContext,
    ) -> SignalingResult<ControlPayload> {
        let router = &self.state.router;

        match payload {
            // -------------------------------------------------------------------
            // Ohne Anmeldung erlaubt
            // -------------------------------------------------------------------
            ControlPayload::Register(req) => {
                let identitaet = router
                    .register()
                    .registrieren(
                        &req.username,
                        &req.password,
                        &req.public_key,
                        req.encrypted_private_key.as_deref(),
                    )
                    .await?;
                Ok(ControlPayload::RegisterResponse {
                    username: identitaet.username,
                })
            }

            ControlPayload::Login(req) => {
                if ctx.sitzung.is_some() {
                    return Err(SignalingError::protokoll("Bereits angemeldet"));
                }
                // Ein erneutes Login ersetzt unter `Ersetzen` nur die eigene Sitzung
                let ersetzt_eigene = router.presence().politik() == PresencePolitik::Ersetzen
                    && router.presence().ist_online(&req.username).is_some();
                if !ersetzt_eigene
                    && router.presence().online_anzahl() >= self.state.config.max_clients
                {
                    return Err(SignalingError::protokoll("Server ist voll"));
                }

                let identitaet = router
                    .register()
                    .authentifizieren(&req.username, &req.password)
                    .await?;
                let sitzung = router.presence().verbinden(&identitaet.username)?;

                tracing::info!(
                    peer = %ctx.peer_addr,
                    username = %identitaet.username,
                    sitzung = %sitzung.handle.sitzung_id,
                    "Verbindung angemeldet"
                );

                let antwort = LoginResponse {
                    username: identitaet.username,
                    session_id: sitzung.handle.sitzung_id,
                    public_key: identitaet.public_key,
                    encrypted_private_key: identitaet.encrypted_private_key,
                    display_name: identitaet.display_name,
                    avatar_ref: identitaet.avatar_ref,
                };
                ctx.sitzung = Some(sitzung.handle);
                ctx.neue_push_queue = Some(sitzung.empfaenger);
                Ok(ControlPayload::LoginResponse(antwort))
            }

            ControlPayload::PublicKeyGet { username } => {
                let public_key = router.register().public_key_von(&username).await?;
                Ok(ControlPayload::PublicKeyResponse {
                    username,
                    public_key,
                })
            }

            ControlPayload::Ping(ping) => Ok(ControlPayload::Pong(
                kurier_protocol::control::PongMessage {
                    echo_timestamp_ms: ping.timestamp_ms,
                    server_timestamp_ms: jetzt_ms(),
                },
            )),

            // -------------------------------------------------------------------
            // Sitzung
            // -------------------------------------------------------------------
            ControlPayload::Logout => {
                let handle = ctx.sitzung.take().ok_or(SignalingError::NichtAngemeldet)?;
                router.presence().trennen(&handle);
                ctx.neue_push_queue = None;
                Ok(ControlPayload::Ok)
            }

            ControlPayload::PublicKeyUpdate { public_key } => {
                router
                    .register()
                    .public_key_aktualisieren(ctx.username()?, &public_key)
                    .await?;
                Ok(ControlPayload::Ok)
            }

            ControlPayload::ProfileUpdate(req) => {
                let identitaet = router
                    .register()
                    .profil_aktualisieren(ctx.username()?, req.display_name, req.avatar_ref)
                    .await?;
                Ok(ControlPayload::ProfileResponse(ProfileInfo {
                    username: identitaet.username,
                    display_name: identitaet.display_name,
                    avatar_ref: identitaet.avatar_ref,
                }))
            }

            ControlPayload::FriendList => {
                let friends = router.register().freunde_von(ctx.username()?).await?;
                Ok(ControlPayload::FriendListResponse { friends })
            }

            // -------------------------------------------------------------------
            // Direktnachrichten
            // -------------------------------------------------------------------
            ControlPayload::SendDirect(req) => {
                let status = router
                    .direkt_senden(ctx.username()?, &req.recipient, req.ciphertext)
                    .await?;
                let outcome = match status {
                    Zustellstatus::LiveZugestellt => DeliveryOutcome::LivePushed,
                    Zustellstatus::Gespeichert { nachricht_id } => DeliveryOutcome::Persisted {
                        message_id: nachricht_id,
                    },
                };
                Ok(ControlPayload::SendDirectResponse { outcome })
            }

            ControlPayload::DrainDirect => {
                let messages = router
                    .direkt_abholen(ctx.username()?)
                    .await?
                    .into_iter()
                    .map(direktnachricht_info)
                    .collect();
                Ok(ControlPayload::DrainDirectResponse { messages })
            }

            ControlPayload::MarkRead { message_id } => {
                router
                    .gelesen_bestaetigen(ctx.username()?, message_id)
                    .await?;
                Ok(ControlPayload::Ok)
            }

            // -------------------------------------------------------------------
            // Gruppen
            // -------------------------------------------------------------------
            ControlPayload::GroupCreate(req) => {
                let gruppe = router
                    .gruppen()
                    .erstellen(&req.name, ctx.username()?, &req.members)
                    .await?;
                Ok(ControlPayload::GroupResponse(gruppen_info(gruppe)))
            }

            ControlPayload::GroupJoin { name } => {
                let gruppe = router.gruppen().beitreten(&name, ctx.username()?).await?;
                Ok(ControlPayload::GroupResponse(gruppen_info(gruppe)))
            }

            ControlPayload::GroupAddMember { name, username } => {
                // Nur Mitglieder duerfen andere hinzufuegen
                let eigener = ctx.username()?;
                if !router.gruppen().ist_mitglied(&name, eigener).await? {
                    router.gruppen().laden(&name).await?;
                    return Err(kurier_chat::ChatError::KeinMitglied {
                        gruppe: name,
                        username: eigener.to_string(),
                    }
                    .into());
                }
                let gruppe = router.gruppen().mitglied_hinzufuegen(&name, &username).await?;
                Ok(ControlPayload::GroupResponse(gruppen_info(gruppe)))
            }

            ControlPayload::SendGroup(req) => {
                let ergebnis = router
                    .gruppe_senden(&req.group, ctx.username()?, req.ciphertext)
                    .await?;
                Ok(ControlPayload::SendGroupResponse(SendGroupResponse {
                    live_pushed: ergebnis.live_zugestellt,
                    missed: ergebnis.verpasst,
                    created_at: ergebnis.nachricht.erstellt_am,
                }))
            }

            ControlPayload::GroupMessagesSince { group, since } => {
                let messages = router
                    .gruppennachrichten_seit(ctx.username()?, &group, since)
                    .await?
                    .into_iter()
                    .map(gruppennachricht_info)
                    .collect();
                Ok(ControlPayload::GroupMessagesResponse { messages })
            }

            ControlPayload::GroupsOf { username } => {
                let eigener = ctx.username()?;
                let ziel = username.as_deref().unwrap_or(eigener);
                let groups = router.gruppen().gruppen_von(ziel).await?;
                Ok(ControlPayload::GroupListResponse { groups })
            }

            ControlPayload::MembersOf { name } => {
                ctx.username()?;
                let members = router.gruppen().mitglieder_von(&name).await?;
                Ok(ControlPayload::MemberListResponse { members })
            }

            // -------------------------------------------------------------------
            // Presence
            // -------------------------------------------------------------------
            ControlPayload::ListOnline => {
                ctx.username()?;
                let usernames = router.presence().online_liste().into_iter().collect();
                Ok(ControlPayload::OnlineListResponse { usernames })
            }

            // -------------------------------------------------------------------
            // Server->Client Nachrichten vom Client
            // -------------------------------------------------------------------
            ControlPayload::RegisterResponse { .. }
            | ControlPayload::LoginResponse(_)
            | ControlPayload::PublicKeyResponse { .. }
            | ControlPayload::ProfileResponse(_)
            | ControlPayload::FriendListResponse { .. }
            | ControlPayload::SendDirectResponse { .. }
            | ControlPayload::DrainDirectResponse { .. }
            | ControlPayload::GroupResponse(_)
            | ControlPayload::SendGroupResponse(_)
            | ControlPayload::GroupMessagesResponse { .. }
            | ControlPayload::GroupListResponse { .. }
            | ControlPayload::MemberListResponse { .. }
            | ControlPayload::OnlineListResponse { .. }
            | ControlPayload::Delivery { .. }
            | ControlPayload::Pong(_)
            | ControlPayload::Ok
            | ControlPayload::Error(_) => {
                tracing::warn!(
                    peer = %ctx.peer_addr,
                    "Unerwartete Server->Client Nachricht vom Client empfangen"
                );
                Err(SignalingError::protokoll("Unerwartete Nachricht"))
            }
        }
    }

    /// Beendet die Sitzung einer Verbindung (genau einmal pro Sitzung)
    pub fn sitzung_beenden(&self, ctx: &mut DispatcherContext) {
        if let Some(handle) = ctx.sitzung.take() {
            self.state.router.presence().trennen(&handle);
        }
        ctx.neue_push_queue = None;
    }
}

// ---------------------------------------------------------------------------
// Umwandlung in Protokoll-Typen
// ---------------------------------------------------------------------------

fn direktnachricht_info(n: Direktnachricht) -> DirectMessageInfo {
    DirectMessageInfo {
        id: n.id,
        sender: n.absender,
        ciphertext: n.chiffrat,
        read: n.gelesen,
        created_at: n.erstellt_am,
    }
}

fn gruppen_info(g: Gruppe) -> GroupInfo {
    GroupInfo {
        name: g.name,
        creator: g.ersteller,
        members: g.mitglieder,
        created_at: g.erstellt_am,
    }
}

fn gruppennachricht_info(n: Gruppennachricht) -> GroupMessageInfo {
    GroupMessageInfo {
        group: n.gruppe,
        sender: n.absender,
        ciphertext: n.chiffrat,
        created_at: n.erstellt_am,
    }
}

fn jetzt_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
