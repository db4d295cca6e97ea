//! Client-Connection – Verwaltet eine einzelne TCP-Verbindung
//!
//! Jede TCP-Verbindung bekommt eine `ClientConnection` in einem eigenen
//! lokalen Task. Nach erfolgreichem `Login` liest die Verbindung zusaetzlich
//! aus der Push-Queue ihrer Sitzung und schreibt Zustellungen als Frames mit
//! `request_id = 0` auf die Leitung.
//!
//! ## Lebenszyklus
//! ```text
//! Verbunden -> Angemeldet (PresenceTracker.verbinden)
//!     ^             |
//!     |             v
//!     +-- Logout / EOF / Idle-Timeout / Shutdown (PresenceTracker.trennen)
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use kurier_core::Zustellung;
use kurier_delivery::ZustellRepository;
use kurier_protocol::{
    control::{ControlMessage, ErrorCode, PUSH_REQUEST_ID},
    wire::FrameCodec,
};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tokio_util::codec::Framed;

use crate::dispatcher::{DispatcherContext, MessageDispatcher};
use crate::server_state::SignalingState;

/// Wartet auf die naechste Zustellung, falls eine Sitzung besteht
async fn naechste_zustellung(queue: &mut Option<mpsc::Receiver<Zustellung>>) -> Option<Zustellung> {
    match queue.as_mut() {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Verarbeitet eine einzelne TCP-Verbindung
pub struct ClientConnection<R: ZustellRepository> {
    state: Arc<SignalingState<R>>,
    peer_addr: SocketAddr,
}

impl<R: ZustellRepository> ClientConnection<R> {
    pub fn neu(state: Arc<SignalingState<R>>, peer_addr: SocketAddr) -> Self {
        Self { state, peer_addr }
    }

    /// Laeuft bis die Verbindung endet oder ein Shutdown-Signal eingeht
    ///
    /// Eine angemeldete Sitzung wird beim Verlassen genau einmal getrennt.
    pub async fn verarbeiten(self, stream: TcpStream, mut shutdown_rx: watch::Receiver<bool>) {
        let peer_addr = self.peer_addr;
        let timeout = self.state.config.verbindungs_timeout;

        tracing::info!(peer = %peer_addr, "Neue Verbindung");

        let mut framed = Framed::new(
            stream,
            FrameCodec::<ControlMessage>::with_max_size(self.state.config.max_frame_bytes),
        );
        let dispatcher = MessageDispatcher::neu(Arc::clone(&self.state));
        let mut ctx = DispatcherContext::neu(peer_addr);
        let mut push_queue: Option<mpsc::Receiver<Zustellung>> = None;
        let mut letzter_empfang = Instant::now();

        loop {
            tokio::select! {
                frame = framed.next() => {
                    match frame {
                        Some(Ok(nachricht)) => {
                            letzter_empfang = Instant::now();
                            tracing::trace!(
                                peer = %peer_addr,
                                request_id = nachricht.request_id,
                                "Nachricht empfangen"
                            );

                            let antwort = dispatcher.dispatch(nachricht, &mut ctx).await;

                            // Login liefert eine neue Queue, Logout raeumt sie ab
                            if let Some(queue) = ctx.neue_push_queue.take() {
                                push_queue = Some(queue);
                            } else if ctx.sitzung.is_none() {
                                push_queue = None;
                            }

                            if let Some(antwort) = antwort {
                                if let Err(e) = framed.send(antwort).await {
                                    tracing::warn!(peer = %peer_addr, fehler = %e, "Senden fehlgeschlagen");
                                    break;
                                }
                            }
                        }
                        Some(Err(e)) => {
                            tracing::warn!(peer = %peer_addr, fehler = %e, "Frame-Lesefehler");
                            break;
                        }
                        None => {
                            tracing::info!(peer = %peer_addr, "Verbindung vom Client getrennt");
                            break;
                        }
                    }
                }

                zustellung = naechste_zustellung(&mut push_queue) => {
                    match zustellung {
                        Some(zustellung) => {
                            if let Err(e) = framed.send(ControlMessage::push(zustellung)).await {
                                tracing::warn!(peer = %peer_addr, fehler = %e, "Push-Senden fehlgeschlagen");
                                break;
                            }
                        }
                        // Sitzung wurde von einer neueren ersetzt
                        None => {
                            tracing::info!(peer = %peer_addr, "Sitzung ersetzt, Push-Queue geschlossen");
                            push_queue = None;
                        }
                    }
                }

                _ = tokio::time::sleep_until(letzter_empfang + timeout) => {
                    tracing::info!(peer = %peer_addr, "Verbindungs-Timeout");
                    break;
                }

                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!(peer = %peer_addr, "Shutdown-Signal – Verbindung wird getrennt");
                        let abschied = ControlMessage::error(
                            PUSH_REQUEST_ID,
                            ErrorCode::InternalError,
                            "Server wird heruntergefahren",
                        );
                        let _ = framed.send(abschied).await;
                        break;
                    }
                }
            }
        }

        dispatcher.sitzung_beenden(&mut ctx);
        tracing::info!(peer = %peer_addr, "Verbindungs-Task beendet");
    }
}
