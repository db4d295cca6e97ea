//! Control-Protokoll (TCP)
//!
//! Definiert alle Nachrichten die ueber die TCP-Verbindung zwischen Client
//! und Server ausgetauscht werden.
//!
//! ## Design
//! - Request/Response Pattern: jede Anfrage hat eine `request_id: u32`,
//!   die der Server in die Antwort kopiert
//! - Live-Pushes (`Delivery`) kommen unaufgefordert mit `request_id = 0`
//! - JSON-Serialisierung via serde, Chiffrate als Base64-Text
//! - Tagged Enums fuer typsichere Nachrichtentypen

use chrono::{DateTime, Utc};
use kurier_core::{NachrichtId, SitzungsId, Zustellung};
use serde::{Deserialize, Serialize};

/// Request-ID fuer unaufgeforderte Server-Nachrichten
pub const PUSH_REQUEST_ID: u32 = 0;

// ---------------------------------------------------------------------------
// Fehler-Codes
// ---------------------------------------------------------------------------

/// Stabile Fehler-Codes, damit Clients verzweigen koennen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Allgemein
    InternalError,
    InvalidRequest,
    NotFound,
    NotLoggedIn,
    // Identitaeten
    DuplicateIdentity,
    InvalidCredentials,
    NoKeyMaterial,
    AlreadyConnected,
    // Zustellung
    UnknownRecipient,
    // Gruppen
    DuplicateGroup,
    AlreadyMember,
    UnknownMember,
    NotAMember,
}

// ---------------------------------------------------------------------------
// Identitaeten
// ---------------------------------------------------------------------------

/// Neue Identitaet registrieren
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    /// Klartext, wird serverseitig nur als Argon2id-Hash gespeichert
    pub password: String,
    /// Oeffentlicher Schluessel (Base64)
    pub public_key: String,
    /// Passphrase-verschluesselter privater Schluessel (opak)
    pub encrypted_private_key: Option<String>,
}

/// Anmeldung; bei Erfolg wird die Verbindung zur Live-Sitzung
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Erfolgreiche Anmeldung
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub username: String,
    pub session_id: SitzungsId,
    pub public_key: Option<String>,
    pub encrypted_private_key: Option<String>,
    pub display_name: Option<String>,
    pub avatar_ref: Option<String>,
}

/// Profilfelder aendern; `None` laesst ein Feld unveraendert
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdateRequest {
    pub display_name: Option<String>,
    pub avatar_ref: Option<String>,
}

/// Oeffentliche Profilinformationen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileInfo {
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_ref: Option<String>,
}

// ---------------------------------------------------------------------------
// Direktnachrichten
// ---------------------------------------------------------------------------

/// Direktnachricht senden
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendDirectRequest {
    pub recipient: String,
    #[serde(with = "kurier_core::serde_b64")]
    pub ciphertext: Vec<u8>,
}

/// Endzustand einer gesendeten Direktnachricht
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    LivePushed,
    Persisted { message_id: NachrichtId },
}

/// Direktnachricht aus dem Postfach
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectMessageInfo {
    pub id: NachrichtId,
    pub sender: String,
    #[serde(with = "kurier_core::serde_b64")]
    pub ciphertext: Vec<u8>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Gruppen
// ---------------------------------------------------------------------------

/// Gruppe anlegen; der Absender ist immer Mitglied
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupCreateRequest {
    pub name: String,
    #[serde(default)]
    pub members: Vec<String>,
}

/// Gruppen-Informationen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupInfo {
    pub name: String,
    pub creator: String,
    /// Mitglieder in Beitrittsreihenfolge
    pub members: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Gruppennachricht senden
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendGroupRequest {
    pub group: String,
    #[serde(with = "kurier_core::serde_b64")]
    pub ciphertext: Vec<u8>,
}

/// Ergebnis einer Gruppen-Sendung
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendGroupResponse {
    pub live_pushed: usize,
    pub missed: usize,
    pub created_at: DateTime<Utc>,
}

/// Eintrag im Gruppen-Log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMessageInfo {
    pub group: String,
    pub sender: String,
    #[serde(with = "kurier_core::serde_b64")]
    pub ciphertext: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Keepalive
// ---------------------------------------------------------------------------

/// Ping (Client -> Server)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingMessage {
    /// Unix-Timestamp in Millisekunden fuer RTT-Messung
    pub timestamp_ms: u64,
}

/// Pong-Antwort (spiegelt Timestamp zurueck)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PongMessage {
    pub echo_timestamp_ms: u64,
    pub server_timestamp_ms: u64,
}

// ---------------------------------------------------------------------------
// Haupt-Enum: ControlPayload
// ---------------------------------------------------------------------------

/// Alle moeglichen Control-Nachrichten (typsicher via Tagged Enum)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlPayload {
    // Identitaeten
    Register(RegisterRequest),
    RegisterResponse { username: String },
    Login(LoginRequest),
    LoginResponse(LoginResponse),
    Logout,
    PublicKeyGet { username: String },
    PublicKeyResponse { username: String, public_key: String },
    PublicKeyUpdate { public_key: String },
    ProfileUpdate(ProfileUpdateRequest),
    ProfileResponse(ProfileInfo),
    FriendList,
    FriendListResponse { friends: Vec<String> },

    // Direktnachrichten
    SendDirect(SendDirectRequest),
    SendDirectResponse { outcome: DeliveryOutcome },
    DrainDirect,
    DrainDirectResponse { messages: Vec<DirectMessageInfo> },
    MarkRead { message_id: NachrichtId },

    // Gruppen
    GroupCreate(GroupCreateRequest),
    GroupJoin { name: String },
    GroupAddMember { name: String, username: String },
    GroupResponse(GroupInfo),
    SendGroup(SendGroupRequest),
    SendGroupResponse(SendGroupResponse),
    GroupMessagesSince {
        group: String,
        since: Option<DateTime<Utc>>,
    },
    GroupMessagesResponse { messages: Vec<GroupMessageInfo> },
    /// Gruppen eines Benutzers; ohne `username` die eigenen
    GroupsOf { username: Option<String> },
    GroupListResponse { groups: Vec<String> },
    MembersOf { name: String },
    MemberListResponse { members: Vec<String> },

    // Presence
    ListOnline,
    OnlineListResponse { usernames: Vec<String> },

    // Live-Push (Server -> Client, request_id = 0)
    Delivery { delivery: Zustellung },

    // Keepalive
    Ping(PingMessage),
    Pong(PongMessage),

    // Generische Bestaetigung
    Ok,

    // Error
    Error(ErrorResponse),
}

/// Standardisierte Fehler-Antwort
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Control-Frame (Umschlag fuer alle Nachrichten)
// ---------------------------------------------------------------------------

/// Control-Protokoll-Nachricht mit Request/Response-Zuordnung
///
/// Jede Anfrage traegt eine `request_id` die der Client vergibt.
/// Der Server kopiert die ID in die Antwort damit der Client
/// Request und Response zuordnen kann.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlMessage {
    pub request_id: u32,
    pub payload: ControlPayload,
}

impl ControlMessage {
    /// Erstellt eine neue Control-Nachricht
    pub fn new(request_id: u32, payload: ControlPayload) -> Self {
        Self {
            request_id,
            payload,
        }
    }

    /// Erstellt eine Ping-Nachricht
    pub fn ping(request_id: u32, timestamp_ms: u64) -> Self {
        Self::new(request_id, ControlPayload::Ping(PingMessage { timestamp_ms }))
    }

    /// Erstellt eine Pong-Antwort
    pub fn pong(request_id: u32, echo_timestamp_ms: u64, server_timestamp_ms: u64) -> Self {
        Self::new(
            request_id,
            ControlPayload::Pong(PongMessage {
                echo_timestamp_ms,
                server_timestamp_ms,
            }),
        )
    }

    /// Erstellt eine generische Bestaetigung
    pub fn ok(request_id: u32) -> Self {
        Self::new(request_id, ControlPayload::Ok)
    }

    /// Erstellt eine Fehler-Antwort
    pub fn error(request_id: u32, code: ErrorCode, message: impl Into<String>) -> Self {
        Self::new(
            request_id,
            ControlPayload::Error(ErrorResponse {
                code,
                message: message.into(),
            }),
        )
    }

    /// Verpackt eine Live-Zustellung als unaufgeforderten Push
    pub fn push(delivery: Zustellung) -> Self {
        Self::new(PUSH_REQUEST_ID, ControlPayload::Delivery { delivery })
    }

    /// Serialisiert die Nachricht als JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Deserialisiert eine Nachricht aus JSON
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
