//! Seam to the remote collaborator that owns the actual messaging session.
//!
//! The sync components only ever talk to `MessagingGateway`; the transport
//! behind it (`HttpGateway` in production, a scripted mock in tests) is an
//! implementation detail of the collaborator, not of this core.

mod http;
#[cfg(test)]
pub(crate) mod mock;

pub use http::HttpGateway;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::{ContactProfile, Message};

/// A freshly issued pairing code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairingCode {
    pub code: String,
    /// Collaborator's hint for when the code stops being scannable, in
    /// unix milliseconds. Advisory only; rotation does not depend on it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_hint: Option<u64>,
}

/// Connection status reported by the collaborator during (and after) a
/// pairing attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum ConnectionStatus {
    /// A code is waiting to be scanned.
    QrReady { code: String },
    /// The device acknowledged the code and is establishing the session.
    Connecting,
    Connected,
    Disconnected,
}

/// Result of a forward incremental fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageBatch {
    pub messages: Vec<Message>,
    /// Collaborator's clock at response time, unix milliseconds.
    #[serde(default)]
    pub server_timestamp: u64,
}

/// One page of backward pagination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePage {
    /// Ascending by `(created_at, id)`, all strictly older than the
    /// requested boundary.
    pub messages: Vec<Message>,
    /// Whether earlier history remains beyond this page.
    pub has_more: bool,
}

/// Acknowledgement for an accepted outbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendReceipt {
    pub id: String,
    /// Server-assigned creation time, unix milliseconds.
    pub created_at: u64,
}

/// Operations the sync core consumes from the platform.
///
/// Every method is a single request/response exchange; retry policy,
/// timers and state transitions all live on the caller's side.
#[async_trait]
pub trait MessagingGateway: Send + Sync {
    async fn request_pairing_code(&self, account_id: &str) -> Result<PairingCode>;

    async fn get_connection_status(&self, account_id: &str) -> Result<ConnectionStatus>;

    /// Release a pending pairing session server-side so a stale code can
    /// never be scanned after the operator cancelled.
    async fn cancel_pairing(&self, account_id: &str) -> Result<()>;

    /// All messages with `created_at > since`, in no guaranteed order.
    async fn fetch_messages_since(&self, conversation_id: &str, since: u64)
        -> Result<MessageBatch>;

    /// Up to `page_size` messages strictly older than `before`.
    async fn fetch_messages_before(
        &self,
        conversation_id: &str,
        before: u64,
        page_size: u32,
    ) -> Result<MessagePage>;

    async fn send_message(&self, conversation_id: &str, content: &str) -> Result<SendReceipt>;

    async fn delete_message(&self, conversation_id: &str, message_id: &str) -> Result<()>;

    async fn fetch_contact_profile(&self, conversation_id: &str) -> Result<ContactProfile>;
}
