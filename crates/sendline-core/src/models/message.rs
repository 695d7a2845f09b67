use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageRole {
    /// Sent by the remote contact.
    Inbound,
    /// Generated by the agent.
    OutboundAi,
    /// Typed by the operator from the dashboard.
    OutboundHuman,
}

/// Delivery progress of a locally-originated message. Messages that arrive
/// from the server carry no delivery state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryState {
    Sending,
    Sent,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Server-assigned id, or a temporary local id while a send is in flight.
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    /// Unix milliseconds.
    pub created_at: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_state: Option<DeliveryState>,
}

impl Message {
    /// Ordering key for the conversation list: ascending `created_at`,
    /// ties broken by id.
    pub fn sort_key(&self) -> (u64, &str) {
        (self.created_at, self.id.as_str())
    }
}
