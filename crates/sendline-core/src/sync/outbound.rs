use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Message;

/// One in-flight locally-created message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundEntry {
    pub message: Message,
    /// Reconciliation key: the server id assigned by the send receipt.
    /// `None` until the send is acknowledged.
    pub server_id: Option<String>,
}

/// Bookkeeping for locally-created messages between the optimistic append
/// and the moment the server's copy is observed in a forward sync.
///
/// Pure data, no network access; only `MessageSyncEngine` drives it. An
/// entry lives from `register` until `reconcile_incoming` matches it (or
/// the send fails and it is removed), which is what keeps an optimistic
/// echo and its polled server copy from double-rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessageTracker {
    in_flight: HashMap<String, OutboundEntry>,
    /// Local sequence feeding temp-id generation; never reused within a
    /// session.
    next_seq: u64,
}

impl OutboundMessageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate a temp id unique within this session.
    pub fn mint_temp_id(&mut self) -> String {
        self.next_seq += 1;
        format!("local-{}-{}", self.next_seq, Uuid::new_v4().simple())
    }

    pub fn register(&mut self, temp_id: impl Into<String>, message: Message) {
        self.in_flight.insert(
            temp_id.into(),
            OutboundEntry {
                message,
                server_id: None,
            },
        );
    }

    /// Record the server id from a send receipt so a later forward sync
    /// can match the server's copy. Returns false if the entry is gone
    /// (already reconciled or rolled back).
    pub fn confirm(&mut self, temp_id: &str, server_id: impl Into<String>) -> bool {
        match self.in_flight.get_mut(temp_id) {
            Some(entry) => {
                entry.server_id = Some(server_id.into());
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, temp_id: &str) -> Option<OutboundEntry> {
        self.in_flight.remove(temp_id)
    }

    /// Match an incoming message id against the in-flight entries (either
    /// the temp id itself or a confirmed server id). On a match the entry
    /// is dropped and its temp id returned so the caller can fix up the
    /// rendered bubble.
    pub fn reconcile_incoming(&mut self, incoming_id: &str) -> Option<String> {
        let temp_id = self.in_flight.iter().find_map(|(temp_id, entry)| {
            let matched =
                temp_id == incoming_id || entry.server_id.as_deref() == Some(incoming_id);
            matched.then(|| temp_id.clone())
        })?;
        self.in_flight.remove(&temp_id);
        Some(temp_id)
    }

    pub fn is_empty(&self) -> bool {
        self.in_flight.is_empty()
    }

    pub fn len(&self) -> usize {
        self.in_flight.len()
    }

    pub fn contains(&self, temp_id: &str) -> bool {
        self.in_flight.contains_key(temp_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DeliveryState, MessageRole};

    fn sending_message(id: &str) -> Message {
        Message {
            id: id.to_string(),
            role: MessageRole::OutboundHuman,
            content: "hello".into(),
            created_at: 1000,
            delivery_state: Some(DeliveryState::Sending),
        }
    }

    #[test]
    fn temp_ids_are_unique_and_sequenced() {
        let mut tracker = OutboundMessageTracker::new();
        let a = tracker.mint_temp_id();
        let b = tracker.mint_temp_id();
        assert_ne!(a, b);
        assert!(a.starts_with("local-1-"));
        assert!(b.starts_with("local-2-"));
    }

    #[test]
    fn reconcile_matches_confirmed_server_id() {
        let mut tracker = OutboundMessageTracker::new();
        let temp_id = tracker.mint_temp_id();
        tracker.register(temp_id.clone(), sending_message(&temp_id));
        assert!(tracker.confirm(&temp_id, "srv-1"));

        assert_eq!(tracker.reconcile_incoming("srv-1"), Some(temp_id));
        assert!(tracker.is_empty());
    }

    #[test]
    fn reconcile_matches_temp_id_before_confirmation() {
        let mut tracker = OutboundMessageTracker::new();
        let temp_id = tracker.mint_temp_id();
        tracker.register(temp_id.clone(), sending_message(&temp_id));

        assert_eq!(tracker.reconcile_incoming(&temp_id), Some(temp_id));
        assert!(tracker.is_empty());
    }

    #[test]
    fn reconcile_ignores_unrelated_ids() {
        let mut tracker = OutboundMessageTracker::new();
        let temp_id = tracker.mint_temp_id();
        tracker.register(temp_id.clone(), sending_message(&temp_id));

        assert_eq!(tracker.reconcile_incoming("srv-unknown"), None);
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn confirm_after_removal_is_rejected() {
        let mut tracker = OutboundMessageTracker::new();
        let temp_id = tracker.mint_temp_id();
        tracker.register(temp_id.clone(), sending_message(&temp_id));
        tracker.remove(&temp_id);

        assert!(!tracker.confirm(&temp_id, "srv-1"));
    }
}
