//! Ordered message state for one open conversation.
//!
//! All merge logic is synchronous and pure so the invariants (unique ids,
//! `(created_at, id)` ordering, monotonic cursor) can be tested without a
//! runtime. `MessageSyncEngine` owns an instance and feeds it gateway
//! responses.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::gateway::{MessageBatch, MessagePage, SendReceipt};
use crate::models::{now_ms, DeliveryState, Message, MessageRole};
use crate::sync::OutboundMessageTracker;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSyncState {
    pub conversation_id: String,
    /// Ascending by `(created_at, id)`, no duplicate ids.
    pub messages: Vec<Message>,
    /// Watermark past which no messages have been fetched. Advances
    /// monotonically; never regresses, not even on empty responses.
    pub cursor_high: u64,
    /// Whether backward pagination can still retrieve earlier history.
    pub has_older_page: bool,
    pub pending_outbound: OutboundMessageTracker,
    /// Locally-deleted ids. A later poll returning one of these must not
    /// resurrect the message.
    pub(crate) tombstones: HashSet<String>,
    /// Collaborator clock observed on the last successful forward sync,
    /// unix milliseconds. Display-only staleness hint.
    pub last_synced_at: u64,
}

impl ConversationSyncState {
    pub fn new(conversation_id: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            messages: Vec::new(),
            cursor_high: 0,
            has_older_page: true,
            pending_outbound: OutboundMessageTracker::new(),
            tombstones: HashSet::new(),
            last_synced_at: 0,
        }
    }

    /// Merge a forward-sync response. Idempotent and commutative with
    /// respect to duplicate deliveries; tolerates arbitrary ordering and
    /// repetition in the batch.
    pub fn apply_increment(&mut self, batch: MessageBatch) {
        let max_seen = batch.messages.iter().map(|m| m.created_at).max();
        let mut inserted = false;

        for incoming in batch.messages {
            // Reconcile before the duplicate check: even when the bubble
            // was already renamed by the send receipt, the pending entry
            // still has to be retired.
            if let Some(temp_id) = self.pending_outbound.reconcile_incoming(&incoming.id) {
                if let Some(bubble) = self.messages.iter_mut().find(|m| m.id == temp_id) {
                    bubble.id = incoming.id.clone();
                    bubble.delivery_state = Some(DeliveryState::Sent);
                    continue;
                }
            }
            if self.tombstones.contains(&incoming.id) {
                continue;
            }
            if self.messages.iter().any(|m| m.id == incoming.id) {
                continue;
            }
            self.messages.push(incoming);
            inserted = true;
        }

        if inserted {
            self.sort_messages();
        }
        if let Some(max_seen) = max_seen {
            if max_seen > self.cursor_high {
                self.cursor_high = max_seen;
            }
        }
        if batch.server_timestamp > self.last_synced_at {
            self.last_synced_at = batch.server_timestamp;
        }
    }

    /// Prepend one page of older history. Does not touch `cursor_high`.
    pub fn apply_older_page(&mut self, page: MessagePage) {
        let mut fresh: Vec<Message> = page
            .messages
            .into_iter()
            .filter(|m| !self.tombstones.contains(&m.id))
            .filter(|m| !self.messages.iter().any(|existing| existing.id == m.id))
            .collect();
        if !fresh.is_empty() {
            fresh.extend(self.messages.drain(..));
            self.messages = fresh;
            self.sort_messages();
        }
        self.has_older_page = page.has_more;
    }

    /// Timestamp boundary for the next backward page: the current oldest
    /// element, or the present moment for an empty conversation.
    pub fn older_page_boundary(&self) -> u64 {
        self.messages
            .first()
            .map(|m| m.created_at)
            .unwrap_or_else(now_ms)
    }

    /// Append an optimistic local message and register it as in-flight.
    /// Returns the temp id.
    pub fn push_optimistic(&mut self, content: &str, role: MessageRole) -> String {
        let temp_id = self.pending_outbound.mint_temp_id();
        let message = Message {
            id: temp_id.clone(),
            role,
            content: content.to_string(),
            created_at: now_ms(),
            delivery_state: Some(DeliveryState::Sending),
        };
        self.pending_outbound
            .register(temp_id.clone(), message.clone());
        self.messages.push(message);
        self.sort_messages();
        temp_id
    }

    /// Apply a send receipt: rename the optimistic bubble in place (its
    /// locally-assigned `created_at`, and therefore its position, are
    /// kept) and record the server id as the reconciliation key.
    ///
    /// If a forward sync already delivered the server's copy, the bubble
    /// is dropped instead so the id stays unique.
    pub fn confirm_send(&mut self, temp_id: &str, receipt: SendReceipt) {
        if self.messages.iter().any(|m| m.id == receipt.id) {
            self.messages.retain(|m| m.id != temp_id);
            self.pending_outbound.remove(temp_id);
            return;
        }
        if let Some(bubble) = self.messages.iter_mut().find(|m| m.id == temp_id) {
            bubble.id = receipt.id.clone();
            bubble.delivery_state = Some(DeliveryState::Sent);
        }
        self.pending_outbound.confirm(temp_id, receipt.id);
    }

    /// Roll back a rejected send: the bubble disappears, everything else
    /// stays untouched.
    pub fn roll_back_send(&mut self, temp_id: &str) {
        self.messages.retain(|m| m.id != temp_id);
        self.pending_outbound.remove(temp_id);
    }

    /// Remove a message locally and tombstone its id so a racing poll
    /// cannot resurrect it.
    pub fn remove_message(&mut self, message_id: &str) {
        self.messages.retain(|m| m.id != message_id);
        self.tombstones.insert(message_id.to_string());
    }

    fn sort_messages(&mut self) {
        self.messages
            .sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    }
}
