use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::CoreConfig;
use crate::error::CoreError;
use crate::events::CoreEvent;
use crate::gateway::MessagingGateway;
use crate::models::{ContactProfile, Message, MessageRole};
use crate::store::ContactCache;
use crate::sync::ConversationSyncState;
use crate::timer::PollTimer;

/// Keeps one conversation's message list consistent with the remote store.
///
/// Forward increments arrive on an owned `PollTimer` while the screen is
/// attached; sends and backward pagination are operator intents forwarded
/// by the UI. The handle is cheap to clone; all clones drive the same
/// conversation state.
#[derive(Clone)]
pub struct MessageSyncEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    gateway: Arc<dyn MessagingGateway>,
    contacts: Arc<ContactCache>,
    config: CoreConfig,
    events: Sender<CoreEvent>,
    state: Mutex<ConversationSyncState>,
    timer: Mutex<PollTimer>,
    /// Busy-guard for backward pagination: prepending is not safe to run
    /// concurrently, so a second request while one is in flight is a no-op.
    paging: AtomicBool,
}

impl MessageSyncEngine {
    pub fn new(
        conversation_id: impl Into<String>,
        gateway: Arc<dyn MessagingGateway>,
        contacts: Arc<ContactCache>,
        config: CoreConfig,
        events: Sender<CoreEvent>,
    ) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                gateway,
                contacts,
                config,
                events,
                state: Mutex::new(ConversationSyncState::new(conversation_id)),
                timer: Mutex::new(PollTimer::new()),
                paging: AtomicBool::new(false),
            }),
        }
    }

    /// Start the forward-sync timer. Called when the conversation screen
    /// mounts; idempotent (a second attach re-arms the same timer).
    pub fn attach(&self) {
        let engine = self.clone();
        let interval = self.inner.config.message_poll_interval;
        self.inner.timer.lock().restart(interval, move || {
            let engine = engine.clone();
            async move { engine.sync_now().await }
        });
    }

    /// Stop the forward-sync timer synchronously. No orphaned tick can
    /// mutate state after this returns.
    pub fn detach(&self) {
        self.inner.timer.lock().stop();
    }

    /// Drop all conversation state and start over for `conversation_id`.
    /// Used when the screen switches to another conversation; an attached
    /// timer keeps running and polls the new conversation from scratch.
    pub fn reset(&self, conversation_id: impl Into<String>) {
        let mut state = self.inner.state.lock();
        *state = ConversationSyncState::new(conversation_id);
    }

    /// One forward incremental sync. Also invoked by every timer tick;
    /// transient failures are logged and retried on the next tick.
    pub async fn sync_now(&self) {
        let (conversation_id, since) = {
            let state = self.inner.state.lock();
            (state.conversation_id.clone(), state.cursor_high)
        };
        match self
            .inner
            .gateway
            .fetch_messages_since(&conversation_id, since)
            .await
        {
            Ok(batch) => {
                let mut state = self.inner.state.lock();
                // The screen may have switched conversations while the
                // fetch was in flight; a stale response must not leak in.
                if state.conversation_id == conversation_id {
                    state.apply_increment(batch);
                }
            }
            Err(err) => {
                debug!("forward sync for {conversation_id} failed, retrying next tick: {err:#}");
            }
        }
    }

    /// Fetch one page of older history. Returns `Ok(false)` when skipped
    /// because a page request is already in flight (the busy-guard keeps
    /// interleaved prepends from landing out of order).
    pub async fn load_older(&self) -> Result<bool, CoreError> {
        if self.inner.paging.swap(true, Ordering::SeqCst) {
            debug!("load_older ignored: a page request is already in flight");
            return Ok(false);
        }
        let result = self.fetch_older_page().await;
        self.inner.paging.store(false, Ordering::SeqCst);
        result
    }

    async fn fetch_older_page(&self) -> Result<bool, CoreError> {
        let (conversation_id, before) = {
            let state = self.inner.state.lock();
            (state.conversation_id.clone(), state.older_page_boundary())
        };
        match self
            .inner
            .gateway
            .fetch_messages_before(&conversation_id, before, self.inner.config.page_size)
            .await
        {
            Ok(page) => {
                let mut state = self.inner.state.lock();
                if state.conversation_id == conversation_id {
                    state.apply_older_page(page);
                }
                Ok(true)
            }
            Err(err) => {
                // `has_older_page` is left as it was so the operator can
                // retry.
                debug!("pagination for {conversation_id} failed: {err:#}");
                Err(CoreError::Pagination {
                    reason: format!("{err:#}"),
                })
            }
        }
    }

    /// Optimistically append an operator message and send it. Returns the
    /// server-assigned id. On rejection the bubble is rolled back, a
    /// `SendFailed` signal is emitted, and the error is returned so the UI
    /// keeps the typed text for resubmission.
    pub async fn send_message(&self, content: &str) -> Result<String, CoreError> {
        let (conversation_id, temp_id) = {
            let mut state = self.inner.state.lock();
            let temp_id = state.push_optimistic(content, MessageRole::OutboundHuman);
            (state.conversation_id.clone(), temp_id)
        };
        match self
            .inner
            .gateway
            .send_message(&conversation_id, content)
            .await
        {
            Ok(receipt) => {
                let server_id = receipt.id.clone();
                let mut state = self.inner.state.lock();
                if state.conversation_id == conversation_id {
                    state.confirm_send(&temp_id, receipt);
                }
                info!("message {server_id} accepted for {conversation_id}");
                Ok(server_id)
            }
            Err(err) => {
                let reason = format!("{err:#}");
                {
                    let mut state = self.inner.state.lock();
                    if state.conversation_id == conversation_id {
                        state.roll_back_send(&temp_id);
                    }
                }
                warn!("send to {conversation_id} rejected: {reason}");
                let _ = self.inner.events.send(CoreEvent::SendFailed {
                    conversation_id,
                    temp_id,
                    reason: reason.clone(),
                });
                Err(CoreError::SendFailed { reason })
            }
        }
    }

    /// Delete a message after the collaborator acknowledges. The id is
    /// tombstoned so a poll racing the delete cannot resurrect it.
    pub async fn delete_message(&self, message_id: &str) -> Result<(), CoreError> {
        let conversation_id = self.inner.state.lock().conversation_id.clone();
        self.inner
            .gateway
            .delete_message(&conversation_id, message_id)
            .await
            .map_err(|err| CoreError::DeleteFailed {
                reason: format!("{err:#}"),
            })?;
        let mut state = self.inner.state.lock();
        if state.conversation_id == conversation_id {
            state.remove_message(message_id);
        }
        Ok(())
    }

    /// Metadata for the contact behind this conversation, via the
    /// injected fetch-once cache.
    pub async fn contact_profile(&self) -> Result<ContactProfile, CoreError> {
        let conversation_id = self.inner.state.lock().conversation_id.clone();
        self.inner
            .contacts
            .get_or_fetch(self.inner.gateway.as_ref(), &conversation_id)
            .await
            .map_err(|err| CoreError::ContactLookup {
                reason: format!("{err:#}"),
            })
    }

    /// Snapshot of the current sync state for rendering.
    pub fn snapshot(&self) -> ConversationSyncState {
        self.inner.state.lock().clone()
    }

    /// Ordered message list, ready for display.
    pub fn messages(&self) -> Vec<Message> {
        self.inner.state.lock().messages.clone()
    }
}
