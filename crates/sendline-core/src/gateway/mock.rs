//! Scripted in-memory gateway used by the component tests.
//!
//! Each operation pops the next scripted response for that endpoint, or
//! falls back to a benign default (fresh code, qr-ready status, empty
//! batch) when the queue is empty. Call counts are recorded so tests can
//! assert exactly how many network exchanges a flow performed.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;

use crate::models::{now_ms, ContactProfile};

use super::{
    ConnectionStatus, MessageBatch, MessagePage, MessagingGateway, PairingCode, SendReceipt,
};

#[derive(Default)]
pub(crate) struct MockGateway {
    code_responses: Mutex<VecDeque<Result<PairingCode>>>,
    status_responses: Mutex<VecDeque<Result<ConnectionStatus>>>,
    since_responses: Mutex<VecDeque<Result<MessageBatch>>>,
    before_responses: Mutex<VecDeque<Result<MessagePage>>>,
    send_responses: Mutex<VecDeque<Result<SendReceipt>>>,
    profile_responses: Mutex<VecDeque<Result<ContactProfile>>>,

    /// Artificial latency for `fetch_messages_before`, used to hold a page
    /// request in flight while the busy-guard is probed.
    before_delay: Mutex<Option<Duration>>,

    pub code_calls: AtomicU32,
    pub status_calls: AtomicU32,
    pub cancel_calls: AtomicU32,
    pub since_calls: AtomicU32,
    pub before_calls: AtomicU32,
    pub send_calls: AtomicU32,
    pub delete_calls: AtomicU32,
    pub profile_calls: AtomicU32,

    /// `before` arguments observed by `fetch_messages_before`.
    pub before_args: Mutex<Vec<u64>>,
    /// `since` arguments observed by `fetch_messages_since`.
    pub since_args: Mutex<Vec<u64>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_code(&self, response: Result<PairingCode>) {
        self.code_responses.lock().push_back(response);
    }

    pub fn push_status(&self, response: Result<ConnectionStatus>) {
        self.status_responses.lock().push_back(response);
    }

    pub fn push_batch(&self, response: Result<MessageBatch>) {
        self.since_responses.lock().push_back(response);
    }

    pub fn push_page(&self, response: Result<MessagePage>) {
        self.before_responses.lock().push_back(response);
    }

    pub fn push_receipt(&self, response: Result<SendReceipt>) {
        self.send_responses.lock().push_back(response);
    }

    pub fn push_profile(&self, response: Result<ContactProfile>) {
        self.profile_responses.lock().push_back(response);
    }

    pub fn set_before_delay(&self, delay: Duration) {
        *self.before_delay.lock() = Some(delay);
    }
}

#[async_trait]
impl MessagingGateway for MockGateway {
    async fn request_pairing_code(&self, _account_id: &str) -> Result<PairingCode> {
        let n = self.code_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.code_responses.lock().pop_front().unwrap_or_else(|| {
            Ok(PairingCode {
                code: format!("code-{n}"),
                expires_hint: None,
            })
        })
    }

    async fn get_connection_status(&self, _account_id: &str) -> Result<ConnectionStatus> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.status_responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| {
                Ok(ConnectionStatus::QrReady {
                    code: "code-1".into(),
                })
            })
    }

    async fn cancel_pairing(&self, _account_id: &str) -> Result<()> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn fetch_messages_since(
        &self,
        _conversation_id: &str,
        since: u64,
    ) -> Result<MessageBatch> {
        self.since_calls.fetch_add(1, Ordering::SeqCst);
        self.since_args.lock().push(since);
        self.since_responses.lock().pop_front().unwrap_or_else(|| {
            Ok(MessageBatch {
                messages: Vec::new(),
                server_timestamp: 0,
            })
        })
    }

    async fn fetch_messages_before(
        &self,
        _conversation_id: &str,
        before: u64,
        _page_size: u32,
    ) -> Result<MessagePage> {
        self.before_calls.fetch_add(1, Ordering::SeqCst);
        self.before_args.lock().push(before);
        let delay = *self.before_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.before_responses.lock().pop_front().unwrap_or_else(|| {
            Ok(MessagePage {
                messages: Vec::new(),
                has_more: false,
            })
        })
    }

    async fn send_message(&self, _conversation_id: &str, _content: &str) -> Result<SendReceipt> {
        let n = self.send_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.send_responses.lock().pop_front().unwrap_or_else(|| {
            Ok(SendReceipt {
                id: format!("srv-{n}"),
                created_at: now_ms(),
            })
        })
    }

    async fn delete_message(&self, _conversation_id: &str, _message_id: &str) -> Result<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn fetch_contact_profile(&self, _conversation_id: &str) -> Result<ContactProfile> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        self.profile_responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| {
                Ok(ContactProfile {
                    display_name: "Test Contact".into(),
                    phone: None,
                    avatar_url: None,
                })
            })
    }
}
