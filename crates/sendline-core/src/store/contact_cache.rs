//! Fetch-once cache for per-contact metadata.
//!
//! Conversation screens all want the same contact header data; fetching it
//! once per conversation and reusing it is the whole point. The cache is an
//! explicitly owned value injected into each `MessageSyncEngine` (typically
//! one shared instance per dashboard), never ambient module state, so there
//! is no hidden coupling between unrelated screens.

use std::collections::{HashMap, VecDeque};

use anyhow::Result;
use parking_lot::Mutex;
use tracing::debug;

use crate::gateway::MessagingGateway;
use crate::models::ContactProfile;

/// Capacity-bounded cache keyed by conversation id, least recently used
/// entry evicted first.
pub struct ContactCache {
    inner: Mutex<CacheInner>,
}

struct CacheInner {
    capacity: usize,
    entries: HashMap<String, ContactProfile>,
    /// Recency order, least recently used at the front.
    order: VecDeque<String>,
}

impl ContactCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                capacity: capacity.max(1),
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    /// Look up a profile, promoting it to most recently used.
    pub fn get(&self, conversation_id: &str) -> Option<ContactProfile> {
        let mut inner = self.inner.lock();
        let profile = inner.entries.get(conversation_id).cloned()?;
        inner.promote(conversation_id);
        Some(profile)
    }

    pub fn insert(&self, conversation_id: impl Into<String>, profile: ContactProfile) {
        let conversation_id = conversation_id.into();
        let mut inner = self.inner.lock();
        if inner.entries.insert(conversation_id.clone(), profile).is_some() {
            inner.promote(&conversation_id);
            return;
        }
        inner.order.push_back(conversation_id);
        while inner.entries.len() > inner.capacity {
            if let Some(evicted) = inner.order.pop_front() {
                debug!("contact cache evicting {evicted}");
                inner.entries.remove(&evicted);
            }
        }
    }

    /// Cached profile, or a single gateway fetch whose result is kept for
    /// subsequent callers.
    pub async fn get_or_fetch(
        &self,
        gateway: &dyn MessagingGateway,
        conversation_id: &str,
    ) -> Result<ContactProfile> {
        if let Some(profile) = self.get(conversation_id) {
            return Ok(profile);
        }
        let profile = gateway.fetch_contact_profile(conversation_id).await?;
        self.insert(conversation_id, profile.clone());
        Ok(profile)
    }

    /// Drop one entry, forcing the next lookup to refetch.
    pub fn invalidate(&self, conversation_id: &str) {
        let mut inner = self.inner.lock();
        inner.entries.remove(conversation_id);
        inner.order.retain(|id| id != conversation_id);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }
}

impl CacheInner {
    fn promote(&mut self, conversation_id: &str) {
        self.order.retain(|id| id != conversation_id);
        self.order.push_back(conversation_id.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(name: &str) -> ContactProfile {
        ContactProfile {
            display_name: name.to_string(),
            phone: None,
            avatar_url: None,
        }
    }

    #[test]
    fn evicts_least_recently_used_first() {
        let cache = ContactCache::new(2);
        cache.insert("a", profile("Ana"));
        cache.insert("b", profile("Bo"));

        // Touch "a" so "b" becomes the eviction candidate.
        assert!(cache.get("a").is_some());
        cache.insert("c", profile("Cy"));

        assert!(cache.get("a").is_some());
        assert!(cache.get("b").is_none());
        assert!(cache.get("c").is_some());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn reinserting_updates_in_place() {
        let cache = ContactCache::new(2);
        cache.insert("a", profile("Ana"));
        cache.insert("a", profile("Ana Maria"));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("a").unwrap().display_name, "Ana Maria");
    }

    #[test]
    fn invalidate_forces_a_refetch_path() {
        let cache = ContactCache::new(4);
        cache.insert("a", profile("Ana"));
        cache.invalidate("a");
        assert!(cache.get("a").is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn get_or_fetch_hits_the_gateway_once() {
        use crate::gateway::mock::MockGateway;
        use std::sync::atomic::Ordering;

        let cache = ContactCache::new(4);
        let gateway = MockGateway::new();

        let first = cache.get_or_fetch(&gateway, "conv-1").await.unwrap();
        let second = cache.get_or_fetch(&gateway, "conv-1").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(gateway.profile_calls.load(Ordering::SeqCst), 1);
    }
}
