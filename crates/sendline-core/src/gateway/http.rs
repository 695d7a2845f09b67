use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::models::ContactProfile;

use super::{
    ConnectionStatus, MessageBatch, MessagePage, MessagingGateway, PairingCode, SendReceipt,
};

/// Production implementation of `MessagingGateway` against the platform's
/// JSON API.
pub struct HttpGateway {
    base_url: String,
    api_token: String,
    client: reqwest::Client,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            api_token: api_token.into(),
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("platform API error ({status}): {body}");
    }
}

#[async_trait]
impl MessagingGateway for HttpGateway {
    async fn request_pairing_code(&self, account_id: &str) -> Result<PairingCode> {
        let response = self
            .client
            .post(self.url(&format!("/sessions/{account_id}/pairing-code")))
            .bearer_auth(&self.api_token)
            .send()
            .await
            .context("failed to request pairing code")?;
        Self::ensure_success(response)
            .await?
            .json()
            .await
            .context("failed to parse pairing code response")
    }

    async fn get_connection_status(&self, account_id: &str) -> Result<ConnectionStatus> {
        let response = self
            .client
            .get(self.url(&format!("/sessions/{account_id}/status")))
            .bearer_auth(&self.api_token)
            .send()
            .await
            .context("failed to fetch connection status")?;
        Self::ensure_success(response)
            .await?
            .json()
            .await
            .context("failed to parse connection status response")
    }

    async fn cancel_pairing(&self, account_id: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.url(&format!("/sessions/{account_id}/pairing")))
            .bearer_auth(&self.api_token)
            .send()
            .await
            .context("failed to cancel pairing")?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    async fn fetch_messages_since(
        &self,
        conversation_id: &str,
        since: u64,
    ) -> Result<MessageBatch> {
        let response = self
            .client
            .get(self.url(&format!("/conversations/{conversation_id}/messages")))
            .query(&[("since", since)])
            .bearer_auth(&self.api_token)
            .send()
            .await
            .context("failed to fetch new messages")?;
        Self::ensure_success(response)
            .await?
            .json()
            .await
            .context("failed to parse message batch response")
    }

    async fn fetch_messages_before(
        &self,
        conversation_id: &str,
        before: u64,
        page_size: u32,
    ) -> Result<MessagePage> {
        let response = self
            .client
            .get(self.url(&format!("/conversations/{conversation_id}/messages")))
            .query(&[("before", before), ("limit", u64::from(page_size))])
            .bearer_auth(&self.api_token)
            .send()
            .await
            .context("failed to fetch older messages")?;
        Self::ensure_success(response)
            .await?
            .json()
            .await
            .context("failed to parse message page response")
    }

    async fn send_message(&self, conversation_id: &str, content: &str) -> Result<SendReceipt> {
        let response = self
            .client
            .post(self.url(&format!("/conversations/{conversation_id}/messages")))
            .bearer_auth(&self.api_token)
            .json(&serde_json::json!({ "content": content }))
            .send()
            .await
            .context("failed to send message")?;
        Self::ensure_success(response)
            .await?
            .json()
            .await
            .context("failed to parse send receipt")
    }

    async fn delete_message(&self, conversation_id: &str, message_id: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.url(&format!(
                "/conversations/{conversation_id}/messages/{message_id}"
            )))
            .bearer_auth(&self.api_token)
            .send()
            .await
            .context("failed to delete message")?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    async fn fetch_contact_profile(&self, conversation_id: &str) -> Result<ContactProfile> {
        let response = self
            .client
            .get(self.url(&format!("/conversations/{conversation_id}/contact")))
            .bearer_auth(&self.api_token)
            .send()
            .await
            .context("failed to fetch contact profile")?;
        Self::ensure_success(response)
            .await?
            .json()
            .await
            .context("failed to parse contact profile response")
    }
}
