//! Direct publish integrations
//!
//! A [`DirectIntegration`] pushes content straight to an external platform
//! and returns the live URL. Integration failures are reported as
//! `AtelierError::Integration` so the controller can fall back to a deferred
//! workflow instead of failing the request.

use async_trait::async_trait;
use atelier_core::{AtelierError, Deliverable, Result};
use serde_json::json;
use tracing::debug;

#[async_trait]
pub trait DirectIntegration: Send + Sync {
    /// Target name this integration serves (e.g. "webflow")
    fn target(&self) -> &str;

    /// Push the deliverable live and return its URL
    async fn publish(&self, deliverable: &Deliverable) -> Result<String>;
}

/// Webflow CMS integration
pub struct WebflowIntegration {
    client: reqwest::Client,
    base_url: String,
    api_token: String,
    collection_id: String,
}

impl WebflowIntegration {
    pub fn new(
        base_url: impl Into<String>,
        api_token: impl Into<String>,
        collection_id: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_token: api_token.into(),
            collection_id: collection_id.into(),
        }
    }
}

#[async_trait]
impl DirectIntegration for WebflowIntegration {
    fn target(&self) -> &str {
        "webflow"
    }

    async fn publish(&self, deliverable: &Deliverable) -> Result<String> {
        let url = format!(
            "{}/v2/collections/{}/items/live",
            self.base_url, self.collection_id
        );
        debug!(deliverable = %deliverable.id, %url, "publishing to webflow");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_token)
            .json(&json!({
                "fieldData": {
                    "name": format!("{}-{}", deliverable.deliverable_type, deliverable.id),
                    "content": deliverable.content,
                }
            }))
            .send()
            .await
            .map_err(|e| AtelierError::Integration(format!("webflow request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AtelierError::Integration(format!(
                "webflow returned {}",
                response.status()
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AtelierError::Integration(format!("webflow response unreadable: {}", e)))?;

        body.get("url")
            .and_then(|u| u.as_str())
            .map(str::to_string)
            .ok_or_else(|| {
                AtelierError::Integration("webflow response carried no item url".to_string())
            })
    }
}
