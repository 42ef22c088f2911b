use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::credentials::TokenProvider;
use crate::error::DeliveryError;
use crate::form::Payload;

/// What the target answered. Any HTTP status counts as a completed call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliveryResponse {
    pub status: u16,
    pub body: String,
}

impl DeliveryResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Clone)]
pub struct Deliverer {
    client: reqwest::Client,
    target_url: String,
    credentials: Arc<dyn TokenProvider>,
}

impl Deliverer {
    pub fn new(
        client: reqwest::Client,
        target_url: impl Into<String>,
        credentials: Arc<dyn TokenProvider>,
    ) -> Self {
        Self {
            client,
            target_url: target_url.into(),
            credentials,
        }
    }

    /// POST the payload once. Failures are logged here and handed back;
    /// nothing is retried.
    pub async fn deliver(&self, payload: &Payload) -> Result<DeliveryResponse, DeliveryError> {
        match self.send(payload).await {
            Ok(resp) => {
                tracing::info!("Response Code: {}", resp.status);
                tracing::info!("Response Body: {}", resp.body);
                Ok(resp)
            }
            Err(e) => {
                tracing::error!("Error calling {}: {e}", self.target_url);
                Err(e)
            }
        }
    }

    async fn send(&self, payload: &Payload) -> Result<DeliveryResponse, DeliveryError> {
        let token = self.credentials.token().await?;
        let body = serde_json::to_vec(payload)?;

        let resp = self
            .client
            .post(&self.target_url)
            .header("Content-Type", "application/json")
            .bearer_auth(token)
            .body(body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        let body = resp.text().await?;

        Ok(DeliveryResponse { status, body })
    }
}

/// Outbound client shared by delivery and the metadata credential provider.
pub fn build_client(timeout: Option<Duration>) -> Result<reqwest::Client, String> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|e| format!("Failed to build HTTP client: {e}"))
}
