use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::CredentialSource;

#[derive(Debug)]
pub struct CredentialError {
    pub message: String,
}

impl std::fmt::Display for CredentialError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<String> for CredentialError {
    fn from(s: String) -> Self {
        CredentialError { message: s }
    }
}

impl From<&str> for CredentialError {
    fn from(s: &str) -> Self {
        CredentialError {
            message: s.to_string(),
        }
    }
}

/// Source of a bearer token. Implementations are asked once per outbound
/// request and must not cache.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn token(&self) -> Result<String, CredentialError>;
}

pub struct StaticToken {
    token: String,
}

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn token(&self) -> Result<String, CredentialError> {
        if self.token.is_empty() {
            return Err(CredentialError::from("Configured token is empty"));
        }
        Ok(self.token.clone())
    }
}

const ACCOUNT_PATH: &str = "/computeMetadata/v1/instance/service-accounts/default";

enum MetadataToken {
    /// OIDC identity token, `aud` set to the receiving service.
    Identity { audience: String },
    /// OAuth access token for Google APIs.
    Access { scopes: String },
}

#[derive(Deserialize)]
struct AccessTokenResponse {
    access_token: String,
}

/// Mints tokens for the default service account through the compute
/// metadata server.
pub struct MetadataServer {
    client: reqwest::Client,
    base_url: String,
    kind: MetadataToken,
}

impl MetadataServer {
    pub fn identity(client: reqwest::Client, base_url: &str, audience: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            kind: MetadataToken::Identity {
                audience: audience.to_string(),
            },
        }
    }

    pub fn access(client: reqwest::Client, base_url: &str, scopes: &[&str]) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            kind: MetadataToken::Access {
                scopes: scopes.join(","),
            },
        }
    }

    fn url(&self) -> Result<reqwest::Url, CredentialError> {
        let parsed = match &self.kind {
            MetadataToken::Identity { audience } => reqwest::Url::parse_with_params(
                &format!("{}{ACCOUNT_PATH}/identity", self.base_url),
                &[("audience", audience.as_str()), ("format", "full")],
            ),
            MetadataToken::Access { scopes } => reqwest::Url::parse_with_params(
                &format!("{}{ACCOUNT_PATH}/token", self.base_url),
                &[("scopes", scopes.as_str())],
            ),
        };
        parsed.map_err(|e| CredentialError::from(format!("Invalid metadata server URL: {e}")))
    }
}

#[async_trait]
impl TokenProvider for MetadataServer {
    async fn token(&self) -> Result<String, CredentialError> {
        let resp = self
            .client
            .get(self.url()?)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| CredentialError::from(format!("Metadata server request failed: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| CredentialError::from(format!("Metadata server read failed: {e}")))?;

        if !status.is_success() {
            return Err(CredentialError::from(format!(
                "Metadata server returned {}: {}",
                status.as_u16(),
                body.trim()
            )));
        }

        let token = match self.kind {
            MetadataToken::Identity { .. } => body.trim().to_string(),
            MetadataToken::Access { .. } => {
                serde_json::from_str::<AccessTokenResponse>(&body)
                    .map_err(|e| {
                        CredentialError::from(format!("Malformed access token response: {e}"))
                    })?
                    .access_token
            }
        };

        if token.is_empty() {
            return Err(CredentialError::from("Metadata server returned an empty token"));
        }

        Ok(token)
    }
}

/// Identity token provider for deliveries to `audience`.
pub fn identity_from_source(
    source: &CredentialSource,
    client: reqwest::Client,
    audience: &str,
) -> Arc<dyn TokenProvider> {
    match source {
        CredentialSource::Metadata { base_url } => {
            Arc::new(MetadataServer::identity(client, base_url, audience))
        }
        CredentialSource::Static { token } => Arc::new(StaticToken::new(token.clone())),
    }
}

/// Access token provider for Google API calls under `scopes`.
pub fn access_from_source(
    source: &CredentialSource,
    client: reqwest::Client,
    scopes: &[&str],
) -> Arc<dyn TokenProvider> {
    match source {
        CredentialSource::Metadata { base_url } => {
            Arc::new(MetadataServer::access(client, base_url, scopes))
        }
        CredentialSource::Static { token } => Arc::new(StaticToken::new(token.clone())),
    }
}
