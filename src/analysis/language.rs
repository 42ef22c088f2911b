use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::{AnalysisError, SentimentScorer};
use crate::credentials::TokenProvider;

/// Google Cloud Natural Language `documents:analyzeSentiment`.
pub struct NaturalLanguage {
    client: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenProvider>,
}

// Zero-valued fields are left out of the JSON response.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SentimentResponse {
    #[serde(default)]
    document_sentiment: DocumentSentiment,
}

#[derive(Default, Deserialize)]
struct DocumentSentiment {
    #[serde(default)]
    score: f64,
}

impl NaturalLanguage {
    pub fn new(client: reqwest::Client, base_url: &str, tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
        }
    }
}

#[async_trait]
impl SentimentScorer for NaturalLanguage {
    async fn sentiment(&self, text: &str) -> Result<f64, AnalysisError> {
        let token = self.tokens.token().await?;

        let resp = self
            .client
            .post(format!("{}/v1/documents:analyzeSentiment", self.base_url))
            .bearer_auth(token)
            .json(&json!({
                "document": { "type": "PLAIN_TEXT", "content": text },
                "encodingType": "UTF8",
            }))
            .send()
            .await
            .map_err(|e| AnalysisError::from(format!("Sentiment request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AnalysisError::from(format!(
                "Sentiment API returned {}: {}",
                status.as_u16(),
                body.trim()
            )));
        }

        let parsed: SentimentResponse = resp
            .json()
            .await
            .map_err(|e| AnalysisError::from(format!("Malformed sentiment response: {e}")))?;

        Ok(parsed.document_sentiment.score)
    }
}
