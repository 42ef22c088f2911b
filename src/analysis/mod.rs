pub mod language;
pub mod scoring;
pub mod sheets;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

use crate::config::AnalysisConfig;
use crate::credentials::{self, CredentialError};
use language::NaturalLanguage;
use scoring::Scoring;
use sheets::SheetsAppender;

/// OAuth scopes the receiving side needs for its Google API calls.
pub const API_SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/cloud-language",
    "https://www.googleapis.com/auth/spreadsheets",
];

#[derive(Debug)]
pub struct AnalysisError {
    pub message: String,
}

impl std::fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<String> for AnalysisError {
    fn from(s: String) -> Self {
        AnalysisError { message: s }
    }
}

impl From<&str> for AnalysisError {
    fn from(s: &str) -> Self {
        AnalysisError {
            message: s.to_string(),
        }
    }
}

impl From<CredentialError> for AnalysisError {
    fn from(err: CredentialError) -> Self {
        AnalysisError {
            message: format!("Access token unavailable: {err}"),
        }
    }
}

/// Body posted by the forwarder.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisRequest {
    pub timestamp: String,
    pub name: String,
    /// Non-blank answers only; `null`, empty and whitespace-only entries
    /// are dropped while decoding.
    #[serde(default, deserialize_with = "non_blank")]
    pub answers: Vec<String>,
}

fn non_blank<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let raw = Vec::<Option<String>>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .flatten()
        .filter(|s| !s.trim().is_empty())
        .collect())
}

/// One line of the result sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisRow {
    pub timestamp: String,
    pub name: String,
    pub full_text: String,
    pub sentiment_score: f64,
    pub final_score: f64,
}

#[async_trait]
pub trait SentimentScorer: Send + Sync {
    /// Document sentiment in -1.0..=1.0.
    async fn sentiment(&self, text: &str) -> Result<f64, AnalysisError>;
}

#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn append(&self, row: &AnalysisRow) -> Result<(), AnalysisError>;
}

#[derive(Debug)]
pub enum Analysis {
    /// Every answer was blank; nothing was scored or stored.
    Skipped,
    Scored(AnalysisRow),
}

#[derive(Clone)]
pub struct Analyzer {
    scorer: Arc<dyn SentimentScorer>,
    sink: Arc<dyn ResultSink>,
    scoring: Scoring,
}

impl Analyzer {
    pub fn new(
        scorer: Arc<dyn SentimentScorer>,
        sink: Arc<dyn ResultSink>,
        scoring: Scoring,
    ) -> Self {
        Self {
            scorer,
            sink,
            scoring,
        }
    }

    /// Score the joined answers and append the result row.
    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<Analysis, AnalysisError> {
        if request.answers.is_empty() {
            tracing::info!("Skipped: No text content for {}", request.name);
            return Ok(Analysis::Skipped);
        }

        let full_text = request.answers.join(" ");
        let sentiment = self.scorer.sentiment(&full_text).await?;
        let final_score = self.scoring.final_score(sentiment, &full_text);

        let row = AnalysisRow {
            timestamp: request.timestamp.clone(),
            name: request.name.clone(),
            full_text,
            sentiment_score: sentiment,
            final_score,
        };
        self.sink.append(&row).await?;

        tracing::info!("Success: {} (Score: {final_score})", request.name);
        Ok(Analysis::Scored(row))
    }
}

/// Wire the Natural Language scorer and the Sheets sink from configuration.
pub fn from_config(config: &AnalysisConfig, client: reqwest::Client) -> Analyzer {
    let tokens = credentials::access_from_source(&config.credentials, client.clone(), &API_SCOPES);

    let scorer = NaturalLanguage::new(client.clone(), &config.language_api_url, tokens.clone());
    let sink = SheetsAppender::new(
        client,
        &config.sheets_api_url,
        &config.sheet_id,
        &config.sheet_name,
        tokens,
    );

    Analyzer::new(Arc::new(scorer), Arc::new(sink), config.scoring.clone())
}
