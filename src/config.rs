use std::net::IpAddr;
use std::time::Duration;

use crate::analysis::scoring::Scoring;
use crate::form::FormLayout;

#[derive(Debug, Clone)]
pub struct Config {
    pub target_url: String,
    pub host: IpAddr,
    pub port: u16,
    pub layout: FormLayout,
    pub credentials: CredentialSource,
    pub request_timeout: Option<Duration>,
    pub max_body_size: usize,
    pub log_level: String,
    /// Receiving side; enabled when a result spreadsheet is configured.
    pub analysis: Option<AnalysisConfig>,
}

#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub sheet_id: String,
    pub sheet_name: String,
    pub scoring: Scoring,
    pub credentials: CredentialSource,
    pub language_api_url: String,
    pub sheets_api_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CredentialSource {
    /// Fresh token from the compute metadata server on every call.
    Metadata { base_url: String },
    /// Token injected at deploy time.
    Static { token: String },
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let target_url = env_required("FORMHOOK_TARGET_URL")?;
        reqwest::Url::parse(&target_url)
            .map_err(|e| format!("Invalid FORMHOOK_TARGET_URL: {e}"))?;

        let host: IpAddr = env_or("FORMHOOK_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid FORMHOOK_HOST: {e}"))?;

        let port: u16 = env_or("FORMHOOK_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid FORMHOOK_PORT: {e}"))?;

        let timestamp_index: usize = env_or("FORMHOOK_TIMESTAMP_COLUMN", "0")
            .parse()
            .map_err(|e| format!("Invalid FORMHOOK_TIMESTAMP_COLUMN: {e}"))?;

        let name_index: usize = env_or("FORMHOOK_NAME_COLUMN", "1")
            .parse()
            .map_err(|e| format!("Invalid FORMHOOK_NAME_COLUMN: {e}"))?;

        let answer_indices = parse_columns(&env_or(
            "FORMHOOK_ANSWER_COLUMNS",
            "6,7,8,9,10,15,16,17",
        ))?;

        let credentials = credential_source("FORMHOOK_CREDENTIALS", "FORMHOOK_IDENTITY_TOKEN")?;

        let request_timeout = match std::env::var("FORMHOOK_REQUEST_TIMEOUT_SECS") {
            Ok(secs) => Some(Duration::from_secs(
                secs.parse()
                    .map_err(|e| format!("Invalid FORMHOOK_REQUEST_TIMEOUT_SECS: {e}"))?,
            )),
            Err(_) => None,
        };

        let max_body_size: usize = env_or("FORMHOOK_MAX_BODY_SIZE", "1048576")
            .parse()
            .map_err(|e| format!("Invalid FORMHOOK_MAX_BODY_SIZE: {e}"))?;

        let log_level = env_or("FORMHOOK_LOG_LEVEL", "info");

        let analysis = match std::env::var("FORMHOOK_SHEET_ID") {
            Ok(sheet_id) if !sheet_id.is_empty() => Some(analysis_from_env(sheet_id)?),
            _ => None,
        };

        Ok(Config {
            target_url,
            host,
            port,
            layout: FormLayout {
                timestamp_index,
                name_index,
                answer_indices,
            },
            credentials,
            request_timeout,
            max_body_size,
            log_level,
            analysis,
        })
    }
}

fn analysis_from_env(sheet_id: String) -> Result<AnalysisConfig, String> {
    let defaults = Scoring::default();

    let multiplier: f64 = match std::env::var("FORMHOOK_SCORE_MULTIPLIER") {
        Ok(v) => v
            .parse()
            .map_err(|e| format!("Invalid FORMHOOK_SCORE_MULTIPLIER: {e}"))?,
        Err(_) => defaults.multiplier,
    };

    let keyword_bonus: f64 = match std::env::var("FORMHOOK_KEYWORD_BONUS") {
        Ok(v) => v
            .parse()
            .map_err(|e| format!("Invalid FORMHOOK_KEYWORD_BONUS: {e}"))?,
        Err(_) => defaults.keyword_bonus,
    };

    let positive = std::env::var("FORMHOOK_KEYWORDS_POSITIVE")
        .map(|v| parse_keywords(&v))
        .unwrap_or(defaults.positive);
    let negative = std::env::var("FORMHOOK_KEYWORDS_NEGATIVE")
        .map(|v| parse_keywords(&v))
        .unwrap_or(defaults.negative);

    Ok(AnalysisConfig {
        sheet_id,
        sheet_name: env_or("FORMHOOK_SHEET_NAME", "Result_Output"),
        scoring: Scoring {
            multiplier,
            keyword_bonus,
            positive,
            negative,
        },
        credentials: credential_source("FORMHOOK_ACCESS_CREDENTIALS", "FORMHOOK_ACCESS_TOKEN")?,
        language_api_url: env_or("FORMHOOK_LANGUAGE_API_URL", "https://language.googleapis.com"),
        sheets_api_url: env_or("FORMHOOK_SHEETS_API_URL", "https://sheets.googleapis.com"),
    })
}

fn credential_source(kind_key: &str, token_key: &str) -> Result<CredentialSource, String> {
    match env_or(kind_key, "metadata").as_str() {
        "static" => Ok(CredentialSource::Static {
            token: env_required(token_key)?,
        }),
        "metadata" => Ok(CredentialSource::Metadata {
            base_url: env_or("FORMHOOK_METADATA_URL", "http://metadata.google.internal"),
        }),
        other => Err(format!("Invalid {kind_key}: {other}")),
    }
}

fn parse_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a comma-separated list of zero-based column indices, keeping order.
pub fn parse_columns(raw: &str) -> Result<Vec<usize>, String> {
    raw.split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| {
            s.trim()
                .parse()
                .map_err(|e| format!("Invalid FORMHOOK_ANSWER_COLUMNS entry '{s}': {e}"))
        })
        .collect()
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
