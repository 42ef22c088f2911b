use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use super::{AnalysisError, AnalysisRow, ResultSink};
use crate::credentials::TokenProvider;

/// Appends result rows to one sheet of a spreadsheet through the Sheets
/// API `values:append` call. Values are stored as sent, not parsed.
pub struct SheetsAppender {
    client: reqwest::Client,
    base_url: String,
    spreadsheet_id: String,
    sheet_name: String,
    tokens: Arc<dyn TokenProvider>,
}

impl SheetsAppender {
    pub fn new(
        client: reqwest::Client,
        base_url: &str,
        spreadsheet_id: &str,
        sheet_name: &str,
        tokens: Arc<dyn TokenProvider>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
            spreadsheet_id: spreadsheet_id.to_string(),
            sheet_name: sheet_name.to_string(),
            tokens,
        }
    }

    fn append_url(&self) -> Result<reqwest::Url, AnalysisError> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| AnalysisError::from(format!("Invalid Sheets API URL: {e}")))?;
        let range = format!("{}:append", self.sheet_name);

        url.path_segments_mut()
            .map_err(|_| AnalysisError::from("Invalid Sheets API URL: cannot be a base"))?
            .pop_if_empty()
            .extend([
                "v4",
                "spreadsheets",
                self.spreadsheet_id.as_str(),
                "values",
                range.as_str(),
            ]);

        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW")
            .append_pair("insertDataOption", "INSERT_ROWS");

        Ok(url)
    }
}

#[async_trait]
impl ResultSink for SheetsAppender {
    async fn append(&self, row: &AnalysisRow) -> Result<(), AnalysisError> {
        let url = self.append_url()?;
        let token = self.tokens.token().await?;

        let resp = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&json!({
                "values": [[
                    row.timestamp,
                    row.name,
                    row.full_text,
                    row.sentiment_score,
                    row.final_score,
                ]],
            }))
            .send()
            .await
            .map_err(|e| AnalysisError::from(format!("Sheets append failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AnalysisError::from(format!(
                "Sheets API returned {}: {}",
                status.as_u16(),
                body.trim()
            )));
        }

        Ok(())
    }
}
