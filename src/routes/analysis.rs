use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};

use crate::analysis::{Analysis, AnalysisRequest};
use crate::error::AppError;
use crate::state::SharedState;

/// Receiving end of the forwarder: score a submission and record it.
pub async fn analyze_submission(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<Response, AppError> {
    let Some(analyzer) = state.analyzer.as_ref() else {
        return Err(AppError::NotFound("Analysis is not enabled".to_string()));
    };

    let request = parse_request(&body)?;

    let body = match analyzer
        .analyze(&request)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    {
        Analysis::Skipped => json!({ "status": "skipped", "reason": "No content" }),
        Analysis::Scored(row) => json!({ "status": "success", "score": row.final_score }),
    };

    Ok((StatusCode::OK, Json(body)).into_response())
}

/// Empty or unparseable bodies are a 400; anything else that does not fit
/// the request shape is a 422.
fn parse_request(body: &[u8]) -> Result<AnalysisRequest, AppError> {
    let raw: Value = serde_json::from_slice(body)
        .map_err(|_| AppError::BadRequest("Invalid JSON".to_string()))?;

    if is_empty(&raw) {
        return Err(AppError::BadRequest("Invalid JSON".to_string()));
    }

    let Value::Object(_) = raw else {
        tracing::warn!("Validation Error: expected a JSON object");
        return Err(AppError::Validation("expected a JSON object".to_string()));
    };

    serde_json::from_value(raw).map_err(|e| {
        tracing::warn!("Validation Error: {e}");
        AppError::Validation(e.to_string())
    })
}

fn is_empty(raw: &Value) -> bool {
    match raw {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}
