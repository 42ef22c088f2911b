use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};

use crate::error::AppError;
use crate::form::SubmissionEvent;
use crate::forward::{self, Invocation};
use crate::state::SharedState;

/// Form-submit trigger. The submitter side always gets a 200 once the body
/// parses; delivery failures only show up in the response body and logs.
pub async fn form_submit(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<Response, AppError> {
    let event = parse_event(&body)?;

    let outcome = forward::handle_submission(
        event.as_ref(),
        &state.config.layout,
        &state.deliverer,
    )
    .await;

    let body = match outcome {
        Invocation::Ignored => json!({ "status": "ignored" }),
        Invocation::Delivered(resp) => json!({
            "status": "delivered",
            "response_code": resp.status,
        }),
        Invocation::Failed(e) => json!({
            "status": "failed",
            "error": e.to_string(),
        }),
    };

    Ok((StatusCode::OK, Json(body)).into_response())
}

/// Decode a trigger body. Valid JSON that is not an object with a `values`
/// array yields `None` rather than an error.
fn parse_event(body: &[u8]) -> Result<Option<SubmissionEvent>, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    let raw: Value = serde_json::from_slice(body)
        .map_err(|e| AppError::BadRequest(format!("Invalid JSON: {e}")))?;

    // serde would also read a struct from a JSON array
    match raw {
        Value::Object(_) => Ok(serde_json::from_value(raw).ok()),
        _ => Ok(None),
    }
}
