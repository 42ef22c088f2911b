pub mod analysis;
pub mod triggers;

use axum::Router;
use axum::routing::post;

use crate::state::SharedState;

pub fn trigger_routes() -> Router<SharedState> {
    Router::new().route("/v1/triggers/form-submit", post(triggers::form_submit))
}

pub fn analysis_routes() -> Router<SharedState> {
    Router::new().route("/v1/analyze-submission", post(analysis::analyze_submission))
}
