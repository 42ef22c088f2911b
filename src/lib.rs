pub mod analysis;
pub mod config;
pub mod credentials;
pub mod delivery;
pub mod error;
pub mod form;
pub mod forward;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderName, HeaderValue};
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::analysis::Analyzer;
use crate::config::Config;
use crate::delivery::Deliverer;
use crate::state::{AppState, SharedState};

/// Wire the deliverer and the optional analyzer from configuration and
/// build the router.
pub fn build_app(config: Config) -> Result<Router, String> {
    let client = delivery::build_client(config.request_timeout)?;
    let credentials =
        credentials::identity_from_source(&config.credentials, client.clone(), &config.target_url);
    let deliverer = Deliverer::new(client.clone(), config.target_url.clone(), credentials);

    let analyzer = config
        .analysis
        .as_ref()
        .map(|settings| analysis::from_config(settings, client));

    Ok(build_app_with(config, deliverer, analyzer))
}

/// Build the router around already constructed collaborators.
pub fn build_app_with(config: Config, deliverer: Deliverer, analyzer: Option<Analyzer>) -> Router {
    let max_body_size = config.max_body_size;
    let state: SharedState = Arc::new(AppState {
        config,
        deliverer,
        analyzer,
    });

    Router::new()
        .merge(routes::trigger_routes())
        .merge(routes::analysis_routes())
        .route("/health", axum::routing::get(health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(max_body_size))
                .layer(SetResponseHeaderLayer::overriding(
                    HeaderName::from_static("x-content-type-options"),
                    HeaderValue::from_static("nosniff"),
                )),
        )
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
