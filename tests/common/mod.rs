#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::routing::{get, post};
use reqwest::Client;
use serde_json::{Value, json};

use formhook::analysis::Analyzer;
use formhook::analysis::scoring::Scoring;
use formhook::config::{AnalysisConfig, Config, CredentialSource};
use formhook::credentials::{CredentialError, StaticToken, TokenProvider};
use formhook::delivery::Deliverer;
use formhook::form::FormLayout;

pub const TEST_TOKEN: &str = "test-identity-token";
pub const METADATA_TOKEN: &str = "minted-by-metadata";
pub const ACCESS_TOKEN: &str = "access-from-metadata";

const IDENTITY_PATH: &str = "/computeMetadata/v1/instance/service-accounts/default/identity";
const TOKEN_PATH: &str = "/computeMetadata/v1/instance/service-accounts/default/token";
const SENTIMENT_PATH: &str = "/v1/documents:analyzeSentiment";

/// A request as seen by the fake target.
#[derive(Debug, Clone)]
pub struct Received {
    pub path: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub metadata_flavor: Option<String>,
    pub query: Vec<(String, String)>,
    pub body: Value,
}

#[derive(Clone)]
struct TargetState {
    status: StatusCode,
    reply: String,
    document_sentiment: Value,
    sheet_status: StatusCode,
    calls: Arc<Mutex<Vec<Received>>>,
}

/// In-process stand-in for the delivery target, the metadata server and
/// the Natural Language and Sheets APIs.
pub struct Target {
    pub addr: SocketAddr,
    calls: Arc<Mutex<Vec<Received>>>,
}

impl Target {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn hook_url(&self) -> String {
        self.url("/hook")
    }

    fn calls_where(&self, pred: impl Fn(&str) -> bool) -> Vec<Received> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|r| pred(&r.path))
            .cloned()
            .collect()
    }

    pub fn hooks(&self) -> Vec<Received> {
        self.calls_where(|p| p == "/hook")
    }

    pub fn identity_requests(&self) -> Vec<Received> {
        self.calls_where(|p| p == IDENTITY_PATH)
    }

    pub fn token_requests(&self) -> Vec<Received> {
        self.calls_where(|p| p == TOKEN_PATH)
    }

    pub fn sentiment_requests(&self) -> Vec<Received> {
        self.calls_where(|p| p == SENTIMENT_PATH)
    }

    pub fn sheet_appends(&self) -> Vec<Received> {
        self.calls_where(|p| p.starts_with("/v4/spreadsheets/"))
    }
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

fn record(
    state: &TargetState,
    uri: &Uri,
    headers: &HeaderMap,
    query: Vec<(String, String)>,
    body: &[u8],
) -> Option<String> {
    let flavor = header(headers, "metadata-flavor");
    state.calls.lock().unwrap().push(Received {
        path: uri.path().to_string(),
        authorization: header(headers, "authorization"),
        content_type: header(headers, "content-type"),
        metadata_flavor: flavor.clone(),
        query,
        body: serde_json::from_slice(body).unwrap_or(Value::Null),
    });
    flavor
}

async fn hook(
    State(state): State<TargetState>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, String) {
    record(&state, &uri, &headers, vec![], &body);
    (state.status, state.reply.clone())
}

async fn identity(
    State(state): State<TargetState>,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<Vec<(String, String)>>,
) -> (StatusCode, String) {
    match record(&state, &uri, &headers, query, b"").as_deref() {
        Some("Google") => (StatusCode::OK, format!("{METADATA_TOKEN}\n")),
        _ => (StatusCode::FORBIDDEN, "missing Metadata-Flavor".to_string()),
    }
}

async fn access_token(
    State(state): State<TargetState>,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<Vec<(String, String)>>,
) -> (StatusCode, Json<Value>) {
    match record(&state, &uri, &headers, query, b"").as_deref() {
        Some("Google") => (
            StatusCode::OK,
            Json(json!({
                "access_token": ACCESS_TOKEN,
                "expires_in": 3599,
                "token_type": "Bearer",
            })),
        ),
        _ => (StatusCode::FORBIDDEN, Json(json!({ "error": "flavor" }))),
    }
}

async fn sentiment(
    State(state): State<TargetState>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Json<Value> {
    record(&state, &uri, &headers, vec![], &body);
    Json(json!({
        "documentSentiment": state.document_sentiment,
        "language": "ja",
    }))
}

async fn sheet_append(
    State(state): State<TargetState>,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<Vec<(String, String)>>,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    record(&state, &uri, &headers, query, &body);
    (state.sheet_status, Json(json!({})))
}

async fn spawn(state: TargetState) -> Target {
    let calls = state.calls.clone();

    let app = Router::new()
        .route("/hook", post(hook))
        .route(IDENTITY_PATH, get(identity))
        .route(TOKEN_PATH, get(access_token))
        .route(SENTIMENT_PATH, post(sentiment))
        .route("/v4/spreadsheets/{id}/values/{range}", post(sheet_append))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind target");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Target failed");
    });

    Target { addr, calls }
}

/// Spawn a target that answers every hook with `status` and `reply`.
pub async fn spawn_target(status: StatusCode, reply: &str) -> Target {
    spawn(TargetState {
        status,
        reply: reply.to_string(),
        document_sentiment: json!({}),
        sheet_status: StatusCode::OK,
        calls: Arc::new(Mutex::new(Vec::new())),
    })
    .await
}

/// Spawn fake Google APIs: the sentiment endpoint answers with
/// `document_sentiment`, the Sheets endpoint with `sheet_status`.
pub async fn spawn_google(document_sentiment: Value, sheet_status: StatusCode) -> Target {
    spawn(TargetState {
        status: StatusCode::OK,
        reply: "ok".to_string(),
        document_sentiment,
        sheet_status,
        calls: Arc::new(Mutex::new(Vec::new())),
    })
    .await
}

/// An address nothing listens on.
pub async fn closed_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/hook")
}

pub struct FailingToken;

#[async_trait]
impl TokenProvider for FailingToken {
    async fn token(&self) -> Result<String, CredentialError> {
        Err(CredentialError::from("no identity available in this environment"))
    }
}

pub fn test_config(target_url: &str) -> Config {
    Config {
        target_url: target_url.to_string(),
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        layout: FormLayout::default(),
        credentials: CredentialSource::Static {
            token: TEST_TOKEN.to_string(),
        },
        request_timeout: None,
        max_body_size: 1_048_576,
        log_level: "warn".to_string(),
        analysis: None,
    }
}

/// Analysis settings pointing every Google API at `target`.
pub fn analysis_config(target: &Target) -> AnalysisConfig {
    AnalysisConfig {
        sheet_id: "sheet-1".to_string(),
        sheet_name: "Result_Output".to_string(),
        scoring: Scoring::default(),
        credentials: CredentialSource::Metadata {
            base_url: target.url(""),
        },
        language_api_url: target.url(""),
        sheets_api_url: target.url(""),
    }
}

pub fn deliverer(target_url: &str, credentials: Arc<dyn TokenProvider>) -> Deliverer {
    Deliverer::new(Client::new(), target_url, credentials)
}

pub fn static_deliverer(target_url: &str) -> Deliverer {
    deliverer(target_url, Arc::new(StaticToken::new(TEST_TOKEN)))
}

/// A running formhook instance.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// POST a raw trigger body, return (body, status).
    pub async fn trigger_raw(&self, body: &str) -> (Value, reqwest::StatusCode) {
        let resp = self
            .client
            .post(self.url("/v1/triggers/form-submit"))
            .header("content-type", "application/json")
            .body(body.to_string())
            .send()
            .await
            .expect("trigger request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn trigger(&self, event: &Value) -> (Value, reqwest::StatusCode) {
        self.trigger_raw(&event.to_string()).await
    }

    /// POST a raw body to the analysis endpoint, return (body, status).
    pub async fn analyze_raw(&self, body: &str) -> (Value, reqwest::StatusCode) {
        let resp = self
            .client
            .post(self.url("/v1/analyze-submission"))
            .header("content-type", "application/json")
            .body(body.to_string())
            .send()
            .await
            .expect("analyze request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn analyze(&self, request: &Value) -> (Value, reqwest::StatusCode) {
        self.analyze_raw(&request.to_string()).await
    }
}

pub async fn spawn_app(config: Config) -> TestApp {
    let app = formhook::build_app(config).expect("Failed to build app");
    serve(app).await
}

pub async fn spawn_app_with(config: Config, deliverer: Deliverer) -> TestApp {
    serve(formhook::build_app_with(config, deliverer, None)).await
}

/// Spawn with a hand-built analyzer; deliveries go to a closed port.
pub async fn spawn_analyzer(analyzer: Analyzer) -> TestApp {
    let config = test_config("http://127.0.0.1:9/hook");
    let deliverer = static_deliverer(&config.target_url);
    serve(formhook::build_app_with(config, deliverer, Some(analyzer))).await
}

async fn serve(app: Router) -> TestApp {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    TestApp {
        addr,
        client: Client::new(),
    }
}

/// The worked example row: timestamp, name, blanks, five answers, blanks,
/// three answers.
pub fn example_values() -> Value {
    json!([
        "2024-01-01T00:00:00Z",
        "Alice",
        "",
        "",
        "",
        "",
        "x",
        "y",
        "z",
        "w",
        "v",
        "",
        "",
        "",
        "",
        "p",
        "q",
        "r"
    ])
}
