use std::sync::Arc;

use anyhow::{Error, Result};
use axum::{
    Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::{StatusCode, Uri, header},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Map, Value};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::{
    clients::{health::HealthChecker, rebuild::RebuildClient, store::ExpiringSet},
    config::Config,
    frontend::{FrontendLinks, is_preview},
    models::{
        event::InboundEvent,
        health::HealthStatus,
        rebuild::TriggerSource,
        response::{LinkResponse, RebuildResponse, StatusResponse},
    },
    relay::EventRelay,
    security,
};

/// Prefix the storefront used when these routes lived behind the CMS REST API.
pub const LEGACY_PREFIX: &str = "/wp-json/custom/v1";

pub struct AppState {
    pub relay: EventRelay,
    pub rebuild: Arc<RebuildClient>,
    pub frontend: FrontendLinks,
    pub health_checker: HealthChecker,
}

impl AppState {
    pub fn new(config: &Config, store: Arc<dyn ExpiringSet>) -> Result<Arc<Self>, Error> {
        Ok(Arc::new(Self {
            relay: EventRelay::from_config(config, Arc::clone(&store)),
            rebuild: Arc::new(RebuildClient::new(config)?),
            frontend: FrontendLinks::from_config(config),
            health_checker: HealthChecker::new(config, store),
        }))
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let relay_routes = Router::new()
        .route("/receive-data", post(receive_form))
        .route("/order-log", post(order_log))
        .route("/error-log", post(error_log));

    let app = Router::new()
        .merge(relay_routes.clone())
        .nest(LEGACY_PREFIX, relay_routes)
        .route("/rebuild", post(trigger_rebuild))
        .route("/health", get(health_check))
        .route("/frontend/reset-link", get(reset_link))
        .route("/frontend/account-link/{endpoint}", get(account_link))
        .fallback(redirect_to_frontend)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    security::harden(app)
}

pub async fn run_api_server(config: &Config, state: Arc<AppState>) -> Result<(), Error> {
    let app = router(state);

    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = TcpListener::bind(&addr).await?;

    info!(address = %addr, "Relay server started");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Unparseable bodies are treated as an empty object.
fn json_body(body: &Bytes) -> Value {
    serde_json::from_slice(body).unwrap_or_else(|e| {
        debug!(error = %e, "Request body is not valid JSON");
        Value::Object(Map::new())
    })
}

async fn receive_form(State(state): State<Arc<AppState>>, body: Bytes) -> Json<StatusResponse> {
    let event = InboundEvent::form_submission(&json_body(&body));
    Json(state.relay.handle(event).await.into())
}

async fn order_log(State(state): State<Arc<AppState>>, body: Bytes) -> Json<StatusResponse> {
    let event = InboundEvent::order_paid(&json_body(&body));
    Json(state.relay.handle(event).await.into())
}

async fn error_log(State(state): State<Arc<AppState>>, body: Bytes) -> Json<StatusResponse> {
    let event = InboundEvent::checkout_error(&json_body(&body));
    Json(state.relay.handle(event).await.into())
}

async fn trigger_rebuild(State(state): State<Arc<AppState>>) -> Json<RebuildResponse> {
    if !state.rebuild.is_configured() {
        return Json(RebuildResponse::error(
            "Build webhook URL not set.".to_string(),
        ));
    }

    let response = match state.rebuild.trigger(TriggerSource::Manual).await {
        Ok(status) => {
            RebuildResponse::success(format!("Rebuild triggered. HTTP {}", status.as_u16()))
        }
        Err(e) => RebuildResponse::error(format!("Request error: {}", e)),
    };

    Json(response)
}

async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_checker.check_all().await;

    let status_code = match health.status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

#[derive(Debug, Deserialize)]
struct ResetLinkParams {
    #[serde(default)]
    key: String,
    #[serde(default)]
    login: String,
}

async fn reset_link(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ResetLinkParams>,
) -> Json<LinkResponse> {
    Json(LinkResponse {
        url: state.frontend.password_reset_url(&params.key, &params.login),
        message: Some(
            state
                .frontend
                .password_reset_message(&params.key, &params.login),
        ),
    })
}

#[derive(Debug, Deserialize)]
struct AccountLinkParams {
    #[serde(default)]
    url: String,
}

async fn account_link(
    State(state): State<Arc<AppState>>,
    Path(endpoint): Path<String>,
    Query(params): Query<AccountLinkParams>,
) -> Json<LinkResponse> {
    Json(LinkResponse {
        url: state.frontend.endpoint_url(&endpoint, &params.url),
        message: None,
    })
}

async fn redirect_to_frontend(State(state): State<Arc<AppState>>, uri: Uri) -> Response {
    if is_preview(uri.query()) {
        return StatusCode::NOT_FOUND.into_response();
    }

    let path_and_query = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let target = state.frontend.redirect_target(path_and_query);

    debug!(%uri, %target, "Redirecting to frontend");

    (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, target)]).into_response()
}
