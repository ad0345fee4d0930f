use std::path::PathBuf;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bridge::{InboundConnector, ACTION_ADD_MARKER, ACTION_CENTER, ACTION_CLEAR, BRIDGE_PATH};
use runtime::{Outbox, SharedMetrics};
use serde_json::Value;
use sync::UiAction;
use tokio::sync::mpsc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::config::DroneSettings;
use crate::ws::handle_renderer_socket;

pub const DRONE_ICON_PATH: &str = "/assets/drone.png";

#[derive(Clone)]
pub struct AppState {
    pub page: Arc<str>,
    pub outbox: Outbox<String>,
    pub connector: InboundConnector,
    pub ui: mpsc::UnboundedSender<UiAction>,
    pub metrics: SharedMetrics,
    pub settings: Arc<DroneSettings>,
    pub drone_icon: Option<PathBuf>,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS]);

    Router::new()
        .route("/", get(index))
        .route(BRIDGE_PATH, get(bridge_socket))
        .route(ACTION_ADD_MARKER, post(add_marker))
        .route(ACTION_CENTER, post(center))
        .route(ACTION_CLEAR, post(clear))
        .route(DRONE_ICON_PATH, get(drone_icon))
        .route("/settings", get(settings))
        .route("/status", get(status))
        .route("/healthz", get(healthz))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index(State(state): State<AppState>) -> Html<String> {
    Html(state.page.to_string())
}

async fn bridge_socket(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_renderer_socket(socket, state))
}

async fn add_marker(State(state): State<AppState>, body: Bytes) -> StatusCode {
    let (lat, lng) = coordinate_fields(&body);
    submit(&state, UiAction::AddMarker { lat, lng })
}

async fn center(State(state): State<AppState>, body: Bytes) -> StatusCode {
    let (lat, lng) = coordinate_fields(&body);
    submit(&state, UiAction::Center { lat, lng })
}

async fn clear(State(state): State<AppState>) -> StatusCode {
    submit(&state, UiAction::ClearAll)
}

fn submit(state: &AppState, action: UiAction) -> StatusCode {
    if state.ui.send(action).is_err() {
        error!("app loop is gone, action dropped");
        return StatusCode::SERVICE_UNAVAILABLE;
    }
    StatusCode::ACCEPTED
}

/// Pulls `lat`/`lng` text out of an action body.
///
/// Anything unreadable becomes empty text, which the session then ignores
/// like any other unparseable input.
fn coordinate_fields(body: &[u8]) -> (String, String) {
    let value: Value = serde_json::from_slice(body).unwrap_or(Value::Null);
    (field_text(&value, "lat"), field_text(&value, "lng"))
}

fn field_text(value: &Value, key: &str) -> String {
    match value.get(key) {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        _ => String::new(),
    }
}

async fn drone_icon(State(state): State<AppState>) -> Response {
    let Some(path) = state.drone_icon.as_ref() else {
        return (StatusCode::NOT_FOUND, "no drone icon").into_response();
    };
    match tokio::fs::read(path).await {
        Ok(bytes) => {
            let mut headers = HeaderMap::new();
            headers.insert(
                http::header::CONTENT_TYPE,
                HeaderValue::from_static("image/png"),
            );
            (StatusCode::OK, headers, Body::from(bytes)).into_response()
        }
        Err(err) => {
            warn!("drone icon unreadable: {err}");
            (StatusCode::NOT_FOUND, "no drone icon").into_response()
        }
    }
}

async fn settings(State(state): State<AppState>) -> Json<DroneSettings> {
    Json(state.settings.as_ref().clone())
}

async fn status(State(state): State<AppState>) -> Response {
    let snapshot = state.metrics.lock().snapshot();
    let body = serde_json::json!({
        "renderer_attached": state.outbox.is_attached(),
        "counters": snapshot.counters,
        "gauges": snapshot.gauges,
    });
    Json(body).into_response()
}

async fn healthz() -> Response {
    (StatusCode::OK, "ok").into_response()
}
