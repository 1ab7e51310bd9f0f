// Ledger Engine - HTTP bridge
// Exposes the ledger operations as a local JSON API for a desktop/web front-end

use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

use ledger_engine::{init_tracing, ApiResponse, Config, Engine, Ledger, RawAmount, RawRequest};

/// Shared application state
#[derive(Clone)]
struct AppState {
    engine: Arc<Engine>,
}

/// Body of `POST /api/entries`
#[derive(Debug, Deserialize)]
struct AddEntryBody {
    kind: String,
    amount: RawAmount,
    category: String,
    #[serde(default)]
    note: Option<String>,
}

impl From<AddEntryBody> for RawRequest {
    fn from(body: AddEntryBody) -> Self {
        RawRequest::Add {
            kind: body.kind,
            amount: body.amount,
            category: body.category,
            note: body.note,
        }
    }
}

fn status_for(response: &ApiResponse) -> StatusCode {
    match response.error.as_ref().map(|e| e.code.as_str()) {
        None => StatusCode::OK,
        Some("not_found") => StatusCode::NOT_FOUND,
        Some("storage_error") | Some("amount_overflow") | Some("invalid_config") => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        Some(_) => StatusCode::BAD_REQUEST,
    }
}

fn respond(response: ApiResponse) -> impl IntoResponse {
    (status_for(&response), Json(response))
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "success": true, "data": "OK" }))
}

/// GET /api/entries - All entries, newest first
async fn list_entries(State(state): State<AppState>) -> impl IntoResponse {
    respond(state.engine.handle(RawRequest::List))
}

/// POST /api/entries - Record a new entry
async fn add_entry(State(state): State<AppState>, Json(body): Json<AddEntryBody>) -> impl IntoResponse {
    respond(state.engine.handle(body.into()))
}

/// GET /api/entries/:id - One entry
async fn get_entry(State(state): State<AppState>, Path(id): Path<i64>) -> impl IntoResponse {
    respond(state.engine.handle(RawRequest::Get { id }))
}

/// DELETE /api/entries/:id - Remove an entry; `data` is false when it did not exist
async fn delete_entry(State(state): State<AppState>, Path(id): Path<i64>) -> impl IntoResponse {
    respond(state.engine.handle(RawRequest::Delete { id }))
}

/// GET /api/summary/:ym - Month summary
async fn month_summary(State(state): State<AppState>, Path(ym): Path<String>) -> impl IntoResponse {
    respond(state.engine.handle(RawRequest::GetMonthSummary { ym }))
}

/// GET /api/categories/:ym/:kind - Category totals
async fn category_totals(
    State(state): State<AppState>,
    Path((ym, kind)): Path<(String, String)>,
) -> impl IntoResponse {
    respond(state.engine.handle(RawRequest::GetCategoryTotals { ym, kind }))
}

/// POST /api/rpc - Any tagged request, e.g. {"op":"get_month_summary","ym":"2024-01"}
async fn rpc(State(state): State<AppState>, body: String) -> impl IntoResponse {
    respond(state.engine.handle_json(&body))
}

fn app(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/entries", get(list_entries).post(add_entry))
        .route("/entries/:id", get(get_entry).delete(delete_entry))
        .route("/summary/:ym", get(month_summary))
        .route("/categories/:ym/:kind", get(category_totals))
        .route("/rpc", post(rpc))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("info");

    let config = Config::load().context("Failed to load configuration")?;
    config
        .ensure_parent_dir()
        .context("Failed to create database directory")?;

    let ledger = Ledger::open(&config.db_path)
        .with_context(|| format!("Failed to open database {}", config.db_path.display()))?;
    let engine = Engine::new(ledger).with_display_scale(config.display_scale);

    let state = AppState {
        engine: Arc::new(engine),
    };

    let listener = tokio::net::TcpListener::bind(&config.server_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.server_addr))?;

    info!(addr = %config.server_addr, db = %config.db_path.display(), "ledger server running");

    axum::serve(listener, app(state))
        .await
        .context("Server terminated")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Method, Request},
    };
    use chrono::{TimeZone, Utc};
    use ledger_engine::FixedClock;
    use serde_json::{json, Value};
    use tower::util::ServiceExt; // for `oneshot`

    fn setup_test_app() -> Router {
        let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2024, 3, 10, 8, 0, 0).unwrap()));
        let ledger = Ledger::open_in_memory()
            .expect("Failed to create test database")
            .with_clock(clock);

        app(AppState {
            engine: Arc::new(Engine::new(ledger)),
        })
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let app = setup_test_app();
        let (status, body) = send(&app, Method::GET, "/api/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], "OK");
    }

    #[tokio::test]
    async fn test_add_list_delete_roundtrip() {
        let app = setup_test_app();

        let (status, added) = send(
            &app,
            Method::POST,
            "/api/entries",
            Some(json!({"kind": "expense", "amount": 42.5, "category": "groceries", "note": "weekly"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(added["data"]["note"], "weekly");
        let id = added["data"]["id"].as_i64().unwrap();

        let (_, listed) = send(&app, Method::GET, "/api/entries", None).await;
        assert_eq!(listed["data"].as_array().unwrap().len(), 1);

        let (status, fetched) = send(&app, Method::GET, &format!("/api/entries/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["data"]["category"], "groceries");

        let uri = format!("/api/entries/{}", id);
        let (_, first) = send(&app, Method::DELETE, &uri, None).await;
        let (_, second) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(first["data"], true);
        assert_eq!(second["data"], false);

        let (status, missing) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(missing["error"]["code"], "not_found");
    }

    #[tokio::test]
    async fn test_validation_maps_to_bad_request() {
        let app = setup_test_app();

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/entries",
            Some(json!({"kind": "expense", "amount": 0, "category": "x"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "invalid_amount");

        let (status, body) = send(&app, Method::GET, "/api/summary/2024-13", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "invalid_month_key");
    }

    #[tokio::test]
    async fn test_reports() {
        let app = setup_test_app();
        for (kind, amount, category) in [
            ("expense", 10, "food"),
            ("expense", 5, "food"),
            ("expense", 20, "gas"),
            ("income", 100, "salary"),
        ] {
            send(
                &app,
                Method::POST,
                "/api/entries",
                Some(json!({"kind": kind, "amount": amount, "category": category})),
            )
            .await;
        }

        let (status, summary) = send(&app, Method::GET, "/api/summary/2024-03", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            summary["data"],
            json!({"month": "2024-03", "income": 100.0, "expense": 35.0, "balance": 65.0})
        );

        let (_, totals) = send(&app, Method::GET, "/api/categories/2024-03/expense", None).await;
        assert_eq!(
            totals["data"],
            json!([{"category": "gas", "total": 20.0}, {"category": "food", "total": 15.0}])
        );

        let (_, rpc) = send(
            &app,
            Method::POST,
            "/api/rpc",
            Some(json!({"op": "get_month_summary", "ym": "2024-04"})),
        )
        .await;
        assert_eq!(rpc["data"]["balance"], 0.0);
    }
}
