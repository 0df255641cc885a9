//! HTTP view server with HTMX support
//!
//! Routes are organized into modules:
//! - routes::view: the ledger view page, its fragment and the user actions
//! - routes::transactions: per-row approval toggle

pub mod error;
pub mod routes;

use axum::{
    routing::{get, post},
    Router,
};
use ledgerview_config::Config;
use ledgerview_core::error::{DefaultErrorLogger, ErrorContext, ErrorLogger};
use ledgerview_core::{LedgerApiRef, ViewAction, ViewCoordinator};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

pub use error::{ApiError, ApiResult};

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<ViewCoordinator>,
    pub config: Config,
    pub logger: Arc<dyn ErrorLogger>,
}

impl AppState {
    pub fn new(config: Config, api: LedgerApiRef) -> Self {
        Self {
            coordinator: Arc::new(ViewCoordinator::new(api)),
            config,
            logger: Arc::new(DefaultErrorLogger),
        }
    }

    /// Run an action's first transition and let the rest finish in the
    /// background. Failures are logged; the view keeps its previous data.
    pub async fn dispatch(&self, action: ViewAction) {
        let operation = action.name();
        let handle = self.coordinator.dispatch(action).await;
        let logger = Arc::clone(&self.logger);
        tokio::spawn(async move {
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => logger.log_error(&e, &ErrorContext::new(operation)),
                Err(e) => logger.log_warning(&format!("action task aborted: {}", e), &ErrorContext::new(operation)),
            }
        });
    }
}

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    use routes::transactions::htmx_transaction_approval;
    use routes::view::{api_view, htmx_view, htmx_view_mount, htmx_view_more, htmx_view_select, page_view};

    Router::new()
        // API endpoints
        .route("/api/health", get(health_check))
        .route("/api/view", get(api_view))
        // HTMX page routes
        .route("/", get(page_view))
        // HTMX partial routes
        .route("/view", get(htmx_view))
        .route("/view/mount", post(htmx_view_mount))
        .route("/view/select", post(htmx_view_select))
        .route("/view/more", post(htmx_view_more))
        .route("/transactions/:id/approval", post(htmx_transaction_approval))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

// ==================== Template Functions ====================

/// Base HTML template
pub fn base_html(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{} - Ledgerview</title>
    <script src="https://unpkg.com/htmx.org@1.9.10"></script>
    <script src="https://cdn.tailwindcss.com"></script>
    <style>
        .htmx-indicator {{ opacity: 0; transition: opacity 0.3s; }}
        .htmx-request .htmx-indicator {{ opacity: 1; }}
        .htmx-request.htmx-indicator {{ opacity: 1; }}
    </style>
</head>
<body class="bg-gray-50 text-gray-900">
    <main class="max-w-5xl mx-auto p-6">{}</main>
</body>
</html>"#,
        title, content
    )
}

/// Check if request is from HTMX (partial page update)
fn is_htmx_request(headers: &axum::http::HeaderMap) -> bool {
    headers.get("hx-request").is_some()
}

/// Wrap content for full page or HTMX partial
pub fn page_response(headers: &axum::http::HeaderMap, title: &str, inner_content: &str) -> String {
    if is_htmx_request(headers) {
        inner_content.to_string()
    } else {
        base_html(title, inner_content)
    }
}

/// Decode an `application/x-www-form-urlencoded` body
pub fn parse_form(body: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    for pair in body.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let decode = |s: &str| {
            let s = s.replace('+', " ");
            urlencoding::decode(&s).map(|v| v.into_owned()).unwrap_or(s)
        };
        params.insert(decode(key), decode(value));
    }
    params
}

/// Start the HTTP server
///
/// Binds to the configured address and serves the ledger view until the
/// process stops.
pub async fn start_server(config: Config, api: LedgerApiRef) -> anyhow::Result<()> {
    let addr = config.bind_address();
    let state = AppState::new(config, api);

    let router = create_router(state);

    let listener = TcpListener::bind(&addr).await?;
    log::info!("Starting ledgerview server on http://{}", addr);
    log::info!("Available routes:");
    log::info!("  - / (Ledger view)");
    log::info!("  - /view, /view/* (HTMX fragment and actions)");
    log::info!("  - /api/* (JSON API endpoints)");

    axum::serve(listener, router).await?;
    log::info!("Server stopped gracefully");
    Ok(())
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use ledgerview_core::{InMemoryLedgerApi, LedgerFixture};
    use std::time::Duration;
    use tower::ServiceExt;

    fn fixture() -> LedgerFixture {
        let mut transactions = Vec::new();
        for n in 1..=12 {
            let (id, first, last) = if n % 2 == 1 { ("1", "Ada", "Lovelace") } else { ("2", "Grace", "Hopper") };
            transactions.push(serde_json::json!({
                "id": format!("tx{}", n),
                "amount": format!("{}.50", n * 100),
                "employee": { "id": id, "firstName": first, "lastName": last },
                "merchant": if n == 3 { "Smith & Sons" } else { "Acme" },
                "date": "2024-03-01",
            }));
        }
        serde_json::from_value(serde_json::json!({
            "employees": [
                { "id": "1", "firstName": "Ada", "lastName": "Lovelace" },
                { "id": "2", "firstName": "Grace", "lastName": "Hopper" },
            ],
            "transactions": transactions,
        }))
        .unwrap()
    }

    fn test_state() -> AppState {
        AppState::new(Config::default(), Arc::new(InMemoryLedgerApi::new(fixture(), 5)))
    }

    async fn send(state: &AppState, method: &str, uri: &str, body: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = create_router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    async fn settle(state: &AppState) {
        for _ in 0..200 {
            if !state.coordinator.view().await.is_busy() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("view did not settle");
    }

    async fn mounted() -> AppState {
        let state = test_state();
        let (status, _) = send(&state, "POST", "/view/mount", "").await;
        assert_eq!(status, StatusCode::OK);
        settle(&state).await;
        state
    }

    async fn view_json(state: &AppState) -> serde_json::Value {
        let (status, body) = send(state, "GET", "/api/view", "").await;
        assert_eq!(status, StatusCode::OK);
        serde_json::from_str(&body).unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let (status, body) = send(&test_state(), "GET", "/api/health", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "OK");
    }

    #[tokio::test]
    async fn test_index_page_requests_mount() {
        let (status, body) = send(&test_state(), "GET", "/", "").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.starts_with("<!DOCTYPE html>"));
        assert!(body.contains("id='ledger-view'"));
        assert!(body.contains("hx-post='/view/mount'"));
    }

    #[tokio::test]
    async fn test_mount_loads_first_page() {
        let state = mounted().await;
        let (_, body) = send(&state, "GET", "/view", "").await;
        assert!(body.contains("Ada Lovelace"));
        assert!(body.contains("All Employees"));
        assert!(body.contains("View More"));
        assert!(body.contains("Smith &amp; Sons"));
        assert!(!body.contains("hx-post='/view/mount'"));

        let json = view_json(&state).await;
        assert_eq!(json["phase"], "VIEWING_ALL");
        assert_eq!(json["transactions"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_view_more_appends_page() {
        let state = mounted().await;
        send(&state, "POST", "/view/more", "").await;
        settle(&state).await;

        let json = view_json(&state).await;
        assert_eq!(json["transactions"].as_array().unwrap().len(), 10);
        assert_eq!(json["viewMore"]["disabled"], false);
    }

    #[tokio::test]
    async fn test_select_employee_filters() {
        let state = mounted().await;
        let (status, body) = send(&state, "POST", "/view/select", "employee_id=2").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("id='ledger-view'"));
        settle(&state).await;

        let json = view_json(&state).await;
        assert_eq!(json["mode"], "BY_EMPLOYEE");
        assert!(json["viewMore"].is_null());
        let rows = json["transactions"].as_array().unwrap();
        assert_eq!(rows.len(), 6);
        assert!(rows.iter().all(|t| t["employee"]["id"] == "2"));

        send(&state, "POST", "/view/select", "employee_id=").await;
        settle(&state).await;
        let json = view_json(&state).await;
        assert_eq!(json["mode"], "ALL");
        assert_eq!(json["transactions"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_select_without_value_is_noop() {
        let state = mounted().await;
        let before = state.coordinator.snapshot().await.epoch;
        let (status, _) = send(&state, "POST", "/view/select", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(state.coordinator.snapshot().await.epoch, before);
    }

    #[tokio::test]
    async fn test_select_unknown_employee() {
        let state = mounted().await;
        let (status, body) = send(&state, "POST", "/view/select", "employee_id=42").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("Employee not found"));
    }

    #[tokio::test]
    async fn test_approval_toggle() {
        let state = mounted().await;
        let (status, body) = send(&state, "POST", "/transactions/tx1/approval", "approved=true").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("id='tx-tx1'"));
        assert!(body.contains("checked"));

        let json = view_json(&state).await;
        assert_eq!(json["transactions"][0]["approved"], true);

        let (status, _) = send(&state, "POST", "/transactions/nope/approval", "approved=true").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&state, "POST", "/transactions/tx1/approval", "approved=maybe").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_parse_form() {
        let form = parse_form("employee_id=&approved=true&name=Ada+L%C3%B6velace");
        assert_eq!(form.get("employee_id").map(String::as_str), Some(""));
        assert_eq!(form.get("approved").map(String::as_str), Some("true"));
        assert_eq!(form.get("name").map(String::as_str), Some("Ada Lövelace"));
        assert!(parse_form("").is_empty());
    }
}
