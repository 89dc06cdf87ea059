// 🌐 HTTP Router - Axum
//
// Every non-API path is answered with one of the four prebuilt pages;
// unknown paths get the home page. Nothing is recomputed per request.

use super::Dashboard;
use axum::{
    extract::State,
    http::Uri,
    response::{Html, IntoResponse, Json},
    routing::get,
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared application state
pub type AppState = Arc<Dashboard>;

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/store - Precomputed aggregate data
async fn data_store(State(dashboard): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::ok(dashboard.data_store().clone()))
}

/// Any other path - one of the static pages
async fn serve_page(State(dashboard): State<AppState>, uri: Uri) -> Html<String> {
    let raw = uri.path();
    let path = urlencoding::decode(raw)
        .map(|p| p.into_owned())
        .unwrap_or_else(|_| raw.to_string());
    Html(dashboard.render(&path).to_string())
}

pub fn build_router(dashboard: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/store", get(data_store));

    Router::new()
        .nest("/api", api_routes)
        .fallback(serve_page)
        .with_state(dashboard)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::fixture_dashboard;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    async fn get_body(app: Router, path: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_routes_select_pages() {
        let (_dir, dashboard) = fixture_dashboard();
        let app = build_router(Arc::new(dashboard));

        let (status, body) = get_body(app.clone(), "/businessDashboard").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Business Dashboard 🏙️"));

        let (_, body) = get_body(app.clone(), "/unknown").await;
        assert!(body.contains("Welcome to the Data Insights Dashboard"));

        let (_, body) = get_body(app.clone(), "/").await;
        assert!(body.contains("Welcome to the Data Insights Dashboard"));

        let (_, body) = get_body(app.clone(), "/social%41ctivityDashboard").await;
        assert!(body.contains("Social Activity Dashboard 🌐"));

        let (_, body) = get_body(app, "/participantDashboard/").await;
        assert!(body.contains("Participant Dashboard 📊"));
    }

    #[tokio::test]
    async fn test_api_endpoints() {
        let (_dir, dashboard) = fixture_dashboard();
        let app = build_router(Arc::new(dashboard));

        let (status, body) = get_body(app.clone(), "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        let health: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(health["data"], "OK");

        let (_, body) = get_body(app, "/api/store").await;
        let store: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(store["success"], true);
        assert!(store["data"]["householdKidCounts"].is_array());
        assert!(store["data"]["educationPivot"].as_array().unwrap().len() == 3);
    }
}
