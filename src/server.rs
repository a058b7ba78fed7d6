// 🌐 HTTP surface
// GET /account/:account_num and GET /health, with permissive CORS.

use crate::handler::{AccountLookup, InvocationContext, LookupResponse};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub lookup: Arc<AccountLookup>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

impl IntoResponse for LookupResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.body)).into_response()
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /account/:account_num - Look up one TIPS account
async fn get_account(State(state): State<AppState>, Path(account_num): Path<String>) -> LookupResponse {
    let ctx = InvocationContext::new();
    state.lookup.get_account(Some(account_num.as_str()), &ctx).await
}

/// GET /health - Liveness probe
async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: crate::VERSION,
    })
}

// ============================================================================
// Router
// ============================================================================

pub fn build_router(lookup: AccountLookup) -> Router {
    let state = AppState {
        lookup: Arc::new(lookup),
    };

    Router::new()
        .route("/account/:account_num", get(get_account))
        .route("/health", get(health_check))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TipsConfig;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tokio::net::TcpListener;
    use tower::ServiceExt;

    const FIXTURE: &str = r#"<Output>
        <BRT-NO>883309050</BRT-NO>
        <PAYMENTS-POSTED-THRU>03/01/2024</PAYMENTS-POSTED-THRU>
        <PROPERTY-INFO>
            <PROPERTY-ADDRESS>1234 MARKET ST</PROPERTY-ADDRESS>
            <PENALTY-CALC-DATE>02/29/2024</PENALTY-CALC-DATE>
        </PROPERTY-INFO>
    </Output>"#;

    async fn spawn_upstream(status: StatusCode, body: &'static str) -> String {
        let app = Router::new().route("/tips", get(move || async move { (status, body) }));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });
        format!("http://{}/tips", addr)
    }

    async fn router_for(status: StatusCode, body: &'static str) -> Router {
        let url = spawn_upstream(status, body).await;
        build_router(AccountLookup::new(&TipsConfig::new(url)).unwrap())
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_account_route_success() {
        let router = router_for(StatusCode::OK, FIXTURE).await;

        let response = router
            .oneshot(Request::builder().uri("/account/883309050").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["query"]["accountNum"], "883309050");
        assert_eq!(json["data"]["property"]["penaltyCalcDate"], "2024-02-29");
        assert_eq!(json["data"]["years"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_account_route_invalid_number() {
        let router = router_for(StatusCode::OK, FIXTURE).await;

        let response = router
            .oneshot(Request::builder().uri("/account/12ab").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["query"]["accountNum"], "12ab");
        assert_eq!(json["message"], "Invalid account number");
    }

    #[tokio::test]
    async fn test_account_route_not_found() {
        let router = router_for(StatusCode::NOT_FOUND, "").await;

        let response = router
            .oneshot(Request::builder().uri("/account/883309050").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["message"], "Account not found");
    }

    #[tokio::test]
    async fn test_cors_allows_any_origin() {
        let router = router_for(StatusCode::OK, FIXTURE).await;

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header("origin", "https://example.org")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn test_health() {
        let router = router_for(StatusCode::OK, FIXTURE).await;

        let response = router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["version"], crate::VERSION);
    }

    #[tokio::test]
    async fn test_unknown_route_returns_404() {
        let router = router_for(StatusCode::OK, FIXTURE).await;

        let response = router
            .oneshot(Request::builder().uri("/accounts").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
