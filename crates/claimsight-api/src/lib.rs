//! ClaimSight API /v1: REST endpoints
pub mod handlers;
pub mod metrics;
pub mod middleware;

use axum::{
    routing::{get, post},
    Router,
};
use claimsight_runner::ClaimPool;
use metrics::ApiMetrics;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub pool: ClaimPool,
    pub metrics: Arc<ApiMetrics>,
    /// Directory every requested image must live under. `None` accepts any
    /// path the process can read.
    pub uploads_root: Option<Arc<PathBuf>>,
}

impl AppState {
    pub fn new(pool: ClaimPool) -> Result<Self, prometheus::Error> {
        Ok(Self {
            pool,
            metrics: Arc::new(ApiMetrics::new()?),
            uploads_root: None,
        })
    }

    pub fn with_uploads_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.uploads_root = Some(Arc::new(root.into()));
        self
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/v1/assess", post(handlers::assess))
        .route("/v1/taxonomy", get(handlers::taxonomy))
        .route("/v1/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .layer(axum::middleware::from_fn(middleware::version_header))
        .layer(middleware::cors())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(addr: &str, state: AppState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("ClaimSight API listening on {}", addr);
    axum::serve(listener, create_app(state)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use claimsight_runner::{ClaimRunner, RunnerConfig};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn state() -> AppState {
        let runner = ClaimRunner::builder()
            .config(RunnerConfig {
                severity_seed: Some(1),
                ..RunnerConfig::default()
            })
            .build()
            .unwrap();
        let pool = ClaimPool::new(Arc::new(runner), 2);
        AppState::new(pool).unwrap()
    }

    fn app() -> Router {
        create_app(state())
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn post_assess(app: Router, payload: Value) -> axum::response::Response {
        app.oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/assess")
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::builder().uri("/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[middleware::VERSION_HEADER],
            claimsight_core::CLAIMSIGHT_VERSION
        );
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["available_slots"], 2);
    }

    #[tokio::test]
    async fn test_assess_with_sidecar_detections() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("car_front.jpg");
        std::fs::write(
            dir.path().join("car_front.jpg.damage.json"),
            r#"[{"bbox": [10, 10, 90, 90], "class_id": 2, "confidence": 0.88}]"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("car_front.jpg.parts.json"),
            r#"[{"bbox": [0, 0, 100, 100], "class_id": 10}]"#,
        )
        .unwrap();

        let payload = json!({ "claim_id": "CLM-HTTP", "image_path": image });
        let response = post_assess(app(), payload).await;
        assert_eq!(response.status(), StatusCode::OK);

        let report = body_json(response).await;
        assert_eq!(report["claim_id"], "CLM-HTTP");
        let result = &report["assessment_result"];
        assert_eq!(result["quality_check"]["passed"], true);
        assert_eq!(result["damage_summary"]["overall_severity"], "major");
        assert_eq!(result["damage_summary"]["affected_parts"], json!(["front_glass"]));
        assert_eq!(result["annotations"][0]["detections"][0]["damage_type"], "glass-crack");
        assert_eq!(result["repair_estimate"]["category"], "significant_body_work");
        assert!(report.get("error").is_none());
    }

    #[tokio::test]
    async fn test_rejected_image_is_reported_and_counted() {
        let app = app();

        let payload = json!({ "image_path": "/uploads/blurry_rear.jpg" });
        let response = post_assess(app.clone(), payload).await;
        assert_eq!(response.status(), StatusCode::OK);

        let report = body_json(response).await;
        assert!(report["claim_id"].as_str().unwrap().starts_with("CLM-"));
        assert_eq!(report["assessment_result"]["quality_check"]["passed"], false);
        assert_eq!(report["error"], "Image quality is too low to process.");
        assert!(report["assessment_result"].get("damage_summary").is_none());

        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("claims_assessed_total 1"));
        assert!(text.contains("claims_rejected_total 1"));
    }

    #[tokio::test]
    async fn test_missing_sidecar_degrades() {
        let dir = tempfile::tempdir().unwrap();
        let response =
            post_assess(app(), json!({ "image_path": dir.path().join("car.jpg") })).await;

        let report = body_json(response).await;
        assert_eq!(report["assessment_result"]["quality_check"]["passed"], true);
        assert_eq!(report["assessment_result"]["damage_summary"]["total_damages_found"], 0);
        assert!(report["error"].as_str().unwrap().starts_with("DET/UNAVAILABLE"));
    }

    #[tokio::test]
    async fn test_empty_image_path_is_bad_request() {
        let response = post_assess(app(), json!({ "image_path": "" })).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_uploads_root_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("car.jpg.damage.json"),
            r#"[{"bbox": [10, 10, 90, 90], "class_id": 2, "confidence": 0.88}]"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("car.jpg.parts.json"),
            r#"[{"bbox": [0, 0, 100, 100], "class_id": 10}]"#,
        )
        .unwrap();
        let app = create_app(state().with_uploads_root(dir.path()));

        let response = post_assess(app, json!({ "image_path": "car.jpg" })).await;
        assert_eq!(response.status(), StatusCode::OK);

        let report = body_json(response).await;
        assert_eq!(
            report["assessment_result"]["damage_summary"]["total_damages_found"],
            1
        );
        assert!(report.get("error").is_none());
    }

    #[tokio::test]
    async fn test_paths_outside_uploads_root_are_refused() {
        let uploads = tempfile::tempdir().unwrap();
        let elsewhere = tempfile::tempdir().unwrap();
        std::fs::write(elsewhere.path().join("car.jpg.damage.json"), "[]").unwrap();
        let app = create_app(state().with_uploads_root(uploads.path()));

        let outside = elsewhere.path().join("car.jpg");
        let response = post_assess(app.clone(), json!({ "image_path": outside })).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let escape = json!({ "image_path": "../../etc/passwd" });
        let response = post_assess(app.clone(), escape).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // Nothing was assessed
        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("claims_assessed_total 0"));
    }

    #[tokio::test]
    async fn test_taxonomy() {
        let response = app()
            .oneshot(Request::builder().uri("/v1/taxonomy").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let body = body_json(response).await;
        assert_eq!(body["parts"].as_array().unwrap().len(), 18);
        assert_eq!(body["severity_rules"]["major"]["cost_range"], json!([3000, 10000]));
    }
}
