//! API Handlers
use crate::AppState;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use claimsight_core::{Report, Taxonomy, CLAIMSIGHT_VERSION};
use claimsight_runner::{Cancellation, ClaimRequest};
use serde_json::{json, Value};
use std::path::{Component, Path, PathBuf};
use std::time::Instant;

/// Assesses one image. A rejected image is still a 200: the report says why.
pub async fn assess(
    State(state): State<AppState>,
    Json(mut request): Json<ClaimRequest>,
) -> Result<Json<Report>, (StatusCode, Json<Value>)> {
    request.image_path = resolve_image_path(&request.image_path, state.uploads_root.as_deref())
        .map_err(|message| (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))))?;

    let started = Instant::now();
    let report = state.pool.assess(request, Cancellation::never()).await;
    state.metrics.observe(&report, started.elapsed());

    Ok(Json(report))
}

/// Relative paths are taken from the uploads root; absolute ones must stay
/// inside it. `..` is refused outright so the check is purely lexical.
fn resolve_image_path(path: &Path, root: Option<&PathBuf>) -> Result<PathBuf, &'static str> {
    if path.as_os_str().is_empty() {
        return Err("image_path must not be empty");
    }
    if path.components().any(|c| c == Component::ParentDir) {
        return Err("image_path must not contain '..'");
    }

    match root {
        None => Ok(path.to_path_buf()),
        Some(root) if path.is_absolute() => {
            if path.starts_with(root) {
                Ok(path.to_path_buf())
            } else {
                Err("image_path is outside the uploads root")
            }
        }
        Some(root) => Ok(root.join(path)),
    }
}

pub async fn taxonomy(State(state): State<AppState>) -> Json<Taxonomy> {
    Json(state.pool.runner().taxonomy().as_ref().clone())
}

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "version": CLAIMSIGHT_VERSION,
            "available_slots": state.pool.available_permits(),
        })),
    )
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_without_root() {
        let path = resolve_image_path(Path::new("/data/car.jpg"), None).unwrap();
        assert_eq!(path, PathBuf::from("/data/car.jpg"));
        assert!(resolve_image_path(Path::new(""), None).is_err());
        assert!(resolve_image_path(Path::new("/data/../etc/passwd"), None).is_err());
    }

    #[test]
    fn test_resolve_under_root() {
        let root = PathBuf::from("/srv/uploads");
        assert_eq!(
            resolve_image_path(Path::new("claims/car.jpg"), Some(&root)).unwrap(),
            PathBuf::from("/srv/uploads/claims/car.jpg")
        );
        assert_eq!(
            resolve_image_path(Path::new("/srv/uploads/car.jpg"), Some(&root)).unwrap(),
            PathBuf::from("/srv/uploads/car.jpg")
        );
        assert!(resolve_image_path(Path::new("/srv/uploads-old/car.jpg"), Some(&root)).is_err());
        assert!(resolve_image_path(Path::new("/etc/passwd"), Some(&root)).is_err());
        assert!(resolve_image_path(Path::new("claims/../../car.jpg"), Some(&root)).is_err());
    }
}
