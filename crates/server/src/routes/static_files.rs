//! Serving of stored property images.

use axum::Router;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::Response;
use axum::routing::get;
use tracing::warn;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Create the image files router.
pub fn router() -> Router<AppState> {
    Router::new().route("/files/{*path}", get(serve_image))
}

/// Serve a stored image.
///
/// GET /files/{*path}
async fn serve_image(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> AppResult<Response> {
    let path = path.trim_start_matches('/');

    // The storage layer rejects traversal too; failing fast here keeps the
    // log noise down.
    if path.contains("..") || path.contains('\0') {
        return Err(AppError::BadRequest("invalid image path".to_string()));
    }

    let uri = format!("{}://{}", state.images().storage().scheme(), path);

    let content = match state.images().storage().read(&uri).await {
        Ok(content) => content,
        Err(e) => {
            warn!(path = %path, error = %e, "stored image not readable");
            return Err(AppError::NotFound);
        }
    };

    let content_type = mime_from_extension(path);

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CACHE_CONTROL, "public, max-age=86400")
        .body(Body::from(content))
        .map_err(|e| AppError::Internal(e.into()))?;

    Ok(response)
}

fn mime_from_extension(path: &str) -> &'static str {
    match path.rsplit('.').next().map(str::to_ascii_lowercase).as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_covers_allowed_image_types() {
        assert_eq!(mime_from_extension("2026/08/a_house.jpg"), "image/jpeg");
        assert_eq!(mime_from_extension("a.JPEG"), "image/jpeg");
        assert_eq!(mime_from_extension("b.png"), "image/png");
        assert_eq!(mime_from_extension("c.webp"), "image/webp");
        assert_eq!(mime_from_extension("d.exe"), "application/octet-stream");
    }
}
