use axum::extract::{Path, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};

use crate::app::AppState;
use crate::error::AppError;

/// `GET /media/o/{path}` — serves a stored image.
///
/// `path` is the percent-encoded storage key of a download URL; the
/// `alt=media` query is accepted and ignored.
pub async fn serve_media_handler(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Response, AppError> {
    let object = state
        .storage
        .get_object(&path)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Media '{}'", path)))?;

    // Keys are unique per upload, so content never changes under a URL
    Ok((
        [
            (CONTENT_TYPE, object.content_type),
            (CACHE_CONTROL, "public, max-age=31536000, immutable".to_string()),
        ],
        object.data,
    )
        .into_response())
}
