use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::post,
    Json, Router,
};
use tracing::{instrument, warn};

use super::services::{scan_image, UploadItem};
use crate::{error::AppError, nutrition::Extraction, state::AppState};

const IMAGE_FIELD: &str = "image";
const FALLBACK_CONTENT_TYPE: &str = "image/jpeg";

pub fn scan_routes() -> Router<AppState> {
    Router::new()
        .route("/vision/scan", post(scan))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024)) // 20MB
}

/// POST /vision/scan (multipart, field `image`)
#[instrument(skip(state, mp))]
pub async fn scan(
    State(state): State<AppState>,
    mut mp: Multipart,
) -> Result<Json<Extraction>, AppError> {
    let mut image = None;
    while let Some(field) = mp.next_field().await.map_err(bad_multipart)? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let content_type = field
            .content_type()
            .filter(|ct| ct.starts_with("image/"))
            .unwrap_or(FALLBACK_CONTENT_TYPE)
            .to_string();
        let body = field.bytes().await.map_err(bad_multipart)?;
        image = Some(UploadItem { body, content_type });
        break;
    }

    let item = image
        .filter(|i| !i.body.is_empty())
        .ok_or(AppError::MissingField(IMAGE_FIELD))?;
    let extraction = scan_image(&state, item).await?;
    Ok(Json(extraction))
}

fn bad_multipart<E: std::fmt::Display>(e: E) -> AppError {
    warn!(error = %e, "unreadable multipart body");
    AppError::BadRequest(format!("invalid multipart body: {e}"))
}
