//! Multipart upload handlers.

use axum::extract::{Multipart, Path, State};
use axum::http::{header, HeaderMap};
use axum::Json;
use tracing::debug;

use tubely_models::VideoRecord;

use crate::auth::AuthUser;
use crate::config::{MULTIPART_ENVELOPE_BYTES, THUMBNAIL_MAX_BYTES};
use crate::error::{ApiError, ApiResult};
use crate::handlers::videos::parse_video_id;
use crate::services::IngestRequest;
use crate::state::AppState;

const VIDEO_FIELD: &str = "video";
const THUMBNAIL_FIELD: &str = "thumbnail";

/// Upload the video file for an existing record.
///
/// The `video` part is streamed straight into the ingestion pipeline.
pub async fn upload_video(
    State(state): State<AppState>,
    user: AuthUser,
    Path(video_id): Path<String>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> ApiResult<Json<VideoRecord>> {
    let video_id = parse_video_id(&video_id)?;
    let declared_len = declared_file_len(&headers);

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some(VIDEO_FIELD) {
            debug!(field = ?field.name(), "Skipping multipart field");
            continue;
        }

        let content_type = field
            .content_type()
            .map(str::to_string)
            .ok_or_else(|| ApiError::bad_request("Missing Content-Type for video"))?;

        let record = state
            .ingest
            .ingest(IngestRequest {
                video_id,
                user_id: user.user_id,
                content_type,
                declared_len,
                body: Box::pin(field),
            })
            .await?;

        return Ok(Json(record));
    }

    Err(ApiError::bad_request("Missing 'video' field"))
}

/// Upload a thumbnail image for an existing record.
pub async fn upload_thumbnail(
    State(state): State<AppState>,
    user: AuthUser,
    Path(video_id): Path<String>,
    mut multipart: Multipart,
) -> ApiResult<Json<VideoRecord>> {
    let video_id = parse_video_id(&video_id)?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some(THUMBNAIL_FIELD) {
            continue;
        }

        let content_type = field
            .content_type()
            .map(str::to_string)
            .ok_or_else(|| ApiError::bad_request("Missing Content-Type for thumbnail"))?;

        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Unable to read thumbnail: {}", e)))?;
        if data.len() > THUMBNAIL_MAX_BYTES {
            return Err(ApiError::PayloadTooLarge(format!(
                "Thumbnail exceeds the {} byte limit",
                THUMBNAIL_MAX_BYTES
            )));
        }

        let record = state
            .thumbnails
            .upload(video_id, user.user_id, &content_type, &data)
            .await?;

        return Ok(Json(record));
    }

    Err(ApiError::bad_request("Missing 'thumbnail' field"))
}

/// Upper estimate of the file part size from the request `Content-Length`.
fn declared_file_len(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .map(|len| len.saturating_sub(MULTIPART_ENVELOPE_BYTES as u64))
}
