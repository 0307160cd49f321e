//! Video record handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::info;

use tubely_models::{NewVideo, VideoId, VideoRecord};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const MAX_TITLE_LEN: usize = 200;

/// Parse a video ID path segment.
pub(crate) fn parse_video_id(raw: &str) -> ApiResult<VideoId> {
    raw.parse()
        .map_err(|_| ApiError::bad_request(format!("Invalid video ID: {}", raw)))
}

/// Create a video record owned by the caller.
pub async fn create_video(
    State(state): State<AppState>,
    user: AuthUser,
    Json(params): Json<NewVideo>,
) -> ApiResult<(StatusCode, Json<VideoRecord>)> {
    let title = params.title.trim();
    if title.is_empty() {
        return Err(ApiError::Validation("Title is required".to_string()));
    }
    if title.len() > MAX_TITLE_LEN {
        return Err(ApiError::Validation(format!(
            "Title must be at most {} bytes",
            MAX_TITLE_LEN
        )));
    }

    let record = VideoRecord::new(
        user.user_id,
        NewVideo {
            title: title.to_string(),
            description: params.description,
        },
    );
    state.videos.create(&record).await?;

    info!(video_id = %record.id, user_id = %user.user_id, "Video created");
    Ok((StatusCode::CREATED, Json(record)))
}

/// Fetch a video record. Records owned by someone else read as missing.
pub async fn get_video(
    State(state): State<AppState>,
    user: AuthUser,
    Path(video_id): Path<String>,
) -> ApiResult<Json<VideoRecord>> {
    let video_id = parse_video_id(&video_id)?;
    let record = state.videos.get(&video_id).await?;

    if !record.owned_by(&user.user_id) {
        return Err(ApiError::not_found(format!("Video {} not found", video_id)));
    }

    Ok(Json(record))
}
