/// Liked songs ("library") routes
use crate::{
    error::{Result, ServerError},
    middleware::AuthenticatedUser,
    state::AppState,
};
use axum::{
    extract::{Path, State},
    Json,
};
use cadence_core::{
    types::{Track, TrackId},
    LikeOutcome, UnlikeOutcome,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeRequest {
    pub song_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryResponse {
    pub saved_songs: Vec<Track>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryChange {
    pub message: String,
    pub saved_songs: Vec<TrackId>,
}

/// GET /api/user/library
/// Liked songs, most recently liked first
pub async fn get_library(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<Json<LibraryResponse>> {
    let saved_songs = app_state.library.liked_tracks(&auth.caller()).await?;
    Ok(Json(LibraryResponse { saved_songs }))
}

/// POST /api/user/library
pub async fn add_song(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    Json(req): Json<LikeRequest>,
) -> Result<Json<LibraryChange>> {
    let caller = auth.caller();
    let outcome = app_state
        .library
        .like_track(&caller, &TrackId::new(req.song_id))
        .await?;

    if outcome == LikeOutcome::AlreadyLiked && app_state.config.library.reject_redundant_likes {
        return Err(ServerError::BadRequest("Song already in library".to_string()));
    }
    change(&app_state, &auth, "Song added to library").await
}

/// DELETE /api/user/library/:song_id
pub async fn remove_song(
    Path(song_id): Path<String>,
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<Json<LibraryChange>> {
    let outcome = app_state
        .library
        .unlike_track(&auth.caller(), &TrackId::new(song_id))
        .await?;

    if outcome == UnlikeOutcome::NotLiked && app_state.config.library.reject_redundant_likes {
        return Err(ServerError::BadRequest("Song not in library".to_string()));
    }
    change(&app_state, &auth, "Song removed from library").await
}

async fn change(
    app_state: &AppState,
    auth: &AuthenticatedUser,
    message: &str,
) -> Result<Json<LibraryChange>> {
    let saved_songs = app_state
        .library
        .catalog()
        .liked_track_ids(auth.user_id())
        .await?;
    Ok(Json(LibraryChange {
        message: message.to_string(),
        saved_songs,
    }))
}
