/// Playlists API routes
///
/// Public browsing lives under `/api/playlists`; the caller's own playlists
/// under `/api/user/playlists`.
use crate::{
    api::multipart::UploadForm,
    error::Result,
    middleware::{AuthenticatedUser, OptionalUser},
    state::AppState,
};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use cadence_core::types::{
    AssetKind, NewPlaylist, PlaylistDetails, PlaylistId, PlaylistPatch, TrackId,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddSongRequest {
    pub song_id: String,
}

/// Read a new playlist from form fields
pub(crate) fn new_playlist(form: &UploadForm) -> Result<NewPlaylist> {
    Ok(NewPlaylist {
        name: form.text("name").unwrap_or_default(),
        description: form.text("description").unwrap_or_default(),
        songs: form.track_ids("songs")?.unwrap_or_default(),
        is_public: form.flag("isPublic").unwrap_or(false),
        is_featured: form.flag("isFeatured").unwrap_or(false),
    })
}

/// Read a playlist patch from form fields; absent fields stay untouched
pub(crate) fn playlist_patch(form: &UploadForm) -> Result<PlaylistPatch> {
    Ok(PlaylistPatch {
        name: form.text("name"),
        description: form.text("description"),
        songs: form.track_ids("songs")?,
        is_public: form.flag("isPublic"),
        is_featured: form.flag("isFeatured"),
    })
}

// ===== Public =====

/// GET /api/playlists
/// Public playlists, newest first
pub async fn list_public(State(app_state): State<AppState>) -> Result<Json<Vec<PlaylistDetails>>> {
    Ok(Json(app_state.library.list_public_playlists().await?))
}

/// GET /api/playlists/featured
pub async fn list_featured(
    State(app_state): State<AppState>,
) -> Result<Json<Vec<PlaylistDetails>>> {
    Ok(Json(app_state.library.list_featured_playlists().await?))
}

/// GET /api/playlists/:id
/// Private playlists are only visible to their owner and admins
pub async fn get_playlist(
    Path(id): Path<String>,
    State(app_state): State<AppState>,
    viewer: OptionalUser,
) -> Result<Json<PlaylistDetails>> {
    let caller = viewer.caller();
    let playlist = app_state
        .library
        .get_playlist(caller.as_ref(), &PlaylistId::new(id))
        .await?;
    Ok(Json(playlist))
}

// ===== Caller's playlists =====

/// GET /api/user/playlists
pub async fn list_own(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<Json<Vec<PlaylistDetails>>> {
    let playlists = app_state
        .library
        .list_owned_playlists(&auth.caller())
        .await?;
    Ok(Json(playlists))
}

/// POST /api/user/playlists
/// Multipart: name, description, songs (JSON array), isPublic, cover
pub async fn create_playlist(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<PlaylistDetails>)> {
    let mut form = UploadForm::parse(&headers, body, &app_state.file_storage).await?;
    let new_playlist = new_playlist(&form)?;
    let cover = form.take_file(AssetKind::Cover);

    let playlist = app_state
        .library
        .create_playlist(&auth.caller(), new_playlist, cover)
        .await?;

    tracing::info!(playlist_id = %playlist.playlist.id, user_id = %auth.user_id(), "Created playlist");
    Ok((StatusCode::CREATED, Json(playlist)))
}

/// PUT /api/user/playlists/:id
/// Multipart; every field optional, a new cover replaces the old one
pub async fn update_playlist(
    Path(id): Path<String>,
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<PlaylistDetails>> {
    let mut form = UploadForm::parse(&headers, body, &app_state.file_storage).await?;
    let patch = playlist_patch(&form)?;
    let cover = form.take_file(AssetKind::Cover);

    let playlist = app_state
        .library
        .update_playlist(&auth.caller(), &PlaylistId::new(id), patch, cover)
        .await?;
    Ok(Json(playlist))
}

/// DELETE /api/user/playlists/:id
pub async fn delete_playlist(
    Path(id): Path<String>,
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<StatusCode> {
    app_state
        .library
        .delete_playlist(&auth.caller(), &PlaylistId::new(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/user/playlists/:id/songs
pub async fn add_song(
    Path(id): Path<String>,
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    Json(req): Json<AddSongRequest>,
) -> Result<Json<PlaylistDetails>> {
    let playlist = app_state
        .library
        .add_track(
            &auth.caller(),
            &PlaylistId::new(id),
            &TrackId::new(req.song_id),
        )
        .await?;
    Ok(Json(playlist))
}

/// DELETE /api/user/playlists/:id/songs/:song_id
pub async fn remove_song(
    Path((id, song_id)): Path<(String, String)>,
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<Json<PlaylistDetails>> {
    let playlist = app_state
        .library
        .remove_track(
            &auth.caller(),
            &PlaylistId::new(id),
            &TrackId::new(song_id),
        )
        .await?;
    Ok(Json(playlist))
}
