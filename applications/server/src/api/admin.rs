/// Admin API routes
///
/// Mounted behind `admin_middleware`; the services re-check the caller's
/// privilege on every operation.
use crate::{
    api::{multipart::UploadForm, playlists},
    error::{Result, ServerError},
    middleware::AuthenticatedUser,
    services::UserView,
    state::AppState,
};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use cadence_core::types::{
    AssetKind, NewTrack, PlaylistDetails, PlaylistId, Track, TrackId, TrackPatch, UserId,
};
use serde::{Deserialize, Serialize};

const DASHBOARD_RECENT: usize = 5;

#[derive(Debug, Serialize)]
pub struct DashboardCounts {
    pub songs: usize,
    pub playlists: usize,
    pub users: usize,
    pub admins: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub counts: DashboardCounts,
    pub recent_songs: Vec<Track>,
    pub recent_playlists: Vec<PlaylistDetails>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleRequest {
    /// Absent toggles the current role
    #[serde(default)]
    pub is_admin: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct RoleResponse {
    pub message: String,
    pub user: UserView,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

fn new_track(form: &UploadForm) -> Result<NewTrack> {
    Ok(NewTrack {
        title: form.text("title").unwrap_or_default(),
        artist: form.text("artist").unwrap_or_default(),
        album: form.text("album").unwrap_or_default(),
        genre: form.text("genre").unwrap_or_default(),
        date: form.text("date"),
        release_year: form.number("releaseYear")?,
        duration_secs: form.number("duration")?,
    })
}

fn track_patch(form: &UploadForm) -> Result<TrackPatch> {
    Ok(TrackPatch {
        title: form.text("title"),
        artist: form.text("artist"),
        album: form.text("album"),
        genre: form.text("genre"),
        date: form.text("date"),
        release_year: form.number("releaseYear")?,
        duration_secs: form.number("duration")?,
    })
}

/// GET /api/admin/dashboard
pub async fn dashboard(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<Json<DashboardResponse>> {
    let caller = auth.caller();
    let songs = app_state.library.list_tracks().await?;
    let playlists = app_state.library.list_all_playlists(&caller).await?;
    let users = app_state.accounts.list_users(&caller).await?;
    let admins = users.iter().filter(|u| u.is_admin).count();

    Ok(Json(DashboardResponse {
        counts: DashboardCounts {
            songs: songs.len(),
            playlists: playlists.len(),
            users: users.len(),
            admins,
        },
        recent_songs: songs.into_iter().take(DASHBOARD_RECENT).collect(),
        recent_playlists: playlists.into_iter().take(DASHBOARD_RECENT).collect(),
    }))
}

// ===== Songs =====

/// GET /api/admin/songs
pub async fn list_songs(State(app_state): State<AppState>) -> Result<Json<Vec<Track>>> {
    Ok(Json(app_state.library.list_tracks().await?))
}

/// GET /api/admin/songs/:id
pub async fn get_song(
    Path(id): Path<String>,
    State(app_state): State<AppState>,
) -> Result<Json<Track>> {
    Ok(Json(app_state.library.get_track(&TrackId::new(id)).await?))
}

/// POST /api/admin/songs
/// Multipart: title, artist, album, genre, date?, releaseYear?, duration?, cover, audio
pub async fn create_song(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<Track>)> {
    let mut form = UploadForm::parse(&headers, body, &app_state.file_storage).await?;
    let new_track = new_track(&form)?;
    let cover = form.take_file(AssetKind::Cover);
    let audio = form.take_file(AssetKind::Audio);

    let track = app_state
        .library
        .create_track(&auth.caller(), new_track, cover, audio)
        .await?;

    tracing::info!(track_id = %track.id, title = %track.title, "Created song");
    Ok((StatusCode::CREATED, Json(track)))
}

/// PUT /api/admin/songs/:id
/// Multipart; text fields are optional, `cover` / `audio` replace the stored files
pub async fn update_song(
    Path(id): Path<String>,
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Track>> {
    let mut form = UploadForm::parse(&headers, body, &app_state.file_storage).await?;
    let patch = track_patch(&form)?;
    let cover = form.take_file(AssetKind::Cover);
    let audio = form.take_file(AssetKind::Audio);

    let track = app_state
        .library
        .update_track(&auth.caller(), &TrackId::new(id), patch, cover, audio)
        .await?;
    Ok(Json(track))
}

/// DELETE /api/admin/songs/:id
/// Also drops the song from every playlist and library
pub async fn delete_song(
    Path(id): Path<String>,
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<StatusCode> {
    let track_id = TrackId::new(id);
    app_state
        .library
        .delete_track(&auth.caller(), &track_id)
        .await?;
    tracing::info!(track_id = %track_id, "Deleted song");
    Ok(StatusCode::NO_CONTENT)
}

// ===== Playlists =====

/// GET /api/admin/playlists
pub async fn list_playlists(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<Json<Vec<PlaylistDetails>>> {
    Ok(Json(
        app_state.library.list_all_playlists(&auth.caller()).await?,
    ))
}

/// GET /api/admin/playlists/:id
pub async fn get_playlist(
    Path(id): Path<String>,
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<Json<PlaylistDetails>> {
    let caller = auth.caller();
    let playlist = app_state
        .library
        .get_playlist(Some(&caller), &PlaylistId::new(id))
        .await?;
    Ok(Json(playlist))
}

/// POST /api/admin/playlists
/// Same form as the user route, plus `isFeatured`
pub async fn create_playlist(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<PlaylistDetails>)> {
    let mut form = UploadForm::parse(&headers, body, &app_state.file_storage).await?;
    let new_playlist = playlists::new_playlist(&form)?;
    let cover = form.take_file(AssetKind::Cover);

    let playlist = app_state
        .library
        .create_playlist(&auth.caller(), new_playlist, cover)
        .await?;
    Ok((StatusCode::CREATED, Json(playlist)))
}

/// PUT /api/admin/playlists/:id
pub async fn update_playlist(
    Path(id): Path<String>,
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<PlaylistDetails>> {
    let mut form = UploadForm::parse(&headers, body, &app_state.file_storage).await?;
    let patch = playlists::playlist_patch(&form)?;
    let cover = form.take_file(AssetKind::Cover);

    let playlist = app_state
        .library
        .update_playlist(&auth.caller(), &PlaylistId::new(id), patch, cover)
        .await?;
    Ok(Json(playlist))
}

/// DELETE /api/admin/playlists/:id
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

// ===== Users =====

/// GET /api/admin/users
pub async fn list_users(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<Json<Vec<UserView>>> {
    let users = app_state.accounts.list_users(&auth.caller()).await?;
    Ok(Json(users.into_iter().map(UserView::from).collect()))
}

/// GET /api/admin/admins
pub async fn list_admins(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<Json<Vec<UserView>>> {
    let admins = app_state.accounts.list_admins(&auth.caller()).await?;
    Ok(Json(admins.into_iter().map(UserView::from).collect()))
}

/// PUT /api/admin/users/:id/role
/// Body `{isAdmin}` sets the role; an empty body toggles it
pub async fn update_role(
    Path(id): Path<String>,
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    body: Bytes,
) -> Result<Json<RoleResponse>> {
    let req: RoleRequest = if body.is_empty() {
        RoleRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ServerError::BadRequest(format!("Invalid request body: {}", e)))?
    };

    let user = app_state
        .accounts
        .set_admin(&auth.caller(), &UserId::new(id), req.is_admin)
        .await?;

    let message = if user.is_admin {
        "User is now an admin"
    } else {
        "User is no longer an admin"
    };
    tracing::info!(user_id = %user.id, is_admin = user.is_admin, "Updated user role");

    Ok(Json(RoleResponse {
        message: message.to_string(),
        user: user.into(),
    }))
}

/// DELETE /api/admin/users/:id
pub async fn delete_user(
    Path(id): Path<String>,
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<Json<MessageResponse>> {
    app_state
        .accounts
        .delete_user(&auth.caller(), &UserId::new(id))
        .await?;
    Ok(Json(MessageResponse {
        message: "User deleted successfully".to_string(),
    }))
}
