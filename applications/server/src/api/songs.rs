/// Public song routes
use crate::{error::Result, state::AppState};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use cadence_core::types::{Track, TrackId};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: Option<String>,
}

/// GET /api/songs
/// Every song, newest first
pub async fn list_songs(State(app_state): State<AppState>) -> Result<Json<Vec<Track>>> {
    Ok(Json(app_state.library.list_tracks().await?))
}

/// GET /api/songs/search?q=
/// Case-insensitive match on title, artist, album and genre; a blank query lists everything
pub async fn search_songs(
    State(app_state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Track>>> {
    let q = query.q.unwrap_or_default();
    Ok(Json(app_state.library.search_tracks(&q).await?))
}

/// GET /api/songs/:id
pub async fn get_song(
    Path(id): Path<String>,
    State(app_state): State<AppState>,
) -> Result<Json<Track>> {
    let track = app_state.library.get_track(&TrackId::new(id)).await?;
    Ok(Json(track))
}
