/// Player routes
///
/// Every route is scoped to `/api/player/:client_id`; the client id names
/// one playback session (typically one per browser tab or device).
use crate::{
    error::Result,
    services::{PlayerAction, PlayerResponse},
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use cadence_core::types::{Track, TrackId};
use cadence_playback::{TransportEvent, TransportEventKind};
use serde::Deserialize;

const DEFAULT_RECENT_LIMIT: usize = 10;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadQueueRequest {
    pub track_ids: Vec<String>,
    #[serde(default)]
    pub start_index: usize,
    #[serde(default)]
    pub shuffled: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayRequest {
    pub track_id: String,

    /// Tracks to queue around the chosen one; omitted means "use the current queue"
    #[serde(default)]
    pub context_track_ids: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct SeekRequest {
    pub position: f64,
}

#[derive(Debug, Deserialize)]
pub struct VolumeRequest {
    pub volume: f32,
}

/// `{generation, event, position?, duration?}`
#[derive(Debug, Deserialize)]
pub struct TransportEventRequest {
    pub generation: u64,
    #[serde(flatten)]
    pub kind: TransportEventKind,
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

fn track_ids(ids: Vec<String>) -> Vec<TrackId> {
    ids.into_iter().map(TrackId::new).collect()
}

async fn run(
    app_state: &AppState,
    client_id: &str,
    action: PlayerAction,
) -> Result<Json<PlayerResponse>> {
    Ok(Json(app_state.sessions.apply(client_id, action).await?))
}

/// GET /api/player/:client_id
pub async fn status(
    Path(client_id): Path<String>,
    State(app_state): State<AppState>,
) -> Result<Json<PlayerResponse>> {
    run(&app_state, &client_id, PlayerAction::Status).await
}

/// POST /api/player/:client_id/queue
pub async fn load_queue(
    Path(client_id): Path<String>,
    State(app_state): State<AppState>,
    Json(req): Json<LoadQueueRequest>,
) -> Result<Json<PlayerResponse>> {
    let action = PlayerAction::LoadQueue {
        track_ids: track_ids(req.track_ids),
        start_index: req.start_index,
        shuffled: req.shuffled,
    };
    run(&app_state, &client_id, action).await
}

/// POST /api/player/:client_id/play
pub async fn play(
    Path(client_id): Path<String>,
    State(app_state): State<AppState>,
    Json(req): Json<PlayRequest>,
) -> Result<Json<PlayerResponse>> {
    let action = PlayerAction::Play {
        track_id: TrackId::new(req.track_id),
        context: req.context_track_ids.map(track_ids),
    };
    run(&app_state, &client_id, action).await
}

/// POST /api/player/:client_id/resume
pub async fn resume(
    Path(client_id): Path<String>,
    State(app_state): State<AppState>,
) -> Result<Json<PlayerResponse>> {
    run(&app_state, &client_id, PlayerAction::Resume).await
}

/// POST /api/player/:client_id/pause
pub async fn pause(
    Path(client_id): Path<String>,
    State(app_state): State<AppState>,
) -> Result<Json<PlayerResponse>> {
    run(&app_state, &client_id, PlayerAction::Pause).await
}

/// POST /api/player/:client_id/next
pub async fn next(
    Path(client_id): Path<String>,
    State(app_state): State<AppState>,
) -> Result<Json<PlayerResponse>> {
    run(&app_state, &client_id, PlayerAction::Next).await
}

/// POST /api/player/:client_id/previous
pub async fn previous(
    Path(client_id): Path<String>,
    State(app_state): State<AppState>,
) -> Result<Json<PlayerResponse>> {
    run(&app_state, &client_id, PlayerAction::Previous).await
}

/// POST /api/player/:client_id/shuffle
pub async fn toggle_shuffle(
    Path(client_id): Path<String>,
    State(app_state): State<AppState>,
) -> Result<Json<PlayerResponse>> {
    run(&app_state, &client_id, PlayerAction::ToggleShuffle).await
}

/// POST /api/player/:client_id/repeat
/// Cycles off, all, one
pub async fn cycle_repeat(
    Path(client_id): Path<String>,
    State(app_state): State<AppState>,
) -> Result<Json<PlayerResponse>> {
    run(&app_state, &client_id, PlayerAction::CycleRepeat).await
}

/// POST /api/player/:client_id/seek
pub async fn seek(
    Path(client_id): Path<String>,
    State(app_state): State<AppState>,
    Json(req): Json<SeekRequest>,
) -> Result<Json<PlayerResponse>> {
    run(&app_state, &client_id, PlayerAction::Seek(req.position)).await
}

/// POST /api/player/:client_id/volume
pub async fn set_volume(
    Path(client_id): Path<String>,
    State(app_state): State<AppState>,
    Json(req): Json<VolumeRequest>,
) -> Result<Json<PlayerResponse>> {
    run(&app_state, &client_id, PlayerAction::SetVolume(req.volume)).await
}

/// POST /api/player/:client_id/events
/// Output callbacks; events from an older load generation are ignored
pub async fn transport_event(
    Path(client_id): Path<String>,
    State(app_state): State<AppState>,
    Json(req): Json<TransportEventRequest>,
) -> Result<Json<PlayerResponse>> {
    let event = TransportEvent::new(req.generation, req.kind);
    run(&app_state, &client_id, PlayerAction::Transport(event)).await
}

/// GET /api/player/:client_id/recent?limit=
pub async fn recent(
    Path(client_id): Path<String>,
    State(app_state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<Track>>> {
    let limit = query.limit.unwrap_or(DEFAULT_RECENT_LIMIT);
    Ok(Json(app_state.sessions.recent(&client_id, limit).await?))
}

/// DELETE /api/player/:client_id
pub async fn close(
    Path(client_id): Path<String>,
    State(app_state): State<AppState>,
) -> Result<StatusCode> {
    app_state.sessions.close(&client_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_event_body_is_flat() {
        let req: TransportEventRequest =
            serde_json::from_str(r#"{"generation": 3, "event": "timeUpdate", "position": 12.5}"#)
                .unwrap();
        assert_eq!(req.generation, 3);
        assert_eq!(req.kind, TransportEventKind::TimeUpdate { position: 12.5 });

        let req: TransportEventRequest =
            serde_json::from_str(r#"{"generation": 1, "event": "ended"}"#).unwrap();
        assert_eq!(req.kind, TransportEventKind::Ended);
    }

    #[test]
    fn play_context_is_optional() {
        let req: PlayRequest = serde_json::from_str(r#"{"trackId": "t1"}"#).unwrap();
        assert!(req.context_track_ids.is_none());

        let req: PlayRequest =
            serde_json::from_str(r#"{"trackId": "t1", "contextTrackIds": ["t1", "t2"]}"#)
                .unwrap();
        assert_eq!(req.context_track_ids.map(|ids| ids.len()), Some(2));
    }
}
