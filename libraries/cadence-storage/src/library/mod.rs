//! Liked-songs sets

use crate::error::Result;
use cadence_core::types::{TrackId, UserId};
use chrono::Utc;
use sqlx::SqlitePool;

/// Add `track_id` to the user's liked songs
///
/// Returns false when it was already there.
pub async fn add(pool: &SqlitePool, user_id: &UserId, track_id: &TrackId) -> Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO liked_songs (user_id, track_id, liked_at)
        VALUES (?, ?, ?)
        ON CONFLICT(user_id, track_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(track_id)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Remove `track_id` from the user's liked songs
///
/// Returns false when it was not there.
pub async fn remove(pool: &SqlitePool, user_id: &UserId, track_id: &TrackId) -> Result<bool> {
    let result = sqlx::query("DELETE FROM liked_songs WHERE user_id = ? AND track_id = ?")
        .bind(user_id)
        .bind(track_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Liked track ids, most recently liked first
pub async fn liked_ids(pool: &SqlitePool, user_id: &UserId) -> Result<Vec<TrackId>> {
    let ids = sqlx::query_scalar(
        "SELECT track_id FROM liked_songs WHERE user_id = ? ORDER BY liked_at DESC, rowid DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(ids)
}
