//! Per-client player state: session snapshot and recently-played log

use crate::error::Result;
use cadence_core::types::{SessionSnapshot, TrackId};
use sqlx::SqlitePool;

/// Load the saved snapshot for `client_id`
pub async fn load_snapshot(pool: &SqlitePool, client_id: &str) -> Result<Option<SessionSnapshot>> {
    let json: Option<String> =
        sqlx::query_scalar("SELECT snapshot FROM session_snapshots WHERE client_id = ?")
            .bind(client_id)
            .fetch_optional(pool)
            .await?;

    match json {
        Some(json) => Ok(Some(serde_json::from_str(&json)?)),
        None => Ok(None),
    }
}

/// Save (upsert) the snapshot for `client_id`
pub async fn save_snapshot(
    pool: &SqlitePool,
    client_id: &str,
    snapshot: &SessionSnapshot,
) -> Result<()> {
    let json = serde_json::to_string(snapshot)?;

    sqlx::query(
        r#"
        INSERT INTO session_snapshots (client_id, snapshot, saved_at)
        VALUES (?, ?, ?)
        ON CONFLICT(client_id)
        DO UPDATE SET snapshot = excluded.snapshot, saved_at = excluded.saved_at
        "#,
    )
    .bind(client_id)
    .bind(json)
    .bind(snapshot.saved_at)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn clear_snapshot(pool: &SqlitePool, client_id: &str) -> Result<()> {
    sqlx::query("DELETE FROM session_snapshots WHERE client_id = ?")
        .bind(client_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Recently-played ids, most recent first
pub async fn load_recent(pool: &SqlitePool, client_id: &str) -> Result<Vec<TrackId>> {
    let ids = sqlx::query_scalar(
        "SELECT track_id FROM recent_plays WHERE client_id = ? ORDER BY position",
    )
    .bind(client_id)
    .fetch_all(pool)
    .await?;

    Ok(ids)
}

/// Replace the recently-played log for `client_id`
pub async fn save_recent(pool: &SqlitePool, client_id: &str, track_ids: &[TrackId]) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM recent_plays WHERE client_id = ?")
        .bind(client_id)
        .execute(&mut *tx)
        .await?;

    for (position, track_id) in track_ids.iter().enumerate() {
        sqlx::query("INSERT INTO recent_plays (client_id, position, track_id) VALUES (?, ?, ?)")
            .bind(client_id)
            .bind(position as i64)
            .bind(track_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(())
}
