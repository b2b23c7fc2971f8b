//! Track catalog queries

use crate::error::{Result, StorageError};
use cadence_core::types::{AssetRef, Track, TrackId, UserId};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

const TRACK_COLUMNS: &str = r#"
    id, title, artist, album, genre, date, release_year, duration_secs,
    cover_ref, audio_ref, owner_id, created_at
"#;

fn track_from_row(row: &SqliteRow) -> Track {
    Track {
        id: row.get("id"),
        title: row.get("title"),
        artist: row.get("artist"),
        album: row.get("album"),
        genre: row.get("genre"),
        date: row.get("date"),
        release_year: row.get("release_year"),
        duration_secs: row
            .get::<Option<i64>, _>("duration_secs")
            .map(|secs| secs as u32),
        cover_ref: AssetRef::new(row.get::<String, _>("cover_ref")),
        audio_ref: AssetRef::new(row.get::<String, _>("audio_ref")),
        owner_id: row.get("owner_id"),
        created_at: row.get("created_at"),
    }
}

/// Get track by id
pub async fn get_by_id(pool: &SqlitePool, id: &TrackId) -> Result<Option<Track>> {
    let row = sqlx::query(&format!("SELECT {TRACK_COLUMNS} FROM tracks WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row.as_ref().map(track_from_row))
}

/// Get all tracks, newest first
pub async fn get_all(pool: &SqlitePool) -> Result<Vec<Track>> {
    let rows = sqlx::query(&format!(
        "SELECT {TRACK_COLUMNS} FROM tracks ORDER BY created_at DESC, rowid DESC"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(track_from_row).collect())
}

/// Get tracks created by `owner_id`, newest first
pub async fn get_by_owner(pool: &SqlitePool, owner_id: &UserId) -> Result<Vec<Track>> {
    let rows = sqlx::query(&format!(
        "SELECT {TRACK_COLUMNS} FROM tracks WHERE owner_id = ? ORDER BY created_at DESC, rowid DESC"
    ))
    .bind(owner_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(track_from_row).collect())
}

/// Get the tracks for `ids`; unknown ids are skipped
pub async fn get_many(pool: &SqlitePool, ids: &[TrackId]) -> Result<Vec<Track>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = vec!["?"; ids.len()].join(", ");
    let sql = format!("SELECT {TRACK_COLUMNS} FROM tracks WHERE id IN ({placeholders})");

    let mut query = sqlx::query(&sql);
    for id in ids {
        query = query.bind(id);
    }
    let rows = query.fetch_all(pool).await?;

    Ok(rows.iter().map(track_from_row).collect())
}

/// Search tracks by query (title, artist, album, genre; case-insensitive)
pub async fn search(pool: &SqlitePool, query: &str) -> Result<Vec<Track>> {
    let search_pattern = format!("%{}%", escape_like(&query.to_lowercase()));

    let rows = sqlx::query(&format!(
        r#"
        SELECT {TRACK_COLUMNS} FROM tracks
        WHERE LOWER(title) LIKE ?1 ESCAPE '\'
           OR LOWER(artist) LIKE ?1 ESCAPE '\'
           OR LOWER(album) LIKE ?1 ESCAPE '\'
           OR LOWER(genre) LIKE ?1 ESCAPE '\'
        ORDER BY created_at DESC, rowid DESC
        "#
    ))
    .bind(search_pattern)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(track_from_row).collect())
}

/// Insert a new track
pub async fn create(pool: &SqlitePool, track: &Track) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO tracks (
            id, title, artist, album, genre, date, release_year, duration_secs,
            cover_ref, audio_ref, owner_id, created_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&track.id)
    .bind(&track.title)
    .bind(&track.artist)
    .bind(&track.album)
    .bind(&track.genre)
    .bind(&track.date)
    .bind(track.release_year)
    .bind(track.duration_secs.map(i64::from))
    .bind(track.cover_ref.as_str())
    .bind(track.audio_ref.as_str())
    .bind(&track.owner_id)
    .bind(track.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Overwrite a track's mutable fields
pub async fn update(pool: &SqlitePool, track: &Track) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE tracks
        SET title = ?, artist = ?, album = ?, genre = ?, date = ?, release_year = ?,
            duration_secs = ?, cover_ref = ?, audio_ref = ?
        WHERE id = ?
        "#,
    )
    .bind(&track.title)
    .bind(&track.artist)
    .bind(&track.album)
    .bind(&track.genre)
    .bind(&track.date)
    .bind(track.release_year)
    .bind(track.duration_secs.map(i64::from))
    .bind(track.cover_ref.as_str())
    .bind(track.audio_ref.as_str())
    .bind(&track.id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StorageError::not_found("Track", track.id.as_str()));
    }
    Ok(())
}

/// Delete a track and pull it from every playlist and liked-songs set
///
/// Runs in a single transaction.
pub async fn delete(pool: &SqlitePool, id: &TrackId) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM playlist_tracks WHERE track_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM liked_songs WHERE track_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    let result = sqlx::query("DELETE FROM tracks WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        // Dropping the transaction rolls it back
        return Err(StorageError::not_found("Track", id.as_str()));
    }

    tx.commit().await?;
    Ok(())
}

fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
