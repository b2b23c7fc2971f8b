use crate::error::{Result, StorageError};
use cadence_core::types::{AssetRef, Playlist, PlaylistId, TrackId, UserId};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};

const PLAYLIST_COLUMNS: &str = r#"
    id, name, description, cover_ref, owner_id, is_public, is_featured,
    created_at, updated_at
"#;

fn playlist_from_row(row: &SqliteRow) -> Playlist {
    Playlist {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        cover_ref: AssetRef::new(row.get::<String, _>("cover_ref")),
        songs: Vec::new(),
        owner_id: row.get("owner_id"),
        is_public: row.get::<i64, _>("is_public") != 0,
        is_featured: row.get::<i64, _>("is_featured") != 0,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// Ordered song ids of a playlist
async fn song_ids(pool: &SqlitePool, id: &PlaylistId) -> Result<Vec<TrackId>> {
    let ids = sqlx::query_scalar(
        "SELECT track_id FROM playlist_tracks WHERE playlist_id = ? ORDER BY position",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    Ok(ids)
}

async fn hydrate(pool: &SqlitePool, rows: Vec<SqliteRow>) -> Result<Vec<Playlist>> {
    let mut playlists = Vec::with_capacity(rows.len());
    for row in rows {
        let mut playlist = playlist_from_row(&row);
        playlist.songs = song_ids(pool, &playlist.id).await?;
        playlists.push(playlist);
    }
    Ok(playlists)
}

async fn write_songs(
    tx: &mut Transaction<'_, Sqlite>,
    id: &PlaylistId,
    songs: &[TrackId],
) -> Result<()> {
    sqlx::query("DELETE FROM playlist_tracks WHERE playlist_id = ?")
        .bind(id)
        .execute(&mut **tx)
        .await?;

    for (position, track_id) in songs.iter().enumerate() {
        sqlx::query("INSERT INTO playlist_tracks (playlist_id, track_id, position) VALUES (?, ?, ?)")
            .bind(id)
            .bind(track_id)
            .bind(position as i64)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

/// Get playlist by id with its ordered songs
///
/// No visibility check; callers apply the rule.
pub async fn get_by_id(pool: &SqlitePool, id: &PlaylistId) -> Result<Option<Playlist>> {
    let row = sqlx::query(&format!(
        "SELECT {PLAYLIST_COLUMNS} FROM playlists WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let mut playlist = playlist_from_row(&row);
    playlist.songs = song_ids(pool, id).await?;
    Ok(Some(playlist))
}

/// Public playlists, newest first
pub async fn get_public(pool: &SqlitePool) -> Result<Vec<Playlist>> {
    let rows = sqlx::query(&format!(
        "SELECT {PLAYLIST_COLUMNS} FROM playlists WHERE is_public = 1 ORDER BY created_at DESC, rowid DESC"
    ))
    .fetch_all(pool)
    .await?;

    hydrate(pool, rows).await
}

/// Featured playlists, newest first
pub async fn get_featured(pool: &SqlitePool) -> Result<Vec<Playlist>> {
    let rows = sqlx::query(&format!(
        "SELECT {PLAYLIST_COLUMNS} FROM playlists WHERE is_featured = 1 ORDER BY created_at DESC, rowid DESC"
    ))
    .fetch_all(pool)
    .await?;

    hydrate(pool, rows).await
}

/// Get user's playlists, most recently updated first
pub async fn get_by_owner(pool: &SqlitePool, owner_id: &UserId) -> Result<Vec<Playlist>> {
    let rows = sqlx::query(&format!(
        "SELECT {PLAYLIST_COLUMNS} FROM playlists WHERE owner_id = ? ORDER BY updated_at DESC, rowid DESC"
    ))
    .bind(owner_id)
    .fetch_all(pool)
    .await?;

    hydrate(pool, rows).await
}

/// Every playlist, newest first
pub async fn get_all(pool: &SqlitePool) -> Result<Vec<Playlist>> {
    let rows = sqlx::query(&format!(
        "SELECT {PLAYLIST_COLUMNS} FROM playlists ORDER BY created_at DESC, rowid DESC"
    ))
    .fetch_all(pool)
    .await?;

    hydrate(pool, rows).await
}

/// Create new playlist with its initial songs
pub async fn create(pool: &SqlitePool, playlist: &Playlist) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO playlists (
            id, name, description, cover_ref, owner_id, is_public, is_featured,
            created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&playlist.id)
    .bind(&playlist.name)
    .bind(&playlist.description)
    .bind(playlist.cover_ref.as_str())
    .bind(&playlist.owner_id)
    .bind(playlist.is_public)
    .bind(playlist.is_featured)
    .bind(playlist.created_at)
    .bind(playlist.updated_at)
    .execute(&mut *tx)
    .await?;

    write_songs(&mut tx, &playlist.id, &playlist.songs).await?;

    tx.commit().await?;
    Ok(())
}

/// Overwrite a playlist, replacing its song list
pub async fn save(pool: &SqlitePool, playlist: &Playlist) -> Result<()> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        UPDATE playlists
        SET name = ?, description = ?, cover_ref = ?, is_public = ?, is_featured = ?,
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&playlist.name)
    .bind(&playlist.description)
    .bind(playlist.cover_ref.as_str())
    .bind(playlist.is_public)
    .bind(playlist.is_featured)
    .bind(playlist.updated_at)
    .bind(&playlist.id)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StorageError::not_found("Playlist", playlist.id.as_str()));
    }

    write_songs(&mut tx, &playlist.id, &playlist.songs).await?;

    tx.commit().await?;
    Ok(())
}

/// Delete playlist; its track rows go with it
pub async fn delete(pool: &SqlitePool, id: &PlaylistId) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM playlist_tracks WHERE playlist_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    let result = sqlx::query("DELETE FROM playlists WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        return Err(StorageError::not_found("Playlist", id.as_str()));
    }

    tx.commit().await?;
    Ok(())
}
