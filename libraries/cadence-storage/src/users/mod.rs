//! User accounts, credentials and password-reset challenges

use crate::error::{is_unique_violation, Result, StorageError};
use crate::library;
use cadence_core::types::{ResetChallenge, User, UserId};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

fn user_from_row(row: &SqliteRow) -> User {
    User {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        is_admin: row.get::<i64, _>("is_admin") != 0,
        liked_songs: Default::default(),
        created_at: row.get("created_at"),
    }
}

async fn with_liked(pool: &SqlitePool, mut user: User) -> Result<User> {
    user.liked_songs = library::liked_ids(pool, &user.id).await?.into_iter().collect();
    Ok(user)
}

/// Insert a user with its password hash
///
/// A taken email yields `StorageError::Conflict`.
pub async fn create(pool: &SqlitePool, user: &User, password_hash: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        INSERT INTO users (id, name, email, password_hash, is_admin, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.id)
    .bind(&user.name)
    .bind(&user.email)
    .bind(password_hash)
    .bind(user.is_admin)
    .bind(user.created_at)
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(()),
        Err(e) if is_unique_violation(&e) => {
            Err(StorageError::Conflict("User already exists".to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Get user by id, including the liked-songs set
pub async fn get_by_id(pool: &SqlitePool, id: &UserId) -> Result<Option<User>> {
    let row = sqlx::query(
        "SELECT id, name, email, is_admin, created_at FROM users WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => Ok(Some(with_liked(pool, user_from_row(&row)).await?)),
        None => Ok(None),
    }
}

/// Get user by (already normalized) email
pub async fn get_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let row = sqlx::query(
        "SELECT id, name, email, is_admin, created_at FROM users WHERE email = ?",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => Ok(Some(with_liked(pool, user_from_row(&row)).await?)),
        None => Ok(None),
    }
}

/// All users, newest first; liked sets are not loaded
pub async fn get_all(pool: &SqlitePool) -> Result<Vec<User>> {
    let rows = sqlx::query(
        "SELECT id, name, email, is_admin, created_at FROM users ORDER BY created_at DESC, rowid DESC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(user_from_row).collect())
}

/// Admin users, oldest first
pub async fn get_admins(pool: &SqlitePool) -> Result<Vec<User>> {
    let rows = sqlx::query(
        "SELECT id, name, email, is_admin, created_at FROM users WHERE is_admin = 1 ORDER BY created_at, rowid",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(user_from_row).collect())
}

pub async fn count_admins(pool: &SqlitePool) -> Result<usize> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE is_admin = 1")
        .fetch_one(pool)
        .await?;

    Ok(count as usize)
}

pub async fn set_admin(pool: &SqlitePool, id: &UserId, is_admin: bool) -> Result<()> {
    let result = sqlx::query("UPDATE users SET is_admin = ? WHERE id = ?")
        .bind(is_admin)
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(StorageError::not_found("User", id.as_str()));
    }
    Ok(())
}

/// Delete a user along with their liked songs and owned playlists
pub async fn delete(pool: &SqlitePool, id: &UserId) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM liked_songs WHERE user_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        "DELETE FROM playlist_tracks WHERE playlist_id IN (SELECT id FROM playlists WHERE owner_id = ?)",
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM playlists WHERE owner_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        return Err(StorageError::not_found("User", id.as_str()));
    }

    tx.commit().await?;
    Ok(())
}

/// Get user's password hash for authentication
pub async fn get_password_hash(pool: &SqlitePool, id: &UserId) -> Result<Option<String>> {
    let hash = sqlx::query_scalar("SELECT password_hash FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(hash)
}

pub async fn set_password_hash(pool: &SqlitePool, id: &UserId, password_hash: &str) -> Result<()> {
    let result = sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
        .bind(password_hash)
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(StorageError::not_found("User", id.as_str()));
    }
    Ok(())
}

/// Current password-reset challenge, if one is pending
pub async fn get_reset_challenge(
    pool: &SqlitePool,
    id: &UserId,
) -> Result<Option<ResetChallenge>> {
    let row = sqlx::query("SELECT reset_code, reset_expires_at FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let code: Option<String> = row.get("reset_code");
    let expires_at: Option<DateTime<Utc>> = row.get("reset_expires_at");

    Ok(code
        .zip(expires_at)
        .map(|(code, expires_at)| ResetChallenge { code, expires_at }))
}

/// Set or clear (`None`) the reset challenge; code and expiry move together
pub async fn set_reset_challenge(
    pool: &SqlitePool,
    id: &UserId,
    challenge: Option<&ResetChallenge>,
) -> Result<()> {
    let result = sqlx::query("UPDATE users SET reset_code = ?, reset_expires_at = ? WHERE id = ?")
        .bind(challenge.map(|c| c.code.as_str()))
        .bind(challenge.map(|c| c.expires_at))
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(StorageError::not_found("User", id.as_str()));
    }
    Ok(())
}
