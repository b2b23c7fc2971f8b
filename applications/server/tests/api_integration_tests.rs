/// API integration tests
/// Tests complete HTTP request/response cycles with a real database and upload dir
mod common;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use common::{test_app, test_app_with, MultipartBody, TEST_PASSWORD};
use serde_json::{json, Value};

fn ids(value: &Value) -> Vec<String> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_str().unwrap().to_string())
        .collect()
}

fn playlist_form(name: &str, songs: &[&str], is_public: bool) -> MultipartBody {
    MultipartBody::new()
        .text("name", name)
        .text("description", "Test playlist")
        .text("songs", &serde_json::to_string(songs).unwrap())
        .text("isPublic", if is_public { "true" } else { "false" })
        .file("cover", "cover.jpg", b"jpg")
}

// ===== Health & authentication =====

#[tokio::test]
async fn test_health() {
    let app = test_app().await;
    let (status, body) = app.get("/api/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_missing_user_id_is_unauthorized() {
    let app = test_app().await;
    let (status, body) = app.get("/api/auth/me", None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "No user ID, authorization denied");
}

#[tokio::test]
async fn test_unknown_user_id_is_unauthorized() {
    let app = test_app().await;
    let request = Request::builder()
        .uri("/api/user/playlists")
        .header("X-User-Id", "no-such-user")
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid user ID");
}

#[tokio::test]
async fn test_user_id_query_parameter_fallback() {
    let app = test_app().await;
    let ann = app.user("Ann").await;

    let (status, body) = app
        .get(&format!("/api/auth/me?userId={}", ann.id), None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], ann.id.as_str());
    assert_eq!(body["user"]["isAdmin"], false);
}

#[tokio::test]
async fn test_register_and_login() {
    let app = test_app().await;

    let (status, body) = app
        .post(
            "/api/auth/register",
            None,
            json!({"name": "Ann", "email": " Ann@Example.com ", "password": "hunter22"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["email"], "ann@example.com");
    assert!(body["user"].get("password").is_none());
    let id = body["user"]["id"].as_str().unwrap().to_string();

    // Same email, different case
    let (status, body) = app
        .post(
            "/api/auth/register",
            None,
            json!({"name": "Other", "email": "ANN@example.com", "password": "hunter22"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "User already exists");

    let (status, body) = app
        .post(
            "/api/auth/login",
            None,
            json!({"email": "ann@example.com", "password": "hunter22"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], id.as_str());

    let (status, body) = app
        .post(
            "/api/auth/login",
            None,
            json!({"email": "ann@example.com", "password": "wrong-password"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid credentials");
}

#[tokio::test]
async fn test_register_rejects_short_password() {
    let app = test_app().await;
    let (status, body) = app
        .post(
            "/api/auth/register",
            None,
            json!({"name": "Ann", "email": "ann@example.com", "password": "123"}),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Password must be at least 6 characters long");
}

#[tokio::test]
async fn test_admin_routes_require_admin() {
    let app = test_app().await;
    let ann = app.user("Ann").await;
    let root = app.admin("Root").await;

    let (status, body) = app.get("/api/admin/users", Some(&ann)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Access denied. Admin privileges required");

    let (status, body) = app.get("/api/admin/users", Some(&root)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, _) = app.get("/api/admin/users", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ===== Songs =====

#[tokio::test]
async fn test_admin_creates_song_with_assets() {
    let app = test_app().await;
    let root = app.admin("Root").await;

    let form = MultipartBody::new()
        .text("title", "Road Trip")
        .text("artist", "The Band")
        .text("album", "Highways")
        .text("genre", "Rock")
        .text("releaseYear", "1999")
        .text("duration", "215")
        .file("cover", "my cover.png", b"png-bytes")
        .file("audio", "road trip.mp3", b"mp3-bytes");

    let (status, song) = app
        .upload(Method::POST, "/api/admin/songs", &root, &form)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(song["title"], "Road Trip");
    assert_eq!(song["releaseYear"], 1999);
    assert_eq!(song["durationSecs"], 215);

    let cover_ref = song["coverRef"].as_str().unwrap();
    let audio_ref = song["audioRef"].as_str().unwrap();
    assert!(cover_ref.starts_with("/uploads/images/"));
    assert!(cover_ref.ends_with("-my-cover.png"));
    assert!(audio_ref.starts_with("/uploads/audio/"));

    // Assets are served back read-only
    let (status, _) = app.get(cover_ref, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.get("/api/songs", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![song["id"].as_str().unwrap().to_string()]);
}

#[tokio::test]
async fn test_create_song_requires_both_assets() {
    let app = test_app().await;
    let root = app.admin("Root").await;

    let form = MultipartBody::new()
        .text("title", "Road Trip")
        .text("artist", "The Band")
        .text("album", "Highways")
        .text("genre", "Rock")
        .file("cover", "cover.png", b"png");

    let (status, body) = app
        .upload(Method::POST, "/api/admin/songs", &root, &form)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Audio file is required");

    let (_, songs) = app.get("/api/songs", None).await;
    assert!(songs.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_type_and_size_are_checked() {
    let app = test_app_with(|config| config.uploads.max_image_bytes = 8).await;
    let root = app.admin("Root").await;

    let wrong_type = MultipartBody::new()
        .text("title", "Song")
        .file("cover", "cover.mp3", b"mp3");
    let (status, body) = app
        .upload(Method::POST, "/api/admin/songs", &root, &wrong_type)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Only image files are allowed!");

    let too_big = MultipartBody::new()
        .text("title", "Song")
        .file("cover", "cover.png", &[0u8; 64]);
    let (status, _) = app
        .upload(Method::POST, "/api/admin/songs", &root, &too_big)
        .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_search_and_get_song() {
    let app = test_app().await;
    let root = app.admin("Root").await;
    let road = app.track(&root, "Road Trip").await;
    app.track(&root, "Night Drive").await;

    let (status, body) = app.get("/api/songs/search?q=ROAD", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![road.id.to_string()]);

    let (_, body) = app.get("/api/songs/search?q=", None).await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, body) = app.get(&format!("/api/songs/{}", road.id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Road Trip");

    let (status, body) = app.get("/api/songs/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Track not found");
}

#[tokio::test]
async fn test_update_song_text_fields() {
    let app = test_app().await;
    let root = app.admin("Root").await;
    let song = app.track(&root, "Road Trip").await;

    let form = MultipartBody::new().text("title", "Road Trip (Live)");
    let (status, body) = app
        .upload(
            Method::PUT,
            &format!("/api/admin/songs/{}", song.id),
            &root,
            &form,
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Road Trip (Live)");
    assert_eq!(body["artist"], "Test Artist");
    assert_eq!(body["coverRef"], song.cover_ref.as_str());
}

#[tokio::test]
async fn test_delete_song_cascades() {
    let app = test_app().await;
    let root = app.admin("Root").await;
    let ann = app.user("Ann").await;
    let keep = app.track(&root, "Keep").await;
    let gone = app.track(&root, "Gone").await;

    let form = playlist_form("Mix", &[keep.id.as_str(), gone.id.as_str()], true);
    let (_, playlist) = app
        .upload(Method::POST, "/api/user/playlists", &ann, &form)
        .await;
    let playlist_id = playlist["id"].as_str().unwrap().to_string();
    app.post("/api/user/library", Some(&ann), json!({"songId": gone.id}))
        .await;

    let (status, _) = app
        .delete(&format!("/api/admin/songs/{}", gone.id), Some(&root))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, playlist) = app
        .get(&format!("/api/playlists/{}", playlist_id), None)
        .await;
    assert_eq!(playlist["songs"], json!([keep.id.as_str()]));

    let (_, library) = app.get("/api/user/library", Some(&ann)).await;
    assert!(library["savedSongs"].as_array().unwrap().is_empty());

    assert!(app
        .state
        .file_storage
        .resolve(&gone.audio_ref)
        .is_some_and(|path| !path.exists()));
}

// ===== Playlists =====

#[tokio::test]
async fn test_playlist_visibility() {
    let app = test_app().await;
    let root = app.admin("Root").await;
    let ann = app.user("Ann").await;
    let bob = app.user("Bob").await;
    let song = app.track(&root, "Song").await;

    let (status, private) = app
        .upload(
            Method::POST,
            "/api/user/playlists",
            &ann,
            &playlist_form("Private", &[song.id.as_str()], false),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(private["tracks"][0]["title"], "Song");
    let uri = format!("/api/playlists/{}", private["id"].as_str().unwrap());

    let (_, public) = app.get("/api/playlists", None).await;
    assert!(public.as_array().unwrap().is_empty());

    let (status, _) = app.get(&uri, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.get(&uri, Some(&bob)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.get(&uri, Some(&ann)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.get(&uri, Some(&root)).await;
    assert_eq!(status, StatusCode::OK);

    let (_, own) = app.get("/api/user/playlists", Some(&ann)).await;
    assert_eq!(own.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_playlist_requires_cover() {
    let app = test_app().await;
    let ann = app.user("Ann").await;

    let form = MultipartBody::new()
        .text("name", "No Cover")
        .text("description", "Missing art");
    let (status, body) = app
        .upload(Method::POST, "/api/user/playlists", &ann, &form)
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Cover image is required");
}

#[tokio::test]
async fn test_playlist_songs_must_exist() {
    let app = test_app().await;
    let ann = app.user("Ann").await;

    let (status, body) = app
        .upload(
            Method::POST,
            "/api/user/playlists",
            &ann,
            &playlist_form("Ghosts", &["no-such-track"], true),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Track not found");
}

#[tokio::test]
async fn test_only_admins_feature_playlists() {
    let app = test_app().await;
    let root = app.admin("Root").await;
    let ann = app.user("Ann").await;

    let form = playlist_form("Mix", &[], true).text("isFeatured", "true");
    let (status, _) = app
        .upload(Method::POST, "/api/user/playlists", &ann, &form)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .upload(Method::POST, "/api/admin/playlists", &root, &form)
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, featured) = app.get("/api/playlists/featured", None).await;
    assert_eq!(featured.as_array().unwrap().len(), 1);
    assert_eq!(featured[0]["isFeatured"], true);
}

#[tokio::test]
async fn test_playlist_song_management() {
    let app = test_app().await;
    let root = app.admin("Root").await;
    let ann = app.user("Ann").await;
    let bob = app.user("Bob").await;
    let first = app.track(&root, "First").await;
    let second = app.track(&root, "Second").await;

    let (_, playlist) = app
        .upload(
            Method::POST,
            "/api/user/playlists",
            &ann,
            &playlist_form("Mix", &[first.id.as_str()], true),
        )
        .await;
    let songs_uri = format!("/api/user/playlists/{}/songs", playlist["id"].as_str().unwrap());

    let (status, body) = app
        .post(&songs_uri, Some(&ann), json!({"songId": second.id}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["songs"], json!([first.id.as_str(), second.id.as_str()]));

    let (status, body) = app
        .post(&songs_uri, Some(&ann), json!({"songId": second.id}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Song already in playlist");

    let (status, _) = app
        .post(&songs_uri, Some(&bob), json!({"songId": second.id}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .delete(&format!("{}/{}", songs_uri, first.id), Some(&ann))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["songs"], json!([second.id.as_str()]));

    // Removing an absent song still succeeds
    let (status, _) = app
        .delete(&format!("{}/{}", songs_uri, first.id), Some(&ann))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_playlist_update_and_delete() {
    let app = test_app().await;
    let ann = app.user("Ann").await;
    let bob = app.user("Bob").await;

    let (_, playlist) = app
        .upload(
            Method::POST,
            "/api/user/playlists",
            &ann,
            &playlist_form("Mix", &[], false),
        )
        .await;
    let uri = format!("/api/user/playlists/{}", playlist["id"].as_str().unwrap());

    let form = MultipartBody::new().text("name", "Renamed").text("isPublic", "true");
    let (status, body) = app.upload(Method::PUT, &uri, &ann, &form).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Renamed");
    assert_eq!(body["description"], "Test playlist");
    assert_eq!(body["isPublic"], true);

    let (status, _) = app.upload(Method::PUT, &uri, &bob, &form).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.delete(&uri, Some(&bob)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.delete(&uri, Some(&ann)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.delete(&uri, Some(&ann)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ===== Liked songs =====

#[tokio::test]
async fn test_like_and_unlike() {
    let app = test_app().await;
    let root = app.admin("Root").await;
    let ann = app.user("Ann").await;
    let first = app.track(&root, "First").await;
    let second = app.track(&root, "Second").await;

    for song in [&first, &second] {
        let (status, _) = app
            .post("/api/user/library", Some(&ann), json!({"songId": song.id}))
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = app
        .post("/api/user/library", Some(&ann), json!({"songId": first.id}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Song already in library");

    let (_, library) = app.get("/api/user/library", Some(&ann)).await;
    assert_eq!(
        ids(&library["savedSongs"]),
        vec![second.id.to_string(), first.id.to_string()]
    );

    let uri = format!("/api/user/library/{}", first.id);
    let (status, body) = app.delete(&uri, Some(&ann)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["savedSongs"], json!([second.id.as_str()]));

    let (status, body) = app.delete(&uri, Some(&ann)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Song not in library");

    let (status, _) = app
        .post("/api/user/library", Some(&ann), json!({"songId": "missing"}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_redundant_likes_can_be_allowed() {
    let app = test_app_with(|config| config.library.reject_redundant_likes = false).await;
    let root = app.admin("Root").await;
    let ann = app.user("Ann").await;
    let song = app.track(&root, "Song").await;

    for _ in 0..2 {
        let (status, body) = app
            .post("/api/user/library", Some(&ann), json!({"songId": song.id}))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["savedSongs"], json!([song.id.as_str()]));
    }

    let uri = format!("/api/user/library/{}", song.id);
    for _ in 0..2 {
        let (status, _) = app.delete(&uri, Some(&ann)).await;
        assert_eq!(status, StatusCode::OK);
    }
}

// ===== User administration =====

#[tokio::test]
async fn test_role_changes_protect_last_admin() {
    let app = test_app().await;
    let root = app.admin("Root").await;
    let ann = app.user("Ann").await;

    let (status, body) = app
        .put(&format!("/api/admin/users/{}/role", root.id), Some(&root), json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Cannot remove the last admin");

    let (status, body) = app
        .put(
            &format!("/api/admin/users/{}/role", ann.id),
            Some(&root),
            json!({"isAdmin": true}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["isAdmin"], true);

    let (_, admins) = app.get("/api/admin/admins", Some(&root)).await;
    assert_eq!(admins.as_array().unwrap().len(), 2);

    // Two admins now, so demotion is allowed
    let (status, body) = app
        .put(&format!("/api/admin/users/{}/role", root.id), Some(&ann), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["isAdmin"], false);
}

#[tokio::test]
async fn test_delete_user_removes_owned_playlists() {
    let app = test_app().await;
    let root = app.admin("Root").await;
    let ann = app.user("Ann").await;

    let (_, playlist) = app
        .upload(
            Method::POST,
            "/api/user/playlists",
            &ann,
            &playlist_form("Mix", &[], true),
        )
        .await;

    let (status, _) = app
        .delete(&format!("/api/admin/users/{}", ann.id), Some(&root))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .get(&format!("/api/playlists/{}", playlist["id"].as_str().unwrap()), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.get("/api/auth/me", Some(&ann)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .delete(&format!("/api/admin/users/{}", root.id), Some(&root))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Cannot remove the last admin");
}

#[tokio::test]
async fn test_dashboard_counts() {
    let app = test_app().await;
    let root = app.admin("Root").await;
    app.user("Ann").await;
    app.track(&root, "Song").await;

    let (status, body) = app.get("/api/admin/dashboard", Some(&root)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["counts"]["songs"], 1);
    assert_eq!(body["counts"]["playlists"], 0);
    assert_eq!(body["counts"]["users"], 2);
    assert_eq!(body["counts"]["admins"], 1);
    assert_eq!(body["recentSongs"][0]["title"], "Song");
}

// ===== Password reset =====

#[tokio::test]
async fn test_password_reset_flow() {
    let app = test_app().await;
    let ann = app.user("Ann").await;

    let (status, _) = app
        .post(
            "/api/password-reset/request-otp",
            None,
            json!({"email": "nobody@example.com"}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .post(
            "/api/password-reset/request-otp",
            None,
            json!({"email": "ANN@example.com"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let code = app.mailer.last_code_for(&ann.email).unwrap();

    let wrong = if code == "000000" { "111111" } else { "000000" };
    let (status, body) = app
        .post(
            "/api/password-reset/verify-otp",
            None,
            json!({"email": ann.email, "otp": wrong}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid or expired OTP");

    let (status, _) = app
        .post(
            "/api/password-reset/verify-otp",
            None,
            json!({"email": ann.email, "otp": code}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post(
            "/api/password-reset/reset-password",
            None,
            json!({"email": ann.email, "otp": code, "newPassword": "brand-new"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // The code is single-use
    let (status, _) = app
        .post(
            "/api/password-reset/reset-password",
            None,
            json!({"email": ann.email, "otp": code, "newPassword": "again-new"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post(
            "/api/auth/login",
            None,
            json!({"email": ann.email, "password": TEST_PASSWORD}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post(
            "/api/auth/login",
            None,
            json!({"email": ann.email, "password": "brand-new"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

// ===== Player sessions =====

#[tokio::test]
async fn test_player_queue_and_transport_flow() {
    let app = test_app().await;
    let root = app.admin("Root").await;
    let a = app.track(&root, "A").await;
    let b = app.track(&root, "B").await;
    let c = app.track(&root, "C").await;

    let (status, body) = app
        .post(
            "/api/player/tab-1/queue",
            None,
            json!({"trackIds": [a.id, b.id, c.id], "startIndex": 0}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"]["currentTrack"]["id"], a.id.as_str());
    assert_eq!(body["status"]["state"], "playing");
    let first_generation = body["status"]["generation"].as_u64().unwrap();

    let (_, body) = app.post("/api/player/tab-1/next", None, json!({})).await;
    assert_eq!(body["status"]["currentTrack"]["id"], b.id.as_str());
    let generation = body["status"]["generation"].as_u64().unwrap();
    assert!(generation > first_generation);

    // An "ended" from the previous load is stale
    let (_, body) = app
        .post(
            "/api/player/tab-1/events",
            None,
            json!({"generation": first_generation, "event": "ended"}),
        )
        .await;
    assert_eq!(body["accepted"], false);
    assert_eq!(body["status"]["currentTrack"]["id"], b.id.as_str());

    let (_, body) = app
        .post(
            "/api/player/tab-1/events",
            None,
            json!({"generation": generation, "event": "timeUpdate", "position": 42.5}),
        )
        .await;
    assert_eq!(body["accepted"], true);
    assert_eq!(body["status"]["position"], 42.5);

    let (_, body) = app
        .post(
            "/api/player/tab-1/events",
            None,
            json!({"generation": generation, "event": "ended"}),
        )
        .await;
    assert_eq!(body["status"]["currentTrack"]["id"], c.id.as_str());
    let generation = body["status"]["generation"].as_u64().unwrap();

    // End of a non-repeating queue: paused on the last track
    let (_, body) = app
        .post(
            "/api/player/tab-1/events",
            None,
            json!({"generation": generation, "event": "ended"}),
        )
        .await;
    assert_eq!(body["status"]["state"], "paused");
    assert_eq!(body["status"]["currentTrack"]["id"], c.id.as_str());

    let (_, body) = app.post("/api/player/tab-1/next", None, json!({})).await;
    assert_eq!(body["status"]["currentTrack"]["id"], c.id.as_str());

    let (status, recent) = app.get("/api/player/tab-1/recent?limit=5", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        ids(&recent),
        vec![c.id.to_string(), b.id.to_string(), a.id.to_string()]
    );
}

#[tokio::test]
async fn test_player_controls() {
    let app = test_app().await;
    let root = app.admin("Root").await;
    let a = app.track(&root, "A").await;
    let b = app.track(&root, "B").await;

    app.post(
        "/api/player/desk/queue",
        None,
        json!({"trackIds": [a.id, b.id]}),
    )
    .await;

    // Previous at the start of the queue does nothing by default
    let (_, body) = app.post("/api/player/desk/previous", None, json!({})).await;
    assert_eq!(body["status"]["currentTrack"]["id"], a.id.as_str());

    let (_, body) = app.post("/api/player/desk/pause", None, json!({})).await;
    assert_eq!(body["status"]["isPlaying"], false);
    let (_, body) = app.post("/api/player/desk/resume", None, json!({})).await;
    assert_eq!(body["status"]["isPlaying"], true);

    let (_, body) = app
        .post("/api/player/desk/volume", None, json!({"volume": 1.5}))
        .await;
    assert_eq!(body["status"]["volume"], 1.0);

    let (_, body) = app.post("/api/player/desk/repeat", None, json!({})).await;
    assert_eq!(body["status"]["repeatMode"], "all");

    let (_, body) = app.post("/api/player/desk/shuffle", None, json!({})).await;
    assert_eq!(body["status"]["shuffle"], true);
    assert_eq!(body["status"]["cursor"], 0);
    assert_eq!(body["status"]["currentTrack"]["id"], a.id.as_str());

    let (status, body) = app
        .post("/api/player/desk/seek", None, json!({"position": 30.0}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"]["position"], 30.0);
}

#[tokio::test]
async fn test_play_without_queue_uses_catalog() {
    let app = test_app().await;
    let root = app.admin("Root").await;
    app.track(&root, "A").await;
    let b = app.track(&root, "B").await;

    let (status, body) = app
        .post("/api/player/phone/play", None, json!({"trackId": b.id}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"]["currentTrack"]["id"], b.id.as_str());
    assert_eq!(body["status"]["queue"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_player_rejects_unknown_tracks_and_bad_input() {
    let app = test_app().await;
    let root = app.admin("Root").await;
    let a = app.track(&root, "A").await;

    let (status, body) = app
        .post(
            "/api/player/tab/queue",
            None,
            json!({"trackIds": [a.id, "missing"]}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Track not found");

    let (status, _) = app
        .post(
            "/api/player/tab/queue",
            None,
            json!({"trackIds": [a.id], "startIndex": 3}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.post("/api/player/tab/resume", None, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.get("/api/player/bad.client/recent", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid client id");
}

#[tokio::test]
async fn test_evicted_session_is_restored_paused() {
    let app = test_app_with(|config| config.playback.idle_session_limit = 1).await;
    let root = app.admin("Root").await;
    let a = app.track(&root, "A").await;
    let b = app.track(&root, "B").await;

    app.post(
        "/api/player/first/queue",
        None,
        json!({"trackIds": [a.id, b.id], "startIndex": 1}),
    )
    .await;

    // Starting a second session evicts the first
    app.get("/api/player/second", None).await;
    assert_eq!(app.state.sessions.len().await, 1);

    let (status, body) = app.get("/api/player/first", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"]["currentTrack"]["id"], b.id.as_str());
    assert_eq!(body["status"]["state"], "paused");
    assert_eq!(body["status"]["isPlaying"], false);
    assert_eq!(body["status"]["queue"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_queue_keeps_repeated_tracks() {
    let app = test_app().await;
    let root = app.admin("Root").await;
    let a = app.track(&root, "A").await;
    let b = app.track(&root, "B").await;

    let (status, body) = app
        .post(
            "/api/player/tab-1/queue",
            None,
            json!({"trackIds": [a.id, b.id, a.id], "startIndex": 2}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"]["queue"].as_array().unwrap().len(), 3);
    assert_eq!(body["status"]["cursor"], 2);
    assert_eq!(body["status"]["currentTrack"]["id"], a.id.as_str());

    let (status, body) = app
        .post(
            "/api/player/tab-2/queue",
            None,
            json!({"trackIds": [a.id, a.id, b.id], "startIndex": 1}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"]["cursor"], 1);
    assert_eq!(body["status"]["currentTrack"]["id"], a.id.as_str());

    let (_, body) = app.post("/api/player/tab-2/next", None, json!({})).await;
    assert_eq!(body["status"]["currentTrack"]["id"], b.id.as_str());
}

#[tokio::test]
async fn test_unreadable_snapshot_is_not_overwritten() {
    let app = test_app().await;
    let root = app.admin("Root").await;
    let a = app.track(&root, "A").await;

    let pool = cadence_storage::create_pool(&app.state.config.storage.database_url)
        .await
        .unwrap();
    sqlx::query("INSERT INTO session_snapshots (client_id, snapshot, saved_at) VALUES (?, ?, ?)")
        .bind("kiosk")
        .bind("{not json")
        .bind("2026-01-01T00:00:00Z")
        .execute(&pool)
        .await
        .unwrap();
    cadence_storage::sessions::save_recent(&pool, "kiosk", &[a.id.clone()])
        .await
        .unwrap();

    let (status, body) = app
        .post("/api/player/kiosk/volume", None, json!({"volume": 0.5}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"]["volume"], 0.5);

    let stored: String =
        sqlx::query_scalar("SELECT snapshot FROM session_snapshots WHERE client_id = ?")
            .bind("kiosk")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(stored, "{not json");

    let recent = cadence_storage::sessions::load_recent(&pool, "kiosk")
        .await
        .unwrap();
    assert_eq!(recent, vec![a.id]);
}

#[tokio::test]
async fn test_bouncing_between_evicted_sessions_keeps_state() {
    let app = test_app_with(|config| config.playback.idle_session_limit = 1).await;
    let root = app.admin("Root").await;
    let a = app.track(&root, "A").await;
    let b = app.track(&root, "B").await;

    app.post(
        "/api/player/first/queue",
        None,
        json!({"trackIds": [a.id, b.id], "startIndex": 0}),
    )
    .await;

    // Each request for one client evicts the other
    for _ in 0..4 {
        let ((first, _), (second, _)) = tokio::join!(
            app.post("/api/player/first/next", None, json!({})),
            app.get("/api/player/second", None),
        );
        assert_eq!(first, StatusCode::OK);
        assert_eq!(second, StatusCode::OK);
    }

    let (status, body) = app.get("/api/player/first", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"]["currentTrack"]["id"], b.id.as_str());
    assert_eq!(body["status"]["queue"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_close_forgets_session() {
    let app = test_app().await;
    let root = app.admin("Root").await;
    let a = app.track(&root, "A").await;

    app.post("/api/player/tv/queue", None, json!({"trackIds": [a.id]}))
        .await;

    let (status, _) = app.delete("/api/player/tv", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = app.get("/api/player/tv", None).await;
    assert!(body["status"]["currentTrack"].is_null());
    assert!(body["status"]["queue"].as_array().unwrap().is_empty());

    // History survives the close
    let (_, recent) = app.get("/api/player/tv/recent", None).await;
    assert_eq!(ids(&recent), vec![a.id.to_string()]);
}
