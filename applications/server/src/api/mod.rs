/// API route modules
pub mod admin;
pub mod health;
pub mod library;
pub mod multipart;
pub mod password_reset;
pub mod player;
pub mod playlists;
pub mod songs;
pub mod user;

use crate::{middleware, services::file_storage::UPLOADS_PREFIX, state::AppState};
use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, TraceLayer},
};

/// Multipart overhead allowed on top of the two file limits
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Build the full application router
pub fn create_router(app_state: AppState) -> Router {
    // Public routes (no caller required)
    let public_routes = Router::new()
        .route("/health", get(health::health))
        .route("/auth/register", post(user::register))
        .route("/auth/login", post(user::login))
        .route("/songs", get(songs::list_songs))
        .route("/songs/search", get(songs::search_songs))
        .route("/songs/:id", get(songs::get_song))
        .route("/playlists", get(playlists::list_public))
        .route("/playlists/featured", get(playlists::list_featured))
        .route("/playlists/:id", get(playlists::get_playlist))
        .route("/password-reset/request-otp", post(password_reset::request_otp))
        .route("/password-reset/verify-otp", post(password_reset::verify_otp))
        .route(
            "/password-reset/reset-password",
            post(password_reset::reset_password),
        )
        // Player sessions are keyed by client id, not by user
        .route(
            "/player/:client_id",
            get(player::status).delete(player::close),
        )
        .route("/player/:client_id/queue", post(player::load_queue))
        .route("/player/:client_id/play", post(player::play))
        .route("/player/:client_id/resume", post(player::resume))
        .route("/player/:client_id/pause", post(player::pause))
        .route("/player/:client_id/next", post(player::next))
        .route("/player/:client_id/previous", post(player::previous))
        .route("/player/:client_id/shuffle", post(player::toggle_shuffle))
        .route("/player/:client_id/repeat", post(player::cycle_repeat))
        .route("/player/:client_id/seek", post(player::seek))
        .route("/player/:client_id/volume", post(player::set_volume))
        .route("/player/:client_id/events", post(player::transport_event))
        .route("/player/:client_id/recent", get(player::recent));

    // Routes that need an identified caller
    let user_routes = Router::new()
        .route("/auth/me", get(user::me))
        .route("/user/me", get(user::me))
        .route(
            "/user/playlists",
            get(playlists::list_own).post(playlists::create_playlist),
        )
        .route(
            "/user/playlists/:id",
            put(playlists::update_playlist).delete(playlists::delete_playlist),
        )
        .route("/user/playlists/:id/songs", post(playlists::add_song))
        .route(
            "/user/playlists/:id/songs/:song_id",
            delete(playlists::remove_song),
        )
        .route(
            "/user/library",
            get(library::get_library).post(library::add_song),
        )
        .route("/user/library/:song_id", delete(library::remove_song));

    let admin_routes = Router::new()
        .route("/admin/dashboard", get(admin::dashboard))
        .route(
            "/admin/songs",
            get(admin::list_songs).post(admin::create_song),
        )
        .route(
            "/admin/songs/:id",
            get(admin::get_song)
                .put(admin::update_song)
                .delete(admin::delete_song),
        )
        .route(
            "/admin/playlists",
            get(admin::list_playlists).post(admin::create_playlist),
        )
        .route(
            "/admin/playlists/:id",
            get(admin::get_playlist)
                .put(admin::update_playlist)
                .delete(admin::delete_playlist),
        )
        .route("/admin/users", get(admin::list_users))
        .route("/admin/users/:id", delete(admin::delete_user))
        .route("/admin/users/:id/role", put(admin::update_role))
        .route("/admin/admins", get(admin::list_admins))
        .route_layer(axum_middleware::from_fn(middleware::admin_middleware));

    let protected_routes = user_routes
        .merge(admin_routes)
        .route_layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            middleware::auth_middleware,
        ));

    let uploads = &app_state.config.uploads;
    let body_limit = uploads.max_image_bytes + uploads.max_audio_bytes + FORM_OVERHEAD_BYTES;
    let upload_dir = ServeDir::new(app_state.file_storage.base_path());

    Router::new()
        .nest("/api", public_routes.merge(protected_routes))
        .nest_service(UPLOADS_PREFIX, upload_dir)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}
