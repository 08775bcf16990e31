pub mod extract;
pub mod middleware;
pub mod routes;

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use http::header::{HeaderValue, CACHE_CONTROL};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::state::AppState;
use middleware::auth as auth_middleware;
use routes::{auth, avatar, directory, health, landing, map, profile};

pub fn build_router(state: AppState) -> Router {
    // Writes need a signed-in user
    let protected_routes = Router::new()
        .route("/api/profile", post(profile::update_profile_handler))
        .route("/api/profile/about", post(profile::update_about_handler))
        .route("/api/profile/avatar", put(profile::upload_avatar_handler))
        .layer(axum_middleware::from_fn(auth_middleware::require_auth));

    Router::new()
        .route("/api/health", get(health::health_handler))
        .route("/api/landing", get(landing::landing_handler))
        .route("/api/map", get(map::map_handler))
        .route("/api/directory", get(directory::directory_handler))
        .route("/api/profile/all", get(profile::all_profiles_handler))
        .route(
            "/api/profile/by-id",
            get(profile::by_id_handler).post(profile::by_ids_post_handler),
        )
        .route(
            "/api/profile/by-user",
            get(profile::by_user_handler).post(profile::by_users_post_handler),
        )
        .route(
            "/api/profile/by-account",
            get(profile::by_account_handler).post(profile::by_accounts_post_handler),
        )
        .route("/api/profile/:id", get(profile::public_profile_handler))
        .route("/api/avatar", get(avatar::avatar_redirect_handler))
        .route(
            "/api/auth/signout",
            get(auth::signout_handler).post(auth::signout_handler),
        )
        .merge(protected_routes)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::resolve_viewer,
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(CatchPanicLayer::new())
        .with_state(state)
}
