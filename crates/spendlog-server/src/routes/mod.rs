mod auth;
mod expenses;
mod profile;

use std::path::Path;
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::services::{ServeDir, ServeFile};

use crate::auth::middleware::require_auth;
use crate::config::Config;
use crate::db::DbPool;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
}

async fn health() -> &'static str {
    "ok"
}

pub fn create_router(state: AppState) -> Router {
    // Rate limit: login/register — 10 requests per 60 seconds per IP
    let auth_governor = GovernorConfigBuilder::default()
        .per_second(6)
        .burst_size(10)
        .finish()
        .unwrap();

    let auth_routes = Router::new()
        .route("/api/register", post(auth::register))
        .route("/api/login", post(auth::login))
        .layer(GovernorLayer::new(Arc::new(auth_governor)));

    let protected = Router::new()
        .route("/api/logout", post(auth::logout))
        .route("/api/me", get(auth::me))
        .route("/api/profile", post(profile::update))
        .route("/api/get-profile", get(profile::get_profile))
        .route("/api/update-account", post(profile::update_account))
        .route("/api/expenses", get(expenses::list).post(expenses::create))
        .route(
            "/api/expenses/{id}",
            put(expenses::update).delete(expenses::delete),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    // Static front end; `/` is the login page, photos live under /uploads
    let public_dir = Path::new(&state.config.public_dir);
    let login_page = ServeFile::new(public_dir.join("login.html"));
    let static_site = ServeDir::new(public_dir);
    let uploads = ServeDir::new(&state.config.uploads_dir);

    Router::new()
        .route("/health", get(health))
        .merge(auth_routes)
        .merge(protected)
        .route_service("/", login_page)
        .nest_service("/uploads", uploads)
        .fallback_service(static_site)
        .with_state(state)
}
