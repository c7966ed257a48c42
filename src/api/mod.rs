use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use time;

use crate::config::Config;
use crate::state::SharedState;

mod artifacts;
pub mod auth;
mod error;
mod messages;
mod observability;
pub mod reset;
mod scores;
pub mod session;
mod tools;
mod types;
mod unfurl;
mod users;
mod validation;

pub use error::ApiError;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;
use tokio::sync::RwLock;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }
}

pub async fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    Ok(Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    }))
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    create_app_state(shared, prometheus_handle).await
}

pub async fn router(state: Arc<AppState>) -> Router {
    let (cors_origins, secure_cookies, httponly_cookies, session_minutes) = {
        let config = state.config().read().await;
        (
            config.server.cors_allowed_origins.clone(),
            config.server.secure_cookies,
            config.server.httponly_cookies,
            config.server.session_minutes,
        )
    };

    let session_store = MemoryStore::default();
    // HttpOnly tracks config and defaults to OFF: the cookie stays readable
    // from page script.
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(secure_cookies)
        .with_http_only(httponly_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            session_minutes,
        )));

    let protected_routes = create_protected_router(state.clone());

    let api_router = Router::new()
        .merge(protected_routes)
        .route("/unfurl", post(unfurl::unfurl));

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .route("/", get(auth::home))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", get(auth::logout))
        .route("/reset", get(reset::reset_init_page).post(reset::reset_init))
        .route(
            "/reset/question",
            get(reset::reset_question_page).post(reset::reset_question),
        )
        .route(
            "/reset/password",
            get(reset::reset_password_page).post(reset::reset_password),
        )
        .nest("/api", api_router)
        .layer(session_layer)
        .with_state(state)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let admin_routes = Router::new()
        .route("/admin/tools", post(tools::add_tool))
        .route("/admin/tools/{id}", delete(tools::remove_tool))
        .route("/admin/users", get(users::list_users))
        .route_layer(middleware::from_fn(auth::require_admin));

    Router::new()
        .route("/users/me", get(users::me))
        .route("/notes", get(users::get_notes).put(users::update_notes))
        .route("/profile", put(users::update_profile))
        .route("/messages", get(messages::list).post(messages::create))
        .route("/messages/{id}", delete(messages::delete))
        .route("/artifacts", get(artifacts::list).post(artifacts::upload))
        .route("/artifacts/xml", post(artifacts::upload_xml))
        .route("/artifacts/view/{*filename}", get(artifacts::view))
        .route("/artifacts/{filename}", delete(artifacts::delete))
        .route("/tools", get(tools::list_tools))
        .route("/tools/execute", post(tools::execute))
        .route("/tools/{id}", get(tools::get_tool))
        .route("/games/snake/scores", post(scores::submit_score))
        .route("/games/snake/{filename}", get(scores::snake_file))
        .route("/metrics", get(observability::get_metrics))
        .merge(admin_routes)
        // Account enable/disable/promote/demote sits next to the other
        // /admin routes but is registered here, behind the login guard only.
        .route("/admin/users/{action}/{id}", get(users::user_action))
        .route_layer(middleware::from_fn_with_state(
            state,
            auth::require_authenticated,
        ))
}
