use axum::{
    extract::{DefaultBodyLimit, Request, State},
    routing::{get, post},
    Json, Router,
};
use sentry_tower::{NewSentryLayer, SentryHttpLayer};
use serde_json::{json, Value};
use tower_cookies::CookieManagerLayer;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::{
    models::{
        Diagram, Experience, NavLink, Project, Resource, Resume, Service, Stat, Technology,
        Testimonial, Video,
    },
    state::AppState,
};

pub mod admin;
pub mod api;
pub mod auth;
pub mod chat;
pub mod site;
pub mod upload;

/// Build the application router with all routes
pub fn routes(app_state: AppState) -> Router {
    let max_body = app_state.config.max_upload_bytes;

    Router::new()
        // Public pages
        .route("/", get(site::home))
        .route("/resume/:type", get(site::resume))
        .route("/healthz", get(healthz))
        .route(
            "/static/*path",
            get(crate::static_assets::serve_static_file),
        )
        .route("/uploads/*key", get(upload::serve_upload))
        // JSON API
        .route("/api/upload", post(upload::upload))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/setup-admin", get(auth::setup_admin))
        .route("/api/chat", post(chat::chat))
        .merge(admin::routes())
        .merge(resource::<Project>())
        .merge(resource::<Experience>())
        .merge(resource::<Technology>())
        .merge(resource::<Testimonial>())
        .merge(resource::<Service>())
        .merge(resource::<Video>())
        .merge(resource::<Diagram>())
        .merge(resource::<Resume>())
        .merge(resource::<Stat>())
        .merge(resource::<NavLink>())
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body))
        .layer(CookieManagerLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(SentryHttpLayer::with_transaction())
        .layer(NewSentryLayer::<Request>::new_from_top())
        .with_state(app_state)
}

/// JSON API and admin pages for one resource type
fn resource<R: Resource>() -> Router<AppState> {
    api::resource_routes::<R>().merge(admin::resource_routes::<R>())
}

async fn healthz(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "status": "ok", "version": state.version() }))
}
