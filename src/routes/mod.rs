use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, create_security_headers_layer, Config};
use crate::handlers::{admin, events, health_check, profile};
use crate::state::AppState;

pub fn create_routes(state: AppState, config: &Config) -> Router {
    let event_routes = Router::new()
        .route("/", get(events::list_events).post(events::create_event))
        .route("/mine", get(events::my_events))
        .route("/:id", get(events::get_event).put(events::update_event))
        .route("/:id/register", post(events::register));

    let admin_routes = Router::new()
        .route("/dashboard", get(admin::dashboard))
        .route("/events/pending", get(admin::pending))
        .route("/events/rejected", get(admin::rejected))
        .route("/events/:id/approve", post(admin::approve))
        .route("/events/:id/approve-rejected", post(admin::approve_rejected))
        .route("/events/:id/reject", post(admin::reject))
        .route("/events/:id/restore", post(admin::restore));

    Router::new()
        .route("/health", get(health_check))
        .nest("/events", event_routes)
        .nest("/admin", admin_routes)
        .route(
            "/profile",
            get(profile::get_profile).put(profile::update_profile),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(create_security_headers_layer(config.is_production))
        .layer(create_cors_layer(&config.cors_allowed_origins))
}
