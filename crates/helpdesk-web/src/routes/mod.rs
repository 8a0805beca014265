//! Route handlers for the helpdesk HTTP interface.

pub mod comments;
pub mod health;
pub mod registries;
pub mod settings;
pub mod tickets;

use axum::routing::{get, post, put};
use axum::Router;
use helpdesk_db::RegistryKind;

use crate::state::AppState;

/// Build the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(health::health))
        // Tickets
        .route("/api/tickets", get(tickets::list).post(tickets::create))
        .route(
            "/api/tickets/:id",
            get(tickets::show).put(tickets::update).delete(tickets::delete),
        )
        .route("/api/tickets/:id/close", post(tickets::close))
        .route("/api/tickets/:id/reopen", post(tickets::reopen))
        // Comments
        .route("/api/tickets/:id/comments", post(comments::create))
        .route(
            "/api/comments/:id",
            put(comments::update).delete(comments::delete),
        )
        // Reference data
        .nest("/api/statuses", registries::router(RegistryKind::Status))
        .nest("/api/priorities", registries::router(RegistryKind::Priority))
        .nest("/api/categories", registries::router(RegistryKind::Category))
        // Settings
        .route(
            "/api/settings/:slug",
            get(settings::show).put(settings::update),
        )
}
