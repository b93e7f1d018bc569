//! DocSign API server
//!
//! REST backend for the document signing workflow:
//! - Documents with ordered signers, self-signing and expiry
//! - Signature submission with audit trail merge and completion detection
//! - Signed PDF and Certificate of Completion export
//! - Progress, completion and forwarding mail

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod mailer;
pub mod models;
pub mod state;
pub mod storage;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use auth::AuthUser;
use state::AppState;

/// Build the router over shared state
pub fn app(state: Arc<AppState>) -> Router {
    // CORS configuration for web clients
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Exported artifacts, behind the same bearer auth as the API
    let exports = Router::new()
        .nest_service("/exports", ServeDir::new(state.exports.dir()))
        .layer(middleware::from_extractor_with_state::<AuthUser, _>(
            state.clone(),
        ));

    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // Address book
        .route(
            "/contacts",
            post(handlers::contacts::create_contact).get(handlers::contacts::list_contacts),
        )
        // Document lifecycle
        .route("/documents/after-save", post(handlers::documents::after_save))
        .route("/documents/save-pdf", post(handlers::documents::save_pdf))
        .route(
            "/documents/forward-doc",
            post(handlers::documents::forward_document),
        )
        .route(
            "/documents/decline-document",
            put(handlers::documents::decline_document),
        )
        .route(
            "/documents/view-document",
            put(handlers::documents::view_document),
        )
        .route("/documents/get-report", post(handlers::documents::get_report))
        .route(
            "/documents/:id",
            get(handlers::documents::get_document).delete(handlers::documents::delete_document),
        )
        .merge(exports)
        // Add middleware
        .layer(middleware::map_response_with_state(
            state.clone(),
            error::expose_error_details,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
