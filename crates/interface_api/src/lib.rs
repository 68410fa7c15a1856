//! HTTP API Layer
//!
//! This crate provides the REST API for claim calculation using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: Request handlers for claims and health
//! - **Middleware**: Request audit logging
//! - **DTOs**: Request/Response data transfer objects
//! - **Error Handling**: Consistent error responses
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let app = create_router(AppState::new(ledger));
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod handlers;
pub mod dto;

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use domain_claims::ClaimLedger;

use crate::handlers::{claims, health};
use crate::middleware::audit_middleware;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<ClaimLedger>,
}

impl AppState {
    pub fn new(ledger: ClaimLedger) -> Self {
        Self {
            ledger: Arc::new(ledger),
        }
    }
}

/// Creates the main API router
///
/// # Arguments
///
/// * `state` - The ledger shared by the handlers
///
/// # Returns
///
/// Configured Axum router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    // Public routes
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    // Claims routes
    let claims_routes = Router::new()
        .route("/", post(claims::submit_claim).get(claims::list_claims))
        .route("/statistics", get(claims::statistics))
        .route("/:id", get(claims::get_claim).delete(claims::delete_claim))
        .route("/:id/calculate", post(claims::calculate_claim))
        .route("/:id/summary", get(claims::claim_summary));

    let api_routes = Router::new()
        .nest("/claims", claims_routes)
        .layer(axum_middleware::from_fn(audit_middleware));

    // Combine all routes
    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
