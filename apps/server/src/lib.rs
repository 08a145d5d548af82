//! # barbearia-server
//!
//! JSON HTTP API for the barbershop: catalog, scheduling, clothing inventory,
//! point of sale and dashboard.
//!
//! ## Module Organization
//!
//! - [`config`] - Layered configuration (`barbearia.toml`, `BARBEARIA_*`)
//! - [`error`] - `ApiError` and its HTTP mapping
//! - [`notifier`] - WhatsApp notifier collaborator
//! - [`routes`] - Handlers, one module per resource
//! - [`state`] - Shared handler state

pub mod config;
pub mod error;
pub mod notifier;
pub mod routes;
pub mod state;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Builds the application with state and middleware attached.
pub fn create_router(state: AppState, cors_permissive: bool) -> Router {
    let router = routes::api_router()
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if cors_permissive {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}
