//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - REST routes for tutors, patients and budgets
//! - Mapping of domain errors to JSON error responses
//! - Shared application state

pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::{Router, extract::DefaultBodyLimit};
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use sea_orm::DatabaseConnection;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use vetclinic_db::BudgetRepository;

/// Largest accepted request body.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// Clinic timezone. Decides which calendar day a new budget code uses.
    pub timezone: Tz,
    /// Retries after a budget code conflict.
    pub code_retry_attempts: u32,
}

impl AppState {
    /// Current date in the clinic timezone.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.timezone).date_naive()
    }

    pub(crate) fn budgets(&self) -> BudgetRepository {
        BudgetRepository::new((*self.db).clone())
            .with_code_retry_attempts(self.code_retry_attempts)
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
