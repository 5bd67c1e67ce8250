//! API route definitions.

use axum::Router;

use crate::AppState;

pub mod budgets;
pub mod health;
pub mod tutors;

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(tutors::routes())
        .merge(budgets::routes())
}
