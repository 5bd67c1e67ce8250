//! JSON error responses.
//!
//! Every domain error is first classified as an [`AppError`], which decides
//! the status code and machine-readable code. Bodies look like:
//!
//! ```json
//! { "error": "VALIDATION_ERROR", "message": "...", "details": [...] }
//! ```

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use tracing::error;
use vetclinic_core::budget::BudgetError;
use vetclinic_db::repositories::{BudgetRepoError, PatientError, TutorError};
use vetclinic_shared::AppError;

/// Error returned by route handlers.
#[derive(Debug)]
pub struct ApiError {
    error: AppError,
    details: Option<Value>,
}

impl ApiError {
    /// Wraps an application error without details.
    #[must_use]
    pub const fn new(error: AppError) -> Self {
        Self {
            error,
            details: None,
        }
    }

    /// Attaches structured details to the response body.
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// The underlying application error.
    #[must_use]
    pub const fn app_error(&self) -> &AppError {
        &self.error
    }
}

impl From<AppError> for ApiError {
    fn from(error: AppError) -> Self {
        Self::new(error)
    }
}

impl From<BudgetError> for ApiError {
    fn from(e: BudgetError) -> Self {
        match e {
            BudgetError::Validation(ref fields) => {
                let details = json!(fields);
                Self::new(AppError::Validation(e.to_string())).with_details(details)
            }
            BudgetError::EmptyBudget
            | BudgetError::InvalidCode(_)
            | BudgetError::TotalOutOfRange(_) => Self::new(AppError::Validation(e.to_string())),
            BudgetError::SequenceExhausted(_)
            | BudgetError::InvalidTransition { .. }
            | BudgetError::NotEditable(_) => Self::new(AppError::BusinessRule(e.to_string())),
        }
    }
}

impl From<BudgetRepoError> for ApiError {
    fn from(e: BudgetRepoError) -> Self {
        match e {
            BudgetRepoError::Budget(inner) => inner.into(),
            BudgetRepoError::NotFound(_)
            | BudgetRepoError::TutorNotFound(_)
            | BudgetRepoError::PatientNotFound(_) => Self::new(AppError::NotFound(e.to_string())),
            BudgetRepoError::PatientTutorMismatch { .. } => {
                Self::new(AppError::BusinessRule(e.to_string()))
            }
            BudgetRepoError::PersistenceConflict(_) => Self::new(AppError::Conflict(e.to_string())),
            BudgetRepoError::Database(_) => Self::new(AppError::Database(e.to_string())),
        }
    }
}

impl From<TutorError> for ApiError {
    fn from(e: TutorError) -> Self {
        let error = match e {
            TutorError::NotFound(_) => AppError::NotFound(e.to_string()),
            TutorError::MissingName => AppError::Validation(e.to_string()),
            TutorError::DuplicateDocument(_) => AppError::Conflict(e.to_string()),
            TutorError::Database(_) => AppError::Database(e.to_string()),
        };
        Self::new(error)
    }
}

impl From<PatientError> for ApiError {
    fn from(e: PatientError) -> Self {
        let error = match e {
            PatientError::NotFound(_) | PatientError::TutorNotFound(_) => {
                AppError::NotFound(e.to_string())
            }
            PatientError::MissingField(_) => AppError::Validation(e.to_string()),
            PatientError::Database(_) => AppError::Database(e.to_string()),
        };
        Self::new(error)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(AppError::Validation(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::new(AppError::Validation(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.error.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let message = if self.error.is_client_error() {
            match &self.error {
                AppError::NotFound(m)
                | AppError::Validation(m)
                | AppError::BusinessRule(m)
                | AppError::Conflict(m)
                | AppError::Database(m)
                | AppError::Internal(m) => m.clone(),
            }
        } else {
            error!(error = %self.error, "Request failed");
            "An error occurred".to_string()
        };

        let mut body = json!({
            "error": self.error.error_code(),
            "message": message,
        });
        if let Some(details) = self.details {
            body["details"] = details;
        }

        (status, Json(body)).into_response()
    }
}
