//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod budget;
pub mod patient;
pub mod tutor;

pub use budget::{
    BudgetFilter, BudgetRepoError, BudgetRepository, BudgetWithItems, CreateBudgetInput,
};
pub use patient::{CreatePatientInput, PatientError, PatientRepository};
pub use tutor::{CreateTutorInput, TutorError, TutorRepository};

use sea_orm::{DbErr, SqlErr};

/// Whether a database error is a unique-constraint violation.
pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
