//! Tutor repository for database operations.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, Set};
use uuid::Uuid;

use super::is_unique_violation;
use crate::entities::tutors;

/// Error types for tutor operations.
#[derive(Debug, thiserror::Error)]
pub enum TutorError {
    /// Tutor not found.
    #[error("Tutor not found: {0}")]
    NotFound(Uuid),

    /// Full name is blank.
    #[error("Tutor name is required")]
    MissingName,

    /// Another tutor already uses this identity document.
    #[error("A tutor with document {0} already exists")]
    DuplicateDocument(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a tutor.
#[derive(Debug, Clone, Default)]
pub struct CreateTutorInput {
    /// Full name.
    pub full_name: String,
    /// National identity document, unique when present.
    pub document_id: Option<String>,
    /// Contact email.
    pub email: Option<String>,
    /// Contact phone.
    pub phone: Option<String>,
}

/// Tutor repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct TutorRepository {
    db: DatabaseConnection,
}

impl TutorRepository {
    /// Creates a new tutor repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a tutor.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank, the document is already
    /// registered, or the insert fails.
    pub async fn create(&self, input: CreateTutorInput) -> Result<tutors::Model, TutorError> {
        let full_name = input.full_name.trim().to_string();
        if full_name.is_empty() {
            return Err(TutorError::MissingName);
        }

        let document_id = input
            .document_id
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        let now = Utc::now().into();
        let tutor = tutors::ActiveModel {
            id: Set(Uuid::new_v4()),
            full_name: Set(full_name),
            document_id: Set(document_id.clone()),
            email: Set(input.email),
            phone: Set(input.phone),
            created_at: Set(now),
            updated_at: Set(now),
        };

        match tutor.insert(&self.db).await {
            Ok(model) => Ok(model),
            Err(err) if is_unique_violation(&err) => Err(TutorError::DuplicateDocument(
                document_id.unwrap_or_default(),
            )),
            Err(err) => Err(err.into()),
        }
    }

    /// Finds a tutor by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<tutors::Model>, DbErr> {
        tutors::Entity::find_by_id(id).one(&self.db).await
    }

    /// Gets a tutor by ID.
    ///
    /// # Errors
    ///
    /// Returns `TutorError::NotFound` if there is no such tutor.
    pub async fn get(&self, id: Uuid) -> Result<tutors::Model, TutorError> {
        self.find_by_id(id).await?.ok_or(TutorError::NotFound(id))
    }
}
