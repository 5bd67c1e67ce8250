//! Patient repository for database operations.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities::{patients, tutors};

/// Error types for patient operations.
#[derive(Debug, thiserror::Error)]
pub enum PatientError {
    /// Patient not found.
    #[error("Patient not found: {0}")]
    NotFound(Uuid),

    /// Owning tutor not found.
    #[error("Tutor not found: {0}")]
    TutorNotFound(Uuid),

    /// Name or species is blank.
    #[error("Patient {0} is required")]
    MissingField(&'static str),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a patient.
#[derive(Debug, Clone, Default)]
pub struct CreatePatientInput {
    /// Patient name.
    pub name: String,
    /// Species (e.g., "canine", "feline").
    pub species: String,
    /// Optional breed.
    pub breed: Option<String>,
}

/// Patient repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct PatientRepository {
    db: DatabaseConnection,
}

impl PatientRepository {
    /// Creates a new patient repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Registers a patient under a tutor.
    ///
    /// # Errors
    ///
    /// Returns an error if the tutor does not exist, a required field is
    /// blank, or the insert fails.
    pub async fn create(
        &self,
        tutor_id: Uuid,
        input: CreatePatientInput,
    ) -> Result<patients::Model, PatientError> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(PatientError::MissingField("name"));
        }
        let species = input.species.trim().to_lowercase();
        if species.is_empty() {
            return Err(PatientError::MissingField("species"));
        }

        tutors::Entity::find_by_id(tutor_id)
            .one(&self.db)
            .await?
            .ok_or(PatientError::TutorNotFound(tutor_id))?;

        let now = Utc::now().into();
        let patient = patients::ActiveModel {
            id: Set(Uuid::new_v4()),
            tutor_id: Set(tutor_id),
            name: Set(name),
            species: Set(species),
            breed: Set(input.breed),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(patient.insert(&self.db).await?)
    }

    /// Finds a patient by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<patients::Model>, DbErr> {
        patients::Entity::find_by_id(id).one(&self.db).await
    }

    /// Lists a tutor's patients by name.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::TutorNotFound` for an unknown tutor.
    pub async fn list_for_tutor(
        &self,
        tutor_id: Uuid,
    ) -> Result<Vec<patients::Model>, PatientError> {
        tutors::Entity::find_by_id(tutor_id)
            .one(&self.db)
            .await?
            .ok_or(PatientError::TutorNotFound(tutor_id))?;

        Ok(patients::Entity::find()
            .filter(patients::Column::TutorId.eq(tutor_id))
            .order_by_asc(patients::Column::Name)
            .all(&self.db)
            .await?)
    }
}
