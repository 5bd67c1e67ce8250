//! Tutor and patient routes.

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::{AppState, error::ApiError};
use vetclinic_db::{
    PatientRepository, TutorRepository,
    entities::{patients, tutors},
    repositories::{CreatePatientInput, CreateTutorInput},
};

/// Creates the tutor routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/tutors", post(create_tutor))
        .route("/tutors/{tutor_id}", get(get_tutor))
        .route(
            "/tutors/{tutor_id}/patients",
            post(create_patient).get(list_patients),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating a tutor.
#[derive(Debug, Deserialize)]
pub struct CreateTutorRequest {
    /// Full name.
    pub full_name: String,
    /// National identity document.
    pub document_id: Option<String>,
    /// Contact email.
    pub email: Option<String>,
    /// Contact phone.
    pub phone: Option<String>,
}

/// Request body for registering a patient.
#[derive(Debug, Deserialize)]
pub struct CreatePatientRequest {
    /// Patient name.
    pub name: String,
    /// Species.
    pub species: String,
    /// Breed.
    pub breed: Option<String>,
}

/// Response for a tutor.
#[derive(Debug, Serialize)]
pub struct TutorResponse {
    /// Tutor ID.
    pub id: Uuid,
    /// Full name.
    pub full_name: String,
    /// Identity document.
    pub document_id: Option<String>,
    /// Email.
    pub email: Option<String>,
    /// Phone.
    pub phone: Option<String>,
    /// Created at timestamp.
    pub created_at: String,
}

impl From<tutors::Model> for TutorResponse {
    fn from(t: tutors::Model) -> Self {
        Self {
            id: t.id,
            full_name: t.full_name,
            document_id: t.document_id,
            email: t.email,
            phone: t.phone,
            created_at: t.created_at.to_rfc3339(),
        }
    }
}

/// Response for a patient.
#[derive(Debug, Serialize)]
pub struct PatientResponse {
    /// Patient ID.
    pub id: Uuid,
    /// Owning tutor.
    pub tutor_id: Uuid,
    /// Name.
    pub name: String,
    /// Species.
    pub species: String,
    /// Breed.
    pub breed: Option<String>,
}

impl From<patients::Model> for PatientResponse {
    fn from(p: patients::Model) -> Self {
        Self {
            id: p.id,
            tutor_id: p.tutor_id,
            name: p.name,
            species: p.species,
            breed: p.breed,
        }
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/tutors` - Register a tutor.
async fn create_tutor(
    State(state): State<AppState>,
    payload: Result<Json<CreateTutorRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload?;
    let repo = TutorRepository::new((*state.db).clone());

    let tutor = repo
        .create(CreateTutorInput {
            full_name: payload.full_name,
            document_id: payload.document_id,
            email: payload.email,
            phone: payload.phone,
        })
        .await?;

    info!(tutor_id = %tutor.id, "Tutor created");
    Ok((StatusCode::CREATED, Json(TutorResponse::from(tutor))))
}

/// GET `/tutors/{tutor_id}` - Get a tutor.
async fn get_tutor(
    State(state): State<AppState>,
    Path(tutor_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = TutorRepository::new((*state.db).clone());
    let tutor = repo.get(tutor_id).await?;
    Ok(Json(TutorResponse::from(tutor)))
}

/// POST `/tutors/{tutor_id}/patients` - Register a patient for a tutor.
async fn create_patient(
    State(state): State<AppState>,
    Path(tutor_id): Path<Uuid>,
    payload: Result<Json<CreatePatientRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload?;
    let repo = PatientRepository::new((*state.db).clone());

    let patient = repo
        .create(
            tutor_id,
            CreatePatientInput {
                name: payload.name,
                species: payload.species,
                breed: payload.breed,
            },
        )
        .await?;

    info!(tutor_id = %tutor_id, patient_id = %patient.id, "Patient created");
    Ok((StatusCode::CREATED, Json(PatientResponse::from(patient))))
}

/// GET `/tutors/{tutor_id}/patients` - List a tutor's patients.
async fn list_patients(
    State(state): State<AppState>,
    Path(tutor_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = PatientRepository::new((*state.db).clone());
    let patients: Vec<PatientResponse> = repo
        .list_for_tutor(tutor_id)
        .await?
        .into_iter()
        .map(PatientResponse::from)
        .collect();

    Ok(Json(json!({ "patients": patients })))
}
