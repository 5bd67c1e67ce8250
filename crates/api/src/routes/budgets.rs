//! Budget routes.
//!
//! Amounts are serialized as strings. Money carries exactly two decimals;
//! quantities and tax rates are normalized.

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::{AppState, error::ApiError};
use vetclinic_core::budget::{
    BudgetCalculator, BudgetItemInput, BudgetStatus, ComputedBudget, ComputedItem, MONEY_SCALE,
    round_money,
};
use vetclinic_db::{
    entities::{budget_items, budgets},
    repositories::{BudgetFilter, BudgetWithItems, CreateBudgetInput},
};
use vetclinic_shared::AppError;

/// Creates the budget routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/budgets", get(list_budgets).post(create_budget))
        .route("/budgets/preview", post(preview_budget))
        .route("/budgets/{budget_id}", get(get_budget).delete(delete_budget))
        .route("/budgets/{budget_id}/items", put(replace_items))
        .route("/budgets/{budget_id}/status", post(change_status))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for previewing totals.
#[derive(Debug, Deserialize)]
pub struct PreviewBudgetRequest {
    /// Items to price.
    pub items: Vec<BudgetItemInput>,
}

/// Request body for creating a budget.
#[derive(Debug, Deserialize)]
pub struct CreateBudgetRequest {
    /// Tutor the quote is addressed to.
    pub tutor_id: Uuid,
    /// Patient the quote is for.
    pub patient_id: Option<Uuid>,
    /// Free-text notes.
    pub notes: Option<String>,
    /// Last valid day.
    pub valid_until: Option<NaiveDate>,
    /// Line items.
    pub items: Vec<BudgetItemInput>,
}

/// Request body for replacing a draft's items.
#[derive(Debug, Deserialize)]
pub struct ReplaceItemsRequest {
    /// New line items.
    pub items: Vec<BudgetItemInput>,
}

/// Request body for a status change.
#[derive(Debug, Deserialize)]
pub struct ChangeStatusRequest {
    /// Target status.
    pub status: BudgetStatus,
}

/// Query parameters for listing budgets.
#[derive(Debug, Deserialize)]
pub struct ListBudgetsQuery {
    /// Only budgets for this tutor.
    pub tutor_id: Option<Uuid>,
    /// Only budgets in this status.
    pub status: Option<String>,
}

/// Response for a line item.
#[derive(Debug, Serialize)]
pub struct BudgetItemResponse {
    /// Item ID, absent in previews.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    /// Name.
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Quantity.
    pub qty: String,
    /// Unit price.
    pub unit_price: String,
    /// Discount amount.
    pub discount: String,
    /// Tax rate percentage.
    pub tax_rate: String,
    /// Display position.
    pub sort_order: i32,
    /// Line subtotal.
    pub line_subtotal: String,
    /// Line tax.
    pub line_tax: String,
    /// Line total.
    pub line_total: String,
}

impl From<&ComputedItem> for BudgetItemResponse {
    fn from(i: &ComputedItem) -> Self {
        Self {
            id: None,
            name: i.name.clone(),
            description: i.description.clone(),
            qty: plain(i.qty),
            unit_price: money(i.unit_price),
            discount: money(i.discount),
            tax_rate: plain(i.tax_rate),
            sort_order: i.sort_order,
            line_subtotal: money(i.line_subtotal),
            line_tax: money(i.line_tax),
            line_total: money(i.line_total),
        }
    }
}

impl From<budget_items::Model> for BudgetItemResponse {
    fn from(i: budget_items::Model) -> Self {
        Self {
            id: Some(i.id),
            name: i.name,
            description: i.description,
            qty: plain(i.qty),
            unit_price: money(i.unit_price),
            discount: money(i.discount),
            tax_rate: plain(i.tax_rate),
            sort_order: i.sort_order,
            line_subtotal: money(i.line_subtotal),
            line_tax: money(i.line_tax),
            line_total: money(i.line_total),
        }
    }
}

/// Response for a budget header.
#[derive(Debug, Serialize)]
pub struct BudgetResponse {
    /// Budget ID.
    pub id: Uuid,
    /// Budget code (`B-YYYYMMDD-NNNNNN`).
    pub code: String,
    /// Tutor ID.
    pub tutor_id: Uuid,
    /// Patient ID.
    pub patient_id: Option<Uuid>,
    /// Lifecycle status.
    pub status: BudgetStatus,
    /// Notes.
    pub notes: Option<String>,
    /// Last valid day.
    pub valid_until: Option<NaiveDate>,
    /// Sum of line subtotals.
    pub subtotal: String,
    /// Sum of discounts.
    pub discount_total: String,
    /// Sum of line taxes.
    pub tax_total: String,
    /// Grand total.
    pub total: String,
    /// Created at timestamp.
    pub created_at: String,
    /// Updated at timestamp.
    pub updated_at: String,
    /// Items, present on single-budget responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<BudgetItemResponse>>,
}

impl From<budgets::Model> for BudgetResponse {
    fn from(b: budgets::Model) -> Self {
        Self {
            id: b.id,
            code: b.code,
            tutor_id: b.tutor_id,
            patient_id: b.patient_id,
            status: b.status.into(),
            notes: b.notes,
            valid_until: b.valid_until,
            subtotal: money(b.subtotal),
            discount_total: money(b.discount_total),
            tax_total: money(b.tax_total),
            total: money(b.total),
            created_at: b.created_at.to_rfc3339(),
            updated_at: b.updated_at.to_rfc3339(),
            items: None,
        }
    }
}

impl From<BudgetWithItems> for BudgetResponse {
    fn from(b: BudgetWithItems) -> Self {
        let items = b.items.into_iter().map(BudgetItemResponse::from).collect();
        Self {
            items: Some(items),
            ..Self::from(b.budget)
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Formats a money amount with exactly two decimals.
fn money(amount: Decimal) -> String {
    let mut amount = round_money(amount);
    amount.rescale(MONEY_SCALE);
    amount.to_string()
}

/// Formats a quantity or rate without trailing zeros.
fn plain(value: Decimal) -> String {
    value.normalize().to_string()
}

fn preview_response(computed: &ComputedBudget) -> serde_json::Value {
    let items: Vec<BudgetItemResponse> =
        computed.items.iter().map(BudgetItemResponse::from).collect();
    json!({
        "items": items,
        "subtotal": money(computed.subtotal),
        "discount_total": money(computed.discount_total),
        "tax_total": money(computed.tax_total),
        "total": money(computed.total),
    })
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/budgets/preview` - Price items without saving anything.
async fn preview_budget(
    payload: Result<Json<PreviewBudgetRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload?;
    let computed = BudgetCalculator::compute(&payload.items)?;
    Ok(Json(preview_response(&computed)))
}

/// POST `/budgets` - Create a draft budget with a fresh code.
async fn create_budget(
    State(state): State<AppState>,
    payload: Result<Json<CreateBudgetRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload?;

    let created = state
        .budgets()
        .create_budget(
            CreateBudgetInput {
                tutor_id: payload.tutor_id,
                patient_id: payload.patient_id,
                notes: payload.notes,
                valid_until: payload.valid_until,
                items: payload.items,
            },
            state.today(),
        )
        .await?;

    info!(
        budget_id = %created.budget.id,
        code = %created.budget.code,
        "Budget created via API"
    );
    Ok((StatusCode::CREATED, Json(BudgetResponse::from(created))))
}

/// GET `/budgets` - List budgets, optionally by tutor and status.
async fn list_budgets(
    State(state): State<AppState>,
    query: Result<Query<ListBudgetsQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;
    let status = query
        .status
        .as_deref()
        .map(str::parse::<BudgetStatus>)
        .transpose()
        .map_err(AppError::Validation)?;

    let budgets: Vec<BudgetResponse> = state
        .budgets()
        .list_budgets(BudgetFilter {
            tutor_id: query.tutor_id,
            status,
        })
        .await?
        .into_iter()
        .map(BudgetResponse::from)
        .collect();

    Ok(Json(json!({ "budgets": budgets })))
}

/// GET `/budgets/{budget_id}` - Get a budget with its items.
async fn get_budget(
    State(state): State<AppState>,
    Path(budget_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let budget = state.budgets().get_budget(budget_id).await?;
    Ok(Json(BudgetResponse::from(budget)))
}

/// PUT `/budgets/{budget_id}/items` - Replace the items of a draft.
async fn replace_items(
    State(state): State<AppState>,
    Path(budget_id): Path<Uuid>,
    payload: Result<Json<ReplaceItemsRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload?;
    let budget = state
        .budgets()
        .replace_items(budget_id, payload.items)
        .await?;
    Ok(Json(BudgetResponse::from(budget)))
}

/// POST `/budgets/{budget_id}/status` - Move a budget through its lifecycle.
async fn change_status(
    State(state): State<AppState>,
    Path(budget_id): Path<Uuid>,
    payload: Result<Json<ChangeStatusRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload?;
    let budget = state
        .budgets()
        .transition_status(budget_id, payload.status)
        .await?;
    Ok(Json(BudgetResponse::from(budget)))
}

/// DELETE `/budgets/{budget_id}` - Soft-delete a budget.
async fn delete_budget(
    State(state): State<AppState>,
    Path(budget_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.budgets().soft_delete(budget_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
