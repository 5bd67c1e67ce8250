//! Budget repository for budget database operations.
//!
//! A budget header and its items are always written in one transaction. Budget
//! codes are proposed optimistically from the last code issued that day and
//! the unique index on `budgets.code` rejects duplicates. The losing writer
//! rolls back and retries with a fresh code, up to the configured number of
//! attempts.

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::{info, warn};
use uuid::Uuid;
use vetclinic_core::budget::{
    BudgetCalculator, BudgetCode, BudgetError, BudgetItemInput, BudgetStatus, ComputedBudget,
    ComputedItem,
};

use super::is_unique_violation;
use crate::entities::{
    budget_items, budgets, patients, sea_orm_active_enums::BudgetStatus as DbBudgetStatus,
    tutors,
};

/// Retries after a code conflict when none are configured.
pub const DEFAULT_CODE_RETRY_ATTEMPTS: u32 = 1;

/// Error types for budget persistence.
#[derive(Debug, thiserror::Error)]
pub enum BudgetRepoError {
    /// Budget not found (or soft-deleted).
    #[error("Budget not found: {0}")]
    NotFound(Uuid),

    /// Tutor not found.
    #[error("Tutor not found: {0}")]
    TutorNotFound(Uuid),

    /// Patient not found.
    #[error("Patient not found: {0}")]
    PatientNotFound(Uuid),

    /// The patient is owned by a different tutor.
    #[error("Patient {patient_id} does not belong to tutor {tutor_id}")]
    PatientTutorMismatch {
        /// Patient ID.
        patient_id: Uuid,
        /// Tutor ID given in the request.
        tutor_id: Uuid,
    },

    /// The proposed code kept colliding with concurrent inserts.
    #[error("Budget code {0} is already taken")]
    PersistenceConflict(String),

    /// Business rule from the core budget module.
    #[error(transparent)]
    Budget(#[from] BudgetError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a budget.
#[derive(Debug, Clone)]
pub struct CreateBudgetInput {
    /// Tutor the quote is addressed to.
    pub tutor_id: Uuid,
    /// Patient the quote is for, if any.
    pub patient_id: Option<Uuid>,
    /// Free-text notes.
    pub notes: Option<String>,
    /// Last day the quote is valid.
    pub valid_until: Option<NaiveDate>,
    /// Line items, in display order.
    pub items: Vec<BudgetItemInput>,
}

/// Filters for listing budgets.
#[derive(Debug, Clone, Copy, Default)]
pub struct BudgetFilter {
    /// Only budgets for this tutor.
    pub tutor_id: Option<Uuid>,
    /// Only budgets in this status.
    pub status: Option<BudgetStatus>,
}

/// Budget header with its items ordered by `sort_order`.
#[derive(Debug, Clone)]
pub struct BudgetWithItems {
    /// Budget record.
    pub budget: budgets::Model,
    /// Item records.
    pub items: Vec<budget_items::Model>,
}

enum Attempt {
    Created(BudgetWithItems),
    CodeTaken(String),
}

/// Budget repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct BudgetRepository {
    db: DatabaseConnection,
    code_retry_attempts: u32,
}

impl BudgetRepository {
    /// Creates a new budget repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            code_retry_attempts: DEFAULT_CODE_RETRY_ATTEMPTS,
        }
    }

    /// Sets how many times a conflicting code is regenerated.
    #[must_use]
    pub const fn with_code_retry_attempts(mut self, attempts: u32) -> Self {
        self.code_retry_attempts = attempts;
        self
    }

    // ========================================================================
    // Budget CRUD Operations
    // ========================================================================

    /// Creates a draft budget with its items, coded for `today`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Any item is invalid (nothing is written)
    /// - Tutor or patient does not exist, or the patient has another tutor
    /// - The code is still taken after all retries (`PersistenceConflict`)
    /// - Database operation fails (the transaction is rolled back)
    pub async fn create_budget(
        &self,
        input: CreateBudgetInput,
        today: NaiveDate,
    ) -> Result<BudgetWithItems, BudgetRepoError> {
        let computed = BudgetCalculator::compute(&input.items)?;
        self.ensure_owner(input.tutor_id, input.patient_id).await?;

        let mut retries = 0;
        loop {
            match self.insert_budget(&input, &computed, today).await? {
                Attempt::Created(created) => {
                    info!(
                        budget_id = %created.budget.id,
                        code = %created.budget.code,
                        items = created.items.len(),
                        total = %created.budget.total,
                        "Budget created"
                    );
                    return Ok(created);
                }
                Attempt::CodeTaken(code) if retries < self.code_retry_attempts => {
                    retries += 1;
                    warn!(%code, attempt = retries, "Budget code already taken, regenerating");
                }
                Attempt::CodeTaken(code) => {
                    warn!(%code, retries, "Budget code still taken, giving up");
                    return Err(BudgetRepoError::PersistenceConflict(code));
                }
            }
        }
    }

    async fn insert_budget(
        &self,
        input: &CreateBudgetInput,
        computed: &ComputedBudget,
        today: NaiveDate,
    ) -> Result<Attempt, BudgetRepoError> {
        let txn = self.db.begin().await?;

        let last = last_code_for_day(&txn, today).await?;
        let code = BudgetCode::next(today, last.as_deref())?.to_string();

        let now = Utc::now().into();
        let header = budgets::ActiveModel {
            id: Set(Uuid::now_v7()),
            code: Set(code.clone()),
            tutor_id: Set(input.tutor_id),
            patient_id: Set(input.patient_id),
            status: Set(DbBudgetStatus::Draft),
            notes: Set(input.notes.clone()),
            valid_until: Set(input.valid_until),
            subtotal: Set(computed.subtotal),
            discount_total: Set(computed.discount_total),
            tax_total: Set(computed.tax_total),
            total: Set(computed.total),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        };

        let budget = match header.insert(&txn).await {
            Ok(budget) => budget,
            Err(err) if is_unique_violation(&err) => {
                txn.rollback().await?;
                return Ok(Attempt::CodeTaken(code));
            }
            Err(err) => return Err(err.into()),
        };

        let items = insert_items(&txn, budget.id, &computed.items).await?;

        txn.commit().await?;
        Ok(Attempt::Created(BudgetWithItems { budget, items }))
    }

    /// Gets a budget with its items.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown or soft-deleted budgets.
    pub async fn get_budget(&self, budget_id: Uuid) -> Result<BudgetWithItems, BudgetRepoError> {
        let budget = find_active(&self.db, budget_id).await?;
        let items = budget_items::Entity::find()
            .filter(budget_items::Column::BudgetId.eq(budget_id))
            .order_by_asc(budget_items::Column::SortOrder)
            .all(&self.db)
            .await?;

        Ok(BudgetWithItems { budget, items })
    }

    /// Lists budgets, newest first. Soft-deleted budgets are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_budgets(
        &self,
        filter: BudgetFilter,
    ) -> Result<Vec<budgets::Model>, BudgetRepoError> {
        let mut query = budgets::Entity::find().filter(budgets::Column::DeletedAt.is_null());

        if let Some(tutor_id) = filter.tutor_id {
            query = query.filter(budgets::Column::TutorId.eq(tutor_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(budgets::Column::Status.eq(DbBudgetStatus::from(status)));
        }

        Ok(query
            .order_by_desc(budgets::Column::CreatedAt)
            .order_by_desc(budgets::Column::Id)
            .all(&self.db)
            .await?)
    }

    /// Replaces every item of a draft budget and recomputes its totals.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Any item is invalid
    /// - Budget is not found
    /// - Budget is no longer a draft
    /// - Database operation fails (the transaction is rolled back)
    pub async fn replace_items(
        &self,
        budget_id: Uuid,
        items: Vec<BudgetItemInput>,
    ) -> Result<BudgetWithItems, BudgetRepoError> {
        let computed = BudgetCalculator::compute(&items)?;

        let txn = self.db.begin().await?;

        let budget = find_active(&txn, budget_id).await?;
        BudgetStatus::from(budget.status).ensure_editable()?;

        budget_items::Entity::delete_many()
            .filter(budget_items::Column::BudgetId.eq(budget_id))
            .exec(&txn)
            .await?;
        let items = insert_items(&txn, budget_id, &computed.items).await?;

        let mut active: budgets::ActiveModel = budget.into();
        active.subtotal = Set(computed.subtotal);
        active.discount_total = Set(computed.discount_total);
        active.tax_total = Set(computed.tax_total);
        active.total = Set(computed.total);
        active.updated_at = Set(Utc::now().into());
        let budget = active.update(&txn).await?;

        txn.commit().await?;

        info!(
            budget_id = %budget_id,
            items = items.len(),
            total = %budget.total,
            "Budget items replaced"
        );
        Ok(BudgetWithItems { budget, items })
    }

    /// Moves a budget to another status.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or an `InvalidTransition` business error.
    pub async fn transition_status(
        &self,
        budget_id: Uuid,
        to: BudgetStatus,
    ) -> Result<budgets::Model, BudgetRepoError> {
        let budget = find_active(&self.db, budget_id).await?;
        let from = BudgetStatus::from(budget.status);
        let to = from.transition(to)?;

        let mut active: budgets::ActiveModel = budget.into();
        active.status = Set(to.into());
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&self.db).await?;

        info!(budget_id = %budget_id, %from, %to, "Budget status changed");
        Ok(updated)
    }

    /// Soft-deletes a budget. Its code stays reserved for the day.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the budget does not exist or is already deleted.
    pub async fn soft_delete(&self, budget_id: Uuid) -> Result<(), BudgetRepoError> {
        let budget = find_active(&self.db, budget_id).await?;

        let mut active: budgets::ActiveModel = budget.into();
        let now = Utc::now().into();
        active.deleted_at = Set(Some(now));
        active.updated_at = Set(now);
        active.update(&self.db).await?;

        info!(budget_id = %budget_id, "Budget deleted");
        Ok(())
    }

    async fn ensure_owner(
        &self,
        tutor_id: Uuid,
        patient_id: Option<Uuid>,
    ) -> Result<(), BudgetRepoError> {
        tutors::Entity::find_by_id(tutor_id)
            .one(&self.db)
            .await?
            .ok_or(BudgetRepoError::TutorNotFound(tutor_id))?;

        if let Some(patient_id) = patient_id {
            let patient = patients::Entity::find_by_id(patient_id)
                .one(&self.db)
                .await?
                .ok_or(BudgetRepoError::PatientNotFound(patient_id))?;

            if patient.tutor_id != tutor_id {
                return Err(BudgetRepoError::PatientTutorMismatch {
                    patient_id,
                    tutor_id,
                });
            }
        }

        Ok(())
    }
}

/// Most recently inserted code carrying `day`'s prefix, soft-deleted rows included.
async fn last_code_for_day<C: ConnectionTrait>(
    conn: &C,
    day: NaiveDate,
) -> Result<Option<String>, DbErr> {
    budgets::Entity::find()
        .select_only()
        .column(budgets::Column::Code)
        .filter(budgets::Column::Code.starts_with(BudgetCode::day_prefix(day)))
        .order_by_desc(budgets::Column::Id)
        .into_tuple::<String>()
        .one(conn)
        .await
}

async fn find_active<C: ConnectionTrait>(
    conn: &C,
    budget_id: Uuid,
) -> Result<budgets::Model, BudgetRepoError> {
    budgets::Entity::find_by_id(budget_id)
        .filter(budgets::Column::DeletedAt.is_null())
        .one(conn)
        .await?
        .ok_or(BudgetRepoError::NotFound(budget_id))
}

async fn insert_items<C: ConnectionTrait>(
    conn: &C,
    budget_id: Uuid,
    items: &[ComputedItem],
) -> Result<Vec<budget_items::Model>, DbErr> {
    let mut inserted = Vec::with_capacity(items.len());

    for item in items {
        let row = budget_items::ActiveModel {
            id: Set(Uuid::new_v4()),
            budget_id: Set(budget_id),
            name: Set(item.name.trim().to_string()),
            description: Set(item.description.clone()),
            qty: Set(item.qty),
            unit_price: Set(item.unit_price),
            discount: Set(item.discount),
            tax_rate: Set(item.tax_rate),
            line_subtotal: Set(item.line_subtotal),
            line_tax: Set(item.line_tax),
            line_total: Set(item.line_total),
            sort_order: Set(item.sort_order),
        };
        inserted.push(row.insert(conn).await?);
    }

    inserted.sort_by_key(|item| item.sort_order);
    Ok(inserted)
}
