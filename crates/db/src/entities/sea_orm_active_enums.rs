//! Enum columns shared by the entities.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use vetclinic_core::budget::BudgetStatus as CoreBudgetStatus;

/// Budget lifecycle status, stored as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum BudgetStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "sent")]
    Sent,
    #[sea_orm(string_value = "accepted")]
    Accepted,
    #[sea_orm(string_value = "rejected")]
    Rejected,
    #[sea_orm(string_value = "expired")]
    Expired,
}

impl From<CoreBudgetStatus> for BudgetStatus {
    fn from(status: CoreBudgetStatus) -> Self {
        match status {
            CoreBudgetStatus::Draft => Self::Draft,
            CoreBudgetStatus::Sent => Self::Sent,
            CoreBudgetStatus::Accepted => Self::Accepted,
            CoreBudgetStatus::Rejected => Self::Rejected,
            CoreBudgetStatus::Expired => Self::Expired,
        }
    }
}

impl From<BudgetStatus> for CoreBudgetStatus {
    fn from(status: BudgetStatus) -> Self {
        match status {
            BudgetStatus::Draft => Self::Draft,
            BudgetStatus::Sent => Self::Sent,
            BudgetStatus::Accepted => Self::Accepted,
            BudgetStatus::Rejected => Self::Rejected,
            BudgetStatus::Expired => Self::Expired,
        }
    }
}
