//! Budget (quote) calculation, code assignment and lifecycle.

pub mod calculator;
pub mod code;
pub mod error;
pub mod status;
pub mod types;


pub use calculator::{BudgetCalculator, MONEY_SCALE, round_money};
pub use code::BudgetCode;
pub use error::{BudgetError, FieldError};
pub use status::BudgetStatus;
pub use types::{BudgetItemInput, ComputedBudget, ComputedItem};
