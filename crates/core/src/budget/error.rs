//! Budget error types.

use serde::Serialize;
use thiserror::Error;

use super::status::BudgetStatus;

/// A single field-level problem found while validating budget items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Zero-based position of the offending item in the input.
    pub index: usize,
    /// Field name as it appears in requests (e.g., `qty`).
    pub field: &'static str,
    /// Human-readable message.
    pub message: String,
}

impl FieldError {
    pub(crate) fn new(index: usize, field: &'static str, message: impl Into<String>) -> Self {
        Self {
            index,
            field,
            message: message.into(),
        }
    }
}

/// Budget-related errors.
#[derive(Debug, Error)]
pub enum BudgetError {
    /// One or more line items are malformed.
    #[error("Invalid budget items: {}", summarize(.0))]
    Validation(Vec<FieldError>),

    /// A budget needs at least one line item.
    #[error("Budget must contain at least one item")]
    EmptyBudget,

    /// A string does not have the `B-YYYYMMDD-NNNNNN` shape.
    #[error("Invalid budget code: {0}")]
    InvalidCode(String),

    /// The daily sequence ran past six digits.
    #[error("Budget code sequence exhausted for prefix {0}")]
    SequenceExhausted(String),

    /// Status change not allowed by the lifecycle.
    #[error("Cannot move budget from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: BudgetStatus,
        /// Requested status.
        to: BudgetStatus,
    },

    /// Items can only change while the budget is a draft.
    #[error("Budget is {0} and its items can no longer be modified")]
    NotEditable(BudgetStatus),

    /// A document total does not fit a money amount.
    #[error("Budget {0} exceeds the maximum amount")]
    TotalOutOfRange(&'static str),
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("item {} {}: {}", e.index, e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display_lists_fields() {
        let err = BudgetError::Validation(vec![
            FieldError::new(0, "qty", "must be greater than zero"),
            FieldError::new(2, "name", "is required"),
        ]);

        assert_eq!(
            err.to_string(),
            "Invalid budget items: item 0 qty: must be greater than zero; item 2 name: is required"
        );
    }

    #[test]
    fn test_transition_display() {
        let err = BudgetError::InvalidTransition {
            from: BudgetStatus::Accepted,
            to: BudgetStatus::Draft,
        };
        assert_eq!(err.to_string(), "Cannot move budget from accepted to draft");
    }
}
