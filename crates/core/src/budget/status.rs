//! Budget status lifecycle.
//!
//! ```text
//! draft ──► sent ──► accepted
//!   │         ├────► rejected
//!   └─────────┴────► expired
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::BudgetError;

/// Lifecycle status of a budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetStatus {
    /// Being prepared; items may still change.
    Draft,
    /// Delivered to the tutor, awaiting an answer.
    Sent,
    /// Tutor agreed to the quote.
    Accepted,
    /// Tutor declined the quote.
    Rejected,
    /// Validity window passed without an answer.
    Expired,
}

impl BudgetStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Draft,
        Self::Sent,
        Self::Accepted,
        Self::Rejected,
        Self::Expired,
    ];

    /// Returns the wire/database name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Sent => "sent",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Expired => "expired",
        }
    }

    /// Whether `next` is a legal successor of `self`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Draft, Self::Sent | Self::Expired)
                | (Self::Sent, Self::Accepted | Self::Rejected | Self::Expired)
        )
    }

    /// No transition leaves a terminal status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected | Self::Expired)
    }

    /// Validates a transition and returns the new status.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::InvalidTransition` if the lifecycle forbids it.
    pub fn transition(self, next: Self) -> Result<Self, BudgetError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(BudgetError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    /// Ensures line items may still be modified.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::NotEditable` for anything but a draft.
    pub fn ensure_editable(self) -> Result<(), BudgetError> {
        match self {
            Self::Draft => Ok(()),
            other => Err(BudgetError::NotEditable(other)),
        }
    }
}

impl fmt::Display for BudgetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BudgetStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown budget status: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(BudgetStatus::Draft, BudgetStatus::Sent)]
    #[case(BudgetStatus::Draft, BudgetStatus::Expired)]
    #[case(BudgetStatus::Sent, BudgetStatus::Accepted)]
    #[case(BudgetStatus::Sent, BudgetStatus::Rejected)]
    #[case(BudgetStatus::Sent, BudgetStatus::Expired)]
    fn test_allowed_transitions(#[case] from: BudgetStatus, #[case] to: BudgetStatus) {
        assert_eq!(from.transition(to).unwrap(), to);
    }

    #[rstest]
    #[case(BudgetStatus::Draft, BudgetStatus::Accepted)]
    #[case(BudgetStatus::Draft, BudgetStatus::Draft)]
    #[case(BudgetStatus::Sent, BudgetStatus::Draft)]
    #[case(BudgetStatus::Accepted, BudgetStatus::Rejected)]
    #[case(BudgetStatus::Rejected, BudgetStatus::Sent)]
    #[case(BudgetStatus::Expired, BudgetStatus::Sent)]
    fn test_forbidden_transitions(#[case] from: BudgetStatus, #[case] to: BudgetStatus) {
        assert!(matches!(
            from.transition(to),
            Err(BudgetError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_terminal_statuses_have_no_successor() {
        for from in BudgetStatus::ALL.into_iter().filter(|s| s.is_terminal()) {
            for to in BudgetStatus::ALL {
                assert!(!from.can_transition_to(to), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn test_only_draft_is_editable() {
        assert!(BudgetStatus::Draft.ensure_editable().is_ok());
        assert!(matches!(
            BudgetStatus::Sent.ensure_editable(),
            Err(BudgetError::NotEditable(BudgetStatus::Sent))
        ));
    }

    #[test]
    fn test_status_string_roundtrip() {
        for status in BudgetStatus::ALL {
            assert_eq!(status.as_str().parse::<BudgetStatus>().unwrap(), status);
        }
        assert_eq!("SENT".parse::<BudgetStatus>().unwrap(), BudgetStatus::Sent);
        assert!("approved".parse::<BudgetStatus>().is_err());
    }

    #[test]
    fn test_serde_uses_snake_case() {
        assert_eq!(
            serde_json::to_string(&BudgetStatus::Accepted).unwrap(),
            "\"accepted\""
        );
    }
}
