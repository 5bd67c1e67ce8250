//! Human-readable budget codes of the form `B-YYYYMMDD-NNNNNN`.
//!
//! The sequence restarts every calendar day. The generator only proposes the
//! next value from the last code issued that day; uniqueness is enforced by the
//! unique index on `budgets.code`.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::error::BudgetError;

/// Largest sequence that fits the six-digit suffix.
pub const MAX_SEQUENCE: u32 = 999_999;

const DATE_FORMAT: &str = "%Y%m%d";

/// A budget code: issue date plus daily sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BudgetCode {
    date: NaiveDate,
    sequence: u32,
}

impl BudgetCode {
    /// Creates a code for `date` with the given sequence.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::InvalidCode` for sequence 0 and
    /// `BudgetError::SequenceExhausted` above [`MAX_SEQUENCE`].
    pub fn new(date: NaiveDate, sequence: u32) -> Result<Self, BudgetError> {
        if sequence == 0 {
            return Err(BudgetError::InvalidCode(format!(
                "{}000000",
                Self::day_prefix(date)
            )));
        }
        if sequence > MAX_SEQUENCE {
            return Err(BudgetError::SequenceExhausted(Self::day_prefix(date)));
        }
        Ok(Self { date, sequence })
    }

    /// Prefix shared by every code issued on `date`, e.g. `B-20261017-`.
    #[must_use]
    pub fn day_prefix(date: NaiveDate) -> String {
        format!("B-{}-", date.format(DATE_FORMAT))
    }

    /// Proposes the code following `last_for_today`.
    ///
    /// `last_for_today` is the most recently inserted code carrying today's
    /// prefix (soft-deleted budgets included). A code from another day counts
    /// as no code at all. The suffix is read after the last `-`; a suffix that
    /// is not a number reads as 0, so the sequence starts over at 1.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::SequenceExhausted` once the day passes
    /// [`MAX_SEQUENCE`] codes.
    pub fn next(today: NaiveDate, last_for_today: Option<&str>) -> Result<Self, BudgetError> {
        let prefix = Self::day_prefix(today);

        let sequence = match last_for_today.filter(|code| code.starts_with(&prefix)) {
            None => 1,
            Some(code) => {
                u32::try_from(trailing_sequence(code).saturating_add(1)).unwrap_or(u32::MAX)
            }
        };

        Self::new(today, sequence)
    }

    /// Issue date.
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    /// Daily sequence number.
    #[must_use]
    pub const fn sequence(&self) -> u32 {
        self.sequence
    }
}

/// Numeric suffix of `code`. A non-numeric suffix counts as 0; digits too
/// large for `u64` saturate.
fn trailing_sequence(code: &str) -> u64 {
    match code.rsplit('-').next() {
        Some(suffix) if !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()) => {
            suffix.parse().unwrap_or(u64::MAX)
        }
        _ => 0,
    }
}

impl fmt::Display for BudgetCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "B-{}-{:06}",
            self.date.format(DATE_FORMAT),
            self.sequence
        )
    }
}

impl FromStr for BudgetCode {
    type Err = BudgetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || BudgetError::InvalidCode(s.to_string());

        let mut parts = s.split('-');
        let (Some("B"), Some(date), Some(sequence), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        if date.len() != 8 || sequence.len() != 6 {
            return Err(invalid());
        }
        if !date.bytes().chain(sequence.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let date = NaiveDate::parse_from_str(date, DATE_FORMAT).map_err(|_| invalid())?;
        let sequence = sequence.parse().map_err(|_| invalid())?;

        Self::new(date, sequence).map_err(|_| invalid())
    }
}

impl TryFrom<String> for BudgetCode {
    type Error = BudgetError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BudgetCode> for String {
    fn from(code: BudgetCode) -> Self {
        code.to_string()
    }
}
