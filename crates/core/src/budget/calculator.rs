//! Line item and document totals for budgets.
//!
//! Each line is rounded on its own and the document totals are sums of the
//! rounded line values. Summing first and rounding once gives different cents
//! for some inputs, and stored budgets were always totalled line by line.
//!
//! Accepted inputs fit the stored columns exactly: quantities have at most
//! three decimals and stay below [`MAX_QTY`], money has at most two decimals
//! and stays below [`MAX_AMOUNT`].

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use rust_decimal::{Decimal, RoundingStrategy};

use super::error::{BudgetError, FieldError};
use super::types::{BudgetItemInput, ComputedBudget, ComputedItem};

/// Decimal places kept for money amounts.
pub const MONEY_SCALE: u32 = 2;

/// Decimal places accepted for quantities.
pub const QTY_SCALE: u32 = 3;

/// Decimal places accepted for tax rates.
pub const TAX_RATE_SCALE: u32 = 2;

/// Exclusive upper bound for quantities (`NUMERIC(12,3)`).
pub const MAX_QTY: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// Exclusive upper bound for any money amount (`NUMERIC(14,2)`).
// 1_000_000_000_000 == 232 * 2^32 + 3_567_587_328
pub const MAX_AMOUNT: Decimal =
    Decimal::from_parts(3_567_587_328, 232, 0, false, 0);

/// Longest accepted item name, in characters.
pub const MAX_NAME_LEN: usize = 200;

/// Rounds a money amount to [`MONEY_SCALE`] places, midpoint away from zero.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Display position of the item at `index` when none was given.
fn default_sort_order(index: usize) -> i32 {
    i32::try_from(index).unwrap_or(i32::MAX)
}

fn decimals(value: Decimal) -> u32 {
    value.normalize().scale()
}

/// Budget calculator. Pure, no I/O.
pub struct BudgetCalculator;

impl BudgetCalculator {
    /// Validates items without computing anything.
    ///
    /// Every offending field is reported, not just the first one.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::EmptyBudget` for an empty list and
    /// `BudgetError::Validation` when any item is malformed.
    pub fn validate(items: &[BudgetItemInput]) -> Result<(), BudgetError> {
        if items.is_empty() {
            return Err(BudgetError::EmptyBudget);
        }

        let mut errors = Vec::new();
        let mut positions: HashMap<i32, usize> = HashMap::with_capacity(items.len());

        for (index, item) in items.iter().enumerate() {
            let name = item.name.trim();
            if name.is_empty() {
                errors.push(FieldError::new(index, "name", "is required"));
            } else if name.chars().count() > MAX_NAME_LEN {
                errors.push(FieldError::new(
                    index,
                    "name",
                    format!("must be at most {MAX_NAME_LEN} characters"),
                ));
            }

            if item.qty <= Decimal::ZERO {
                errors.push(FieldError::new(index, "qty", "must be greater than zero"));
            } else if item.qty >= MAX_QTY {
                errors.push(FieldError::new(
                    index,
                    "qty",
                    format!("must be less than {MAX_QTY}"),
                ));
            }
            if decimals(item.qty) > QTY_SCALE {
                errors.push(FieldError::new(
                    index,
                    "qty",
                    format!("must have at most {QTY_SCALE} decimals"),
                ));
            }

            check_amount(&mut errors, index, "unit_price", item.unit_price);
            check_amount(&mut errors, index, "discount", item.discount);

            if item.tax_rate < Decimal::ZERO || item.tax_rate > Decimal::ONE_HUNDRED {
                errors.push(FieldError::new(
                    index,
                    "tax_rate",
                    "must be between 0 and 100",
                ));
            }
            if decimals(item.tax_rate) > TAX_RATE_SCALE {
                errors.push(FieldError::new(
                    index,
                    "tax_rate",
                    format!("must have at most {TAX_RATE_SCALE} decimals"),
                ));
            }

            let sort_order = item.sort_order.unwrap_or_else(|| default_sort_order(index));
            match positions.entry(sort_order) {
                Entry::Occupied(first) => errors.push(FieldError::new(
                    index,
                    "sort_order",
                    format!("{sort_order} is already used by item {}", first.get()),
                )),
                Entry::Vacant(slot) => {
                    slot.insert(index);
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(BudgetError::Validation(errors))
        }
    }

    /// Computes the amounts of the line at `index`.
    ///
    /// A discount larger than `qty * unit_price` yields a negative subtotal;
    /// it is kept as is. A missing `sort_order` becomes `index`.
    ///
    /// # Errors
    ///
    /// Returns a `line_total` field error when an amount overflows or the
    /// line total does not fit [`MAX_AMOUNT`].
    pub fn compute_line(index: usize, item: &BudgetItemInput) -> Result<ComputedItem, FieldError> {
        let out_of_range = || {
            FieldError::new(
                index,
                "line_total",
                format!("must be less than {MAX_AMOUNT} in absolute value"),
            )
        };

        let gross = item
            .qty
            .checked_mul(item.unit_price)
            .ok_or_else(out_of_range)?;
        let line_subtotal = round_money(gross.checked_sub(item.discount).ok_or_else(out_of_range)?);
        let line_tax = line_subtotal
            .checked_mul(item.tax_rate)
            .and_then(|tax| tax.checked_div(Decimal::ONE_HUNDRED))
            .map(round_money)
            .ok_or_else(out_of_range)?;
        let line_total = line_subtotal
            .checked_add(line_tax)
            .ok_or_else(out_of_range)?;

        // Tax shares the subtotal's sign, so the total bounds both.
        if line_total.abs() >= MAX_AMOUNT {
            return Err(out_of_range());
        }

        Ok(ComputedItem {
            name: item.name.trim().to_string(),
            description: item.description.clone(),
            qty: item.qty,
            unit_price: item.unit_price,
            discount: item.discount,
            tax_rate: item.tax_rate,
            sort_order: item.sort_order.unwrap_or_else(|| default_sort_order(index)),
            line_subtotal,
            line_tax,
            line_total,
        })
    }

    /// Validates and computes a whole budget.
    ///
    /// # Errors
    ///
    /// See [`BudgetCalculator::validate`]. Lines whose amounts are out of
    /// range are reported as field errors, document totals as
    /// `BudgetError::TotalOutOfRange`. No partial output is produced on error.
    pub fn compute(items: &[BudgetItemInput]) -> Result<ComputedBudget, BudgetError> {
        Self::validate(items)?;

        let mut computed = Vec::with_capacity(items.len());
        let mut errors = Vec::new();
        for (index, item) in items.iter().enumerate() {
            match Self::compute_line(index, item) {
                Ok(line) => computed.push(line),
                Err(e) => errors.push(e),
            }
        }
        if !errors.is_empty() {
            return Err(BudgetError::Validation(errors));
        }

        let subtotal = sum(&computed, "subtotal", |i| i.line_subtotal)?;
        let discount_total = sum(&computed, "discount_total", |i| i.discount)?;
        let tax_total = sum(&computed, "tax_total", |i| i.line_tax)?;
        let total = sum(&computed, "total", |i| i.line_total)?;

        Ok(ComputedBudget {
            items: computed,
            subtotal,
            discount_total,
            tax_total,
            total,
        })
    }
}

fn check_amount(errors: &mut Vec<FieldError>, index: usize, field: &'static str, value: Decimal) {
    if value < Decimal::ZERO {
        errors.push(FieldError::new(index, field, "cannot be negative"));
    } else if value >= MAX_AMOUNT {
        errors.push(FieldError::new(
            index,
            field,
            format!("must be less than {MAX_AMOUNT}"),
        ));
    }
    if decimals(value) > MONEY_SCALE {
        errors.push(FieldError::new(
            index,
            field,
            format!("must have at most {MONEY_SCALE} decimals"),
        ));
    }
}

fn sum(
    items: &[ComputedItem],
    total: &'static str,
    amount: impl Fn(&ComputedItem) -> Decimal,
) -> Result<Decimal, BudgetError> {
    items
        .iter()
        .try_fold(Decimal::ZERO, |acc, item| acc.checked_add(amount(item)))
        .filter(|sum| sum.abs() < MAX_AMOUNT)
        .ok_or(BudgetError::TotalOutOfRange(total))
}
