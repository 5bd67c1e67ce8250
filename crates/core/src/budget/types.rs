//! Budget data types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A line item as submitted by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetItemInput {
    /// Service or product name. Blank names are rejected during validation.
    #[serde(default)]
    pub name: String,
    /// Optional free-text description.
    #[serde(default)]
    pub description: Option<String>,
    /// Quantity, must be greater than zero.
    pub qty: Decimal,
    /// Price per unit, must not be negative.
    pub unit_price: Decimal,
    /// Discount as an absolute amount (not a percentage).
    #[serde(default)]
    pub discount: Decimal,
    /// Tax rate as a percentage between 0 and 100.
    #[serde(default)]
    pub tax_rate: Decimal,
    /// Display position within the budget. Defaults to the item's index in
    /// the request; must be unique within a budget.
    #[serde(default)]
    pub sort_order: Option<i32>,
}

/// A line item with its calculated amounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputedItem {
    /// Service or product name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Quantity.
    pub qty: Decimal,
    /// Price per unit.
    pub unit_price: Decimal,
    /// Discount amount.
    pub discount: Decimal,
    /// Tax rate percentage.
    pub tax_rate: Decimal,
    /// Display position, resolved from the input or the item's index.
    pub sort_order: i32,
    /// `round(qty * unit_price - discount, 2)`.
    pub line_subtotal: Decimal,
    /// `round(line_subtotal * tax_rate / 100, 2)`.
    pub line_tax: Decimal,
    /// `line_subtotal + line_tax`.
    pub line_total: Decimal,
}

/// Calculated items plus document-level totals.
///
/// `discount_total` is informational: discounts are already netted into
/// `subtotal`, so `total == subtotal + tax_total`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputedBudget {
    /// Items in input order.
    pub items: Vec<ComputedItem>,
    /// Sum of line subtotals.
    pub subtotal: Decimal,
    /// Sum of item discounts.
    pub discount_total: Decimal,
    /// Sum of line taxes.
    pub tax_total: Decimal,
    /// Sum of line totals.
    pub total: Decimal,
}
