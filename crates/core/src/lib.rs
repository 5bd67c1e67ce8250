//! Core business logic for the veterinary clinic backend.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Budget types, validation rules, and money calculations live here.
//!
//! # Modules
//!
//! - `budget` - Line item totals, daily budget codes and the budget status lifecycle

pub mod budget;
