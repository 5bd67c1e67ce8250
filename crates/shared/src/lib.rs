//! Shared errors and configuration for the veterinary clinic backend.
//!
//! This crate provides common pieces used across all other crates:
//! - Application-wide error types with HTTP status mapping
//! - Configuration management

pub mod config;
pub mod error;

pub use config::{AppConfig, BudgetConfig, DatabaseConfig, ServerConfig};
pub use error::{AppError, AppResult};
