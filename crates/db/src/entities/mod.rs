//! `SeaORM` entity definitions.

pub mod budget_items;
pub mod budgets;
pub mod patients;
pub mod sea_orm_active_enums;
pub mod tutors;
