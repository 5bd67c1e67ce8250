//! Creates the `budgets` and `budget_items` tables.
//!
//! `budgets.code` carries a unique index: the code generator is optimistic and
//! this index is what turns two concurrent proposals of the same code into an
//! insert failure. Soft-deleted rows keep their code.

use sea_orm_migration::prelude::*;

use super::m20261017_000001_clinic::{Patients, Tutors};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Budgets::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Budgets::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Budgets::Code).string_len(32).not_null())
                    .col(ColumnDef::new(Budgets::TutorId).uuid().not_null())
                    .col(ColumnDef::new(Budgets::PatientId).uuid().null())
                    .col(
                        ColumnDef::new(Budgets::Status)
                            .string_len(16)
                            .not_null()
                            .default("draft"),
                    )
                    .col(ColumnDef::new(Budgets::Notes).text().null())
                    .col(ColumnDef::new(Budgets::ValidUntil).date().null())
                    .col(money(Budgets::Subtotal))
                    .col(money(Budgets::DiscountTotal))
                    .col(money(Budgets::TaxTotal))
                    .col(money(Budgets::Total))
                    .col(
                        ColumnDef::new(Budgets::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Budgets::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Budgets::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_budgets_tutor")
                            .from(Budgets::Table, Budgets::TutorId)
                            .to(Tutors::Table, Tutors::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_budgets_patient")
                            .from(Budgets::Table, Budgets::PatientId)
                            .to(Patients::Table, Patients::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_budgets_code")
                    .table(Budgets::Table)
                    .col(Budgets::Code)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_budgets_tutor")
                    .table(Budgets::Table)
                    .col(Budgets::TutorId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(BudgetItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BudgetItems::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BudgetItems::BudgetId).uuid().not_null())
                    .col(ColumnDef::new(BudgetItems::Name).string_len(200).not_null())
                    .col(ColumnDef::new(BudgetItems::Description).text().null())
                    .col(
                        ColumnDef::new(BudgetItems::Qty)
                            .decimal_len(12, 3)
                            .not_null(),
                    )
                    .col(money(BudgetItems::UnitPrice))
                    .col(money(BudgetItems::Discount))
                    .col(
                        ColumnDef::new(BudgetItems::TaxRate)
                            .decimal_len(5, 2)
                            .not_null()
                            .default(0),
                    )
                    .col(money(BudgetItems::LineSubtotal))
                    .col(money(BudgetItems::LineTax))
                    .col(money(BudgetItems::LineTotal))
                    .col(
                        ColumnDef::new(BudgetItems::SortOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_budget_items_budget")
                            .from(BudgetItems::Table, BudgetItems::BudgetId)
                            .to(Budgets::Table, Budgets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_budget_items_order")
                    .table(BudgetItems::Table)
                    .col(BudgetItems::BudgetId)
                    .col(BudgetItems::SortOrder)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BudgetItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Budgets::Table).to_owned())
            .await
    }
}

/// Two-decimal money column, zero by default.
fn money<T: IntoIden>(name: T) -> ColumnDef {
    ColumnDef::new(name)
        .decimal_len(14, 2)
        .not_null()
        .default(0)
        .to_owned()
}

#[derive(DeriveIden)]
enum Budgets {
    Table,
    Id,
    Code,
    TutorId,
    PatientId,
    Status,
    Notes,
    ValidUntil,
    Subtotal,
    DiscountTotal,
    TaxTotal,
    Total,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}

#[derive(DeriveIden)]
enum BudgetItems {
    Table,
    Id,
    BudgetId,
    Name,
    Description,
    Qty,
    UnitPrice,
    Discount,
    TaxRate,
    LineSubtotal,
    LineTax,
    LineTotal,
    SortOrder,
}
