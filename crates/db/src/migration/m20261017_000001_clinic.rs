//! Creates the `tutors` and `patients` tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Tutors::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Tutors::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Tutors::FullName).string_len(200).not_null())
                    .col(
                        ColumnDef::new(Tutors::DocumentId)
                            .string_len(32)
                            .null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Tutors::Email).string_len(255).null())
                    .col(ColumnDef::new(Tutors::Phone).string_len(32).null())
                    .col(
                        ColumnDef::new(Tutors::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Tutors::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Patients::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Patients::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Patients::TutorId).uuid().not_null())
                    .col(ColumnDef::new(Patients::Name).string_len(120).not_null())
                    .col(ColumnDef::new(Patients::Species).string_len(60).not_null())
                    .col(ColumnDef::new(Patients::Breed).string_len(120).null())
                    .col(
                        ColumnDef::new(Patients::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Patients::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_patients_tutor")
                            .from(Patients::Table, Patients::TutorId)
                            .to(Tutors::Table, Tutors::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_patients_tutor")
                    .table(Patients::Table)
                    .col(Patients::TutorId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Patients::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tutors::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(super) enum Tutors {
    Table,
    Id,
    FullName,
    DocumentId,
    Email,
    Phone,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub(super) enum Patients {
    Table,
    Id,
    TutorId,
    Name,
    Species,
    Breed,
    CreatedAt,
    UpdatedAt,
}
