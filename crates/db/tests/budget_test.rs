//! Integration tests for the budget repository.
//!
//! Runs against an in-memory SQLite database with the real migrations applied.

use std::collections::BTreeSet;

use chrono::{NaiveDate, Utc};
use futures::future::join_all;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ConnectOptions, ConnectionTrait, Database,
    DatabaseConnection, EntityTrait, PaginatorTrait,
};
use uuid::Uuid;

use vetclinic_core::budget::{BudgetError, BudgetItemInput, BudgetStatus};
use vetclinic_db::entities::{budget_items, budgets, sea_orm_active_enums};
use vetclinic_db::migration::{Migrator, MigratorTrait};
use vetclinic_db::repositories::{
    BudgetFilter, BudgetRepoError, BudgetRepository, CreateBudgetInput, CreatePatientInput,
    CreateTutorInput, PatientRepository, TutorRepository,
};

async fn setup_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .expect("Failed to connect to database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
}

fn item(name: &str, qty: Decimal, unit_price: Decimal, sort_order: i32) -> BudgetItemInput {
    BudgetItemInput {
        name: name.to_string(),
        description: None,
        qty,
        unit_price,
        discount: Decimal::ZERO,
        tax_rate: Decimal::ZERO,
        sort_order: Some(sort_order),
    }
}

async fn create_tutor(db: &DatabaseConnection, name: &str) -> Uuid {
    TutorRepository::new(db.clone())
        .create(CreateTutorInput {
            full_name: name.to_string(),
            ..Default::default()
        })
        .await
        .expect("Failed to create tutor")
        .id
}

fn budget_for(tutor_id: Uuid, items: Vec<BudgetItemInput>) -> CreateBudgetInput {
    CreateBudgetInput {
        tutor_id,
        patient_id: None,
        notes: None,
        valid_until: None,
        items,
    }
}

/// Inserts a budget row directly, bypassing the code generator.
async fn insert_raw_budget(db: &DatabaseConnection, tutor_id: Uuid, code: &str) {
    let now = Utc::now().into();
    budgets::ActiveModel {
        id: Set(Uuid::now_v7()),
        code: Set(code.to_string()),
        tutor_id: Set(tutor_id),
        patient_id: Set(None),
        status: Set(sea_orm_active_enums::BudgetStatus::Draft),
        notes: Set(None),
        valid_until: Set(None),
        subtotal: Set(Decimal::ZERO),
        discount_total: Set(Decimal::ZERO),
        tax_total: Set(Decimal::ZERO),
        total: Set(Decimal::ZERO),
        created_at: Set(now),
        updated_at: Set(now),
        deleted_at: Set(None),
    }
    .insert(db)
    .await
    .expect("Failed to insert budget");
}

#[tokio::test]
async fn test_create_budget_computes_totals_and_code() {
    let db = setup_db().await;
    let tutor_id = create_tutor(&db, "María González").await;
    let patient = PatientRepository::new(db.clone())
        .create(
            tutor_id,
            CreatePatientInput {
                name: "Luna".to_string(),
                species: "Feline".to_string(),
                breed: None,
            },
        )
        .await
        .unwrap();

    let repo = BudgetRepository::new(db.clone());
    let mut consult = item("Consulta", dec!(2), dec!(1000), 1);
    consult.tax_rate = dec!(19);
    let mut vaccine = item("Vacuna triple felina", dec!(1), dec!(500), 2);
    vaccine.discount = dec!(100);

    let created = repo
        .create_budget(
            CreateBudgetInput {
                tutor_id,
                patient_id: Some(patient.id),
                notes: Some("Control anual".to_string()),
                valid_until: NaiveDate::from_ymd_opt(2026, 11, 16),
                items: vec![consult, vaccine],
            },
            today(),
        )
        .await
        .unwrap();

    assert_eq!(created.budget.code, "B-20261017-000001");
    assert_eq!(
        created.budget.status,
        sea_orm_active_enums::BudgetStatus::Draft
    );
    assert_eq!(created.budget.subtotal, dec!(2400));
    assert_eq!(created.budget.discount_total, dec!(100));
    assert_eq!(created.budget.tax_total, dec!(380));
    assert_eq!(created.budget.total, dec!(2780));
    assert_eq!(created.items.len(), 2);
    assert_eq!(created.items[0].line_total, dec!(2380));
    assert_eq!(created.items[1].line_total, dec!(400));

    let fetched = repo.get_budget(created.budget.id).await.unwrap();
    assert_eq!(fetched.budget.code, created.budget.code);
    assert_eq!(fetched.budget.total, dec!(2780));
    assert_eq!(fetched.items.len(), 2);
    assert_eq!(fetched.items[0].name, "Consulta");
}

#[tokio::test]
async fn test_codes_are_sequential_within_a_day() {
    let db = setup_db().await;
    let tutor_id = create_tutor(&db, "Pedro Soto").await;
    let repo = BudgetRepository::new(db.clone());

    let mut codes = Vec::new();
    for _ in 0..3 {
        let created = repo
            .create_budget(
                budget_for(tutor_id, vec![item("Consulta", dec!(1), dec!(100), 0)]),
                today(),
            )
            .await
            .unwrap();
        codes.push(created.budget.code);
    }

    assert_eq!(
        codes,
        vec![
            "B-20261017-000001",
            "B-20261017-000002",
            "B-20261017-000003"
        ]
    );

    let tomorrow = today().succ_opt().unwrap();
    let next_day = repo
        .create_budget(
            budget_for(tutor_id, vec![item("Consulta", dec!(1), dec!(100), 0)]),
            tomorrow,
        )
        .await
        .unwrap();
    assert_eq!(next_day.budget.code, "B-20261018-000001");
}

#[tokio::test]
async fn test_soft_deleted_budget_still_advances_sequence() {
    let db = setup_db().await;
    let tutor_id = create_tutor(&db, "Ana Rojas").await;
    let repo = BudgetRepository::new(db.clone());

    let first = repo
        .create_budget(
            budget_for(tutor_id, vec![item("Ecografía", dec!(1), dec!(25000), 0)]),
            today(),
        )
        .await
        .unwrap();
    repo.soft_delete(first.budget.id).await.unwrap();

    let second = repo
        .create_budget(
            budget_for(tutor_id, vec![item("Ecografía", dec!(1), dec!(25000), 0)]),
            today(),
        )
        .await
        .unwrap();

    assert_eq!(second.budget.code, "B-20261017-000002");
    assert!(matches!(
        repo.get_budget(first.budget.id).await,
        Err(BudgetRepoError::NotFound(_))
    ));
    assert!(matches!(
        repo.soft_delete(first.budget.id).await,
        Err(BudgetRepoError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_failed_item_insert_rolls_back_whole_budget() {
    let db = setup_db().await;
    let tutor_id = create_tutor(&db, "Jorge Díaz").await;
    let repo = BudgetRepository::new(db.clone());

    // Item rows fail only after the header row has been written inside the
    // transaction.
    db.execute_unprepared(
        "CREATE TRIGGER reject_budget_items BEFORE INSERT ON budget_items \
         BEGIN SELECT RAISE(ABORT, 'items rejected'); END;",
    )
    .await
    .unwrap();

    let items = vec![
        item("Cirugía", dec!(1), dec!(150000), 1),
        item("Anestesia", dec!(1), dec!(40000), 2),
    ];
    let result = repo
        .create_budget(budget_for(tutor_id, items.clone()), today())
        .await;

    assert!(matches!(result, Err(BudgetRepoError::Database(_))));
    assert_eq!(budgets::Entity::find().count(&db).await.unwrap(), 0);
    assert_eq!(budget_items::Entity::find().count(&db).await.unwrap(), 0);

    db.execute_unprepared("DROP TRIGGER reject_budget_items")
        .await
        .unwrap();

    let retry = repo
        .create_budget(budget_for(tutor_id, items), today())
        .await
        .unwrap();
    assert_eq!(retry.budget.code, "B-20261017-000001");
    assert_eq!(retry.budget.total, dec!(190000));
    assert_eq!(retry.items.len(), 2);
}

#[tokio::test]
async fn test_items_without_sort_order_take_their_position() {
    let db = setup_db().await;
    let tutor_id = create_tutor(&db, "Valentina Soto").await;
    let repo = BudgetRepository::new(db.clone());

    let mut consulta = item("Consulta", dec!(1), dec!(1000), 0);
    consulta.tax_rate = dec!(10);
    let mut items = vec![
        consulta,
        item("Antiparasitario", dec!(3), dec!(500), 0),
        item("Collar", dec!(1), dec!(0), 0),
    ];
    for input in &mut items {
        input.sort_order = None;
    }

    let created = repo
        .create_budget(budget_for(tutor_id, items), today())
        .await
        .unwrap();

    assert_eq!(created.budget.subtotal, dec!(2500));
    assert_eq!(created.budget.tax_total, dec!(100));
    assert_eq!(created.budget.total, dec!(2600));

    let fetched = repo.get_budget(created.budget.id).await.unwrap();
    let positions: Vec<(String, i32)> = fetched
        .items
        .iter()
        .map(|i| (i.name.clone(), i.sort_order))
        .collect();
    assert_eq!(
        positions,
        vec![
            ("Consulta".to_string(), 0),
            ("Antiparasitario".to_string(), 1),
            ("Collar".to_string(), 2),
        ]
    );

    // Replacing items follows the same rule.
    let replaced = repo
        .replace_items(
            created.budget.id,
            vec![
                BudgetItemInput {
                    sort_order: None,
                    ..item("Vacuna", dec!(1), dec!(800), 0)
                },
                BudgetItemInput {
                    sort_order: None,
                    ..item("Control", dec!(1), dec!(200), 0)
                },
            ],
        )
        .await
        .unwrap();
    let orders: Vec<i32> = replaced.items.iter().map(|i| i.sort_order).collect();
    assert_eq!(orders, vec![0, 1]);
}

#[tokio::test]
async fn test_duplicate_sort_order_rejected_before_writing() {
    let db = setup_db().await;
    let tutor_id = create_tutor(&db, "Jorge Díaz").await;
    let repo = BudgetRepository::new(db.clone());

    let result = repo
        .create_budget(
            budget_for(
                tutor_id,
                vec![
                    item("Cirugía", dec!(1), dec!(150000), 1),
                    item("Anestesia", dec!(1), dec!(40000), 1),
                ],
            ),
            today(),
        )
        .await;

    assert!(matches!(
        result,
        Err(BudgetRepoError::Budget(BudgetError::Validation(ref errors)))
            if errors.len() == 1 && errors[0].field == "sort_order"
    ));
    assert_eq!(budgets::Entity::find().count(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_code_conflict_surfaces_after_retry() {
    let db = setup_db().await;
    let tutor_id = create_tutor(&db, "Camila Fuentes").await;

    // The most recently inserted code is 000001 while 000002 is already taken,
    // so every attempt proposes 000002.
    insert_raw_budget(&db, tutor_id, "B-20261017-000002").await;
    insert_raw_budget(&db, tutor_id, "B-20261017-000001").await;

    let repo = BudgetRepository::new(db.clone()).with_code_retry_attempts(2);
    let result = repo
        .create_budget(
            budget_for(tutor_id, vec![item("Consulta", dec!(1), dec!(100), 0)]),
            today(),
        )
        .await;

    match result {
        Err(BudgetRepoError::PersistenceConflict(code)) => {
            assert_eq!(code, "B-20261017-000002");
        }
        other => panic!("expected conflict, got {other:?}"),
    }
    assert_eq!(budgets::Entity::find().count(&db).await.unwrap(), 2);
    assert_eq!(budget_items::Entity::find().count(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_invalid_items_write_nothing() {
    let db = setup_db().await;
    let tutor_id = create_tutor(&db, "Luis Araya").await;
    let repo = BudgetRepository::new(db.clone());

    let result = repo
        .create_budget(
            budget_for(tutor_id, vec![item("Consulta", dec!(0), dec!(100), 0)]),
            today(),
        )
        .await;

    match result {
        Err(BudgetRepoError::Budget(BudgetError::Validation(errors))) => {
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].field, "qty");
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert_eq!(budgets::Entity::find().count(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_unknown_tutor_and_foreign_patient_rejected() {
    let db = setup_db().await;
    let owner = create_tutor(&db, "Sofía Muñoz").await;
    let stranger = create_tutor(&db, "Tomás Vera").await;
    let patient = PatientRepository::new(db.clone())
        .create(
            owner,
            CreatePatientInput {
                name: "Toby".to_string(),
                species: "canine".to_string(),
                breed: Some("Beagle".to_string()),
            },
        )
        .await
        .unwrap();
    let repo = BudgetRepository::new(db.clone());

    let missing = Uuid::new_v4();
    assert!(matches!(
        repo.create_budget(
            budget_for(missing, vec![item("Consulta", dec!(1), dec!(100), 0)]),
            today()
        )
        .await,
        Err(BudgetRepoError::TutorNotFound(id)) if id == missing
    ));

    let mut input = budget_for(stranger, vec![item("Consulta", dec!(1), dec!(100), 0)]);
    input.patient_id = Some(patient.id);
    assert!(matches!(
        repo.create_budget(input, today()).await,
        Err(BudgetRepoError::PatientTutorMismatch { .. })
    ));
}

#[tokio::test]
async fn test_replace_items_only_while_draft() {
    let db = setup_db().await;
    let tutor_id = create_tutor(&db, "Valentina Pérez").await;
    let repo = BudgetRepository::new(db.clone());

    let created = repo
        .create_budget(
            budget_for(tutor_id, vec![item("Consulta", dec!(1), dec!(100), 0)]),
            today(),
        )
        .await
        .unwrap();

    let mut radiography = item("Radiografía", dec!(2), dec!(18000), 0);
    radiography.tax_rate = dec!(19);
    let replaced = repo
        .replace_items(
            created.budget.id,
            vec![radiography, item("Consulta", dec!(1), dec!(12000), 1)],
        )
        .await
        .unwrap();

    assert_eq!(replaced.budget.code, created.budget.code);
    assert_eq!(replaced.budget.subtotal, dec!(48000));
    assert_eq!(replaced.budget.tax_total, dec!(6840));
    assert_eq!(replaced.budget.total, dec!(54840));
    assert_eq!(replaced.items.len(), 2);
    assert_eq!(budget_items::Entity::find().count(&db).await.unwrap(), 2);

    repo.transition_status(created.budget.id, BudgetStatus::Sent)
        .await
        .unwrap();

    assert!(matches!(
        repo.replace_items(
            created.budget.id,
            vec![item("Consulta", dec!(1), dec!(1), 0)]
        )
        .await,
        Err(BudgetRepoError::Budget(BudgetError::NotEditable(
            BudgetStatus::Sent
        )))
    ));
    let unchanged = repo.get_budget(created.budget.id).await.unwrap();
    assert_eq!(unchanged.budget.total, dec!(54840));
}

#[tokio::test]
async fn test_status_lifecycle() {
    let db = setup_db().await;
    let tutor_id = create_tutor(&db, "Diego Castro").await;
    let repo = BudgetRepository::new(db.clone());

    let created = repo
        .create_budget(
            budget_for(tutor_id, vec![item("Consulta", dec!(1), dec!(100), 0)]),
            today(),
        )
        .await
        .unwrap();
    let id = created.budget.id;

    assert!(matches!(
        repo.transition_status(id, BudgetStatus::Accepted).await,
        Err(BudgetRepoError::Budget(BudgetError::InvalidTransition { .. }))
    ));

    let sent = repo.transition_status(id, BudgetStatus::Sent).await.unwrap();
    assert_eq!(sent.status, sea_orm_active_enums::BudgetStatus::Sent);

    let accepted = repo
        .transition_status(id, BudgetStatus::Accepted)
        .await
        .unwrap();
    assert_eq!(accepted.status, sea_orm_active_enums::BudgetStatus::Accepted);

    assert!(matches!(
        repo.transition_status(id, BudgetStatus::Rejected).await,
        Err(BudgetRepoError::Budget(BudgetError::InvalidTransition { .. }))
    ));
}

#[tokio::test]
async fn test_list_budgets_filters() {
    let db = setup_db().await;
    let first_tutor = create_tutor(&db, "Isidora Lagos").await;
    let second_tutor = create_tutor(&db, "Martín Reyes").await;
    let repo = BudgetRepository::new(db.clone());

    let mut ids = Vec::new();
    for tutor_id in [first_tutor, first_tutor, second_tutor] {
        let created = repo
            .create_budget(
                budget_for(tutor_id, vec![item("Consulta", dec!(1), dec!(100), 0)]),
                today(),
            )
            .await
            .unwrap();
        ids.push(created.budget.id);
    }
    repo.transition_status(ids[0], BudgetStatus::Sent)
        .await
        .unwrap();
    repo.soft_delete(ids[1]).await.unwrap();

    let all = repo.list_budgets(BudgetFilter::default()).await.unwrap();
    assert_eq!(all.len(), 2);

    let by_tutor = repo
        .list_budgets(BudgetFilter {
            tutor_id: Some(first_tutor),
            status: None,
        })
        .await
        .unwrap();
    assert_eq!(by_tutor.len(), 1);
    assert_eq!(by_tutor[0].id, ids[0]);

    let drafts = repo
        .list_budgets(BudgetFilter {
            tutor_id: None,
            status: Some(BudgetStatus::Draft),
        })
        .await
        .unwrap();
    assert_eq!(drafts.len(), 1);
    assert_eq!(drafts[0].id, ids[2]);
}

#[tokio::test]
async fn test_concurrent_creations_get_distinct_codes() {
    let db = setup_db().await;
    let tutor_id = create_tutor(&db, "Fernanda Silva").await;
    let repo = BudgetRepository::new(db.clone());

    let futures = (0..5).map(|_| {
        let repo = repo.clone();
        async move {
            repo.create_budget(
                budget_for(tutor_id, vec![item("Consulta", dec!(1), dec!(100), 0)]),
                today(),
            )
            .await
        }
    });

    let codes: BTreeSet<String> = join_all(futures)
        .await
        .into_iter()
        .map(|r| r.expect("creation should succeed").budget.code)
        .collect();

    let expected: BTreeSet<String> = (1..=5).map(|n| format!("B-20261017-{n:06}")).collect();
    assert_eq!(codes, expected);
}
