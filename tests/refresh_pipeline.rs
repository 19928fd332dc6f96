mod common;

use chrono::NaiveDate;
use common::*;
use tokio_test::{assert_err, assert_ok};
use sales_loader::{
    errors::RefreshError,
    models::{DateRange, RefreshState, RefreshTrigger, TableCounts},
};

fn january_2024() -> DateRange {
    DateRange {
        start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        end: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
    }
}

#[tokio::test]
async fn test_scenario_row_loads_and_totals() {
    let database = memory_database().await;
    let source = sales_csv(&[SCENARIO_ROW]);
    let service = refresh_service(&database, source.path());

    let summary = assert_ok!(service.refresh(RefreshTrigger::Manual).await);

    assert_eq!(summary.rows, 1);
    assert_eq!(summary.loaded, 1);
    assert_eq!(
        database.table_counts().await.unwrap(),
        TableCounts {
            customers: 1,
            products: 1,
            orders: 1,
            order_items: 1,
        }
    );
    let total = database.total_revenue(january_2024()).await.unwrap();
    assert!(approx_eq(total, 31.47), "total was {}", total);
}

#[tokio::test]
async fn test_invalid_row_is_skipped_and_the_rest_load() {
    let database = memory_database().await;
    let source = sales_csv(&[
        SCENARIO_ROW,
        "O2,P2,C2,Gadget,Toys,East,2024-01-06,abc,5.00,0,1.00,cash,Bob,b@x.com,2 Main St",
        "O3,P2,C2,Gadget,Toys,East,2024-01-07,1,5.00,0,1.00,cash,Bob,b@x.com,2 Main St",
    ]);
    let service = refresh_service(&database, source.path());

    let summary = service.refresh(RefreshTrigger::Manual).await.unwrap();

    assert_eq!(summary.loaded, 2);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.validation_failures, 1);
    assert_eq!(database.table_counts().await.unwrap().orders, 2);
}

#[tokio::test]
async fn test_repeated_refresh_yields_identical_content() {
    let database = memory_database().await;
    let source = sales_csv(&[
        SCENARIO_ROW,
        "O1,P2,C1,Gadget,Toys,West,2024-01-05,1,5.00,0,2.50,card,Alice,a@x.com,1 Main St",
    ]);
    let service = refresh_service(&database, source.path());

    service.refresh(RefreshTrigger::Startup).await.unwrap();
    let first = database.table_counts().await.unwrap();
    let first_total = database.total_revenue(january_2024()).await.unwrap();

    service.refresh(RefreshTrigger::Manual).await.unwrap();

    assert_eq!(database.table_counts().await.unwrap(), first);
    assert!(approx_eq(
        database.total_revenue(january_2024()).await.unwrap(),
        first_total
    ));
}

#[tokio::test]
async fn test_duplicate_rows_keep_first_seen_values() {
    let database = memory_database().await;
    let source = sales_csv(&[
        SCENARIO_ROW,
        "O1,P1,C1,Renamed,Other,North,2024-01-05,9,1.00,0,0,cash,Mallory,m@x.com,9 Side St",
    ]);
    let service = refresh_service(&database, source.path());

    let summary = service.refresh(RefreshTrigger::Manual).await.unwrap();

    // Both rows succeed; the second is absorbed by insert-if-absent.
    assert_eq!(summary.loaded, 2);
    assert_eq!(database.table_counts().await.unwrap().order_items, 1);
    let products = database.revenue_by_product(january_2024()).await.unwrap();
    assert_eq!(products[0].product_name, "Widget");
}

#[tokio::test]
async fn test_failed_truncation_leaves_prior_content() {
    let database = memory_database().await;
    let source = sales_csv(&[SCENARIO_ROW]);
    let service = refresh_service(&database, source.path());
    service.refresh(RefreshTrigger::Startup).await.unwrap();

    sqlx::query(
        "CREATE TRIGGER keep_customers BEFORE DELETE ON customers
         BEGIN SELECT RAISE(ABORT, 'customers are locked'); END",
    )
    .execute(&database.pool())
    .await
    .unwrap();

    let err = service.refresh(RefreshTrigger::Manual).await.unwrap_err();

    assert!(matches!(err, RefreshError::Truncation(ref e) if e.step == "customers"));
    assert_eq!(
        database.table_counts().await.unwrap(),
        TableCounts {
            customers: 1,
            products: 1,
            orders: 1,
            order_items: 1,
        }
    );
    assert_eq!(service.status().await.state, RefreshState::Failed);
}

#[tokio::test]
async fn test_unreadable_source_fails_the_refresh() {
    let database = memory_database().await;
    let source = sales_csv(&[SCENARIO_ROW]);
    let service = refresh_service(&database, &source.path().with_extension("missing"));

    let err = assert_err!(service.refresh(RefreshTrigger::Manual).await);

    assert!(matches!(err, RefreshError::SourceRead(_)));
    assert_eq!(database.table_counts().await.unwrap(), TableCounts::default());
}

#[tokio::test]
async fn test_persistence_failure_rolls_back_only_that_row() {
    let database = memory_database().await;
    sqlx::query(
        "CREATE TRIGGER no_bulk_orders BEFORE INSERT ON order_items
         WHEN NEW.quantity_sold > 100
         BEGIN SELECT RAISE(ABORT, 'bulk orders go elsewhere'); END",
    )
    .execute(&database.pool())
    .await
    .unwrap();
    let source = sales_csv(&[
        SCENARIO_ROW,
        "O2,P2,C2,Gadget,Toys,East,2024-01-06,500,5.00,0,1.00,cash,Bob,b@x.com,2 Main St",
    ]);
    let service = refresh_service(&database, source.path());

    let summary = service.refresh(RefreshTrigger::Manual).await.unwrap();

    assert_eq!(summary.loaded, 1);
    assert_eq!(summary.persistence_failures, 1);
    // Bob, Gadget and O2 were written before the item failed and rolled back.
    assert_eq!(
        database.table_counts().await.unwrap(),
        TableCounts {
            customers: 1,
            products: 1,
            orders: 1,
            order_items: 1,
        }
    );
}

async fn key_count(database: &sales_loader::database::Database, sql: &str, key: &str) -> i64 {
    sqlx::query_scalar(sql)
        .bind(key)
        .fetch_one(&database.pool())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_refresh_from_a_new_source_drops_keys_it_no_longer_has() {
    let database = memory_database().await;
    let first = sales_csv(&[SCENARIO_ROW]);
    let second = sales_csv(&[
        "O9,P9,C9,Lamp,Home,North,2024-01-20,1,40.00,0,0,card,Cara,c@x.com,9 Elm St",
    ]);

    assert_ok!(refresh_service(&database, first.path()).refresh(RefreshTrigger::Startup).await);
    let summary = assert_ok!(
        refresh_service(&database, second.path())
            .refresh(RefreshTrigger::Manual)
            .await
    );

    assert_eq!(summary.loaded, 1);
    assert_eq!(key_count(&database, "SELECT COUNT(*) FROM customers WHERE customer_id = ?", "C1").await, 0);
    assert_eq!(key_count(&database, "SELECT COUNT(*) FROM products WHERE product_id = ?", "P1").await, 0);
    assert_eq!(key_count(&database, "SELECT COUNT(*) FROM orders WHERE order_id = ?", "O1").await, 0);
    assert_eq!(key_count(&database, "SELECT COUNT(*) FROM order_items WHERE order_id = ?", "O1").await, 0);
    assert_eq!(key_count(&database, "SELECT COUNT(*) FROM orders WHERE order_id = ?", "O9").await, 1);
    assert_eq!(
        database.table_counts().await.unwrap(),
        TableCounts {
            customers: 1,
            products: 1,
            orders: 1,
            order_items: 1,
        }
    );
    let total = database.total_revenue(january_2024()).await.unwrap();
    assert!(approx_eq(total, 40.0), "total was {}", total);
}

#[tokio::test]
async fn test_latin1_row_is_skipped_and_the_store_keeps_the_rest() {
    use std::io::Write;

    let database = memory_database().await;
    let mut source = sales_csv(&[SCENARIO_ROW]);
    source
        .write_all(b"O2,P2,C2,Gadget,Toys,East,2024-01-06,1,5.00,0,1.00,cash,Bob,b@x.com,2 Caf\xe9 St\n")
        .unwrap();
    writeln!(source, "O3,P2,C2,Gadget,Toys,East,2024-01-07,1,5.00,0,1.00,cash,Bob,b@x.com,2 Main St").unwrap();
    source.flush().unwrap();
    let service = refresh_service(&database, source.path());

    let summary = assert_ok!(service.refresh(RefreshTrigger::Manual).await);

    assert_eq!(summary.rows, 3);
    assert_eq!(summary.loaded, 2);
    assert_eq!(summary.validation_failures, 1);
    assert_eq!(database.table_counts().await.unwrap().orders, 2);
    assert_eq!(key_count(&database, "SELECT COUNT(*) FROM orders WHERE order_id = ?", "O2").await, 0);
    assert_eq!(service.status().await.state, RefreshState::Done);
}
