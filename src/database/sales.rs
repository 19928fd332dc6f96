//! Statements behind the row upsert and the refresh truncate.
//!
//! Every function takes a bare connection so callers decide the transaction
//! boundary. Inserts are insert-if-absent: an existing key is left untouched
//! and the function reports `false`.

use sqlx::SqliteConnection;

use crate::models::{Customer, Order, OrderItem, Product};

/// Tables emptied by a refresh, children before parents
pub const TRUNCATE_ORDER: [&str; 4] = ["order_items", "orders", "products", "customers"];

pub async fn insert_customer(
    conn: &mut SqliteConnection,
    customer: &Customer,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO customers (customer_id, customer_name, email, address, region)
         VALUES (?, ?, ?, ?, ?)
         ON CONFLICT (customer_id) DO NOTHING",
    )
    .bind(&customer.customer_id)
    .bind(&customer.name)
    .bind(&customer.email)
    .bind(&customer.address)
    .bind(&customer.region)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn insert_product(
    conn: &mut SqliteConnection,
    product: &Product,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO products (product_id, product_name, category, unit_price)
         VALUES (?, ?, ?, ?)
         ON CONFLICT (product_id) DO NOTHING",
    )
    .bind(&product.product_id)
    .bind(&product.name)
    .bind(&product.category)
    .bind(product.unit_price)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn insert_order(conn: &mut SqliteConnection, order: &Order) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO orders (order_id, customer_id, order_date, payment_method, shipping_cost, discount)
         VALUES (?, ?, ?, ?, ?, ?)
         ON CONFLICT (order_id) DO NOTHING",
    )
    .bind(&order.order_id)
    .bind(&order.customer_id)
    .bind(order.order_date)
    .bind(&order.payment_method)
    .bind(order.shipping_cost)
    .bind(order.discount)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn insert_order_item(
    conn: &mut SqliteConnection,
    item: &OrderItem,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO order_items (order_id, product_id, quantity_sold, unit_price_at_sale, discount_applied)
         VALUES (?, ?, ?, ?, ?)
         ON CONFLICT (order_id, product_id) DO NOTHING",
    )
    .bind(&item.order_id)
    .bind(&item.product_id)
    .bind(item.quantity_sold)
    .bind(item.unit_price_at_sale)
    .bind(item.discount_applied)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete every row of one of the `TRUNCATE_ORDER` tables.
pub async fn truncate_table(conn: &mut SqliteConnection, table: &str) -> Result<u64, sqlx::Error> {
    if !TRUNCATE_ORDER.contains(&table) {
        return Err(sqlx::Error::Protocol(format!(
            "refusing to truncate unknown table '{}'",
            table
        )));
    }

    let result = sqlx::query(&format!("DELETE FROM {}", table))
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_support::memory_database;
    use chrono::NaiveDate;

    fn customer(id: &str, name: &str) -> Customer {
        Customer {
            customer_id: id.to_string(),
            name: name.to_string(),
            email: format!("{}@example.com", id.to_lowercase()),
            address: "1 Main St".to_string(),
            region: "West".to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_customer_keeps_first_seen() {
        let database = memory_database().await;
        let mut conn = database.pool().acquire().await.unwrap();

        assert!(insert_customer(&mut conn, &customer("C1", "Alice")).await.unwrap());
        assert!(!insert_customer(&mut conn, &customer("C1", "Mallory")).await.unwrap());

        let stored: Customer = sqlx::query_as("SELECT * FROM customers WHERE customer_id = 'C1'")
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        assert_eq!(stored.name, "Alice");
    }

    #[tokio::test]
    async fn test_order_date_is_stored_as_iso_text() {
        let database = memory_database().await;
        let mut conn = database.pool().acquire().await.unwrap();

        insert_customer(&mut conn, &customer("C1", "Alice")).await.unwrap();
        let order = Order {
            order_id: "O1".to_string(),
            customer_id: "C1".to_string(),
            order_date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            payment_method: "card".to_string(),
            shipping_cost: 2.5,
            discount: 1.0,
        };
        assert!(insert_order(&mut conn, &order).await.unwrap());

        let raw: String = sqlx::query_scalar("SELECT order_date FROM orders WHERE order_id = 'O1'")
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        assert_eq!(raw, "2024-01-05");
    }

    #[tokio::test]
    async fn test_truncate_rejects_unknown_table() {
        let database = memory_database().await;
        let mut conn = database.pool().acquire().await.unwrap();

        assert!(truncate_table(&mut conn, "schema_migrations").await.is_err());
        assert_eq!(truncate_table(&mut conn, "customers").await.unwrap(), 0);
    }
}
