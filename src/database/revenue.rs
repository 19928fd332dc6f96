use std::collections::BTreeMap;

use sqlx::Row;

use super::Database;
use crate::models::{DateRange, RevenueByProduct};

// Line revenue excludes shipping for the per-product view only; the other
// views add the order's shipping cost once per order item.
const LINE_REVENUE: &str = "oi.quantity_sold * oi.unit_price_at_sale - oi.discount_applied";
const LINE_REVENUE_WITH_SHIPPING: &str =
    "oi.quantity_sold * oi.unit_price_at_sale - oi.discount_applied + o.shipping_cost";

impl Database {
    pub async fn revenue_by_product(
        &self,
        range: DateRange,
    ) -> Result<Vec<RevenueByProduct>, sqlx::Error> {
        let query = format!(
            "SELECT p.product_id, p.product_name, SUM({}) AS total_revenue
             FROM order_items oi
             JOIN products p ON oi.product_id = p.product_id
             JOIN orders o ON oi.order_id = o.order_id
             WHERE o.order_date BETWEEN ? AND ?
             GROUP BY p.product_id, p.product_name
             ORDER BY total_revenue DESC",
            LINE_REVENUE
        );

        sqlx::query_as::<_, RevenueByProduct>(&query)
            .bind(range.start)
            .bind(range.end)
            .fetch_all(&self.pool)
            .await
    }

    pub async fn revenue_by_category(
        &self,
        range: DateRange,
    ) -> Result<BTreeMap<String, f64>, sqlx::Error> {
        let query = format!(
            "SELECT p.category AS group_key, SUM({}) AS total_revenue
             FROM orders o
             JOIN order_items oi ON o.order_id = oi.order_id
             JOIN products p ON oi.product_id = p.product_id
             WHERE o.order_date BETWEEN ? AND ?
             GROUP BY p.category",
            LINE_REVENUE_WITH_SHIPPING
        );

        self.grouped_revenue(&query, range).await
    }

    pub async fn revenue_by_region(
        &self,
        range: DateRange,
    ) -> Result<BTreeMap<String, f64>, sqlx::Error> {
        let query = format!(
            "SELECT c.region AS group_key, SUM({}) AS total_revenue
             FROM orders o
             JOIN customers c ON o.customer_id = c.customer_id
             JOIN order_items oi ON o.order_id = oi.order_id
             WHERE o.order_date BETWEEN ? AND ?
             GROUP BY c.region",
            LINE_REVENUE_WITH_SHIPPING
        );

        self.grouped_revenue(&query, range).await
    }

    /// Overall revenue in range; 0 when nothing matches.
    pub async fn total_revenue(&self, range: DateRange) -> Result<f64, sqlx::Error> {
        let query = format!(
            "SELECT COALESCE(SUM({}), 0.0) AS total_revenue
             FROM orders o
             JOIN order_items oi ON o.order_id = oi.order_id
             WHERE o.order_date BETWEEN ? AND ?",
            LINE_REVENUE_WITH_SHIPPING
        );

        sqlx::query_scalar::<_, f64>(&query)
            .bind(range.start)
            .bind(range.end)
            .fetch_one(&self.pool)
            .await
    }

    async fn grouped_revenue(
        &self,
        query: &str,
        range: DateRange,
    ) -> Result<BTreeMap<String, f64>, sqlx::Error> {
        let rows = sqlx::query(query)
            .bind(range.start)
            .bind(range.end)
            .fetch_all(&self.pool)
            .await?;

        let mut result = BTreeMap::new();
        for row in rows {
            result.insert(row.try_get("group_key")?, row.try_get("total_revenue")?);
        }
        Ok(result)
    }
}
