use async_trait::async_trait;
use sqlx::{Pool, Sqlite, SqliteConnection};
use tracing::{debug, warn};

use crate::database::sales;
use crate::errors::PersistenceError;
use crate::models::{EntityBundle, PersistenceStage};

/// Persists one validated row as a single unit of work.
#[async_trait]
pub trait RowWriter: Send + Sync {
    async fn write_row(&self, row: usize, bundle: &EntityBundle) -> Result<(), PersistenceError>;
}

/// Writes customer, product, order and order item with insert-if-absent
/// semantics inside one transaction per row.
#[derive(Clone)]
pub struct SalesUpserter {
    pool: Pool<Sqlite>,
}

impl SalesUpserter {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    async fn insert_bundle(
        conn: &mut SqliteConnection,
        row: usize,
        bundle: &EntityBundle,
    ) -> Result<(), PersistenceError> {
        let stage_err = |stage| move |e: sqlx::Error| PersistenceError::new(row, stage, e);

        let customer = sales::insert_customer(conn, &bundle.customer)
            .await
            .map_err(stage_err(PersistenceStage::Customer))?;
        let product = sales::insert_product(conn, &bundle.product)
            .await
            .map_err(stage_err(PersistenceStage::Product))?;
        let order = sales::insert_order(conn, &bundle.order)
            .await
            .map_err(stage_err(PersistenceStage::Order))?;
        let item = sales::insert_order_item(conn, &bundle.item)
            .await
            .map_err(stage_err(PersistenceStage::OrderItem))?;

        debug!(
            "Row {}: inserted customer={} product={} order={} order_item={}",
            row, customer, product, order, item
        );
        Ok(())
    }
}

#[async_trait]
impl RowWriter for SalesUpserter {
    async fn write_row(&self, row: usize, bundle: &EntityBundle) -> Result<(), PersistenceError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| PersistenceError::new(row, PersistenceStage::Begin, e))?;

        if let Err(e) = Self::insert_bundle(&mut tx, row, bundle).await {
            if let Err(rollback_err) = tx.rollback().await {
                warn!("Row {}: rollback after {} failed: {}", row, e.stage, rollback_err);
            }
            return Err(e);
        }

        tx.commit()
            .await
            .map_err(|e| PersistenceError::new(row, PersistenceStage::Commit, e))
    }
}
