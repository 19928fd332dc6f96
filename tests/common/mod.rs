#![allow(dead_code)]

use std::io::Write;
use std::path::Path;

use sales_loader::{
    config::{Config, DatabaseConfig},
    database::Database,
    ingestor::{BatchLoader, RefreshOrchestrator, RefreshService, SalesUpserter},
};
use tempfile::NamedTempFile;

pub const HEADER: &str = "order_id,product_id,customer_id,product_name,category,region,date_of_sale,quantity_sold,unit_price,discount,shipping_cost,payment_method,customer_name,customer_email,customer_address";

pub const SCENARIO_ROW: &str =
    "O1,P1,C1,Widget,Tools,West,2024-01-05,3,9.99,1.00,2.50,card,Alice,a@x.com,1 Main St";

/// Write a source file with the standard header followed by `rows`.
pub fn sales_csv(rows: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{}", HEADER).unwrap();
    for row in rows {
        writeln!(file, "{}", row).unwrap();
    }
    file.flush().unwrap();
    file
}

pub async fn memory_database() -> Database {
    let config = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        ..DatabaseConfig::default()
    };
    let database = Database::new(&config).await.unwrap();
    database.migrate().await.unwrap();
    database
}

pub fn refresh_service(database: &Database, source: &Path) -> RefreshService {
    let loader = BatchLoader::new(SalesUpserter::new(database.pool()));
    RefreshService::from_orchestrator(RefreshOrchestrator::new(database.clone(), loader, source))
}

pub fn test_config(source: &Path) -> Config {
    let mut config = Config::default();
    config.database.url = "sqlite::memory:".to_string();
    config.source.csv_path = source.to_path_buf();
    config
}

pub fn approx_eq(left: f64, right: f64) -> bool {
    (left - right).abs() < 1e-9
}
