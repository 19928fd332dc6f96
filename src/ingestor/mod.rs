//! Source-to-store pipeline: parse rows, write them, reload on refresh.

pub mod batch_loader;
pub mod refresh;
pub mod sales_parser;
pub mod state_manager;
pub mod upsert;

pub use batch_loader::{BatchLoader, SalesSource};
pub use refresh::{RefreshOrchestrator, RefreshService};
pub use sales_parser::{parse_iso_date, SalesRowParser};
pub use state_manager::RefreshStateManager;
pub use upsert::{RowWriter, SalesUpserter};
