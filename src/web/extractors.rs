//! Request parameter extraction and validation

use serde::Deserialize;

use crate::errors::{AppError, AppResult};
use crate::ingestor::parse_iso_date;
use crate::models::DateRange;

/// `?start_date=YYYY-MM-DD&end_date=YYYY-MM-DD`
///
/// Both are optional at the query-string level so a missing value surfaces
/// as a 400 with a readable message rather than axum's rejection text.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DateRangeParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl DateRangeParams {
    pub fn into_range(self) -> AppResult<DateRange> {
        let start = required_date("start_date", self.start_date)?;
        let end = required_date("end_date", self.end_date)?;
        Ok(DateRange { start, end })
    }
}

fn required_date(name: &str, value: Option<String>) -> AppResult<chrono::NaiveDate> {
    let value = value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::validation(format!("{} is required", name)))?;

    parse_iso_date(&value).map_err(|cause| AppError::validation(format!("{}: {}", name, cause)))
}
