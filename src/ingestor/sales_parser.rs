//! Turns one untyped source row into a typed entity bundle.
//!
//! Parsing is all-or-nothing: the first field that fails produces a
//! `ValidationError` and no entity is built. Nothing here touches the store.

use chrono::NaiveDate;
use csv::{ByteRecord, StringRecord};
use regex::Regex;
use std::sync::OnceLock;

use crate::errors::ValidationError;
use crate::models::*;

fn iso_date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date pattern"))
}

/// Parse a strict `YYYY-MM-DD` calendar date.
pub fn parse_iso_date(value: &str) -> Result<NaiveDate, String> {
    if !iso_date_pattern().is_match(value) {
        return Err(format!("'{}' does not match YYYY-MM-DD", value));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| format!("'{}' is not a calendar date: {}", value, e))
}

impl SalesRecord {
    /// Map a raw row onto the fixed 15-column layout.
    pub fn from_csv(row: usize, record: &StringRecord) -> Result<Self, ValidationError> {
        if record.len() != SALES_FIELD_COUNT {
            return Err(ValidationError::new(
                row,
                SalesField::Record,
                format!(
                    "expected {} fields, found {}",
                    SALES_FIELD_COUNT,
                    record.len()
                ),
            ));
        }

        let field = |index: usize| record.get(index).unwrap_or_default().to_string();

        Ok(Self {
            order_id: field(0),
            product_id: field(1),
            customer_id: field(2),
            product_name: field(3),
            category: field(4),
            region: field(5),
            date_of_sale: field(6),
            quantity_sold: field(7),
            unit_price: field(8),
            discount: field(9),
            shipping_cost: field(10),
            payment_method: field(11),
            customer_name: field(12),
            customer_email: field(13),
            customer_address: field(14),
        })
    }
}

pub struct SalesRowParser;

impl SalesRowParser {
    /// Validate every typed field of `record` and build its entities.
    pub fn parse(row: usize, record: &SalesRecord) -> Result<EntityBundle, ValidationError> {
        require_key(row, SalesField::OrderId, &record.order_id)?;
        require_key(row, SalesField::ProductId, &record.product_id)?;
        require_key(row, SalesField::CustomerId, &record.customer_id)?;

        let order_date = parse_iso_date(&record.date_of_sale)
            .map_err(|cause| ValidationError::new(row, SalesField::DateOfSale, cause))?;
        let unit_price = parse_amount(row, SalesField::UnitPrice, &record.unit_price)?;
        let shipping_cost = parse_amount(row, SalesField::ShippingCost, &record.shipping_cost)?;
        let discount = parse_amount(row, SalesField::Discount, &record.discount)?;
        let quantity_sold = record.quantity_sold.parse::<i64>().map_err(|e| {
            ValidationError::new(
                row,
                SalesField::QuantitySold,
                format!("'{}': {}", record.quantity_sold, e),
            )
        })?;

        Ok(EntityBundle {
            customer: Customer {
                customer_id: record.customer_id.clone(),
                name: record.customer_name.clone(),
                email: record.customer_email.clone(),
                address: record.customer_address.clone(),
                region: record.region.clone(),
            },
            product: Product {
                product_id: record.product_id.clone(),
                name: record.product_name.clone(),
                category: record.category.clone(),
                unit_price,
            },
            order: Order {
                order_id: record.order_id.clone(),
                customer_id: record.customer_id.clone(),
                order_date,
                payment_method: record.payment_method.clone(),
                shipping_cost,
                discount,
            },
            item: OrderItem {
                order_id: record.order_id.clone(),
                product_id: record.product_id.clone(),
                quantity_sold,
                unit_price_at_sale: unit_price,
                discount_applied: discount,
            },
        })
    }

    /// Shape check plus typed parse of one raw row.
    pub fn parse_csv(row: usize, record: &StringRecord) -> Result<EntityBundle, ValidationError> {
        let record = SalesRecord::from_csv(row, record)?;
        Self::parse(row, &record)
    }

    /// Decode one raw row, then parse it. A field that is not valid UTF-8
    /// fails that field only.
    pub fn parse_bytes(row: usize, record: &ByteRecord) -> Result<EntityBundle, ValidationError> {
        let decoded = StringRecord::from_byte_record(record.clone()).map_err(|e| {
            let index = e.utf8_error().field();
            let field = if record.len() == SALES_FIELD_COUNT {
                SalesField::COLUMNS
                    .get(index)
                    .copied()
                    .unwrap_or(SalesField::Record)
            } else {
                SalesField::Record
            };
            ValidationError::new(
                row,
                field,
                format!(
                    "field {} is not valid UTF-8 (valid up to byte {})",
                    index,
                    e.utf8_error().valid_up_to()
                ),
            )
        })?;
        Self::parse_csv(row, &decoded)
    }
}

fn require_key(row: usize, field: SalesField, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::new(row, field, "must not be empty"));
    }
    Ok(())
}

fn parse_amount(row: usize, field: SalesField, value: &str) -> Result<f64, ValidationError> {
    let amount = value
        .parse::<f64>()
        .map_err(|e| ValidationError::new(row, field, format!("'{}': {}", value, e)))?;

    if !amount.is_finite() {
        return Err(ValidationError::new(
            row,
            field,
            format!("'{}' is not a finite number", value),
        ));
    }
    if amount < 0.0 {
        return Err(ValidationError::new(
            row,
            field,
            format!("'{}' must not be negative", value),
        ));
    }

    Ok(amount)
}
