use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

pub mod refresh;
pub mod revenue;

pub use refresh::*;
pub use revenue::*;

/// Number of columns in a source row
pub const SALES_FIELD_COUNT: usize = 15;

/// Columns of a source row, in file order.
///
/// `Record` is not a column; it names the row as a whole when its shape is
/// wrong (for example a short line).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalesField {
    OrderId,
    ProductId,
    CustomerId,
    ProductName,
    Category,
    Region,
    DateOfSale,
    QuantitySold,
    UnitPrice,
    Discount,
    ShippingCost,
    PaymentMethod,
    CustomerName,
    CustomerEmail,
    CustomerAddress,
    Record,
}

impl SalesField {
    pub const COLUMNS: [SalesField; SALES_FIELD_COUNT] = [
        SalesField::OrderId,
        SalesField::ProductId,
        SalesField::CustomerId,
        SalesField::ProductName,
        SalesField::Category,
        SalesField::Region,
        SalesField::DateOfSale,
        SalesField::QuantitySold,
        SalesField::UnitPrice,
        SalesField::Discount,
        SalesField::ShippingCost,
        SalesField::PaymentMethod,
        SalesField::CustomerName,
        SalesField::CustomerEmail,
        SalesField::CustomerAddress,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SalesField::OrderId => "order_id",
            SalesField::ProductId => "product_id",
            SalesField::CustomerId => "customer_id",
            SalesField::ProductName => "product_name",
            SalesField::Category => "category",
            SalesField::Region => "region",
            SalesField::DateOfSale => "date_of_sale",
            SalesField::QuantitySold => "quantity_sold",
            SalesField::UnitPrice => "unit_price",
            SalesField::Discount => "discount",
            SalesField::ShippingCost => "shipping_cost",
            SalesField::PaymentMethod => "payment_method",
            SalesField::CustomerName => "customer_name",
            SalesField::CustomerEmail => "customer_email",
            SalesField::CustomerAddress => "customer_address",
            SalesField::Record => "record",
        }
    }
}

impl fmt::Display for SalesField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One denormalized source row, still untyped.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SalesRecord {
    pub order_id: String,
    pub product_id: String,
    pub customer_id: String,
    pub product_name: String,
    pub category: String,
    pub region: String,
    pub date_of_sale: String,
    pub quantity_sold: String,
    pub unit_price: String,
    pub discount: String,
    pub shipping_cost: String,
    pub payment_method: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_address: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Customer {
    pub customer_id: String,
    #[sqlx(rename = "customer_name")]
    pub name: String,
    pub email: String,
    pub address: String,
    pub region: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub product_id: String,
    #[sqlx(rename = "product_name")]
    pub name: String,
    pub category: String,
    pub unit_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub order_id: String,
    pub customer_id: String,
    pub order_date: NaiveDate,
    pub payment_method: String,
    pub shipping_cost: f64,
    pub discount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct OrderItem {
    pub order_id: String,
    pub product_id: String,
    pub quantity_sold: i64,
    pub unit_price_at_sale: f64,
    pub discount_applied: f64,
}

/// The four typed records derived from one source row
#[derive(Debug, Clone, PartialEq)]
pub struct EntityBundle {
    pub customer: Customer,
    pub product: Product,
    pub order: Order,
    pub item: OrderItem,
}

/// Step of a row's unit of work, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistenceStage {
    Begin,
    Customer,
    Product,
    Order,
    OrderItem,
    Commit,
}

impl PersistenceStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PersistenceStage::Begin => "begin transaction",
            PersistenceStage::Customer => "insert customer",
            PersistenceStage::Product => "insert product",
            PersistenceStage::Order => "insert order",
            PersistenceStage::OrderItem => "insert order_item",
            PersistenceStage::Commit => "commit",
        }
    }
}

impl fmt::Display for PersistenceStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
