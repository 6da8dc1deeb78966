//! Order Aggregate
//!
//! An order header plus its full set of line items. The aggregate is always
//! written as one unit: items are never patched individually, an update
//! replaces the whole set.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::value_objects::{OrderStatus, OrderType};

/// Header fields supplied by callers on create and on full-replacement update.
#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct OrderHeader {
    #[validate(length(min = 1, max = 50, message = "order_number must be 1-50 characters"))]
    pub order_number: String,
    #[serde(default)]
    pub supplier_id: Option<i64>,
    #[serde(default, alias = "type")]
    pub order_type: OrderType,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub expected_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A line item as submitted; the price is captured as given, not looked up.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewLineItem {
    #[validate(range(min = 1, message = "product_id must reference a product"))]
    pub product_id: i64,
    #[validate(range(min = 1, message = "quantity must be positive"))]
    pub quantity: i32,
    #[validate(custom = "crate::domain::money")]
    pub price: Decimal,
}

/// Request body for create and update. `items` is required and is always the
/// complete item set.
#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct OrderDraft {
    #[serde(flatten)]
    #[validate]
    pub header: OrderHeader,
    #[validate]
    pub items: Vec<NewLineItem>,
}

impl OrderDraft {
    pub fn new(header: OrderHeader, items: Vec<NewLineItem>) -> Self { Self { header, items } }
}

/// Order header as read back, joined with the supplier name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub id: i64,
    pub order_number: String,
    pub supplier_id: Option<i64>,
    pub supplier_name: Option<String>,
    pub order_type: OrderType,
    pub status: OrderStatus,
    pub expected_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct LineItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub unit: String,
    pub quantity: i32,
    pub price: Decimal,
}

impl LineItem {
    pub fn line_total(&self) -> Decimal { self.price * Decimal::from(self.quantity) }
}

/// Full aggregate: header plus items.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
    #[serde(flatten)]
    pub summary: OrderSummary,
    pub items: Vec<LineItem>,
}

impl Order {
    pub fn id(&self) -> i64 { self.summary.id }
    pub fn order_number(&self) -> &str { &self.summary.order_number }
    pub fn items(&self) -> &[LineItem] { &self.items }
    pub fn total(&self) -> Decimal { self.items.iter().map(LineItem::line_total).sum() }
}
