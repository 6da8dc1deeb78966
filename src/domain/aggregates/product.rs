//! Product Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::domain::value_objects::{Sku, StockStatus};

/// A stocked product. `quantity` is the single source of truth for the stock
/// level and only changes through an inventory adjustment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: i64,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub category_name: Option<String>,
    pub unit: String,
    pub price: Decimal,
    pub quantity: i32,
    pub min_quantity: i32,
    pub max_quantity: Option<i32>,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn stock_status(&self) -> StockStatus { StockStatus::classify(self.quantity, self.min_quantity) }
    pub fn is_low_stock(&self) -> bool { self.quantity <= self.min_quantity }
}

/// Product with its computed stock status, as listed by the warehouse view.
#[derive(Clone, Debug, Serialize)]
pub struct InventoryItem {
    #[serde(flatten)]
    pub product: Product,
    pub stock_status: StockStatus,
}

impl From<Product> for InventoryItem {
    fn from(product: Product) -> Self {
        let stock_status = product.stock_status();
        Self { product, stock_status }
    }
}

/// Catalog fields for create and update. The stock level is not among them.
#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
#[validate(schema(function = "thresholds_ordered"))]
pub struct ProductInput {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category_id: Option<i64>,
    pub sku: String,
    #[validate(length(min = 1, message = "unit is required"))]
    pub unit: String,
    #[validate(custom = "crate::domain::money")]
    pub price: Decimal,
    #[serde(default)]
    #[validate(range(min = 0, message = "min_quantity cannot be negative"))]
    pub min_quantity: i32,
    #[serde(default)]
    pub max_quantity: Option<i32>,
    #[serde(default)]
    pub location: Option<String>,
}

fn thresholds_ordered(input: &ProductInput) -> Result<(), ValidationError> {
    match input.max_quantity {
        Some(max) if max < input.min_quantity => Err(ValidationError::new("max_quantity_below_min")),
        _ => Ok(()),
    }
}

impl ProductInput {
    /// Validates the payload and normalizes the SKU.
    pub fn normalized(mut self) -> crate::Result<Self> {
        self.validate()?;
        self.sku = Sku::new(self.sku)?.into_inner();
        Ok(self)
    }
}
