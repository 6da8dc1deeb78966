//! Stock movement ledger entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{MovementType, ReferenceType};

/// An immutable, persisted ledger entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: i64,
    pub product_id: i64,
    pub quantity: i32,
    pub movement_type: MovementType,
    pub reference_type: ReferenceType,
    pub reference_id: Option<i64>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A ledger entry about to be appended. Only constructible from a non-zero
/// delta, so the movement type always matches the sign.
#[derive(Clone, Debug, PartialEq)]
pub struct NewStockMovement {
    product_id: i64,
    quantity: i32,
    movement_type: MovementType,
    reference_type: ReferenceType,
    reference_id: Option<i64>,
    notes: Option<String>,
}

impl NewStockMovement {
    pub fn from_delta(product_id: i64, delta: i32, reference_type: ReferenceType, reference_id: Option<i64>, notes: Option<String>) -> Option<Self> {
        let movement_type = MovementType::from_delta(delta)?;
        Some(Self { product_id, quantity: delta, movement_type, reference_type, reference_id, notes })
    }

    pub fn product_id(&self) -> i64 { self.product_id }
    pub fn quantity(&self) -> i32 { self.quantity }
    pub fn movement_type(&self) -> MovementType { self.movement_type }
    pub fn reference_type(&self) -> ReferenceType { self.reference_type }
    pub fn reference_id(&self) -> Option<i64> { self.reference_id }
    pub fn notes(&self) -> Option<&str> { self.notes.as_deref() }

    pub fn into_stored(self, id: i64, created_at: DateTime<Utc>) -> StockMovement {
        StockMovement {
            id, product_id: self.product_id, quantity: self.quantity, movement_type: self.movement_type,
            reference_type: self.reference_type, reference_id: self.reference_id, notes: self.notes, created_at,
        }
    }
}

/// Movement joined with product and category names for the warehouse and report views.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MovementView {
    #[serde(flatten)]
    pub movement: StockMovement,
    pub product_name: Option<String>,
    pub unit: Option<String>,
    pub category_name: Option<String>,
}
