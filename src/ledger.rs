//! Inventory ledger.
//!
//! The only write path into `stock_movements`. Entries are derived from a
//! quantity delta and appended inside the caller's transaction; a zero delta
//! records nothing.

use crate::domain::aggregates::{NewStockMovement, StockMovement};
use crate::domain::value_objects::ReferenceType;
use crate::store::StoreTx;
use crate::Result;

/// Appends the movement for `delta`, or does nothing when `delta` is zero.
pub async fn record<T: StoreTx>(
    tx: &mut T,
    product_id: i64,
    delta: i32,
    reference_type: ReferenceType,
    reference_id: Option<i64>,
    notes: Option<String>,
) -> Result<Option<StockMovement>> {
    let Some(entry) = NewStockMovement::from_delta(product_id, delta, reference_type, reference_id, notes) else {
        return Ok(None);
    };
    let movement = tx.append_movement(&entry).await?;
    tracing::debug!(product_id, delta, movement_id = movement.id, "stock movement recorded");
    Ok(Some(movement))
}
