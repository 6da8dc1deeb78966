//! Direct stock corrections.

use serde::{Deserialize, Serialize};
use tracing::instrument;
use validator::Validate;

use crate::domain::aggregates::{InventoryItem, Product, StockMovement};
use crate::domain::events::DomainEvent;
use crate::domain::value_objects::ReferenceType;
use crate::ledger;
use crate::publisher::EventPublisher;
use crate::store::{Store, StoreTx};
use crate::{Result, WarehouseError};

pub const DEFAULT_ADJUSTMENT_NOTE: &str = "Quantity adjustment";

#[derive(Clone, Debug, Deserialize, Validate)]
pub struct Adjustment {
    #[validate(range(min = 0, message = "quantity cannot be negative"))]
    pub quantity: i32,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Adjustment {
    pub fn new(quantity: i32, location: Option<&str>, notes: Option<&str>) -> Self {
        Self { quantity, location: location.map(str::to_string), notes: notes.map(str::to_string) }
    }
}

/// Relative correction: stock moves by `delta` from whatever it is at lock time.
#[derive(Clone, Debug, Deserialize)]
pub struct StockChange {
    pub delta: i32,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct AdjustmentOutcome {
    pub product: Product,
    pub movement: Option<StockMovement>,
}

#[derive(Clone)]
pub struct InventoryService<S> {
    store: S,
    events: EventPublisher,
}

impl<S: Store> InventoryService<S> {
    pub fn new(store: S, events: EventPublisher) -> Self { Self { store, events } }

    /// Products by name with their stock status.
    pub async fn inventory(&self) -> Result<Vec<InventoryItem>> {
        Ok(self.store.list_products().await?.into_iter().map(InventoryItem::from).collect())
    }

    /// Sets the stock level and location of a product.
    #[instrument(skip(self, adjustment), fields(quantity = adjustment.quantity))]
    pub async fn adjust(&self, product_id: i64, adjustment: Adjustment) -> Result<AdjustmentOutcome> {
        adjustment.validate()?;
        let Adjustment { quantity, location, notes } = adjustment;
        self.apply(product_id, notes, move |_| Ok((quantity, location))).await
    }

    /// Moves the stock level by a signed amount, keeping the location.
    #[instrument(skip(self, change), fields(delta = change.delta))]
    pub async fn adjust_by(&self, product_id: i64, change: StockChange) -> Result<AdjustmentOutcome> {
        let StockChange { delta, notes } = change;
        self.apply(product_id, notes, move |current| {
            let target = current
                .quantity
                .checked_add(delta)
                .filter(|q| *q >= 0)
                .ok_or_else(|| WarehouseError::validation("stock cannot go below zero"))?;
            Ok((target, current.location.clone()))
        })
        .await
    }

    /// The read, the write and the ledger entry share one transaction and the
    /// product row stays locked until commit, so concurrent adjustments of one
    /// product apply in sequence.
    async fn apply<F>(&self, product_id: i64, notes: Option<String>, target: F) -> Result<AdjustmentOutcome>
    where
        F: FnOnce(&Product) -> Result<(i32, Option<String>)> + Send,
    {
        let mut tx = self.store.begin().await?;
        let current = tx.lock_product(product_id).await?.ok_or(WarehouseError::NotFound("Product"))?;
        let (quantity, location) = target(&current)?;
        let delta = quantity - current.quantity;

        tx.set_stock(product_id, quantity, location.as_deref()).await?;
        let notes = notes.unwrap_or_else(|| DEFAULT_ADJUSTMENT_NOTE.to_string());
        let movement = ledger::record(&mut tx, product_id, delta, ReferenceType::Adjustment, Some(product_id), Some(notes)).await?;
        tx.commit().await?;
        tracing::info!(product_id, previous = current.quantity, delta, "stock adjusted");

        self.events
            .publish(DomainEvent::stock_adjusted(product_id, current.quantity, quantity, movement.as_ref()))
            .await;
        let product = Product { quantity, location, ..current };
        Ok(AdjustmentOutcome { product, movement })
    }
}
