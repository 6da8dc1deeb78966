//! Domain events, published after the owning transaction commits.
use serde::Serialize;

use crate::domain::aggregates::{Order, StockMovement};

#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum DomainEvent {
    Order(OrderEvent),
    Stock(StockEvent),
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OrderEvent {
    Created { order_id: i64, order_number: String, item_count: usize },
    Replaced { order_id: i64, order_number: String, item_count: usize },
    Deleted { order_id: i64 },
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StockEvent {
    Adjusted { product_id: i64, previous_quantity: i32, quantity: i32, movement_id: Option<i64> },
}

impl DomainEvent {
    pub fn order_created(order: &Order) -> Self {
        Self::Order(OrderEvent::Created { order_id: order.id(), order_number: order.order_number().to_string(), item_count: order.items().len() })
    }

    pub fn order_replaced(order: &Order) -> Self {
        Self::Order(OrderEvent::Replaced { order_id: order.id(), order_number: order.order_number().to_string(), item_count: order.items().len() })
    }

    pub fn order_deleted(order_id: i64) -> Self { Self::Order(OrderEvent::Deleted { order_id }) }

    pub fn stock_adjusted(product_id: i64, previous_quantity: i32, quantity: i32, movement: Option<&StockMovement>) -> Self {
        Self::Stock(StockEvent::Adjusted { product_id, previous_quantity, quantity, movement_id: movement.map(|m| m.id) })
    }

    /// NATS subject, `warehouse.<aggregate>.<action>`.
    pub fn subject(&self) -> String {
        let (aggregate, action) = match self {
            Self::Order(OrderEvent::Created { .. }) => ("orders", "created"),
            Self::Order(OrderEvent::Replaced { .. }) => ("orders", "replaced"),
            Self::Order(OrderEvent::Deleted { .. }) => ("orders", "deleted"),
            Self::Stock(StockEvent::Adjusted { .. }) => ("stock", "adjusted"),
        };
        format!("warehouse.{aggregate}.{action}")
    }
}
