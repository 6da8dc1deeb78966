//! Order aggregate lifecycle.
//!
//! Every write runs as one transaction over the header and its full item
//! set. Any `?` before `commit` drops the transaction, which rolls it back.
//! The returned aggregate is read inside that transaction, before commit.

use tracing::instrument;
use validator::Validate;

use crate::domain::aggregates::{Order, OrderDraft, OrderSummary};
use crate::domain::events::DomainEvent;
use crate::publisher::EventPublisher;
use crate::store::{Store, StoreTx};
use crate::{Result, WarehouseError};

#[derive(Clone)]
pub struct OrderService<S> {
    store: S,
    events: EventPublisher,
}

impl<S: Store> OrderService<S> {
    pub fn new(store: S, events: EventPublisher) -> Self { Self { store, events } }

    pub async fn list(&self) -> Result<Vec<OrderSummary>> { self.store.list_orders().await }

    pub async fn get(&self, id: i64) -> Result<Order> {
        self.store.find_order(id).await?.ok_or(WarehouseError::NotFound("Order"))
    }

    #[instrument(skip(self, draft), fields(order_number = %draft.header.order_number, items = draft.items.len()))]
    pub async fn create(&self, draft: OrderDraft) -> Result<Order> {
        draft.validate()?;
        let mut tx = self.store.begin().await?;
        let order_id = tx.insert_order(&draft.header).await?;
        for item in &draft.items {
            tx.insert_line_item(order_id, item).await?;
        }
        let order = tx.find_order(order_id).await?.ok_or(WarehouseError::NotFound("Order"))?;
        tx.commit().await?;
        tracing::info!(order_id, "order created");

        self.events.publish(DomainEvent::order_created(&order)).await;
        Ok(order)
    }

    /// Full replacement of header and items. A missing order is detected by
    /// the header update touching no rows, before any item is deleted.
    #[instrument(skip(self, draft), fields(order_number = %draft.header.order_number, items = draft.items.len()))]
    pub async fn update(&self, id: i64, draft: OrderDraft) -> Result<Order> {
        draft.validate()?;
        let mut tx = self.store.begin().await?;
        if tx.update_order(id, &draft.header).await? == 0 {
            return Err(WarehouseError::NotFound("Order"));
        }
        let removed = tx.delete_line_items(id).await?;
        for item in &draft.items {
            tx.insert_line_item(id, item).await?;
        }
        let order = tx.find_order(id).await?.ok_or(WarehouseError::NotFound("Order"))?;
        tx.commit().await?;
        tracing::info!(order_id = id, removed, inserted = draft.items.len(), "order replaced");

        self.events.publish(DomainEvent::order_replaced(&order)).await;
        Ok(order)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<()> {
        let mut tx = self.store.begin().await?;
        tx.delete_line_items(id).await?;
        if tx.delete_order(id).await? == 0 {
            return Err(WarehouseError::NotFound("Order"));
        }
        tx.commit().await?;
        tracing::info!(order_id = id, "order deleted");
        self.events.publish(DomainEvent::order_deleted(id)).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::{NewLineItem, OrderHeader, ProductInput, SupplierInput};
    use crate::domain::value_objects::{OrderStatus, OrderType};
    use crate::store::MemoryStore;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    struct Fixture {
        store: MemoryStore,
        service: OrderService<MemoryStore>,
        supplier_id: i64,
        bolt: i64,
        nut: i64,
    }

    async fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let supplier_id = tx
            .insert_supplier(&SupplierInput { name: "Acme".into(), contact_person: None, phone: None, email: None, address: None, notes: None })
            .await
            .unwrap();
        tx.commit().await.unwrap();
        let product = |sku: &str, name: &str| ProductInput {
            name: name.into(), description: None, category_id: None, sku: sku.into(), unit: "pcs".into(),
            price: Decimal::ONE, min_quantity: 0, max_quantity: None, location: None,
        };
        let bolt = store.seed_product(product("B-1", "Bolt"), 0).await.unwrap().id;
        let nut = store.seed_product(product("N-1", "Nut"), 0).await.unwrap().id;
        let service = OrderService::new(store.clone(), EventPublisher::disabled());
        Fixture { store, service, supplier_id, bolt, nut }
    }

    fn header(number: &str, supplier_id: Option<i64>) -> OrderHeader {
        OrderHeader { order_number: number.into(), supplier_id, order_type: OrderType::Incoming, status: OrderStatus::Pending, expected_date: None, notes: None }
    }

    fn item(product_id: i64, quantity: i32, price: &str) -> NewLineItem {
        NewLineItem { product_id, quantity, price: Decimal::from_str(price).unwrap() }
    }

    #[tokio::test]
    async fn create_persists_every_item() {
        let f = fixture().await;
        let draft = OrderDraft::new(header("PO-1", Some(f.supplier_id)), vec![item(f.bolt, 10, "2.50"), item(f.nut, 3, "0.10")]);
        let order = f.service.create(draft).await.unwrap();

        assert_eq!(order.items().len(), 2);
        assert!(order.items().iter().all(|i| i.order_id == order.id()));
        assert_eq!(order.items()[0].product_name, "Bolt");
        assert_eq!(order.summary.supplier_name.as_deref(), Some("Acme"));
        assert_eq!(order.total(), Decimal::from_str("25.30").unwrap());
    }

    #[tokio::test]
    async fn returned_order_matches_what_was_committed() {
        let f = fixture().await;
        let draft = OrderDraft::new(header("PO-1", None), vec![item(f.bolt, 4, "2.5")]);
        let created = f.service.create(draft).await.unwrap();
        assert_eq!(created.items()[0].price.to_string(), "2.50");
        assert_eq!(f.service.get(created.id()).await.unwrap(), created);

        let replaced = f.service.update(created.id(), OrderDraft::new(header("PO-1", None), vec![item(f.nut, 1, "3")])).await.unwrap();
        assert_eq!(f.service.get(created.id()).await.unwrap(), replaced);
    }

    #[tokio::test]
    async fn unstorable_price_is_rejected_before_writing() {
        let f = fixture().await;
        for price in ["2.505", "12345678901"] {
            let err = f.service.create(OrderDraft::new(header("PO-1", None), vec![item(f.bolt, 1, price)])).await.unwrap_err();
            assert_eq!(err.kind(), "validation_error");
        }
        assert!(f.service.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_with_no_items_is_allowed() {
        let f = fixture().await;
        let order = f.service.create(OrderDraft::new(header("PO-0", None), vec![])).await.unwrap();
        assert!(order.items().is_empty());
    }

    #[tokio::test]
    async fn failing_item_rolls_back_the_header() {
        let f = fixture().await;
        let draft = OrderDraft::new(header("PO-2", None), vec![item(f.bolt, 1, "1"), item(9999, 1, "1")]);
        let err = f.service.create(draft).await.unwrap_err();
        assert_eq!(err.kind(), "validation_error");
        assert!(f.service.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_order_number_is_a_conflict() {
        let f = fixture().await;
        f.service.create(OrderDraft::new(header("PO-1", None), vec![])).await.unwrap();
        let err = f.service.create(OrderDraft::new(header("PO-1", None), vec![item(f.bolt, 1, "1")])).await.unwrap_err();
        assert_eq!(err.kind(), "conflict");
        assert_eq!(f.service.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn invalid_draft_never_opens_a_transaction() {
        let f = fixture().await;
        let err = f.service.create(OrderDraft::new(header("PO-3", None), vec![item(f.bolt, 0, "1")])).await.unwrap_err();
        assert_eq!(err.kind(), "validation_error");
        assert!(f.service.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_replaces_the_item_set() {
        let f = fixture().await;
        let created = f.service.create(OrderDraft::new(header("PO-1", None), vec![item(f.bolt, 1, "1"), item(f.nut, 2, "1")])).await.unwrap();

        let mut h = header("PO-1", Some(f.supplier_id));
        h.status = OrderStatus::Completed;
        let updated = f.service.update(created.id(), OrderDraft::new(h, vec![item(f.nut, 7, "0.50")])).await.unwrap();

        assert_eq!(updated.summary.status, OrderStatus::Completed);
        let items: Vec<_> = updated.items().iter().map(|i| (i.product_id, i.quantity, i.price)).collect();
        assert_eq!(items, vec![(f.nut, 7, Decimal::from_str("0.50").unwrap())]);
    }

    #[tokio::test]
    async fn failed_update_keeps_the_old_items() {
        let f = fixture().await;
        let created = f.service.create(OrderDraft::new(header("PO-1", None), vec![item(f.bolt, 1, "1")])).await.unwrap();
        let err = f.service.update(created.id(), OrderDraft::new(header("PO-1", None), vec![item(4242, 1, "1")])).await.unwrap_err();
        assert_eq!(err.kind(), "validation_error");
        assert_eq!(f.service.get(created.id()).await.unwrap(), created);
    }

    #[tokio::test]
    async fn missing_order_is_not_found_and_changes_nothing() {
        let f = fixture().await;
        let existing = f.service.create(OrderDraft::new(header("PO-1", None), vec![item(f.bolt, 1, "1")])).await.unwrap();

        let err = f.service.update(404, OrderDraft::new(header("PO-9", None), vec![item(f.nut, 1, "1")])).await.unwrap_err();
        assert!(matches!(err, WarehouseError::NotFound("Order")));
        let err = f.service.delete(404).await.unwrap_err();
        assert!(matches!(err, WarehouseError::NotFound("Order")));

        assert_eq!(f.service.list().await.unwrap().len(), 1);
        assert_eq!(f.service.get(existing.id()).await.unwrap(), existing);
    }

    #[tokio::test]
    async fn delete_removes_order_and_items_but_not_ledger() {
        let f = fixture().await;
        let order = f.service.create(OrderDraft::new(header("PO-1", None), vec![item(f.bolt, 1, "1")])).await.unwrap();
        f.service.delete(order.id()).await.unwrap();
        assert!(matches!(f.service.get(order.id()).await, Err(WarehouseError::NotFound(_))));
        assert_eq!(f.store.movement_count().await, 0);

        // the product is no longer referenced by the deleted items
        let mut tx = f.store.begin().await.unwrap();
        assert_eq!(tx.product_references(f.bolt).await.unwrap(), 0);
    }
}
