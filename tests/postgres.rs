//! The same rules, checked against PostgreSQL.
//!
//! `#[sqlx::test]` connects through `DATABASE_URL`, creates a throwaway
//! database per test and applies `migrations/` to it.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;

use opensase_warehouse::domain::aggregates::{
    CategoryInput, EmployeeInput, InvoiceInput, NewLineItem, OrderDraft, OrderHeader, ProductInput, SupplierInput,
};
use opensase_warehouse::domain::reports::{DateRange, MovementFilter, OrderReportFilter};
use opensase_warehouse::domain::value_objects::{EmployeeStatus, InvoiceStatus, OrderStatus, OrderType, Period};
use opensase_warehouse::publisher::EventPublisher;
use opensase_warehouse::services::{Adjustment, Services, StockChange};
use opensase_warehouse::store::{PgStore, Store, StoreTx};
use opensase_warehouse::WarehouseError;

fn services(pool: &PgPool) -> (PgStore, Services<PgStore>) {
    let store = PgStore::new(pool.clone());
    (store.clone(), Services::new(store, EventPublisher::disabled()))
}

fn dec(s: &str) -> Decimal { Decimal::from_str(s).unwrap() }

fn product(sku: &str, name: &str, category_id: Option<i64>) -> ProductInput {
    ProductInput {
        name: name.into(), description: None, category_id, sku: sku.into(), unit: "pcs".into(),
        price: dec("2.50"), min_quantity: 5, max_quantity: None, location: None,
    }
}

fn supplier(name: &str) -> SupplierInput {
    SupplierInput { name: name.into(), contact_person: None, phone: None, email: None, address: None, notes: None }
}

fn header(number: &str, supplier_id: Option<i64>) -> OrderHeader {
    OrderHeader { order_number: number.into(), supplier_id, order_type: OrderType::Incoming, status: OrderStatus::Pending, expected_date: None, notes: None }
}

fn item(product_id: i64, quantity: i32, price: &str) -> NewLineItem {
    NewLineItem { product_id, quantity, price: dec(price) }
}

async fn count(pool: &PgPool, table: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}")).fetch_one(pool).await.unwrap()
}

async fn ledger_sum(pool: &PgPool, product_id: i64) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COALESCE(SUM(quantity), 0)::BIGINT FROM stock_movements WHERE product_id = $1")
        .bind(product_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

#[sqlx::test(migrations = "./migrations")]
async fn order_round_trip(pool: PgPool) {
    let (_, app) = services(&pool);
    let acme = app.catalog.create_supplier(supplier("Acme")).await.unwrap();
    let bolt = app.catalog.create_product(product("b-1", "Bolt", None)).await.unwrap();

    let order = app.orders.create(OrderDraft::new(header("PO-1", Some(acme.id)), vec![item(bolt.id, 10, "2.5")])).await.unwrap();
    assert_eq!(order.summary.supplier_name.as_deref(), Some("Acme"));
    assert_eq!(order.items()[0].product_name, "Bolt");
    assert_eq!(order.items()[0].price.to_string(), "2.50");
    assert_eq!(order.total(), dec("25.00"));
    assert_eq!(app.orders.get(order.id()).await.unwrap(), order);

    app.orders.delete(order.id()).await.unwrap();
    assert!(matches!(app.orders.get(order.id()).await, Err(WarehouseError::NotFound("Order"))));
    assert_eq!(count(&pool, "order_items").await, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn failing_item_rolls_back_the_whole_order(pool: PgPool) {
    let (_, app) = services(&pool);
    let bolt = app.catalog.create_product(product("b-1", "Bolt", None)).await.unwrap();

    let draft = OrderDraft::new(header("PO-1", None), vec![item(bolt.id, 1, "1"), item(9999, 1, "1")]);
    let err = app.orders.create(draft).await.unwrap_err();
    assert_eq!(err.kind(), "validation_error");
    assert_eq!(count(&pool, "orders").await, 0);
    assert_eq!(count(&pool, "order_items").await, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn update_replaces_items_and_misses_change_nothing(pool: PgPool) {
    let (_, app) = services(&pool);
    let bolt = app.catalog.create_product(product("b-1", "Bolt", None)).await.unwrap();
    let nut = app.catalog.create_product(product("n-1", "Nut", None)).await.unwrap();
    let created = app.orders.create(OrderDraft::new(header("PO-1", None), vec![item(bolt.id, 1, "1"), item(nut.id, 2, "1")])).await.unwrap();

    let replaced = app.orders.update(created.id(), OrderDraft::new(header("PO-1", None), vec![item(nut.id, 7, "0.50")])).await.unwrap();
    let items: Vec<_> = replaced.items().iter().map(|i| (i.product_id, i.quantity)).collect();
    assert_eq!(items, vec![(nut.id, 7)]);
    assert_eq!(count(&pool, "order_items").await, 1);

    let err = app.orders.update(created.id(), OrderDraft::new(header("PO-1", None), vec![item(4242, 1, "1")])).await.unwrap_err();
    assert_eq!(err.kind(), "validation_error");
    assert_eq!(app.orders.get(created.id()).await.unwrap(), replaced);

    assert!(matches!(app.orders.update(404, OrderDraft::new(header("PO-9", None), vec![])).await, Err(WarehouseError::NotFound("Order"))));
    assert!(matches!(app.orders.delete(404).await, Err(WarehouseError::NotFound("Order"))));
    assert_eq!(app.orders.list().await.unwrap().len(), 1);
    assert_eq!(app.orders.get(created.id()).await.unwrap(), replaced);
}

#[sqlx::test(migrations = "./migrations")]
async fn duplicate_keys_are_conflicts(pool: PgPool) {
    let (_, app) = services(&pool);
    app.orders.create(OrderDraft::new(header("PO-1", None), vec![])).await.unwrap();
    assert_eq!(app.orders.create(OrderDraft::new(header("PO-1", None), vec![])).await.unwrap_err().kind(), "conflict");

    app.catalog.create_product(product("b-1", "Bolt", None)).await.unwrap();
    assert_eq!(app.catalog.create_product(product(" B-1 ", "Bolt", None)).await.unwrap_err().kind(), "conflict");
    assert_eq!(app.catalog.create_product(product("c-1", "Cog", Some(77))).await.unwrap_err().kind(), "validation_error");
}

#[sqlx::test(migrations = "./migrations")]
async fn prices_come_back_as_sent(pool: PgPool) {
    let (_, app) = services(&pool);
    let bolt = app.catalog.create_product(product("b-1", "Bolt", None)).await.unwrap();
    for price in ["2.505", "12345678901"] {
        let err = app.orders.create(OrderDraft::new(header("PO-1", None), vec![item(bolt.id, 1, price)])).await.unwrap_err();
        assert_eq!(err.kind(), "validation_error");
    }
    let order = app.orders.create(OrderDraft::new(header("PO-1", None), vec![item(bolt.id, 1, "9999999999.99")])).await.unwrap();
    assert_eq!(order.items()[0].price, dec("9999999999.99"));
}

#[sqlx::test(migrations = "./migrations")]
async fn transaction_sees_its_writes_and_drop_rolls_back(pool: PgPool) {
    let store = PgStore::new(pool.clone());
    let mut tx = store.begin().await.unwrap();
    let id = tx.insert_order(&header("PO-1", None)).await.unwrap();
    assert_eq!(tx.find_order(id).await.unwrap().unwrap().order_number(), "PO-1");
    drop(tx);

    assert!(store.find_order(id).await.unwrap().is_none());
    assert_eq!(count(&pool, "orders").await, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn recount_writes_one_signed_movement(pool: PgPool) {
    let (_, app) = services(&pool);
    let bolt = app.catalog.create_product(product("b-1", "Bolt", None)).await.unwrap();
    app.inventory.adjust(bolt.id, Adjustment::new(20, Some("A1"), None)).await.unwrap();

    let outcome = app.inventory.adjust(bolt.id, Adjustment::new(15, Some("A1"), Some("recount"))).await.unwrap();
    let movement = outcome.movement.unwrap();
    assert_eq!(movement.quantity, -5);
    assert_eq!(movement.movement_type.as_str(), "outgoing");
    assert_eq!(outcome.product.quantity, 15);

    let again = app.inventory.adjust(bolt.id, Adjustment::new(15, Some("A1"), None)).await.unwrap();
    assert!(again.movement.is_none());
    assert_eq!(count(&pool, "stock_movements").await, 2);
    assert_eq!(ledger_sum(&pool, bolt.id).await, 15);

    let err = app.inventory.adjust_by(bolt.id, StockChange { delta: -16, notes: None }).await.unwrap_err();
    assert_eq!(err.kind(), "validation_error");
    assert!(matches!(app.inventory.adjust(999, Adjustment::new(1, None, None)).await, Err(WarehouseError::NotFound("Product"))));
}

#[sqlx::test(migrations = "./migrations")]
async fn concurrent_relative_adjustments_all_land(pool: PgPool) {
    let (_, app) = services(&pool);
    let bolt = app.catalog.create_product(product("b-1", "Bolt", None)).await.unwrap();
    app.inventory.adjust(bolt.id, Adjustment::new(20, None, None)).await.unwrap();

    let deltas = [3, -4, 5, -2];
    let tasks: Vec<_> = deltas
        .into_iter()
        .map(|delta| {
            let inventory = app.inventory.clone();
            tokio::spawn(async move { inventory.adjust_by(bolt.id, StockChange { delta, notes: None }).await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let expected = 20 + deltas.iter().sum::<i32>();
    assert_eq!(app.catalog.get_product(bolt.id).await.unwrap().quantity, expected);
    assert_eq!(count(&pool, "stock_movements").await, 1 + deltas.len() as i64);
    assert_eq!(ledger_sum(&pool, bolt.id).await, i64::from(expected));
}

#[sqlx::test(migrations = "./migrations")]
async fn ledger_rows_cannot_change(pool: PgPool) {
    let (_, app) = services(&pool);
    let bolt = app.catalog.create_product(product("b-1", "Bolt", None)).await.unwrap();
    app.inventory.adjust(bolt.id, Adjustment::new(4, None, None)).await.unwrap();

    assert!(sqlx::query("UPDATE stock_movements SET notes = 'edited'").execute(&pool).await.is_err());
    assert!(sqlx::query("DELETE FROM stock_movements").execute(&pool).await.is_err());
    assert_eq!(count(&pool, "stock_movements").await, 1);

    assert_eq!(app.catalog.delete_product(bolt.id).await.unwrap_err().kind(), "conflict");
}

#[sqlx::test(migrations = "./migrations")]
async fn referenced_rows_are_kept(pool: PgPool) {
    let store = PgStore::new(pool.clone());
    let (_, app) = services(&pool);
    let tools = app.catalog.create_category(CategoryInput { name: "Tools".into(), description: None }).await.unwrap();
    let hinge = app.catalog.create_product(product("h-1", "Hinge", Some(tools.id))).await.unwrap();
    assert_eq!(app.catalog.delete_category(tools.id).await.unwrap_err().kind(), "conflict");

    let acme = app.catalog.create_supplier(supplier("Acme")).await.unwrap();
    let invoice = app.office.create_invoice(invoice_input("INV-1", Some(acme.id))).await.unwrap();
    assert_eq!(app.catalog.delete_supplier(acme.id).await.unwrap_err().kind(), "conflict");

    // Bypassing the reference check still ends in a conflict.
    let mut tx = store.begin().await.unwrap();
    assert_eq!(tx.delete_supplier(acme.id).await.unwrap_err().kind(), "conflict");
    drop(tx);

    app.office.delete_invoice(invoice.id).await.unwrap();
    app.catalog.delete_supplier(acme.id).await.unwrap();
    app.catalog.delete_product(hinge.id).await.unwrap();
    app.catalog.delete_category(tools.id).await.unwrap();
}

fn invoice_input(number: &str, supplier_id: Option<i64>) -> InvoiceInput {
    InvoiceInput {
        invoice_number: number.into(), supplier_id, invoice_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        amount: dec("100"), tax_amount: dec("20.5"), total_amount: None, status: InvoiceStatus::Pending,
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn employees_and_invoices(pool: PgPool) {
    let (_, app) = services(&pool);
    let input = EmployeeInput {
        full_name: "Dana Reyes".into(), position: Some("Picker".into()), email: Some("dana@example.test".into()),
        phone: None, hire_date: NaiveDate::from_ymd_opt(2023, 9, 1), salary: Some(dec("3100.5")), status: EmployeeStatus::Active,
    };
    let dana = app.office.create_employee(input.clone()).await.unwrap();
    assert_eq!(dana.salary.unwrap().to_string(), "3100.50");
    let moved = app.office.update_employee(dana.id, EmployeeInput { status: EmployeeStatus::OnLeave, ..input }).await.unwrap();
    assert_eq!(moved.status, EmployeeStatus::OnLeave);
    assert_eq!(app.office.list_employees().await.unwrap(), vec![moved]);
    app.office.delete_employee(dana.id).await.unwrap();
    assert!(matches!(app.office.delete_employee(dana.id).await, Err(WarehouseError::NotFound("Employee"))));

    let acme = app.catalog.create_supplier(supplier("Acme")).await.unwrap();
    let created = app.office.create_invoice(invoice_input("INV-1", Some(acme.id))).await.unwrap();
    assert_eq!(created.supplier_name.as_deref(), Some("Acme"));
    assert_eq!(created.total_amount.to_string(), "120.50");
    assert_eq!(app.office.create_invoice(invoice_input("INV-1", None)).await.unwrap_err().kind(), "conflict");

    let paid = app.office.update_invoice(created.id, InvoiceInput { status: InvoiceStatus::Paid, ..invoice_input("INV-1", None) }).await.unwrap();
    assert_eq!(paid.status, InvoiceStatus::Paid);
    assert!(paid.supplier_name.is_none());
    assert_eq!(app.office.get_invoice(created.id).await.unwrap(), paid);
    assert_eq!(app.office.list_invoices().await.unwrap().len(), 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn every_report_answers(pool: PgPool) {
    let (_, app) = services(&pool);
    let tools = app.catalog.create_category(CategoryInput { name: "Tools".into(), description: None }).await.unwrap();
    let acme = app.catalog.create_supplier(supplier("Acme")).await.unwrap();
    let bolt = app.catalog.create_product(product("b-1", "Bolt", Some(tools.id))).await.unwrap();
    let nut = app.catalog.create_product(product("n-1", "Nut", None)).await.unwrap();
    app.inventory.adjust(bolt.id, Adjustment::new(50, Some("A1"), None)).await.unwrap();

    app.orders.create(OrderDraft::new(header("PO-1", Some(acme.id)), vec![item(bolt.id, 4, "2.50"), item(nut.id, 2, "1.00")])).await.unwrap();
    let mut outgoing = header("SO-1", None);
    outgoing.order_type = OrderType::Outgoing;
    outgoing.status = OrderStatus::Completed;
    app.orders.create(OrderDraft::new(outgoing, vec![item(bolt.id, 1, "3.00")])).await.unwrap();

    let stats = app.reports.stats().await.unwrap();
    assert_eq!((stats.total_products, stats.low_stock, stats.incoming_orders, stats.outgoing_orders), (2, 1, 1, 0));

    let movements = app.reports.movements(MovementFilter { search: Some("bol".into()), ..Default::default() }).await.unwrap();
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].category_name.as_deref(), Some("Tools"));

    let summary = app.reports.summary(Period::Month).await.unwrap();
    assert_eq!(summary.total_orders, 2);
    assert_eq!(summary.total_value, dec("15.00"));
    assert_eq!(summary.average_order_value, dec("7.50"));
    assert_eq!(summary.low_stock_items, 1);

    let sales = app.reports.sales(Period::Year).await.unwrap();
    assert_eq!(sales.len(), 1);
    assert_eq!(sales[0].value, dec("15.00"));
    assert_eq!(sales[0].date.len(), "2024-01".len());
    assert_eq!(app.reports.sales(Period::Week).await.unwrap()[0].date.len(), "2024-01-01".len());

    let shares = app.reports.categories(Period::Month).await.unwrap();
    assert_eq!(shares.len(), 1);
    assert_eq!((shares[0].name.as_str(), shares[0].value), ("Tools", 2));

    let top = app.reports.top_products(Period::Quarter).await.unwrap();
    assert_eq!(top[0].name, "Bolt");
    assert_eq!(top[0].quantity, 5);
    assert_eq!(top[0].revenue, dec("13.00"));

    let ledger = app.reports.inventory_movement(DateRange::default(), Some(bolt.id)).await.unwrap();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].movement.quantity, 50);

    let balance = app.reports.inventory_balance(Some(tools.id)).await.unwrap();
    assert_eq!(balance.len(), 1);
    assert_eq!(balance[0].location.as_deref(), Some("A1"));

    let completed = app.reports.orders(OrderReportFilter { status: Some(OrderStatus::Completed), ..Default::default() }).await.unwrap();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].total_amount, dec("3.00"));

    let suppliers = app.reports.suppliers(DateRange::default()).await.unwrap();
    assert_eq!((suppliers[0].total_orders, suppliers[0].total_amount), (1, dec("12.00")));
    let old = NaiveDate::from_ymd_opt(2000, 1, 1);
    let none = app.reports.suppliers(DateRange::new(old, old)).await.unwrap();
    assert_eq!((none[0].total_orders, none[0].total_amount), (0, Decimal::ZERO));
}
