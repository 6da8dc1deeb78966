//! In-memory backend for tests and local runs.
//!
//! A transaction owns the state lock for its whole lifetime and keeps a
//! snapshot taken at `begin`. Dropping it without `commit` puts the snapshot
//! back. Holding the lock also serializes transactions, which is stronger
//! than the row lock the Postgres backend takes for adjustments.
//!
//! Constraint checks mirror the schema in `migrations/` and fail with the
//! same error kinds.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{ReportStore, Store, StoreTx, MOVEMENT_LIMIT};
use crate::domain::aggregates::{
    Category, CategoryInput, Employee, EmployeeInput, Invoice, InvoiceInput, LineItem, MovementView, NewLineItem,
    NewStockMovement, Order, OrderHeader, OrderSummary, Product, ProductInput, StockMovement, Supplier, SupplierInput,
};
use crate::domain::reports::{
    average, BalanceRow, CategoryShare, DateRange, MovementFilter, OrderReportFilter, OrderReportRow, PeriodSummary,
    SupplierReportRow, TopProduct, VolumePoint, WarehouseStats,
};
use crate::domain::value_objects::{Bucket, InvoiceStatus, OrderStatus, OrderType};
use crate::domain::MONEY_SCALE;
use crate::{Result, WarehouseError};

/// Stores an amount the way a `NUMERIC(12, 2)` column returns it.
fn cents(mut value: Decimal) -> Decimal {
    value.rescale(MONEY_SCALE);
    value
}

#[derive(Clone, Debug)]
struct OrderRecord {
    id: i64,
    header: OrderHeader,
    created_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
struct ItemRecord {
    id: i64,
    order_id: i64,
    product_id: i64,
    quantity: i32,
    price: Decimal,
}

impl ItemRecord {
    fn total(&self) -> Decimal { self.price * Decimal::from(self.quantity) }
}

#[derive(Clone, Debug)]
struct InvoiceRecord {
    id: i64,
    invoice_number: String,
    supplier_id: Option<i64>,
    invoice_date: NaiveDate,
    amount: Decimal,
    tax_amount: Decimal,
    total_amount: Decimal,
    status: InvoiceStatus,
    created_at: DateTime<Utc>,
}

impl InvoiceRecord {
    fn new(id: i64, input: &InvoiceInput, created_at: DateTime<Utc>) -> Self {
        Self {
            id, invoice_number: input.invoice_number.clone(), supplier_id: input.supplier_id,
            invoice_date: input.invoice_date, amount: cents(input.amount), tax_amount: cents(input.tax_amount),
            total_amount: cents(input.total()), status: input.status, created_at,
        }
    }
}

#[derive(Clone, Debug, Default)]
struct Sequences {
    orders: i64,
    items: i64,
    products: i64,
    movements: i64,
    categories: i64,
    suppliers: i64,
    employees: i64,
    invoices: i64,
}

fn next(seq: &mut i64) -> i64 {
    *seq += 1;
    *seq
}

#[derive(Clone, Debug, Default)]
struct State {
    seq: Sequences,
    orders: BTreeMap<i64, OrderRecord>,
    items: BTreeMap<i64, ItemRecord>,
    products: BTreeMap<i64, Product>,
    movements: Vec<StockMovement>,
    categories: BTreeMap<i64, Category>,
    suppliers: BTreeMap<i64, Supplier>,
    employees: BTreeMap<i64, Employee>,
    invoices: BTreeMap<i64, InvoiceRecord>,
}

fn missing_reference(constraint: &str) -> WarehouseError {
    WarehouseError::validation(format!("referenced record does not exist ({constraint})"))
}

impl State {
    fn category_name(&self, id: Option<i64>) -> Option<String> {
        id.and_then(|id| self.categories.get(&id)).map(|c| c.name.clone())
    }

    fn product_view(&self, p: &Product) -> Product {
        Product { category_name: self.category_name(p.category_id), ..p.clone() }
    }

    fn summary(&self, o: &OrderRecord) -> OrderSummary {
        OrderSummary {
            id: o.id, order_number: o.header.order_number.clone(), supplier_id: o.header.supplier_id,
            supplier_name: self.supplier_name(o.header.supplier_id),
            order_type: o.header.order_type, status: o.header.status, expected_date: o.header.expected_date,
            notes: o.header.notes.clone(), created_at: o.created_at,
        }
    }

    fn supplier_name(&self, id: Option<i64>) -> Option<String> {
        id.and_then(|id| self.suppliers.get(&id)).map(|s| s.name.clone())
    }

    fn order(&self, id: i64) -> Option<Order> {
        let record = self.orders.get(&id)?;
        let items = self
            .items_of(id)
            .filter_map(|i| {
                let p = self.products.get(&i.product_id)?;
                Some(LineItem {
                    id: i.id, order_id: i.order_id, product_id: i.product_id, product_name: p.name.clone(),
                    unit: p.unit.clone(), quantity: i.quantity, price: i.price,
                })
            })
            .collect();
        Some(Order { summary: self.summary(record), items })
    }

    fn invoice(&self, r: &InvoiceRecord) -> Invoice {
        Invoice {
            id: r.id, invoice_number: r.invoice_number.clone(), supplier_id: r.supplier_id,
            supplier_name: self.supplier_name(r.supplier_id), invoice_date: r.invoice_date, amount: r.amount,
            tax_amount: r.tax_amount, total_amount: r.total_amount, status: r.status, created_at: r.created_at,
        }
    }

    fn items_of(&self, order_id: i64) -> impl Iterator<Item = &ItemRecord> {
        self.items.values().filter(move |i| i.order_id == order_id)
    }

    fn order_total(&self, order_id: i64) -> Decimal { self.items_of(order_id).map(ItemRecord::total).sum() }

    fn orders_since(&self, since: DateTime<Utc>) -> impl Iterator<Item = &OrderRecord> {
        self.orders.values().filter(move |o| o.created_at >= since)
    }

    fn items_since(&self, since: DateTime<Utc>) -> impl Iterator<Item = &ItemRecord> + '_ {
        self.items.values().filter(move |i| self.orders.get(&i.order_id).map_or(false, |o| o.created_at >= since))
    }

    fn check_header(&self, header: &OrderHeader, skip: Option<i64>) -> Result<()> {
        if let Some(supplier_id) = header.supplier_id {
            if !self.suppliers.contains_key(&supplier_id) {
                return Err(missing_reference("orders_supplier_id_fkey"));
            }
        }
        if self.orders.values().any(|o| Some(o.id) != skip && o.header.order_number == header.order_number) {
            return Err(WarehouseError::conflict("order number already exists"));
        }
        Ok(())
    }

    fn check_product(&self, input: &ProductInput, skip: Option<i64>) -> Result<()> {
        if let Some(category_id) = input.category_id {
            if !self.categories.contains_key(&category_id) {
                return Err(missing_reference("products_category_id_fkey"));
            }
        }
        if self.products.values().any(|p| Some(p.id) != skip && p.sku == input.sku) {
            return Err(WarehouseError::conflict("a product with this SKU already exists"));
        }
        Ok(())
    }

    fn check_invoice(&self, input: &InvoiceInput, skip: Option<i64>) -> Result<()> {
        if let Some(supplier_id) = input.supplier_id {
            if !self.suppliers.contains_key(&supplier_id) {
                return Err(missing_reference("invoices_supplier_id_fkey"));
            }
        }
        if self.invoices.values().any(|i| Some(i.id) != skip && i.invoice_number == input.invoice_number) {
            return Err(WarehouseError::conflict("invoice number already exists"));
        }
        Ok(())
    }

    fn supplier_references(&self, id: i64) -> i64 {
        let orders = self.orders.values().filter(|o| o.header.supplier_id == Some(id)).count();
        let invoices = self.invoices.values().filter(|i| i.supplier_id == Some(id)).count();
        (orders + invoices) as i64
    }

    fn product_references(&self, id: i64) -> i64 {
        let items = self.items.values().filter(|i| i.product_id == id).count();
        let movements = self.movements.iter().filter(|m| m.product_id == id).count();
        (items + movements) as i64
    }
}

/// Shared in-memory store. Clones share state.
#[derive(Clone, Default)]
pub struct MemoryStore { state: Arc<Mutex<State>> }

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    /// Fixture helper: inserts a product with an opening stock level without
    /// writing a ledger entry.
    pub async fn seed_product(&self, input: ProductInput, quantity: i32) -> Result<Product> {
        let input = input.normalized()?;
        let mut state = self.state.lock().await;
        state.check_product(&input, None)?;
        let id = next(&mut state.seq.products);
        let product = Product {
            id, sku: input.sku, name: input.name, description: input.description, category_id: input.category_id,
            category_name: None, unit: input.unit, price: cents(input.price), quantity, min_quantity: input.min_quantity,
            max_quantity: input.max_quantity, location: input.location, created_at: Utc::now(),
        };
        state.products.insert(id, product.clone());
        Ok(state.product_view(&product))
    }

    /// Fixture helper: moves an order's creation time, for window tests.
    pub async fn backdate_order(&self, id: i64, created_at: DateTime<Utc>) -> Result<()> {
        let mut state = self.state.lock().await;
        let order = state.orders.get_mut(&id).ok_or(WarehouseError::NotFound("Order"))?;
        order.created_at = created_at;
        Ok(())
    }

    /// Number of ledger entries, across all products.
    pub async fn movement_count(&self) -> usize { self.state.lock().await.movements.len() }

    pub async fn movements_for(&self, product_id: i64) -> Vec<StockMovement> {
        self.state.lock().await.movements.iter().filter(|m| m.product_id == product_id).cloned().collect()
    }
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<State>,
    snapshot: Option<State>,
}

impl Drop for MemoryTx {
    fn drop(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            *self.guard = snapshot;
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<MemoryTx> {
        let guard = self.state.clone().lock_owned().await;
        let snapshot = Some(guard.clone());
        Ok(MemoryTx { guard, snapshot })
    }

    async fn list_orders(&self) -> Result<Vec<OrderSummary>> {
        let state = self.state.lock().await;
        let mut orders: Vec<_> = state.orders.values().map(|o| state.summary(o)).collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(orders)
    }

    async fn find_order(&self, id: i64) -> Result<Option<Order>> { Ok(self.state.lock().await.order(id)) }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let state = self.state.lock().await;
        let mut products: Vec<_> = state.products.values().map(|p| state.product_view(p)).collect();
        products.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(products)
    }

    async fn find_product(&self, id: i64) -> Result<Option<Product>> {
        let state = self.state.lock().await;
        Ok(state.products.get(&id).map(|p| state.product_view(p)))
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let state = self.state.lock().await;
        let mut categories: Vec<_> = state.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(categories)
    }

    async fn find_category(&self, id: i64) -> Result<Option<Category>> {
        Ok(self.state.lock().await.categories.get(&id).cloned())
    }

    async fn list_suppliers(&self) -> Result<Vec<Supplier>> {
        let state = self.state.lock().await;
        let mut suppliers: Vec<_> = state.suppliers.values().cloned().collect();
        suppliers.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(suppliers)
    }

    async fn find_supplier(&self, id: i64) -> Result<Option<Supplier>> {
        Ok(self.state.lock().await.suppliers.get(&id).cloned())
    }

    async fn list_employees(&self) -> Result<Vec<Employee>> {
        let state = self.state.lock().await;
        let mut employees: Vec<_> = state.employees.values().cloned().collect();
        employees.sort_by(|a, b| a.full_name.cmp(&b.full_name).then(a.id.cmp(&b.id)));
        Ok(employees)
    }

    async fn find_employee(&self, id: i64) -> Result<Option<Employee>> {
        Ok(self.state.lock().await.employees.get(&id).cloned())
    }

    async fn list_invoices(&self) -> Result<Vec<Invoice>> {
        let state = self.state.lock().await;
        let mut invoices: Vec<_> = state.invoices.values().map(|i| state.invoice(i)).collect();
        invoices.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(invoices)
    }

    async fn find_invoice(&self, id: i64) -> Result<Option<Invoice>> {
        let state = self.state.lock().await;
        Ok(state.invoices.get(&id).map(|i| state.invoice(i)))
    }
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn insert_order(&mut self, header: &OrderHeader) -> Result<i64> {
        let state = &mut *self.guard;
        state.check_header(header, None)?;
        let id = next(&mut state.seq.orders);
        state.orders.insert(id, OrderRecord { id, header: header.clone(), created_at: Utc::now() });
        Ok(id)
    }

    async fn update_order(&mut self, id: i64, header: &OrderHeader) -> Result<u64> {
        let state = &mut *self.guard;
        if !state.orders.contains_key(&id) {
            return Ok(0);
        }
        state.check_header(header, Some(id))?;
        if let Some(order) = state.orders.get_mut(&id) {
            order.header = header.clone();
        }
        Ok(1)
    }

    async fn delete_order(&mut self, id: i64) -> Result<u64> {
        let state = &mut *self.guard;
        if state.orders.remove(&id).is_none() {
            return Ok(0);
        }
        state.items.retain(|_, i| i.order_id != id);
        Ok(1)
    }

    async fn insert_line_item(&mut self, order_id: i64, item: &NewLineItem) -> Result<i64> {
        let state = &mut *self.guard;
        if !state.orders.contains_key(&order_id) {
            return Err(missing_reference("order_items_order_id_fkey"));
        }
        if !state.products.contains_key(&item.product_id) {
            return Err(missing_reference("order_items_product_id_fkey"));
        }
        if item.quantity <= 0 || (item.price.is_sign_negative() && !item.price.is_zero()) {
            return Err(WarehouseError::validation("value rejected by order_items_check"));
        }
        let id = next(&mut state.seq.items);
        state.items.insert(id, ItemRecord { id, order_id, product_id: item.product_id, quantity: item.quantity, price: cents(item.price) });
        Ok(id)
    }

    async fn delete_line_items(&mut self, order_id: i64) -> Result<u64> {
        let before = self.guard.items.len();
        self.guard.items.retain(|_, i| i.order_id != order_id);
        Ok((before - self.guard.items.len()) as u64)
    }

    async fn find_order(&mut self, id: i64) -> Result<Option<Order>> { Ok(self.guard.order(id)) }

    async fn lock_product(&mut self, id: i64) -> Result<Option<Product>> {
        let state = &*self.guard;
        Ok(state.products.get(&id).map(|p| state.product_view(p)))
    }

    async fn set_stock(&mut self, id: i64, quantity: i32, location: Option<&str>) -> Result<u64> {
        if quantity < 0 {
            return Err(WarehouseError::validation("value rejected by products_quantity_check"));
        }
        match self.guard.products.get_mut(&id) {
            Some(p) => {
                p.quantity = quantity;
                p.location = location.map(str::to_string);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn append_movement(&mut self, entry: &NewStockMovement) -> Result<StockMovement> {
        let state = &mut *self.guard;
        if !state.products.contains_key(&entry.product_id()) {
            return Err(missing_reference("stock_movements_product_id_fkey"));
        }
        let id = next(&mut state.seq.movements);
        let movement = entry.clone().into_stored(id, Utc::now());
        state.movements.push(movement.clone());
        Ok(movement)
    }

    async fn insert_product(&mut self, input: &ProductInput) -> Result<i64> {
        let state = &mut *self.guard;
        state.check_product(input, None)?;
        let id = next(&mut state.seq.products);
        state.products.insert(id, Product {
            id, sku: input.sku.clone(), name: input.name.clone(), description: input.description.clone(),
            category_id: input.category_id, category_name: None, unit: input.unit.clone(), price: cents(input.price),
            quantity: 0, min_quantity: input.min_quantity, max_quantity: input.max_quantity,
            location: input.location.clone(), created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn update_product(&mut self, id: i64, input: &ProductInput) -> Result<u64> {
        let state = &mut *self.guard;
        if !state.products.contains_key(&id) {
            return Ok(0);
        }
        state.check_product(input, Some(id))?;
        if let Some(p) = state.products.get_mut(&id) {
            p.sku = input.sku.clone();
            p.name = input.name.clone();
            p.description = input.description.clone();
            p.category_id = input.category_id;
            p.unit = input.unit.clone();
            p.price = cents(input.price);
            p.min_quantity = input.min_quantity;
            p.max_quantity = input.max_quantity;
            p.location = input.location.clone();
        }
        Ok(1)
    }

    async fn product_references(&mut self, id: i64) -> Result<i64> { Ok(self.guard.product_references(id)) }

    async fn delete_product(&mut self, id: i64) -> Result<u64> {
        let state = &mut *self.guard;
        if state.product_references(id) > 0 {
            return Err(WarehouseError::conflict("product is referenced by orders or stock movements"));
        }
        Ok(state.products.remove(&id).map_or(0, |_| 1))
    }

    async fn insert_category(&mut self, input: &CategoryInput) -> Result<i64> {
        let state = &mut *self.guard;
        let id = next(&mut state.seq.categories);
        state.categories.insert(id, Category { id, name: input.name.clone(), description: input.description.clone(), created_at: Utc::now() });
        Ok(id)
    }

    async fn update_category(&mut self, id: i64, input: &CategoryInput) -> Result<u64> {
        match self.guard.categories.get_mut(&id) {
            Some(c) => {
                c.name = input.name.clone();
                c.description = input.description.clone();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn category_product_count(&mut self, id: i64) -> Result<i64> {
        Ok(self.guard.products.values().filter(|p| p.category_id == Some(id)).count() as i64)
    }

    async fn delete_category(&mut self, id: i64) -> Result<u64> {
        let state = &mut *self.guard;
        if state.products.values().any(|p| p.category_id == Some(id)) {
            return Err(WarehouseError::conflict("category still contains products"));
        }
        Ok(state.categories.remove(&id).map_or(0, |_| 1))
    }

    async fn insert_supplier(&mut self, input: &SupplierInput) -> Result<i64> {
        let state = &mut *self.guard;
        let id = next(&mut state.seq.suppliers);
        state.suppliers.insert(id, Supplier {
            id, name: input.name.clone(), contact_person: input.contact_person.clone(), phone: input.phone.clone(),
            email: input.email.clone(), address: input.address.clone(), notes: input.notes.clone(), created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn update_supplier(&mut self, id: i64, input: &SupplierInput) -> Result<u64> {
        match self.guard.suppliers.get_mut(&id) {
            Some(s) => {
                s.name = input.name.clone();
                s.contact_person = input.contact_person.clone();
                s.phone = input.phone.clone();
                s.email = input.email.clone();
                s.address = input.address.clone();
                s.notes = input.notes.clone();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn supplier_references(&mut self, id: i64) -> Result<i64> { Ok(self.guard.supplier_references(id)) }

    async fn delete_supplier(&mut self, id: i64) -> Result<u64> {
        let state = &mut *self.guard;
        if state.supplier_references(id) > 0 {
            return Err(WarehouseError::conflict("supplier has orders or invoices"));
        }
        Ok(state.suppliers.remove(&id).map_or(0, |_| 1))
    }

    async fn insert_employee(&mut self, input: &EmployeeInput) -> Result<Employee> {
        let state = &mut *self.guard;
        let id = next(&mut state.seq.employees);
        let employee = Employee {
            id, full_name: input.full_name.clone(), position: input.position.clone(), email: input.email.clone(),
            phone: input.phone.clone(), hire_date: input.hire_date, salary: input.salary.map(cents), status: input.status,
            created_at: Utc::now(),
        };
        state.employees.insert(id, employee.clone());
        Ok(employee)
    }

    async fn update_employee(&mut self, id: i64, input: &EmployeeInput) -> Result<Option<Employee>> {
        let Some(e) = self.guard.employees.get_mut(&id) else { return Ok(None) };
        e.full_name = input.full_name.clone();
        e.position = input.position.clone();
        e.email = input.email.clone();
        e.phone = input.phone.clone();
        e.hire_date = input.hire_date;
        e.salary = input.salary.map(cents);
        e.status = input.status;
        Ok(Some(e.clone()))
    }

    async fn delete_employee(&mut self, id: i64) -> Result<u64> {
        Ok(self.guard.employees.remove(&id).map_or(0, |_| 1))
    }

    async fn insert_invoice(&mut self, input: &InvoiceInput) -> Result<i64> {
        let state = &mut *self.guard;
        state.check_invoice(input, None)?;
        let id = next(&mut state.seq.invoices);
        state.invoices.insert(id, InvoiceRecord::new(id, input, Utc::now()));
        Ok(id)
    }

    async fn update_invoice(&mut self, id: i64, input: &InvoiceInput) -> Result<u64> {
        let state = &mut *self.guard;
        if !state.invoices.contains_key(&id) {
            return Ok(0);
        }
        state.check_invoice(input, Some(id))?;
        if let Some(record) = state.invoices.get_mut(&id) {
            *record = InvoiceRecord::new(id, input, record.created_at);
        }
        Ok(1)
    }

    async fn find_invoice(&mut self, id: i64) -> Result<Option<Invoice>> {
        let state = &*self.guard;
        Ok(state.invoices.get(&id).map(|i| state.invoice(i)))
    }

    async fn delete_invoice(&mut self, id: i64) -> Result<u64> {
        Ok(self.guard.invoices.remove(&id).map_or(0, |_| 1))
    }

    async fn commit(mut self) -> Result<()> {
        self.snapshot = None;
        Ok(())
    }

    async fn rollback(self) -> Result<()> { Ok(()) }
}

#[async_trait]
impl ReportStore for MemoryStore {
    async fn warehouse_stats(&self) -> Result<WarehouseStats> {
        let state = self.state.lock().await;
        let pending = |t: OrderType| {
            state.orders.values().filter(|o| o.header.status == OrderStatus::Pending && o.header.order_type == t).count() as i64
        };
        Ok(WarehouseStats {
            total_products: state.products.len() as i64,
            low_stock: state.products.values().filter(|p| p.is_low_stock()).count() as i64,
            incoming_orders: pending(OrderType::Incoming),
            outgoing_orders: pending(OrderType::Outgoing),
        })
    }

    async fn movements(&self, filter: &MovementFilter) -> Result<Vec<MovementView>> {
        let state = self.state.lock().await;
        let needle = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_lowercase);
        let mut rows: Vec<MovementView> = state
            .movements
            .iter()
            .filter(|m| filter.range.contains(m.created_at))
            .filter(|m| filter.product_id.map_or(true, |id| m.product_id == id))
            .filter_map(|m| {
                let product = state.products.get(&m.product_id);
                if let Some(needle) = &needle {
                    if !product.map_or(false, |p| p.name.to_lowercase().contains(needle)) {
                        return None;
                    }
                }
                Some(MovementView {
                    movement: m.clone(),
                    product_name: product.map(|p| p.name.clone()),
                    unit: product.map(|p| p.unit.clone()),
                    category_name: product.and_then(|p| state.category_name(p.category_id)),
                })
            })
            .collect();
        rows.sort_by(|a, b| b.movement.created_at.cmp(&a.movement.created_at).then(b.movement.id.cmp(&a.movement.id)));
        rows.truncate(filter.limit.unwrap_or(MOVEMENT_LIMIT).max(0) as usize);
        Ok(rows)
    }

    async fn period_summary(&self, since: DateTime<Utc>) -> Result<PeriodSummary> {
        let state = self.state.lock().await;
        let (total_orders, total_value) = state
            .orders_since(since)
            .fold((0i64, Decimal::ZERO), |(n, sum), o| (n + 1, sum + state.order_total(o.id)));
        Ok(PeriodSummary {
            total_orders, total_value, average_order_value: average(total_value, total_orders),
            low_stock_items: state.products.values().filter(|p| p.is_low_stock()).count() as i64,
        })
    }

    async fn order_volume(&self, since: DateTime<Utc>, bucket: Bucket) -> Result<Vec<VolumePoint>> {
        let state = self.state.lock().await;
        let mut buckets: BTreeMap<String, Decimal> = BTreeMap::new();
        for order in state.orders_since(since) {
            *buckets.entry(bucket.label(order.created_at)).or_default() += state.order_total(order.id);
        }
        Ok(buckets.into_iter().map(|(date, value)| VolumePoint { date, value }).collect())
    }

    async fn category_distribution(&self, since: DateTime<Utc>) -> Result<Vec<CategoryShare>> {
        let state = self.state.lock().await;
        let mut counts: HashMap<i64, i64> = HashMap::new();
        for item in state.items_since(since) {
            if let Some(category_id) = state.products.get(&item.product_id).and_then(|p| p.category_id) {
                *counts.entry(category_id).or_default() += 1;
            }
        }
        let mut shares: Vec<CategoryShare> = counts
            .into_iter()
            .filter_map(|(id, value)| state.categories.get(&id).map(|c| CategoryShare { name: c.name.clone(), value }))
            .collect();
        shares.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.name.cmp(&b.name)));
        Ok(shares)
    }

    async fn top_products(&self, since: DateTime<Utc>, limit: i64) -> Result<Vec<TopProduct>> {
        let state = self.state.lock().await;
        let mut totals: HashMap<i64, (i64, Decimal)> = HashMap::new();
        for item in state.items_since(since) {
            let entry = totals.entry(item.product_id).or_default();
            entry.0 += i64::from(item.quantity);
            entry.1 += item.total();
        }
        let mut top: Vec<TopProduct> = totals
            .into_iter()
            .filter_map(|(id, (quantity, revenue))| {
                state.products.get(&id).map(|p| TopProduct { product_id: id, name: p.name.clone(), quantity, revenue })
            })
            .collect();
        top.sort_by(|a, b| b.quantity.cmp(&a.quantity).then_with(|| a.name.cmp(&b.name)));
        top.truncate(limit.max(0) as usize);
        Ok(top)
    }

    async fn inventory_balance(&self, category_id: Option<i64>) -> Result<Vec<BalanceRow>> {
        let state = self.state.lock().await;
        let mut rows: Vec<BalanceRow> = state
            .products
            .values()
            .filter(|p| category_id.map_or(true, |c| p.category_id == Some(c)))
            .map(|p| BalanceRow {
                id: p.id, product_name: p.name.clone(), category_name: state.category_name(p.category_id),
                quantity: p.quantity, min_quantity: p.min_quantity, max_quantity: p.max_quantity, location: p.location.clone(),
            })
            .collect();
        rows.sort_by(|a, b| a.product_name.cmp(&b.product_name).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn orders_report(&self, filter: &OrderReportFilter) -> Result<Vec<OrderReportRow>> {
        let state = self.state.lock().await;
        let mut rows: Vec<OrderReportRow> = state
            .orders
            .values()
            .filter(|o| filter.range.contains(o.created_at))
            .filter(|o| filter.status.map_or(true, |s| o.header.status == s))
            .map(|o| {
                let summary = state.summary(o);
                OrderReportRow {
                    id: o.id, order_number: summary.order_number, order_type: summary.order_type, status: summary.status,
                    supplier_name: summary.supplier_name, expected_date: summary.expected_date, created_at: o.created_at,
                    total_amount: state.order_total(o.id), notes: summary.notes,
                }
            })
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn suppliers_report(&self, range: &DateRange) -> Result<Vec<SupplierReportRow>> {
        let state = self.state.lock().await;
        let mut rows: Vec<SupplierReportRow> = state
            .suppliers
            .values()
            .map(|s| {
                let orders: Vec<&OrderRecord> = state
                    .orders
                    .values()
                    .filter(|o| o.header.supplier_id == Some(s.id) && range.contains(o.created_at))
                    .collect();
                SupplierReportRow {
                    id: s.id, name: s.name.clone(), contact_person: s.contact_person.clone(), email: s.email.clone(),
                    phone: s.phone.clone(), total_orders: orders.len() as i64,
                    total_amount: orders.iter().map(|o| state.order_total(o.id)).sum(),
                }
            })
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(rows)
    }
}
