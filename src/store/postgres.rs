//! PostgreSQL backend. Every value reaches the database as a bound parameter.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder, Transaction};

use super::{ReportStore, Store, StoreTx, MOVEMENT_LIMIT};
use crate::domain::aggregates::{
    Category, CategoryInput, Employee, EmployeeInput, Invoice, InvoiceInput, LineItem, MovementView, NewLineItem,
    NewStockMovement, Order, OrderHeader, OrderSummary, Product, ProductInput, StockMovement, Supplier, SupplierInput,
};
use crate::domain::reports::{
    average, BalanceRow, CategoryShare, DateRange, MovementFilter, OrderReportFilter, OrderReportRow, PeriodSummary,
    SupplierReportRow, TopProduct, VolumePoint, WarehouseStats,
};
use crate::domain::value_objects::{Bucket, UnknownVariant};
use crate::{Result, WarehouseError};

const ORDER_SELECT: &str = "SELECT o.id, o.order_number, o.supplier_id, s.name AS supplier_name, o.order_type, o.status, \
     o.expected_date, o.notes, o.created_at FROM orders o LEFT JOIN suppliers s ON o.supplier_id = s.id";

const ITEM_SELECT: &str = "SELECT oi.id, oi.order_id, oi.product_id, p.name AS product_name, p.unit, oi.quantity, oi.price \
     FROM order_items oi JOIN products p ON oi.product_id = p.id";

const PRODUCT_SELECT: &str = "SELECT p.id, p.sku, p.name, p.description, p.category_id, c.name AS category_name, p.unit, \
     p.price, p.quantity, p.min_quantity, p.max_quantity, p.location, p.created_at \
     FROM products p LEFT JOIN categories c ON p.category_id = c.id";

const EMPLOYEE_COLUMNS: &str = "id, full_name, position, email, phone, hire_date, salary, status, created_at";

const INVOICE_SELECT: &str = "SELECT i.id, i.invoice_number, i.supplier_id, s.name AS supplier_name, i.invoice_date, \
     i.amount, i.tax_amount, i.total_amount, i.status, i.created_at FROM invoices i LEFT JOIN suppliers s ON i.supplier_id = s.id";

// =============================================================================
// Row mapping
// =============================================================================

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i64,
    order_number: String,
    supplier_id: Option<i64>,
    supplier_name: Option<String>,
    order_type: String,
    status: String,
    expected_date: Option<NaiveDate>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for OrderSummary {
    type Error = UnknownVariant;
    fn try_from(r: OrderRow) -> std::result::Result<Self, Self::Error> {
        Ok(OrderSummary {
            id: r.id, order_number: r.order_number, supplier_id: r.supplier_id, supplier_name: r.supplier_name,
            order_type: r.order_type.parse()?, status: r.status.parse()?, expected_date: r.expected_date,
            notes: r.notes, created_at: r.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct EmployeeRow {
    id: i64,
    full_name: String,
    position: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    hire_date: Option<NaiveDate>,
    salary: Option<Decimal>,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<EmployeeRow> for Employee {
    type Error = UnknownVariant;
    fn try_from(r: EmployeeRow) -> std::result::Result<Self, Self::Error> {
        Ok(Employee {
            id: r.id, full_name: r.full_name, position: r.position, email: r.email, phone: r.phone,
            hire_date: r.hire_date, salary: r.salary, status: r.status.parse()?, created_at: r.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct InvoiceRow {
    id: i64,
    invoice_number: String,
    supplier_id: Option<i64>,
    supplier_name: Option<String>,
    invoice_date: NaiveDate,
    amount: Decimal,
    tax_amount: Decimal,
    total_amount: Decimal,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<InvoiceRow> for Invoice {
    type Error = UnknownVariant;
    fn try_from(r: InvoiceRow) -> std::result::Result<Self, Self::Error> {
        Ok(Invoice {
            id: r.id, invoice_number: r.invoice_number, supplier_id: r.supplier_id, supplier_name: r.supplier_name,
            invoice_date: r.invoice_date, amount: r.amount, tax_amount: r.tax_amount, total_amount: r.total_amount,
            status: r.status.parse()?, created_at: r.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct MovementRow {
    id: i64,
    product_id: i64,
    quantity: i32,
    movement_type: String,
    reference_type: String,
    reference_id: Option<i64>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    product_name: Option<String>,
    unit: Option<String>,
    category_name: Option<String>,
}

impl TryFrom<MovementRow> for MovementView {
    type Error = UnknownVariant;
    fn try_from(r: MovementRow) -> std::result::Result<Self, Self::Error> {
        Ok(MovementView {
            movement: StockMovement {
                id: r.id, product_id: r.product_id, quantity: r.quantity, movement_type: r.movement_type.parse()?,
                reference_type: r.reference_type.parse()?, reference_id: r.reference_id, notes: r.notes,
                created_at: r.created_at,
            },
            product_name: r.product_name, unit: r.unit, category_name: r.category_name,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OrderReportDbRow {
    id: i64,
    order_number: String,
    order_type: String,
    status: String,
    supplier_name: Option<String>,
    expected_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    total_amount: Decimal,
    notes: Option<String>,
}

impl TryFrom<OrderReportDbRow> for OrderReportRow {
    type Error = UnknownVariant;
    fn try_from(r: OrderReportDbRow) -> std::result::Result<Self, Self::Error> {
        Ok(OrderReportRow {
            id: r.id, order_number: r.order_number, order_type: r.order_type.parse()?, status: r.status.parse()?,
            supplier_name: r.supplier_name, expected_date: r.expected_date, created_at: r.created_at,
            total_amount: r.total_amount, notes: r.notes,
        })
    }
}

fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>>
where
    T: TryFrom<R, Error = UnknownVariant>,
{
    rows.into_iter().map(|r| T::try_from(r).map_err(WarehouseError::from)).collect()
}

/// Unique violations become a `Conflict` with a readable message.
fn unique_conflict(message: &'static str) -> impl FnOnce(sqlx::Error) -> WarehouseError {
    move |err| match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => WarehouseError::conflict(message),
        _ => err.into(),
    }
}

/// Foreign-key violations while deleting mean the row is still referenced.
fn still_referenced(message: &'static str) -> impl FnOnce(sqlx::Error) -> WarehouseError {
    move |err| match &err {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => WarehouseError::conflict(message),
        _ => err.into(),
    }
}

fn convert_one<R, T>(row: Option<R>) -> Result<Option<T>>
where
    T: TryFrom<R, Error = UnknownVariant>,
{
    row.map(|r| T::try_from(r).map_err(WarehouseError::from)).transpose()
}

/// Header plus items over one connection, so a transaction sees its own writes.
async fn fetch_order(conn: &mut PgConnection, id: i64) -> Result<Option<Order>> {
    let Some(row) = sqlx::query_as::<_, OrderRow>(&format!("{ORDER_SELECT} WHERE o.id = $1"))
        .bind(id).fetch_optional(&mut *conn).await? else { return Ok(None) };
    let items = sqlx::query_as::<_, LineItem>(&format!("{ITEM_SELECT} WHERE oi.order_id = $1 ORDER BY oi.id"))
        .bind(id).fetch_all(&mut *conn).await?;
    Ok(Some(Order { summary: row.try_into()?, items }))
}

async fn fetch_invoice(conn: &mut PgConnection, id: i64) -> Result<Option<Invoice>> {
    let row = sqlx::query_as::<_, InvoiceRow>(&format!("{INVOICE_SELECT} WHERE i.id = $1")).bind(id).fetch_optional(conn).await?;
    convert_one(row)
}

fn like_pattern(search: &str) -> String {
    let escaped = search.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
    format!("%{escaped}%")
}

// =============================================================================
// Store
// =============================================================================

#[derive(Clone)]
pub struct PgStore { pool: PgPool }

impl PgStore {
    pub fn new(pool: PgPool) -> Self { Self { pool } }

    /// Fixed-size pool; acquirers queue until a connection frees up or the timeout elapses.
    pub async fn connect(url: &str, max_connections: u32, acquire_timeout: Duration) -> Result<Self> {
        let pool = PgPoolOptions::new().max_connections(max_connections).acquire_timeout(acquire_timeout).connect(url).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool { &self.pool }
}

pub struct PgTx { tx: Transaction<'static, Postgres> }

#[async_trait]
impl Store for PgStore {
    type Tx = PgTx;

    async fn begin(&self) -> Result<PgTx> {
        Ok(PgTx { tx: self.pool.begin().await? })
    }

    async fn list_orders(&self) -> Result<Vec<OrderSummary>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!("{ORDER_SELECT} ORDER BY o.created_at DESC, o.id DESC"))
            .fetch_all(&self.pool).await?;
        convert_all(rows)
    }

    async fn find_order(&self, id: i64) -> Result<Option<Order>> {
        let mut conn = self.pool.acquire().await?;
        fetch_order(&mut conn, id).await
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        Ok(sqlx::query_as::<_, Product>(&format!("{PRODUCT_SELECT} ORDER BY p.name, p.id")).fetch_all(&self.pool).await?)
    }

    async fn find_product(&self, id: i64) -> Result<Option<Product>> {
        Ok(sqlx::query_as::<_, Product>(&format!("{PRODUCT_SELECT} WHERE p.id = $1")).bind(id).fetch_optional(&self.pool).await?)
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        Ok(sqlx::query_as::<_, Category>("SELECT id, name, description, created_at FROM categories ORDER BY name, id").fetch_all(&self.pool).await?)
    }

    async fn find_category(&self, id: i64) -> Result<Option<Category>> {
        Ok(sqlx::query_as::<_, Category>("SELECT id, name, description, created_at FROM categories WHERE id = $1")
            .bind(id).fetch_optional(&self.pool).await?)
    }

    async fn list_suppliers(&self) -> Result<Vec<Supplier>> {
        Ok(sqlx::query_as::<_, Supplier>("SELECT id, name, contact_person, phone, email, address, notes, created_at FROM suppliers ORDER BY name, id")
            .fetch_all(&self.pool).await?)
    }

    async fn find_supplier(&self, id: i64) -> Result<Option<Supplier>> {
        Ok(sqlx::query_as::<_, Supplier>("SELECT id, name, contact_person, phone, email, address, notes, created_at FROM suppliers WHERE id = $1")
            .bind(id).fetch_optional(&self.pool).await?)
    }

    async fn list_employees(&self) -> Result<Vec<Employee>> {
        let rows = sqlx::query_as::<_, EmployeeRow>(&format!("SELECT {EMPLOYEE_COLUMNS} FROM employees ORDER BY full_name, id"))
            .fetch_all(&self.pool).await?;
        convert_all(rows)
    }

    async fn find_employee(&self, id: i64) -> Result<Option<Employee>> {
        let row = sqlx::query_as::<_, EmployeeRow>(&format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = $1"))
            .bind(id).fetch_optional(&self.pool).await?;
        convert_one(row)
    }

    async fn list_invoices(&self) -> Result<Vec<Invoice>> {
        let rows = sqlx::query_as::<_, InvoiceRow>(&format!("{INVOICE_SELECT} ORDER BY i.created_at DESC, i.id DESC"))
            .fetch_all(&self.pool).await?;
        convert_all(rows)
    }

    async fn find_invoice(&self, id: i64) -> Result<Option<Invoice>> {
        let mut conn = self.pool.acquire().await?;
        fetch_invoice(&mut conn, id).await
    }
}

// =============================================================================
// Transaction
// =============================================================================

#[async_trait]
impl StoreTx for PgTx {
    async fn insert_order(&mut self, h: &OrderHeader) -> Result<i64> {
        sqlx::query_scalar::<_, i64>("INSERT INTO orders (order_number, supplier_id, order_type, status, expected_date, notes) VALUES ($1, $2, $3, $4, $5, $6) RETURNING id")
            .bind(&h.order_number).bind(h.supplier_id).bind(h.order_type.as_str()).bind(h.status.as_str()).bind(h.expected_date).bind(&h.notes)
            .fetch_one(&mut *self.tx).await.map_err(unique_conflict("order number already exists"))
    }

    async fn update_order(&mut self, id: i64, h: &OrderHeader) -> Result<u64> {
        let done = sqlx::query("UPDATE orders SET order_number = $1, supplier_id = $2, order_type = $3, status = $4, expected_date = $5, notes = $6 WHERE id = $7")
            .bind(&h.order_number).bind(h.supplier_id).bind(h.order_type.as_str()).bind(h.status.as_str()).bind(h.expected_date).bind(&h.notes).bind(id)
            .execute(&mut *self.tx).await.map_err(unique_conflict("order number already exists"))?;
        Ok(done.rows_affected())
    }

    async fn delete_order(&mut self, id: i64) -> Result<u64> {
        Ok(sqlx::query("DELETE FROM orders WHERE id = $1").bind(id).execute(&mut *self.tx).await?.rows_affected())
    }

    async fn insert_line_item(&mut self, order_id: i64, item: &NewLineItem) -> Result<i64> {
        Ok(sqlx::query_scalar::<_, i64>("INSERT INTO order_items (order_id, product_id, quantity, price) VALUES ($1, $2, $3, $4) RETURNING id")
            .bind(order_id).bind(item.product_id).bind(item.quantity).bind(item.price)
            .fetch_one(&mut *self.tx).await?)
    }

    async fn delete_line_items(&mut self, order_id: i64) -> Result<u64> {
        Ok(sqlx::query("DELETE FROM order_items WHERE order_id = $1").bind(order_id).execute(&mut *self.tx).await?.rows_affected())
    }

    async fn find_order(&mut self, id: i64) -> Result<Option<Order>> { fetch_order(&mut self.tx, id).await }

    async fn lock_product(&mut self, id: i64) -> Result<Option<Product>> {
        Ok(sqlx::query_as::<_, Product>(&format!("{PRODUCT_SELECT} WHERE p.id = $1 FOR UPDATE OF p"))
            .bind(id).fetch_optional(&mut *self.tx).await?)
    }

    async fn set_stock(&mut self, id: i64, quantity: i32, location: Option<&str>) -> Result<u64> {
        Ok(sqlx::query("UPDATE products SET quantity = $1, location = $2 WHERE id = $3")
            .bind(quantity).bind(location).bind(id).execute(&mut *self.tx).await?.rows_affected())
    }

    async fn append_movement(&mut self, entry: &NewStockMovement) -> Result<StockMovement> {
        let (id, created_at) = sqlx::query_as::<_, (i64, DateTime<Utc>)>(
            "INSERT INTO stock_movements (product_id, quantity, movement_type, reference_type, reference_id, notes) VALUES ($1, $2, $3, $4, $5, $6) RETURNING id, created_at")
            .bind(entry.product_id()).bind(entry.quantity()).bind(entry.movement_type().as_str())
            .bind(entry.reference_type().as_str()).bind(entry.reference_id()).bind(entry.notes())
            .fetch_one(&mut *self.tx).await?;
        Ok(entry.clone().into_stored(id, created_at))
    }

    async fn insert_product(&mut self, p: &ProductInput) -> Result<i64> {
        sqlx::query_scalar::<_, i64>("INSERT INTO products (sku, name, description, category_id, unit, price, min_quantity, max_quantity, location) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING id")
            .bind(&p.sku).bind(&p.name).bind(&p.description).bind(p.category_id).bind(&p.unit).bind(p.price).bind(p.min_quantity).bind(p.max_quantity).bind(&p.location)
            .fetch_one(&mut *self.tx).await.map_err(unique_conflict("a product with this SKU already exists"))
    }

    async fn update_product(&mut self, id: i64, p: &ProductInput) -> Result<u64> {
        let done = sqlx::query("UPDATE products SET sku = $1, name = $2, description = $3, category_id = $4, unit = $5, price = $6, min_quantity = $7, max_quantity = $8, location = $9 WHERE id = $10")
            .bind(&p.sku).bind(&p.name).bind(&p.description).bind(p.category_id).bind(&p.unit).bind(p.price).bind(p.min_quantity).bind(p.max_quantity).bind(&p.location).bind(id)
            .execute(&mut *self.tx).await.map_err(unique_conflict("a product with this SKU already exists"))?;
        Ok(done.rows_affected())
    }

    async fn product_references(&mut self, id: i64) -> Result<i64> {
        Ok(sqlx::query_scalar::<_, i64>("SELECT (SELECT COUNT(*) FROM order_items WHERE product_id = $1) + (SELECT COUNT(*) FROM stock_movements WHERE product_id = $1)")
            .bind(id).fetch_one(&mut *self.tx).await?)
    }

    async fn delete_product(&mut self, id: i64) -> Result<u64> {
        let done = sqlx::query("DELETE FROM products WHERE id = $1").bind(id).execute(&mut *self.tx).await
            .map_err(still_referenced("product is referenced by orders or stock movements"))?;
        Ok(done.rows_affected())
    }

    async fn insert_category(&mut self, c: &CategoryInput) -> Result<i64> {
        Ok(sqlx::query_scalar::<_, i64>("INSERT INTO categories (name, description) VALUES ($1, $2) RETURNING id")
            .bind(&c.name).bind(&c.description).fetch_one(&mut *self.tx).await?)
    }

    async fn update_category(&mut self, id: i64, c: &CategoryInput) -> Result<u64> {
        Ok(sqlx::query("UPDATE categories SET name = $1, description = $2 WHERE id = $3")
            .bind(&c.name).bind(&c.description).bind(id).execute(&mut *self.tx).await?.rows_affected())
    }

    async fn category_product_count(&mut self, id: i64) -> Result<i64> {
        Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products WHERE category_id = $1").bind(id).fetch_one(&mut *self.tx).await?)
    }

    async fn delete_category(&mut self, id: i64) -> Result<u64> {
        let done = sqlx::query("DELETE FROM categories WHERE id = $1").bind(id).execute(&mut *self.tx).await
            .map_err(still_referenced("category still contains products"))?;
        Ok(done.rows_affected())
    }

    async fn insert_supplier(&mut self, s: &SupplierInput) -> Result<i64> {
        Ok(sqlx::query_scalar::<_, i64>("INSERT INTO suppliers (name, contact_person, phone, email, address, notes) VALUES ($1, $2, $3, $4, $5, $6) RETURNING id")
            .bind(&s.name).bind(&s.contact_person).bind(&s.phone).bind(&s.email).bind(&s.address).bind(&s.notes)
            .fetch_one(&mut *self.tx).await?)
    }

    async fn update_supplier(&mut self, id: i64, s: &SupplierInput) -> Result<u64> {
        Ok(sqlx::query("UPDATE suppliers SET name = $1, contact_person = $2, phone = $3, email = $4, address = $5, notes = $6 WHERE id = $7")
            .bind(&s.name).bind(&s.contact_person).bind(&s.phone).bind(&s.email).bind(&s.address).bind(&s.notes).bind(id)
            .execute(&mut *self.tx).await?.rows_affected())
    }

    async fn supplier_references(&mut self, id: i64) -> Result<i64> {
        Ok(sqlx::query_scalar::<_, i64>("SELECT (SELECT COUNT(*) FROM orders WHERE supplier_id = $1) + (SELECT COUNT(*) FROM invoices WHERE supplier_id = $1)")
            .bind(id).fetch_one(&mut *self.tx).await?)
    }

    async fn delete_supplier(&mut self, id: i64) -> Result<u64> {
        let done = sqlx::query("DELETE FROM suppliers WHERE id = $1").bind(id).execute(&mut *self.tx).await
            .map_err(still_referenced("supplier has orders or invoices"))?;
        Ok(done.rows_affected())
    }

    async fn insert_employee(&mut self, e: &EmployeeInput) -> Result<Employee> {
        let row = sqlx::query_as::<_, EmployeeRow>(&format!(
            "INSERT INTO employees (full_name, position, email, phone, hire_date, salary, status) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {EMPLOYEE_COLUMNS}"))
            .bind(&e.full_name).bind(&e.position).bind(&e.email).bind(&e.phone).bind(e.hire_date).bind(e.salary).bind(e.status.as_str())
            .fetch_one(&mut *self.tx).await?;
        Ok(row.try_into()?)
    }

    async fn update_employee(&mut self, id: i64, e: &EmployeeInput) -> Result<Option<Employee>> {
        let row = sqlx::query_as::<_, EmployeeRow>(&format!(
            "UPDATE employees SET full_name = $1, position = $2, email = $3, phone = $4, hire_date = $5, salary = $6, status = $7 WHERE id = $8 RETURNING {EMPLOYEE_COLUMNS}"))
            .bind(&e.full_name).bind(&e.position).bind(&e.email).bind(&e.phone).bind(e.hire_date).bind(e.salary).bind(e.status.as_str()).bind(id)
            .fetch_optional(&mut *self.tx).await?;
        convert_one(row)
    }

    async fn delete_employee(&mut self, id: i64) -> Result<u64> {
        Ok(sqlx::query("DELETE FROM employees WHERE id = $1").bind(id).execute(&mut *self.tx).await?.rows_affected())
    }

    async fn insert_invoice(&mut self, i: &InvoiceInput) -> Result<i64> {
        sqlx::query_scalar::<_, i64>("INSERT INTO invoices (invoice_number, supplier_id, invoice_date, amount, tax_amount, total_amount, status) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id")
            .bind(&i.invoice_number).bind(i.supplier_id).bind(i.invoice_date).bind(i.amount).bind(i.tax_amount).bind(i.total()).bind(i.status.as_str())
            .fetch_one(&mut *self.tx).await.map_err(unique_conflict("invoice number already exists"))
    }

    async fn update_invoice(&mut self, id: i64, i: &InvoiceInput) -> Result<u64> {
        let done = sqlx::query("UPDATE invoices SET invoice_number = $1, supplier_id = $2, invoice_date = $3, amount = $4, tax_amount = $5, total_amount = $6, status = $7 WHERE id = $8")
            .bind(&i.invoice_number).bind(i.supplier_id).bind(i.invoice_date).bind(i.amount).bind(i.tax_amount).bind(i.total()).bind(i.status.as_str()).bind(id)
            .execute(&mut *self.tx).await.map_err(unique_conflict("invoice number already exists"))?;
        Ok(done.rows_affected())
    }

    async fn find_invoice(&mut self, id: i64) -> Result<Option<Invoice>> { fetch_invoice(&mut self.tx, id).await }

    async fn delete_invoice(&mut self, id: i64) -> Result<u64> {
        Ok(sqlx::query("DELETE FROM invoices WHERE id = $1").bind(id).execute(&mut *self.tx).await?.rows_affected())
    }

    async fn commit(self) -> Result<()> { Ok(self.tx.commit().await?) }

    async fn rollback(self) -> Result<()> { Ok(self.tx.rollback().await?) }
}

// =============================================================================
// Reports
// =============================================================================

#[async_trait]
impl ReportStore for PgStore {
    async fn warehouse_stats(&self) -> Result<WarehouseStats> {
        Ok(sqlx::query_as::<_, WarehouseStats>(
            "SELECT (SELECT COUNT(*) FROM products) AS total_products, \
                    (SELECT COUNT(*) FROM products WHERE quantity <= min_quantity) AS low_stock, \
                    (SELECT COUNT(*) FROM orders WHERE status = 'pending' AND order_type = 'incoming') AS incoming_orders, \
                    (SELECT COUNT(*) FROM orders WHERE status = 'pending' AND order_type = 'outgoing') AS outgoing_orders")
            .fetch_one(&self.pool).await?)
    }

    async fn movements(&self, filter: &MovementFilter) -> Result<Vec<MovementView>> {
        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT sm.id, sm.product_id, sm.quantity, sm.movement_type, sm.reference_type, sm.reference_id, sm.notes, sm.created_at, \
                    p.name AS product_name, p.unit, c.name AS category_name \
             FROM stock_movements sm LEFT JOIN products p ON sm.product_id = p.id LEFT JOIN categories c ON p.category_id = c.id \
             WHERE TRUE");
        if let Some(from) = filter.range.from_ts() { qb.push(" AND sm.created_at >= ").push_bind(from); }
        if let Some(until) = filter.range.until_ts() { qb.push(" AND sm.created_at < ").push_bind(until); }
        if let Some(product_id) = filter.product_id { qb.push(" AND sm.product_id = ").push_bind(product_id); }
        if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
            qb.push(" AND p.name ILIKE ").push_bind(like_pattern(search.trim()));
        }
        qb.push(" ORDER BY sm.created_at DESC, sm.id DESC LIMIT ").push_bind(filter.limit.unwrap_or(MOVEMENT_LIMIT));
        let rows = qb.build_query_as::<MovementRow>().fetch_all(&self.pool).await?;
        convert_all(rows)
    }

    async fn period_summary(&self, since: DateTime<Utc>) -> Result<PeriodSummary> {
        let (total_orders, total_value, low_stock_items) = sqlx::query_as::<_, (i64, Decimal, i64)>(
            "WITH totals AS ( \
                 SELECT o.id, COALESCE(SUM(oi.quantity * oi.price), 0) AS total \
                 FROM orders o LEFT JOIN order_items oi ON oi.order_id = o.id \
                 WHERE o.created_at >= $1 GROUP BY o.id) \
             SELECT (SELECT COUNT(*) FROM totals), \
                    (SELECT COALESCE(SUM(total), 0) FROM totals), \
                    (SELECT COUNT(*) FROM products WHERE quantity <= min_quantity)")
            .bind(since).fetch_one(&self.pool).await?;
        Ok(PeriodSummary { total_orders, total_value, average_order_value: average(total_value, total_orders), low_stock_items })
    }

    async fn order_volume(&self, since: DateTime<Utc>, bucket: Bucket) -> Result<Vec<VolumePoint>> {
        Ok(sqlx::query_as::<_, VolumePoint>(
            "SELECT to_char(o.created_at AT TIME ZONE 'UTC', $1) AS date, COALESCE(SUM(oi.quantity * oi.price), 0) AS value \
             FROM orders o LEFT JOIN order_items oi ON oi.order_id = o.id \
             WHERE o.created_at >= $2 GROUP BY 1 ORDER BY 1")
            .bind(bucket.pg_pattern()).bind(since).fetch_all(&self.pool).await?)
    }

    async fn category_distribution(&self, since: DateTime<Utc>) -> Result<Vec<CategoryShare>> {
        Ok(sqlx::query_as::<_, CategoryShare>(
            "SELECT c.name, COUNT(oi.id) AS value \
             FROM order_items oi JOIN products p ON oi.product_id = p.id JOIN categories c ON p.category_id = c.id \
             JOIN orders o ON oi.order_id = o.id \
             WHERE o.created_at >= $1 GROUP BY c.id, c.name ORDER BY value DESC, c.name")
            .bind(since).fetch_all(&self.pool).await?)
    }

    async fn top_products(&self, since: DateTime<Utc>, limit: i64) -> Result<Vec<TopProduct>> {
        Ok(sqlx::query_as::<_, TopProduct>(
            "SELECT p.id AS product_id, p.name, SUM(oi.quantity)::BIGINT AS quantity, SUM(oi.quantity * oi.price) AS revenue \
             FROM order_items oi JOIN products p ON oi.product_id = p.id JOIN orders o ON oi.order_id = o.id \
             WHERE o.created_at >= $1 GROUP BY p.id, p.name ORDER BY quantity DESC, p.name LIMIT $2")
            .bind(since).bind(limit).fetch_all(&self.pool).await?)
    }

    async fn inventory_balance(&self, category_id: Option<i64>) -> Result<Vec<BalanceRow>> {
        Ok(sqlx::query_as::<_, BalanceRow>(
            "SELECT p.id, p.name AS product_name, c.name AS category_name, p.quantity, p.min_quantity, p.max_quantity, p.location \
             FROM products p LEFT JOIN categories c ON p.category_id = c.id \
             WHERE ($1::BIGINT IS NULL OR p.category_id = $1) ORDER BY p.name, p.id")
            .bind(category_id).fetch_all(&self.pool).await?)
    }

    async fn orders_report(&self, filter: &OrderReportFilter) -> Result<Vec<OrderReportRow>> {
        let rows = sqlx::query_as::<_, OrderReportDbRow>(
            "SELECT o.id, o.order_number, o.order_type, o.status, s.name AS supplier_name, o.expected_date, o.created_at, o.notes, \
                    COALESCE((SELECT SUM(oi.quantity * oi.price) FROM order_items oi WHERE oi.order_id = o.id), 0) AS total_amount \
             FROM orders o LEFT JOIN suppliers s ON o.supplier_id = s.id \
             WHERE ($1::TIMESTAMPTZ IS NULL OR o.created_at >= $1) \
               AND ($2::TIMESTAMPTZ IS NULL OR o.created_at < $2) \
               AND ($3::TEXT IS NULL OR o.status = $3) \
             ORDER BY o.created_at DESC, o.id DESC")
            .bind(filter.range.from_ts()).bind(filter.range.until_ts()).bind(filter.status.map(|s| s.as_str()))
            .fetch_all(&self.pool).await?;
        convert_all(rows)
    }

    async fn suppliers_report(&self, range: &DateRange) -> Result<Vec<SupplierReportRow>> {
        Ok(sqlx::query_as::<_, SupplierReportRow>(
            "SELECT s.id, s.name, s.contact_person, s.email, s.phone, \
                    COUNT(DISTINCT o.id) AS total_orders, COALESCE(SUM(oi.quantity * oi.price), 0) AS total_amount \
             FROM suppliers s \
             LEFT JOIN orders o ON o.supplier_id = s.id \
                  AND ($1::TIMESTAMPTZ IS NULL OR o.created_at >= $1) \
                  AND ($2::TIMESTAMPTZ IS NULL OR o.created_at < $2) \
             LEFT JOIN order_items oi ON oi.order_id = o.id \
             GROUP BY s.id ORDER BY s.name, s.id")
            .bind(range.from_ts()).bind(range.until_ts()).fetch_all(&self.pool).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("bolt"), "%bolt%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
