//! Storage handle.
//!
//! [`Store`] is the pooled handle: committed reads plus [`Store::begin`].
//! [`StoreTx`] is one open transaction. A transaction that is dropped without
//! [`StoreTx::commit`] is rolled back, so every early return through `?`
//! leaves the store exactly as it was.
//!
//! Two backends: [`postgres::PgStore`] for the service and
//! [`memory::MemoryStore`] for tests and local development.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::aggregates::{
    Category, CategoryInput, Employee, EmployeeInput, Invoice, InvoiceInput, MovementView, NewLineItem,
    NewStockMovement, Order, OrderHeader, OrderSummary, Product, ProductInput, StockMovement, Supplier, SupplierInput,
};
use crate::domain::reports::{
    BalanceRow, CategoryShare, DateRange, MovementFilter, OrderReportFilter, OrderReportRow, PeriodSummary,
    SupplierReportRow, TopProduct, VolumePoint, WarehouseStats,
};
use crate::domain::value_objects::Bucket;
use crate::Result;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Upper bound on rows returned by the movement views.
pub const MOVEMENT_LIMIT: i64 = 100;

#[async_trait]
pub trait Store: Clone + Send + Sync + 'static {
    type Tx: StoreTx;

    async fn begin(&self) -> Result<Self::Tx>;

    async fn list_orders(&self) -> Result<Vec<OrderSummary>>;
    async fn find_order(&self, id: i64) -> Result<Option<Order>>;

    async fn list_products(&self) -> Result<Vec<Product>>;
    async fn find_product(&self, id: i64) -> Result<Option<Product>>;

    async fn list_categories(&self) -> Result<Vec<Category>>;
    async fn find_category(&self, id: i64) -> Result<Option<Category>>;

    async fn list_suppliers(&self) -> Result<Vec<Supplier>>;
    async fn find_supplier(&self, id: i64) -> Result<Option<Supplier>>;

    async fn list_employees(&self) -> Result<Vec<Employee>>;
    async fn find_employee(&self, id: i64) -> Result<Option<Employee>>;

    async fn list_invoices(&self) -> Result<Vec<Invoice>>;
    async fn find_invoice(&self, id: i64) -> Result<Option<Invoice>>;
}

/// Statements available inside one transaction. Mutations that can miss
/// return the affected row count; callers turn zero into `NotFound`.
#[async_trait]
pub trait StoreTx: Send {
    async fn insert_order(&mut self, header: &OrderHeader) -> Result<i64>;
    async fn update_order(&mut self, id: i64, header: &OrderHeader) -> Result<u64>;
    async fn delete_order(&mut self, id: i64) -> Result<u64>;
    async fn insert_line_item(&mut self, order_id: i64, item: &NewLineItem) -> Result<i64>;
    async fn delete_line_items(&mut self, order_id: i64) -> Result<u64>;
    /// The order as this transaction sees it, uncommitted writes included.
    async fn find_order(&mut self, id: i64) -> Result<Option<Order>>;

    /// Reads a product and holds its row lock until the transaction ends.
    async fn lock_product(&mut self, id: i64) -> Result<Option<Product>>;
    async fn set_stock(&mut self, id: i64, quantity: i32, location: Option<&str>) -> Result<u64>;
    /// Ledger append. Movements have no update or delete.
    async fn append_movement(&mut self, entry: &NewStockMovement) -> Result<StockMovement>;

    async fn insert_product(&mut self, input: &ProductInput) -> Result<i64>;
    async fn update_product(&mut self, id: i64, input: &ProductInput) -> Result<u64>;
    /// Order line items and stock movements pointing at the product.
    async fn product_references(&mut self, id: i64) -> Result<i64>;
    async fn delete_product(&mut self, id: i64) -> Result<u64>;

    async fn insert_category(&mut self, input: &CategoryInput) -> Result<i64>;
    async fn update_category(&mut self, id: i64, input: &CategoryInput) -> Result<u64>;
    async fn category_product_count(&mut self, id: i64) -> Result<i64>;
    async fn delete_category(&mut self, id: i64) -> Result<u64>;

    async fn insert_supplier(&mut self, input: &SupplierInput) -> Result<i64>;
    async fn update_supplier(&mut self, id: i64, input: &SupplierInput) -> Result<u64>;
    /// Orders and invoices pointing at the supplier.
    async fn supplier_references(&mut self, id: i64) -> Result<i64>;
    async fn delete_supplier(&mut self, id: i64) -> Result<u64>;

    async fn insert_employee(&mut self, input: &EmployeeInput) -> Result<Employee>;
    async fn update_employee(&mut self, id: i64, input: &EmployeeInput) -> Result<Option<Employee>>;
    async fn delete_employee(&mut self, id: i64) -> Result<u64>;

    async fn insert_invoice(&mut self, input: &InvoiceInput) -> Result<i64>;
    async fn update_invoice(&mut self, id: i64, input: &InvoiceInput) -> Result<u64>;
    async fn find_invoice(&mut self, id: i64) -> Result<Option<Invoice>>;
    async fn delete_invoice(&mut self, id: i64) -> Result<u64>;

    async fn commit(self) -> Result<()>;
    async fn rollback(self) -> Result<()>;
}

/// Aggregate reads over committed state.
#[async_trait]
pub trait ReportStore: Clone + Send + Sync + 'static {
    async fn warehouse_stats(&self) -> Result<WarehouseStats>;
    async fn movements(&self, filter: &MovementFilter) -> Result<Vec<MovementView>>;
    async fn period_summary(&self, since: DateTime<Utc>) -> Result<PeriodSummary>;
    async fn order_volume(&self, since: DateTime<Utc>, bucket: Bucket) -> Result<Vec<VolumePoint>>;
    async fn category_distribution(&self, since: DateTime<Utc>) -> Result<Vec<CategoryShare>>;
    async fn top_products(&self, since: DateTime<Utc>, limit: i64) -> Result<Vec<TopProduct>>;
    async fn inventory_balance(&self, category_id: Option<i64>) -> Result<Vec<BalanceRow>>;
    async fn orders_report(&self, filter: &OrderReportFilter) -> Result<Vec<OrderReportRow>>;
    async fn suppliers_report(&self, range: &DateRange) -> Result<Vec<SupplierReportRow>>;
}
