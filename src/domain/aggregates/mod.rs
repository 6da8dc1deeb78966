//! Aggregates module
pub mod catalog;
pub mod employee;
pub mod invoice;
pub mod movement;
pub mod order;
pub mod product;

pub use catalog::{Category, CategoryInput, Supplier, SupplierInput};
pub use employee::{Employee, EmployeeInput};
pub use invoice::{Invoice, InvoiceInput};
pub use movement::{MovementView, NewStockMovement, StockMovement};
pub use order::{LineItem, NewLineItem, Order, OrderDraft, OrderHeader, OrderSummary};
pub use product::{InventoryItem, Product, ProductInput};
