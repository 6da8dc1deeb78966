//! Application services. Each takes the store handle it works on; nothing is global.

pub mod catalog;
pub mod inventory;
pub mod office;
pub mod orders;
pub mod reports;

pub use catalog::CatalogService;
pub use inventory::{Adjustment, AdjustmentOutcome, InventoryService, StockChange};
pub use office::OfficeService;
pub use orders::OrderService;
pub use reports::ReportService;

use crate::publisher::EventPublisher;
use crate::store::{ReportStore, Store};

#[derive(Clone)]
pub struct Services<S> {
    pub orders: OrderService<S>,
    pub inventory: InventoryService<S>,
    pub catalog: CatalogService<S>,
    pub office: OfficeService<S>,
    pub reports: ReportService<S>,
}

impl<S: Store + ReportStore> Services<S> {
    pub fn new(store: S, events: EventPublisher) -> Self {
        Self {
            orders: OrderService::new(store.clone(), events.clone()),
            inventory: InventoryService::new(store.clone(), events),
            catalog: CatalogService::new(store.clone()),
            office: OfficeService::new(store.clone()),
            reports: ReportService::new(store),
        }
    }
}
