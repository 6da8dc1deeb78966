//! Warehouse views and period reports. Reads only committed state.

use chrono::Utc;
use tracing::instrument;

use crate::domain::aggregates::MovementView;
use crate::domain::reports::{
    BalanceRow, CategoryShare, DateRange, MovementFilter, OrderReportFilter, OrderReportRow, PeriodSummary,
    SupplierReportRow, TopProduct, VolumePoint, WarehouseStats,
};
use crate::domain::value_objects::Period;
use crate::store::{ReportStore, MOVEMENT_LIMIT};
use crate::{Result, WarehouseError};

pub const TOP_PRODUCTS: i64 = 10;

fn check_range(range: &DateRange) -> Result<()> {
    match (range.start, range.end) {
        (Some(start), Some(end)) if start > end => Err(WarehouseError::validation("start_date is after end_date")),
        _ => Ok(()),
    }
}

#[derive(Clone)]
pub struct ReportService<R> { store: R }

impl<R: ReportStore> ReportService<R> {
    pub fn new(store: R) -> Self { Self { store } }

    pub async fn stats(&self) -> Result<WarehouseStats> { self.store.warehouse_stats().await }

    /// Latest movements, newest first, never more than [`MOVEMENT_LIMIT`].
    #[instrument(skip(self))]
    pub async fn movements(&self, mut filter: MovementFilter) -> Result<Vec<MovementView>> {
        check_range(&filter.range)?;
        filter.limit = Some(filter.limit.unwrap_or(MOVEMENT_LIMIT).clamp(1, MOVEMENT_LIMIT));
        self.store.movements(&filter).await
    }

    pub async fn summary(&self, period: Period) -> Result<PeriodSummary> {
        self.store.period_summary(period.window_start(Utc::now())).await
    }

    /// Order value per day (week, month) or per month (quarter, year).
    pub async fn sales(&self, period: Period) -> Result<Vec<VolumePoint>> {
        self.store.order_volume(period.window_start(Utc::now()), period.bucket()).await
    }

    pub async fn categories(&self, period: Period) -> Result<Vec<CategoryShare>> {
        self.store.category_distribution(period.window_start(Utc::now())).await
    }

    pub async fn top_products(&self, period: Period) -> Result<Vec<TopProduct>> {
        self.store.top_products(period.window_start(Utc::now()), TOP_PRODUCTS).await
    }

    /// Ledger for a date range, optionally for one product. Unlike the
    /// warehouse view this is not capped.
    #[instrument(skip(self))]
    pub async fn inventory_movement(&self, range: DateRange, product_id: Option<i64>) -> Result<Vec<MovementView>> {
        check_range(&range)?;
        self.store.movements(&MovementFilter { range, product_id, search: None, limit: Some(i64::MAX) }).await
    }

    pub async fn inventory_balance(&self, category_id: Option<i64>) -> Result<Vec<BalanceRow>> {
        self.store.inventory_balance(category_id).await
    }

    #[instrument(skip(self))]
    pub async fn orders(&self, filter: OrderReportFilter) -> Result<Vec<OrderReportRow>> {
        check_range(&filter.range)?;
        self.store.orders_report(&filter).await
    }

    #[instrument(skip(self))]
    pub async fn suppliers(&self, range: DateRange) -> Result<Vec<SupplierReportRow>> {
        check_range(&range)?;
        self.store.suppliers_report(&range).await
    }
}
