use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::Deserialize;

use super::error::ApiQuery;
use super::AppState;
use crate::domain::aggregates::MovementView;
use crate::domain::reports::{
    BalanceRow, CategoryShare, DateRange, OrderReportFilter, OrderReportRow, PeriodSummary, SupplierReportRow,
    TopProduct, VolumePoint,
};
use crate::domain::value_objects::{OrderStatus, Period};
use crate::store::{ReportStore, Store};
use crate::Result;

pub fn router<S: Store + ReportStore>() -> Router<AppState<S>> {
    Router::new()
        .route("/summary", get(summary::<S>))
        .route("/sales", get(sales::<S>))
        .route("/categories", get(categories::<S>))
        .route("/top-products", get(top_products::<S>))
        .route("/inventory-movement", get(inventory_movement::<S>))
        .route("/inventory-balance", get(inventory_balance::<S>))
        .route("/orders", get(orders::<S>))
        .route("/suppliers", get(suppliers::<S>))
}

#[derive(Debug, Default, Deserialize)]
pub struct PeriodQuery {
    pub period: Option<String>,
}

impl PeriodQuery {
    fn period(&self) -> Period { Period::parse_or_default(self.period.as_deref()) }
}

#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub product_id: Option<i64>,
    pub category_id: Option<i64>,
    pub status: Option<OrderStatus>,
}

impl RangeQuery {
    fn range(&self) -> DateRange { DateRange::new(self.start_date, self.end_date) }
}

async fn summary<S: Store + ReportStore>(State(s): State<AppState<S>>, ApiQuery(q): ApiQuery<PeriodQuery>) -> Result<Json<PeriodSummary>> {
    Ok(Json(s.services.reports.summary(q.period()).await?))
}

async fn sales<S: Store + ReportStore>(State(s): State<AppState<S>>, ApiQuery(q): ApiQuery<PeriodQuery>) -> Result<Json<Vec<VolumePoint>>> {
    Ok(Json(s.services.reports.sales(q.period()).await?))
}

async fn categories<S: Store + ReportStore>(State(s): State<AppState<S>>, ApiQuery(q): ApiQuery<PeriodQuery>) -> Result<Json<Vec<CategoryShare>>> {
    Ok(Json(s.services.reports.categories(q.period()).await?))
}

async fn top_products<S: Store + ReportStore>(State(s): State<AppState<S>>, ApiQuery(q): ApiQuery<PeriodQuery>) -> Result<Json<Vec<TopProduct>>> {
    Ok(Json(s.services.reports.top_products(q.period()).await?))
}

async fn inventory_movement<S: Store + ReportStore>(
    State(s): State<AppState<S>>,
    ApiQuery(q): ApiQuery<RangeQuery>,
) -> Result<Json<Vec<MovementView>>> {
    Ok(Json(s.services.reports.inventory_movement(q.range(), q.product_id).await?))
}

async fn inventory_balance<S: Store + ReportStore>(
    State(s): State<AppState<S>>,
    ApiQuery(q): ApiQuery<RangeQuery>,
) -> Result<Json<Vec<BalanceRow>>> {
    Ok(Json(s.services.reports.inventory_balance(q.category_id).await?))
}

async fn orders<S: Store + ReportStore>(State(s): State<AppState<S>>, ApiQuery(q): ApiQuery<RangeQuery>) -> Result<Json<Vec<OrderReportRow>>> {
    let filter = OrderReportFilter { range: q.range(), status: q.status };
    Ok(Json(s.services.reports.orders(filter).await?))
}

async fn suppliers<S: Store + ReportStore>(
    State(s): State<AppState<S>>,
    ApiQuery(q): ApiQuery<RangeQuery>,
) -> Result<Json<Vec<SupplierReportRow>>> {
    Ok(Json(s.services.reports.suppliers(q.range()).await?))
}
