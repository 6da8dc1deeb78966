//! Warehouse views and stock corrections.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::Deserialize;

use super::error::{ApiJson, ApiPath, ApiQuery};
use super::AppState;
use crate::domain::aggregates::{InventoryItem, MovementView};
use crate::domain::reports::{DateRange, MovementFilter, WarehouseStats};
use crate::services::{Adjustment, AdjustmentOutcome, StockChange};
use crate::store::{ReportStore, Store};
use crate::Result;

pub fn router<S: Store + ReportStore>() -> Router<AppState<S>> {
    Router::new()
        .route("/stats", get(stats::<S>))
        .route("/movements", get(movements::<S>))
        .route("/inventory", get(inventory::<S>))
        .route("/inventory/:id", axum::routing::put(adjust::<S>).patch(adjust_by::<S>))
}

#[derive(Debug, Default, Deserialize)]
pub struct MovementQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub product_id: Option<i64>,
    pub search: Option<String>,
}

impl From<MovementQuery> for MovementFilter {
    fn from(q: MovementQuery) -> Self {
        MovementFilter { range: DateRange::new(q.start_date, q.end_date), product_id: q.product_id, search: q.search, limit: None }
    }
}

async fn stats<S: Store + ReportStore>(State(s): State<AppState<S>>) -> Result<Json<WarehouseStats>> {
    Ok(Json(s.services.reports.stats().await?))
}

async fn movements<S: Store + ReportStore>(
    State(s): State<AppState<S>>,
    ApiQuery(q): ApiQuery<MovementQuery>,
) -> Result<Json<Vec<MovementView>>> {
    Ok(Json(s.services.reports.movements(q.into()).await?))
}

async fn inventory<S: Store + ReportStore>(State(s): State<AppState<S>>) -> Result<Json<Vec<InventoryItem>>> {
    Ok(Json(s.services.inventory.inventory().await?))
}

async fn adjust<S: Store + ReportStore>(
    State(s): State<AppState<S>>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(adjustment): ApiJson<Adjustment>,
) -> Result<Json<AdjustmentOutcome>> {
    Ok(Json(s.services.inventory.adjust(id, adjustment).await?))
}

async fn adjust_by<S: Store + ReportStore>(
    State(s): State<AppState<S>>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(change): ApiJson<StockChange>,
) -> Result<Json<AdjustmentOutcome>> {
    Ok(Json(s.services.inventory.adjust_by(id, change).await?))
}
