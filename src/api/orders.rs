use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use super::error::{ApiJson, ApiPath};
use super::AppState;
use crate::domain::aggregates::{Order, OrderDraft, OrderSummary};
use crate::store::{ReportStore, Store};
use crate::Result;

pub fn router<S: Store + ReportStore>() -> Router<AppState<S>> {
    Router::new()
        .route("/", get(list_orders::<S>).post(create_order::<S>))
        .route("/:id", get(get_order::<S>).put(update_order::<S>).delete(delete_order::<S>))
}

async fn list_orders<S: Store + ReportStore>(State(s): State<AppState<S>>) -> Result<Json<Vec<OrderSummary>>> {
    Ok(Json(s.services.orders.list().await?))
}

async fn get_order<S: Store + ReportStore>(State(s): State<AppState<S>>, ApiPath(id): ApiPath<i64>) -> Result<Json<Order>> {
    Ok(Json(s.services.orders.get(id).await?))
}

async fn create_order<S: Store + ReportStore>(
    State(s): State<AppState<S>>,
    ApiJson(draft): ApiJson<OrderDraft>,
) -> Result<(StatusCode, Json<Order>)> {
    Ok((StatusCode::CREATED, Json(s.services.orders.create(draft).await?)))
}

async fn update_order<S: Store + ReportStore>(
    State(s): State<AppState<S>>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(draft): ApiJson<OrderDraft>,
) -> Result<Json<Order>> {
    Ok(Json(s.services.orders.update(id, draft).await?))
}

async fn delete_order<S: Store + ReportStore>(State(s): State<AppState<S>>, ApiPath(id): ApiPath<i64>) -> Result<StatusCode> {
    s.services.orders.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
