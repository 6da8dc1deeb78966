//! Products, categories and suppliers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use super::error::{ApiJson, ApiPath};
use super::AppState;
use crate::domain::aggregates::{Category, CategoryInput, Product, ProductInput, Supplier, SupplierInput};
use crate::store::{ReportStore, Store};
use crate::Result;

pub fn products<S: Store + ReportStore>() -> Router<AppState<S>> {
    Router::new()
        .route("/", get(list_products::<S>).post(create_product::<S>))
        .route("/:id", get(get_product::<S>).put(update_product::<S>).delete(delete_product::<S>))
}

pub fn categories<S: Store + ReportStore>() -> Router<AppState<S>> {
    Router::new()
        .route("/", get(list_categories::<S>).post(create_category::<S>))
        .route("/:id", get(get_category::<S>).put(update_category::<S>).delete(delete_category::<S>))
}

pub fn suppliers<S: Store + ReportStore>() -> Router<AppState<S>> {
    Router::new()
        .route("/", get(list_suppliers::<S>).post(create_supplier::<S>))
        .route("/:id", get(get_supplier::<S>).put(update_supplier::<S>).delete(delete_supplier::<S>))
}

async fn list_products<S: Store + ReportStore>(State(s): State<AppState<S>>) -> Result<Json<Vec<Product>>> {
    Ok(Json(s.services.catalog.list_products().await?))
}

async fn get_product<S: Store + ReportStore>(State(s): State<AppState<S>>, ApiPath(id): ApiPath<i64>) -> Result<Json<Product>> {
    Ok(Json(s.services.catalog.get_product(id).await?))
}

async fn create_product<S: Store + ReportStore>(
    State(s): State<AppState<S>>,
    ApiJson(input): ApiJson<ProductInput>,
) -> Result<(StatusCode, Json<Product>)> {
    Ok((StatusCode::CREATED, Json(s.services.catalog.create_product(input).await?)))
}

async fn update_product<S: Store + ReportStore>(
    State(s): State<AppState<S>>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<ProductInput>,
) -> Result<Json<Product>> {
    Ok(Json(s.services.catalog.update_product(id, input).await?))
}

async fn delete_product<S: Store + ReportStore>(State(s): State<AppState<S>>, ApiPath(id): ApiPath<i64>) -> Result<StatusCode> {
    s.services.catalog.delete_product(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_categories<S: Store + ReportStore>(State(s): State<AppState<S>>) -> Result<Json<Vec<Category>>> {
    Ok(Json(s.services.catalog.list_categories().await?))
}

async fn get_category<S: Store + ReportStore>(State(s): State<AppState<S>>, ApiPath(id): ApiPath<i64>) -> Result<Json<Category>> {
    Ok(Json(s.services.catalog.get_category(id).await?))
}

async fn create_category<S: Store + ReportStore>(
    State(s): State<AppState<S>>,
    ApiJson(input): ApiJson<CategoryInput>,
) -> Result<(StatusCode, Json<Category>)> {
    Ok((StatusCode::CREATED, Json(s.services.catalog.create_category(input).await?)))
}

async fn update_category<S: Store + ReportStore>(
    State(s): State<AppState<S>>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<CategoryInput>,
) -> Result<Json<Category>> {
    Ok(Json(s.services.catalog.update_category(id, input).await?))
}

async fn delete_category<S: Store + ReportStore>(State(s): State<AppState<S>>, ApiPath(id): ApiPath<i64>) -> Result<StatusCode> {
    s.services.catalog.delete_category(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_suppliers<S: Store + ReportStore>(State(s): State<AppState<S>>) -> Result<Json<Vec<Supplier>>> {
    Ok(Json(s.services.catalog.list_suppliers().await?))
}

async fn get_supplier<S: Store + ReportStore>(State(s): State<AppState<S>>, ApiPath(id): ApiPath<i64>) -> Result<Json<Supplier>> {
    Ok(Json(s.services.catalog.get_supplier(id).await?))
}

async fn create_supplier<S: Store + ReportStore>(
    State(s): State<AppState<S>>,
    ApiJson(input): ApiJson<SupplierInput>,
) -> Result<(StatusCode, Json<Supplier>)> {
    Ok((StatusCode::CREATED, Json(s.services.catalog.create_supplier(input).await?)))
}

async fn update_supplier<S: Store + ReportStore>(
    State(s): State<AppState<S>>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<SupplierInput>,
) -> Result<Json<Supplier>> {
    Ok(Json(s.services.catalog.update_supplier(id, input).await?))
}

async fn delete_supplier<S: Store + ReportStore>(State(s): State<AppState<S>>, ApiPath(id): ApiPath<i64>) -> Result<StatusCode> {
    s.services.catalog.delete_supplier(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
