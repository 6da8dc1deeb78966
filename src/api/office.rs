//! Employees and invoices.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use super::error::{ApiJson, ApiPath};
use super::AppState;
use crate::domain::aggregates::{Employee, EmployeeInput, Invoice, InvoiceInput};
use crate::store::{ReportStore, Store};
use crate::Result;

pub fn employees<S: Store + ReportStore>() -> Router<AppState<S>> {
    Router::new()
        .route("/", get(list_employees::<S>).post(create_employee::<S>))
        .route("/:id", get(get_employee::<S>).put(update_employee::<S>).delete(delete_employee::<S>))
}

pub fn invoices<S: Store + ReportStore>() -> Router<AppState<S>> {
    Router::new()
        .route("/", get(list_invoices::<S>).post(create_invoice::<S>))
        .route("/:id", get(get_invoice::<S>).put(update_invoice::<S>).delete(delete_invoice::<S>))
}

async fn list_employees<S: Store + ReportStore>(State(s): State<AppState<S>>) -> Result<Json<Vec<Employee>>> {
    Ok(Json(s.services.office.list_employees().await?))
}

async fn get_employee<S: Store + ReportStore>(State(s): State<AppState<S>>, ApiPath(id): ApiPath<i64>) -> Result<Json<Employee>> {
    Ok(Json(s.services.office.get_employee(id).await?))
}

async fn create_employee<S: Store + ReportStore>(
    State(s): State<AppState<S>>,
    ApiJson(input): ApiJson<EmployeeInput>,
) -> Result<(StatusCode, Json<Employee>)> {
    Ok((StatusCode::CREATED, Json(s.services.office.create_employee(input).await?)))
}

async fn update_employee<S: Store + ReportStore>(
    State(s): State<AppState<S>>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<EmployeeInput>,
) -> Result<Json<Employee>> {
    Ok(Json(s.services.office.update_employee(id, input).await?))
}

async fn delete_employee<S: Store + ReportStore>(State(s): State<AppState<S>>, ApiPath(id): ApiPath<i64>) -> Result<StatusCode> {
    s.services.office.delete_employee(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_invoices<S: Store + ReportStore>(State(s): State<AppState<S>>) -> Result<Json<Vec<Invoice>>> {
    Ok(Json(s.services.office.list_invoices().await?))
}

async fn get_invoice<S: Store + ReportStore>(State(s): State<AppState<S>>, ApiPath(id): ApiPath<i64>) -> Result<Json<Invoice>> {
    Ok(Json(s.services.office.get_invoice(id).await?))
}

async fn create_invoice<S: Store + ReportStore>(
    State(s): State<AppState<S>>,
    ApiJson(input): ApiJson<InvoiceInput>,
) -> Result<(StatusCode, Json<Invoice>)> {
    Ok((StatusCode::CREATED, Json(s.services.office.create_invoice(input).await?)))
}

async fn update_invoice<S: Store + ReportStore>(
    State(s): State<AppState<S>>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<InvoiceInput>,
) -> Result<Json<Invoice>> {
    Ok(Json(s.services.office.update_invoice(id, input).await?))
}

async fn delete_invoice<S: Store + ReportStore>(State(s): State<AppState<S>>, ApiPath(id): ApiPath<i64>) -> Result<StatusCode> {
    s.services.office.delete_invoice(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
