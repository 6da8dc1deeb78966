//! Error responses and rejection-aware extractors.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::WarehouseError;

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (status, axum::Json(json!({ "error": code, "message": message.into() }))).into_response()
}

impl WarehouseError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Conflict(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for WarehouseError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::Storage(detail) => {
                tracing::error!(%detail, "storage failure");
                json_error(status, self.kind(), "internal storage error")
            }
            _ => {
                tracing::warn!(kind = self.kind(), message = %self, "request rejected");
                json_error(status, self.kind(), self.to_string())
            }
        }
    }
}

impl From<JsonRejection> for WarehouseError {
    fn from(rejection: JsonRejection) -> Self { Self::Validation(rejection.body_text()) }
}

impl From<QueryRejection> for WarehouseError {
    fn from(rejection: QueryRejection) -> Self { Self::Validation(rejection.body_text()) }
}

impl From<PathRejection> for WarehouseError {
    fn from(rejection: PathRejection) -> Self { Self::Validation(rejection.body_text()) }
}

/// `Json` whose rejections use the service error body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(WarehouseError))]
pub struct ApiJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(WarehouseError))]
pub struct ApiQuery<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(WarehouseError))]
pub struct ApiPath<T>(pub T);
