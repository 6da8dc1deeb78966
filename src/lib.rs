//! OpenSASE Warehouse
//!
//! Self-hosted warehouse and inventory backend.
//!
//! ## Features
//! - Product, category and supplier catalog
//! - Incoming/outgoing orders with line items, written as one transaction
//! - Inventory adjustments backed by an append-only stock movement ledger
//! - Warehouse views and period reports
//! - Bearer-token capability check

pub mod api;
pub mod config;
pub mod domain;
pub mod ledger;
pub mod publisher;
pub mod services;
pub mod store;

use thiserror::Error;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum WarehouseError {
    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Authorization required")]
    Unauthorized,

    #[error("Invalid token")]
    Forbidden,
}

impl WarehouseError {
    /// Stable machine-readable code, used as the `error` field of HTTP bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::Storage(_) => "storage_error",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self { Self::Validation(msg.into()) }
    pub fn conflict(msg: impl Into<String>) -> Self { Self::Conflict(msg.into()) }
}

impl From<sqlx::Error> for WarehouseError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let constraint = db_err.constraint().unwrap_or_default().to_string();
            if db_err.is_unique_violation() {
                return Self::Conflict(format!("duplicate value violates {constraint}"));
            }
            if db_err.is_foreign_key_violation() {
                return Self::Validation(format!("referenced record does not exist ({constraint})"));
            }
            if db_err.is_check_violation() {
                return Self::Validation(format!("value rejected by {constraint}"));
            }
        }
        Self::Storage(err.to_string())
    }
}

impl From<validator::ValidationErrors> for WarehouseError {
    fn from(err: validator::ValidationErrors) -> Self { Self::Validation(err.to_string()) }
}

pub type Result<T> = std::result::Result<T, WarehouseError>;
