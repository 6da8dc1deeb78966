//! HTTP surface. Everything under `/api/v1` requires a bearer token;
//! `/health` does not.

pub mod auth;
pub mod catalog;
pub mod error;
pub mod office;
pub mod orders;
pub mod reports;
pub mod warehouse;

use axum::routing::get;
use axum::{Json, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::services::Services;
use crate::store::{ReportStore, Store};

pub use auth::{Authenticator, Claims, Principal};

#[derive(Clone)]
pub struct AppState<S> {
    pub services: Services<S>,
}

impl<S> AppState<S> {
    pub fn new(services: Services<S>) -> Self { Self { services } }
}

pub fn router<S: Store + ReportStore>(state: AppState<S>, auth: Authenticator) -> Router {
    let api = Router::new()
        .nest("/orders", orders::router())
        .nest("/products", catalog::products())
        .nest("/categories", catalog::categories())
        .nest("/suppliers", catalog::suppliers())
        .nest("/employees", office::employees())
        .nest("/invoices", office::invoices())
        .nest("/warehouse", warehouse::router())
        .nest("/reports", reports::router())
        .route_layer(axum::middleware::from_fn_with_state(auth, auth::require_bearer));

    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "opensase-warehouse"})) }))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
