//! # HTTP Surface
//!
//! `GET /{id}` answers the aggregated [`Catalog`](crate::model::Catalog) as JSON.
//! A failed aggregation is a 5xx: 504 when a downstream timed out, 503 otherwise.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

use crate::aggregator::{AggregationError, CatalogService};
use crate::model::CatalogId;

pub fn router(service: Arc<CatalogService>) -> Router {
    Router::new()
        .route("/{id}", get(get_catalog))
        .with_state(service)
}

async fn get_catalog(
    State(service): State<Arc<CatalogService>>,
    Path(id): Path<i32>,
) -> Result<Response, AggregationError> {
    let catalog = service.aggregate(CatalogId(id)).await?;
    Ok(Json(catalog).into_response())
}

impl IntoResponse for AggregationError {
    fn into_response(self) -> Response {
        let status = if self.cause().is_timeout() {
            StatusCode::GATEWAY_TIMEOUT
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        };
        warn!(status = status.as_u16(), error = %self, "Catalog request failed");
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bulkhead_framework::DependencyError;

    #[test]
    fn test_timeout_maps_to_gateway_timeout() {
        let response = AggregationError::Price(DependencyError::Timeout("pricing".into())).into_response();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn test_other_failures_map_to_service_unavailable() {
        let error = DependencyError::unavailable("products", bulkhead_framework::UnavailableReason::CircuitOpen);
        let response = AggregationError::Products(error).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
