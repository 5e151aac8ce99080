//! `GET /{id}` answers the price as a JSON string, e.g. `"100"`.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::service::PriceService;

pub fn router(service: Arc<PriceService>) -> Router {
    Router::new()
        .route("/{id}", get(get_price))
        .with_state(service)
}

async fn get_price(State(service): State<Arc<PriceService>>, Path(id): Path<i32>) -> Json<Decimal> {
    Json(service.price(id).await)
}
