use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

use super::Product;

/// Type-safe identifier for catalogs.
///
/// The same value keys the price and products lookups, so it is rendered
/// unmodified into downstream paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogId(pub i32);

impl From<i32> for CatalogId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}

impl Display for CatalogId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The aggregate answered for one catalog request.
///
/// Built once both downstream lookups have succeeded and never modified afterwards.
/// `price` is a decimal that serializes as a JSON string (`"price": "250"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub id: CatalogId,
    pub price: Decimal,
    pub products: Vec<Product>,
}

impl Catalog {
    pub fn new(id: CatalogId, price: Decimal, products: Vec<Product>) -> Self {
        Self {
            id,
            price,
            products,
        }
    }
}
