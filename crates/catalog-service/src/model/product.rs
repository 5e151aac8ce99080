use serde::{Deserialize, Serialize};

/// One record from the products downstream.
///
/// The gateway never looks inside a product: whatever JSON the downstream
/// returns is passed through to the caller untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Product(pub serde_json::Value);

impl From<serde_json::Value> for Product {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}
