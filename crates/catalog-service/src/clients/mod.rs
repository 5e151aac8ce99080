//! # Downstream Clients
//!
//! Each downstream is a [`Dependency`](bulkhead_framework::Dependency) whose fetch is a
//! single `GET {base_url}/{id}`, wrapped in a typed client that runs it behind its own
//! bulkhead and breaker.
//!
//! | Client | Boundary | Answer |
//! |--------|----------|--------|
//! | [`PriceClient`] | `pricing` | one decimal |
//! | [`ProductsClient`] | `products` | array of opaque product records |

pub mod http;
pub mod price_client;
pub mod products_client;

pub use http::HttpEndpoint;
pub use price_client::{PriceClient, PriceLookup};
pub use products_client::{ProductsClient, ProductsLookup};
