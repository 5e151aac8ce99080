//! # Price Client
//!
//! Provides a high-level API for the price downstream.
//! It wraps an `IsolatedClient<PriceLookup>` and exposes domain-specific methods.
use crate::clients::http::HttpEndpoint;
use crate::model::CatalogId;
use async_trait::async_trait;
use bulkhead_framework::{Dependency, DependencyError, IsolatedCaller, IsolatedClient};
use rust_decimal::Decimal;
use tracing::{debug, instrument};

/// `GET {price_url}/{id}`, answered with a JSON string such as `"100"`.
pub struct PriceLookup;

#[async_trait]
impl Dependency for PriceLookup {
    type Id = CatalogId;
    type Output = Decimal;
    type Context = HttpEndpoint;

    async fn fetch(id: CatalogId, endpoint: &HttpEndpoint) -> Result<Decimal, DependencyError> {
        endpoint.get_json(id).await
    }
}

/// Client for the `pricing` isolation boundary.
#[derive(Clone)]
pub struct PriceClient {
    inner: IsolatedClient<PriceLookup>,
}

impl PriceClient {
    pub fn new(inner: IsolatedClient<PriceLookup>) -> Self {
        Self { inner }
    }
}

impl IsolatedCaller<PriceLookup> for PriceClient {
    fn inner(&self) -> &IsolatedClient<PriceLookup> {
        &self.inner
    }
}

impl PriceClient {
    /// Current price of a catalog.
    #[instrument(skip(self))]
    pub async fn get_price(&self, id: CatalogId) -> Result<Decimal, DependencyError> {
        debug!("Fetching price for catalog {}", id);
        self.call(id).await
    }
}
