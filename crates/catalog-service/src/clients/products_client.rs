//! # Products Client
//!
//! Wraps an `IsolatedClient<ProductsLookup>`. The products downstream is an external
//! collaborator; its records are passed through as opaque [`Product`] values.
use crate::clients::http::HttpEndpoint;
use crate::model::{CatalogId, Product};
use async_trait::async_trait;
use bulkhead_framework::{Dependency, DependencyError, IsolatedCaller, IsolatedClient};
use tracing::{debug, instrument};

/// `GET {products_url}/{id}`, answered with a JSON array.
pub struct ProductsLookup;

#[async_trait]
impl Dependency for ProductsLookup {
    type Id = CatalogId;
    type Output = Vec<Product>;
    type Context = HttpEndpoint;

    async fn fetch(id: CatalogId, endpoint: &HttpEndpoint) -> Result<Vec<Product>, DependencyError> {
        endpoint.get_json(id).await
    }
}

/// Client for the `products` isolation boundary.
#[derive(Clone)]
pub struct ProductsClient {
    inner: IsolatedClient<ProductsLookup>,
}

impl ProductsClient {
    pub fn new(inner: IsolatedClient<ProductsLookup>) -> Self {
        Self { inner }
    }
}

impl IsolatedCaller<ProductsLookup> for ProductsClient {
    fn inner(&self) -> &IsolatedClient<ProductsLookup> {
        &self.inner
    }
}

impl ProductsClient {
    #[instrument(skip(self))]
    pub async fn get_products(&self, id: CatalogId) -> Result<Vec<Product>, DependencyError> {
        let products = self.call(id).await?;
        debug!(count = products.len(), "Products received");
        Ok(products)
    }
}
