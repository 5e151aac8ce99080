//! Shared HTTP plumbing for the downstream lookups.

use bulkhead_framework::{DependencyError, UnavailableReason};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::fmt::Display;
use std::time::Duration;
use tracing::debug;

/// Where one downstream lives and the client used to reach it.
///
/// This is the `Context` of the lookup dependencies: one endpoint per bulkhead,
/// shared by all of that bulkhead's in-flight calls.
#[derive(Debug, Clone)]
pub struct HttpEndpoint {
    name: String,
    http: Client,
    base_url: String,
}

impl HttpEndpoint {
    /// Builds an endpoint whose requests are cut off after `timeout`.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(name, base_url, http))
    }

    pub fn with_client(name: impl Into<String>, base_url: impl Into<String>, http: Client) -> Self {
        Self {
            name: name.into(),
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET {base_url}/{id}` and decode the body as `T`.
    pub async fn get_json<T: DeserializeOwned>(&self, id: impl Display) -> Result<T, DependencyError> {
        let url = format!("{}/{}", self.base_url, id);
        debug!(dependency = %self.name, %url, "GET");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| self.map_error(e))?
            .error_for_status()
            .map_err(|e| self.map_error(e))?;

        response.json::<T>().await.map_err(|e| self.map_error(e))
    }

    fn map_error(&self, e: reqwest::Error) -> DependencyError {
        if e.is_timeout() {
            DependencyError::Timeout(self.name.clone())
        } else if e.is_status() || e.is_decode() {
            DependencyError::unavailable(&self.name, UnavailableReason::BadResponse(e.to_string()))
        } else {
            DependencyError::unavailable(&self.name, UnavailableReason::Network(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_is_dropped() {
        let endpoint = HttpEndpoint::with_client("pricing", "http://localhost:8070/", Client::new());
        assert_eq!(endpoint.base_url(), "http://localhost:8070");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_a_network_failure() {
        // grab a free port, then close it again
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        drop(listener);

        let endpoint =
            HttpEndpoint::new("pricing", format!("http://{address}"), Duration::from_millis(500)).unwrap();

        let err = endpoint.get_json::<String>(1).await.unwrap_err();
        assert_eq!(err.dependency(), "pricing");
        assert!(matches!(
            err,
            DependencyError::Unavailable {
                reason: UnavailableReason::Network(_),
                ..
            }
        ));
    }
}
