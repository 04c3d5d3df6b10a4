//! Reusable connections to backend services.
//!
//! A [`ConnectorPool`] hands out one [`Connector`] per backend role and
//! address. Connectors wrap a pooled HTTP client, are cheap to clone, and are
//! shared by every checkout running in the process.

use std::time::Duration;

use dashmap::DashMap;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

/// The backend a connector talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BackendRole {
    Cart,
    Catalog,
    Currency,
    Shipping,
    Payment,
    Notification,
}

impl BackendRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendRole::Cart => "cart",
            BackendRole::Catalog => "catalog",
            BackendRole::Currency => "currency",
            BackendRole::Shipping => "shipping",
            BackendRole::Payment => "payment",
            BackendRole::Notification => "notification",
        }
    }
}

impl std::fmt::Display for BackendRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transport settings shared by every connector in a pool.
#[derive(Debug, Clone)]
pub struct ConnectorConfig {
    /// Upper bound on a whole request, including reading the body.
    pub request_timeout: Duration,

    /// Upper bound on establishing the TCP connection.
    pub connect_timeout: Duration,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(3),
        }
    }
}

impl ConnectorConfig {
    /// Set the request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

/// A handle for calling one backend at one address.
#[derive(Debug, Clone)]
pub struct Connector {
    role: BackendRole,
    address: String,
    base_url: Url,
    client: Client,
}

impl Connector {
    /// Builds a connector for `address`.
    ///
    /// A bare `host:port` is treated as `http://host:port`.
    pub fn connect(
        role: BackendRole,
        address: &str,
        config: &ConnectorConfig,
    ) -> Result<Self, ServiceError> {
        let unreachable = |reason: String| ServiceError::Unreachable {
            role,
            address: address.to_string(),
            reason,
        };

        let base_url = parse_base_url(address).map_err(unreachable)?;
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| unreachable(e.to_string()))?;

        Ok(Self {
            role,
            address: address.to_string(),
            base_url,
            client,
        })
    }

    pub fn role(&self) -> BackendRole {
        self.role
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Builds the URL for `segments` below the base URL. Segments are
    /// percent-encoded.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ServiceError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| self.backend_error("address cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Starts a request to `segments` below the base URL.
    pub fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, ServiceError> {
        Ok(self.client.request(method, self.endpoint(segments)?))
    }

    /// Sends a request. Any transport failure maps to
    /// [`ServiceError::Unreachable`]; the status code is not inspected.
    #[tracing::instrument(skip(self, request), fields(role = %self.role, address = %self.address))]
    pub async fn send(&self, request: RequestBuilder) -> Result<Response, ServiceError> {
        let response = request.send().await.map_err(|e| self.unreachable(&e))?;
        tracing::debug!(status = %response.status(), "backend responded");
        Ok(response)
    }

    /// Decodes a successful JSON response, or turns a non-2xx status into
    /// [`ServiceError::Backend`].
    pub async fn json<T: DeserializeOwned>(&self, response: Response) -> Result<T, ServiceError> {
        let response = self.success(response).await?;
        response.json::<T>().await.map_err(|e| {
            if e.is_decode() {
                self.backend_error(format!("undecodable response: {e}"))
            } else {
                self.unreachable(&e)
            }
        })
    }

    /// Accepts any 2xx response and discards its body.
    pub async fn success(&self, response: Response) -> Result<Response, ServiceError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        Err(self.status_error(status, response).await)
    }

    /// Builds a [`ServiceError::Backend`] from a failed response, keeping the
    /// body as the reason.
    pub async fn status_error(&self, status: StatusCode, response: Response) -> ServiceError {
        let body = response.text().await.unwrap_or_default();
        let reason = if body.trim().is_empty() {
            format!("status {status}")
        } else {
            format!("status {status}: {}", body.trim())
        };
        self.backend_error(reason)
    }

    fn backend_error(&self, reason: String) -> ServiceError {
        ServiceError::Backend {
            role: self.role,
            reason,
        }
    }

    fn unreachable(&self, err: &reqwest::Error) -> ServiceError {
        ServiceError::Unreachable {
            role: self.role,
            address: self.address.clone(),
            reason: err.to_string(),
        }
    }
}

fn parse_base_url(address: &str) -> Result<Url, String> {
    let address = address.trim();
    if address.is_empty() {
        return Err("no address configured".to_string());
    }
    let candidate = if address.contains("://") {
        address.to_string()
    } else {
        format!("http://{address}")
    };
    let url = Url::parse(&candidate).map_err(|e| format!("invalid address: {e}"))?;
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err("invalid address: missing host".to_string());
    }
    Ok(url)
}

/// Process-wide cache of connectors keyed by role and address.
///
/// Safe to share between concurrent checkouts; the first caller for a key
/// builds the connector, later callers get a clone of it.
#[derive(Debug, Default)]
pub struct ConnectorPool {
    config: ConnectorConfig,
    connectors: DashMap<(BackendRole, String), Connector>,
}

impl ConnectorPool {
    /// Creates an empty pool.
    pub fn new(config: ConnectorConfig) -> Self {
        Self {
            config,
            connectors: DashMap::new(),
        }
    }

    /// Returns the connector for `role` at `address`, creating it on first use.
    pub fn acquire(&self, role: BackendRole, address: &str) -> Result<Connector, ServiceError> {
        let key = (role, address.to_string());
        if let Some(existing) = self.connectors.get(&key) {
            return Ok(existing.value().clone());
        }

        let connector = Connector::connect(role, address, &self.config)?;
        tracing::debug!(%role, address, "connector created");
        Ok(self.connectors.entry(key).or_insert(connector).value().clone())
    }

    /// Number of cached connectors.
    pub fn len(&self) -> usize {
        self.connectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connectors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_host_port_gets_http_scheme() {
        let connector =
            Connector::connect(BackendRole::Cart, "cart:7070", &ConnectorConfig::default())
                .unwrap();
        assert_eq!(connector.base_url().as_str(), "http://cart:7070/");
        assert_eq!(connector.role(), BackendRole::Cart);
        assert_eq!(connector.address(), "cart:7070");
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let connector = Connector::connect(
            BackendRole::Catalog,
            "http://catalog:3550/api",
            &ConnectorConfig::default(),
        )
        .unwrap();
        let url = connector.endpoint(&["products", "a b/c"]).unwrap();
        assert_eq!(url.as_str(), "http://catalog:3550/api/products/a%20b%2Fc");
    }

    #[test]
    fn test_empty_address_is_unreachable() {
        let err = Connector::connect(BackendRole::Payment, "  ", &ConnectorConfig::default())
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Unreachable {
                role: BackendRole::Payment,
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_address_is_unreachable() {
        let err = Connector::connect(
            BackendRole::Shipping,
            "http://[::1",
            &ConnectorConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::DependencyUnreachable);
        assert!(err.to_string().contains("http://[::1"));
    }

    #[test]
    fn test_pool_caches_per_role_and_address() {
        let pool = ConnectorPool::new(ConnectorConfig::default());
        assert!(pool.is_empty());

        pool.acquire(BackendRole::Cart, "cart:7070").unwrap();
        pool.acquire(BackendRole::Cart, "cart:7070").unwrap();
        assert_eq!(pool.len(), 1);

        pool.acquire(BackendRole::Currency, "cart:7070").unwrap();
        pool.acquire(BackendRole::Cart, "cart-2:7070").unwrap();
        assert_eq!(pool.len(), 3);
    }

    #[test]
    fn test_pool_does_not_cache_failures() {
        let pool = ConnectorPool::new(ConnectorConfig::default());
        assert!(pool.acquire(BackendRole::Cart, "").is_err());
        assert!(pool.is_empty());
    }

    #[tokio::test]
    async fn test_pool_is_shared_across_tasks() {
        let pool = std::sync::Arc::new(ConnectorPool::default());
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let pool = pool.clone();
                tokio::spawn(async move { pool.acquire(BackendRole::Payment, "payment:50051") })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(pool.len(), 1);
    }
}
