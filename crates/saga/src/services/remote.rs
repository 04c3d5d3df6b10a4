//! HTTP/JSON clients for the checkout backends.
//!
//! | role         | call                         | success body            |
//! |--------------|------------------------------|-------------------------|
//! | cart         | `GET /carts/{user_id}`       | [`CartResponse`]        |
//! | cart         | `DELETE /carts/{user_id}`    | any                     |
//! | catalog      | `GET /products/{id}`         | [`Product`]             |
//! | currency     | `POST /convert`              | [`Money`]               |
//! | shipping     | `POST /quote`                | [`QuoteResponse`]       |
//! | shipping     | `POST /ship`                 | [`ShipResponse`]        |
//! | payment      | `POST /charge`               | [`ChargeResponse`]      |
//! | notification | `POST /order-confirmations`  | any                     |

use std::sync::Arc;

use async_trait::async_trait;
use common::{TrackingId, TransactionId, UserId};
use domain::{Address, CartItem, CreditCardInfo, Money, OrderResult, Product, ProductId};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};

use crate::connector::{BackendRole, Connector, ConnectorPool};
use crate::error::ServiceError;
use crate::services::cart::check_quantities;
use crate::services::{
    CartService, CatalogService, CurrencyService, NotificationService, PaymentService,
    ShippingService,
};

/// Body of `GET /carts/{user_id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartResponse {
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub items: Vec<CartItem>,
}

/// Body of `POST /convert`.
#[derive(Debug, Clone, Serialize)]
pub struct ConvertRequest<'a> {
    pub from: &'a Money,
    pub to_code: &'a str,
}

/// Body of `POST /quote` and `POST /ship`.
#[derive(Debug, Clone, Serialize)]
pub struct ShipmentRequest<'a> {
    pub address: &'a Address,
    pub items: &'a [CartItem],
}

/// Response of `POST /quote`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteResponse {
    pub cost_usd: Money,
}

/// Response of `POST /ship`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipResponse {
    pub tracking_id: TrackingId,
}

/// Body of `POST /charge`.
#[derive(Debug, Clone, Serialize)]
pub struct ChargeRequest<'a> {
    pub amount: &'a Money,
    pub credit_card: &'a CreditCardInfo,
}

/// Response of `POST /charge`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeResponse {
    pub transaction_id: TransactionId,
}

/// Body of `POST /order-confirmations`.
#[derive(Debug, Clone, Serialize)]
pub struct ConfirmationRequest<'a> {
    pub email: &'a str,
    pub order: &'a OrderResult,
}

/// Shared plumbing: which backend, where, and the pool to get a handle from.
#[derive(Debug, Clone)]
struct Endpoint {
    role: BackendRole,
    address: String,
    pool: Arc<ConnectorPool>,
}

impl Endpoint {
    fn new(role: BackendRole, pool: Arc<ConnectorPool>, address: impl Into<String>) -> Self {
        Self {
            role,
            address: address.into(),
            pool,
        }
    }

    fn connector(&self) -> Result<Connector, ServiceError> {
        self.pool.acquire(self.role, &self.address)
    }
}

/// Cart backend over HTTP.
#[derive(Debug, Clone)]
pub struct RemoteCartService {
    endpoint: Endpoint,
}

impl RemoteCartService {
    pub fn new(pool: Arc<ConnectorPool>, address: impl Into<String>) -> Self {
        Self {
            endpoint: Endpoint::new(BackendRole::Cart, pool, address),
        }
    }
}

#[async_trait]
impl CartService for RemoteCartService {
    #[tracing::instrument(skip_all, fields(user_id = %user_id))]
    async fn get_cart(&self, user_id: &UserId) -> Result<Vec<CartItem>, ServiceError> {
        let connector = self.endpoint.connector()?;
        let request = connector.request(Method::GET, &["carts", user_id.as_str()])?;
        let response = connector.send(request).await?;
        let cart: CartResponse = connector.json(response).await?;
        check_quantities(&cart.items)?;
        Ok(cart.items)
    }

    #[tracing::instrument(skip_all, fields(user_id = %user_id))]
    async fn empty_cart(&self, user_id: &UserId) -> Result<(), ServiceError> {
        let connector = self.endpoint.connector()?;
        let request = connector.request(Method::DELETE, &["carts", user_id.as_str()])?;
        let response = connector.send(request).await?;
        connector.success(response).await?;
        Ok(())
    }
}

/// Catalog backend over HTTP.
#[derive(Debug, Clone)]
pub struct RemoteCatalogService {
    endpoint: Endpoint,
}

impl RemoteCatalogService {
    pub fn new(pool: Arc<ConnectorPool>, address: impl Into<String>) -> Self {
        Self {
            endpoint: Endpoint::new(BackendRole::Catalog, pool, address),
        }
    }
}

#[async_trait]
impl CatalogService for RemoteCatalogService {
    #[tracing::instrument(skip_all, fields(product_id = %id))]
    async fn get_product(&self, id: &ProductId) -> Result<Product, ServiceError> {
        let connector = self.endpoint.connector()?;
        let request = connector.request(Method::GET, &["products", id.as_str()])?;
        let response = connector.send(request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(ServiceError::NotFound {
                entity: "product",
                id: id.to_string(),
            });
        }
        connector.json(response).await
    }
}

/// Currency backend over HTTP.
#[derive(Debug, Clone)]
pub struct RemoteCurrencyService {
    endpoint: Endpoint,
}

impl RemoteCurrencyService {
    pub fn new(pool: Arc<ConnectorPool>, address: impl Into<String>) -> Self {
        Self {
            endpoint: Endpoint::new(BackendRole::Currency, pool, address),
        }
    }
}

#[async_trait]
impl CurrencyService for RemoteCurrencyService {
    #[tracing::instrument(skip_all, fields(from = %from, to = to_code))]
    async fn convert(&self, from: &Money, to_code: &str) -> Result<Money, ServiceError> {
        let connector = self.endpoint.connector()?;
        let request = connector
            .request(Method::POST, &["convert"])?
            .json(&ConvertRequest { from, to_code });
        let response = connector.send(request).await?;
        connector.json(response).await
    }
}

/// Shipping backend over HTTP.
#[derive(Debug, Clone)]
pub struct RemoteShippingService {
    endpoint: Endpoint,
}

impl RemoteShippingService {
    pub fn new(pool: Arc<ConnectorPool>, address: impl Into<String>) -> Self {
        Self {
            endpoint: Endpoint::new(BackendRole::Shipping, pool, address),
        }
    }
}

#[async_trait]
impl ShippingService for RemoteShippingService {
    #[tracing::instrument(skip_all, fields(items = items.len()))]
    async fn get_quote(
        &self,
        address: &Address,
        items: &[CartItem],
    ) -> Result<Money, ServiceError> {
        let connector = self.endpoint.connector()?;
        let request = connector
            .request(Method::POST, &["quote"])?
            .json(&ShipmentRequest { address, items });
        let response = connector.send(request).await?;
        let quote: QuoteResponse = connector.json(response).await?;
        Ok(quote.cost_usd)
    }

    #[tracing::instrument(skip_all, fields(items = items.len()))]
    async fn ship_order(
        &self,
        address: &Address,
        items: &[CartItem],
    ) -> Result<TrackingId, ServiceError> {
        let connector = self.endpoint.connector()?;
        let request = connector
            .request(Method::POST, &["ship"])?
            .json(&ShipmentRequest { address, items });
        let response = connector.send(request).await?;
        let shipment: ShipResponse = connector.json(response).await?;
        Ok(shipment.tracking_id)
    }
}

/// Payment backend over HTTP.
///
/// 402 and 422 responses are treated as a declined card.
#[derive(Debug, Clone)]
pub struct RemotePaymentService {
    endpoint: Endpoint,
}

impl RemotePaymentService {
    pub fn new(pool: Arc<ConnectorPool>, address: impl Into<String>) -> Self {
        Self {
            endpoint: Endpoint::new(BackendRole::Payment, pool, address),
        }
    }
}

#[async_trait]
impl PaymentService for RemotePaymentService {
    #[tracing::instrument(skip_all, fields(amount = %amount, card = %card.masked_number()))]
    async fn charge(
        &self,
        amount: &Money,
        card: &CreditCardInfo,
    ) -> Result<TransactionId, ServiceError> {
        let connector = self.endpoint.connector()?;
        let request = connector
            .request(Method::POST, &["charge"])?
            .json(&ChargeRequest {
                amount,
                credit_card: card,
            });
        let response = connector.send(request).await?;

        let status = response.status();
        if status == StatusCode::PAYMENT_REQUIRED || status == StatusCode::UNPROCESSABLE_ENTITY {
            let reason = response.text().await.unwrap_or_default();
            let reason = if reason.trim().is_empty() {
                format!("status {status}")
            } else {
                reason.trim().to_string()
            };
            return Err(ServiceError::PaymentDeclined(reason));
        }

        let charge: ChargeResponse = connector.json(response).await?;
        Ok(charge.transaction_id)
    }
}

/// Notification backend over HTTP.
#[derive(Debug, Clone)]
pub struct RemoteNotificationService {
    endpoint: Endpoint,
}

impl RemoteNotificationService {
    pub fn new(pool: Arc<ConnectorPool>, address: impl Into<String>) -> Self {
        Self {
            endpoint: Endpoint::new(BackendRole::Notification, pool, address),
        }
    }
}

#[async_trait]
impl NotificationService for RemoteNotificationService {
    #[tracing::instrument(skip_all, fields(order_id = %order.order_id))]
    async fn send_order_confirmation(
        &self,
        email: &str,
        order: &OrderResult,
    ) -> Result<(), ServiceError> {
        let connector = self.endpoint.connector()?;
        let request = connector
            .request(Method::POST, &["order-confirmations"])?
            .json(&ConfirmationRequest { email, order });
        let response = connector.send(request).await?;
        connector.success(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_address_is_unreachable() {
        let pool = Arc::new(ConnectorPool::default());
        let cart = RemoteCartService::new(pool.clone(), "");

        let err = cart.get_cart(&UserId::new("u1")).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Unreachable {
                role: BackendRole::Cart,
                ..
            }
        ));
        assert!(pool.is_empty());
    }

    #[test]
    fn test_charge_request_shape() {
        let amount = Money::from_units("USD", 28);
        let card = CreditCardInfo {
            credit_card_number: "4432801561520454".to_string(),
            credit_card_cvv: 672,
            credit_card_expiration_year: 2030,
            credit_card_expiration_month: 1,
        };
        let json = serde_json::to_value(ChargeRequest {
            amount: &amount,
            credit_card: &card,
        })
        .unwrap();
        assert_eq!(json["amount"]["units"], 28);
        assert_eq!(json["amount"]["currency_code"], "USD");
        assert_eq!(json["credit_card"]["credit_card_cvv"], 672);
    }

    #[test]
    fn test_cart_response_tolerates_missing_items() {
        let cart: CartResponse = serde_json::from_str(r#"{"user_id":"u1"}"#).unwrap();
        assert!(cart.items.is_empty());
    }
}
