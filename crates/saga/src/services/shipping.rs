//! Shipping service trait and in-memory implementation.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::TrackingId;
use domain::{Address, CartItem, Money};

use crate::connector::BackendRole;
use crate::error::ServiceError;

/// Trait for shipping operations.
#[async_trait]
pub trait ShippingService: Send + Sync {
    /// Estimates the cost of shipping `items` to `address`, in USD.
    async fn get_quote(
        &self,
        address: &Address,
        items: &[CartItem],
    ) -> Result<Money, ServiceError>;

    /// Schedules the shipment. This has external side effects and must not
    /// be retried blindly.
    async fn ship_order(
        &self,
        address: &Address,
        items: &[CartItem],
    ) -> Result<TrackingId, ServiceError>;
}

#[derive(Debug)]
struct InMemoryShippingState {
    quote: Money,
    shipments: Vec<(TrackingId, Address, Vec<CartItem>)>,
    next_id: u32,
    fail_on_quote: bool,
    fail_on_ship: bool,
    ship_calls: usize,
}

/// In-memory shipping service for testing.
///
/// Quotes a flat rate per non-empty shipment (8.99 USD unless changed).
#[derive(Debug, Clone)]
pub struct InMemoryShippingService {
    state: Arc<RwLock<InMemoryShippingState>>,
}

impl Default for InMemoryShippingService {
    fn default() -> Self {
        Self::with_flat_rate(Money::new("USD", 8, 990_000_000).expect("valid flat rate"))
    }
}

impl InMemoryShippingService {
    /// Creates a new in-memory shipping service with the default flat rate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a service that quotes `quote` for every non-empty shipment.
    pub fn with_flat_rate(quote: Money) -> Self {
        Self {
            state: Arc::new(RwLock::new(InMemoryShippingState {
                quote,
                shipments: Vec::new(),
                next_id: 0,
                fail_on_quote: false,
                fail_on_ship: false,
                ship_calls: 0,
            })),
        }
    }

    /// Configures the service to fail on get_quote calls.
    pub fn set_fail_on_quote(&self, fail: bool) {
        self.state.write().unwrap().fail_on_quote = fail;
    }

    /// Configures the service to fail on ship_order calls.
    pub fn set_fail_on_ship(&self, fail: bool) {
        self.state.write().unwrap().fail_on_ship = fail;
    }

    /// Returns the number of scheduled shipments.
    pub fn shipment_count(&self) -> usize {
        self.state.read().unwrap().shipments.len()
    }

    /// Returns how many times ship_order was called, successful or not.
    pub fn ship_calls(&self) -> usize {
        self.state.read().unwrap().ship_calls
    }

    /// Returns true if a shipment exists with the given tracking id.
    pub fn has_shipment(&self, tracking_id: &TrackingId) -> bool {
        self.state
            .read()
            .unwrap()
            .shipments
            .iter()
            .any(|(id, _, _)| id == tracking_id)
    }
}

#[async_trait]
impl ShippingService for InMemoryShippingService {
    async fn get_quote(
        &self,
        _address: &Address,
        items: &[CartItem],
    ) -> Result<Money, ServiceError> {
        let state = self.state.read().unwrap();
        if state.fail_on_quote {
            return Err(ServiceError::Backend {
                role: BackendRole::Shipping,
                reason: "Quote unavailable".to_string(),
            });
        }
        if !items.iter().any(|item| item.quantity > 0) {
            return Ok(Money::zero(state.quote.currency_code()));
        }
        Ok(state.quote.clone())
    }

    async fn ship_order(
        &self,
        address: &Address,
        items: &[CartItem],
    ) -> Result<TrackingId, ServiceError> {
        let mut state = self.state.write().unwrap();
        state.ship_calls += 1;
        if state.fail_on_ship {
            return Err(ServiceError::Unreachable {
                role: BackendRole::Shipping,
                address: "in-memory".to_string(),
                reason: "Shipping unavailable".to_string(),
            });
        }

        state.next_id += 1;
        let tracking_id = TrackingId::new(format!("TRACK-{:04}", state.next_id));
        state
            .shipments
            .push((tracking_id.clone(), address.clone(), items.to_vec()));

        Ok(tracking_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_flat_rate_quote() {
        let service = InMemoryShippingService::new();
        let quote = service
            .get_quote(&Address::default(), &[CartItem::new("A", 3)])
            .await
            .unwrap();
        assert_eq!(quote, Money::new("USD", 8, 990_000_000).unwrap());
    }

    #[tokio::test]
    async fn test_empty_shipment_is_free() {
        let service = InMemoryShippingService::new();
        let quote = service.get_quote(&Address::default(), &[]).await.unwrap();
        assert!(quote.is_zero());
        assert_eq!(quote.currency_code(), "USD");
    }

    #[tokio::test]
    async fn test_quote_for_large_quantities() {
        let service = InMemoryShippingService::new();
        let items = [CartItem::new("A", u32::MAX), CartItem::new("B", u32::MAX)];
        let quote = service.get_quote(&Address::default(), &items).await.unwrap();
        assert_eq!(quote, Money::new("USD", 8, 990_000_000).unwrap());
    }

    #[tokio::test]
    async fn test_sequential_tracking_ids() {
        let service = InMemoryShippingService::new();
        let items = [CartItem::new("A", 1)];

        let t1 = service.ship_order(&Address::default(), &items).await.unwrap();
        let t2 = service.ship_order(&Address::default(), &items).await.unwrap();

        assert_eq!(t1.as_str(), "TRACK-0001");
        assert_eq!(t2.as_str(), "TRACK-0002");
        assert!(service.has_shipment(&t1));
        assert_eq!(service.shipment_count(), 2);
    }

    #[tokio::test]
    async fn test_fail_on_ship() {
        let service = InMemoryShippingService::new();
        service.set_fail_on_ship(true);

        let result = service.ship_order(&Address::default(), &[]).await;
        assert!(result.is_err());
        assert_eq!(service.shipment_count(), 0);
        assert_eq!(service.ship_calls(), 1);
    }

    #[tokio::test]
    async fn test_fail_on_quote() {
        let service = InMemoryShippingService::new();
        service.set_fail_on_quote(true);
        assert!(service.get_quote(&Address::default(), &[]).await.is_err());
    }
}
