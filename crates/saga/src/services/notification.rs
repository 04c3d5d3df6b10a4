//! Order confirmation trait and in-memory implementation.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::OrderId;
use domain::OrderResult;

use crate::connector::BackendRole;
use crate::error::ServiceError;

/// Trait for notifying shoppers about their orders.
#[async_trait]
pub trait NotificationService: Send + Sync {
    /// Sends the order confirmation to `email`.
    async fn send_order_confirmation(
        &self,
        email: &str,
        order: &OrderResult,
    ) -> Result<(), ServiceError>;
}

#[derive(Debug, Default)]
struct InMemoryNotificationState {
    sent: Vec<(String, OrderId)>,
    fail_on_send: bool,
}

/// In-memory notification service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotificationService {
    state: Arc<RwLock<InMemoryNotificationState>>,
}

impl InMemoryNotificationService {
    /// Creates a new in-memory notification service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the service to fail on send calls.
    pub fn set_fail_on_send(&self, fail: bool) {
        self.state.write().unwrap().fail_on_send = fail;
    }

    /// Returns every (email, order id) pair that was confirmed.
    pub fn sent(&self) -> Vec<(String, OrderId)> {
        self.state.read().unwrap().sent.clone()
    }
}

#[async_trait]
impl NotificationService for InMemoryNotificationService {
    async fn send_order_confirmation(
        &self,
        email: &str,
        order: &OrderResult,
    ) -> Result<(), ServiceError> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_send {
            return Err(ServiceError::Backend {
                role: BackendRole::Notification,
                reason: "Mail relay rejected message".to_string(),
            });
        }
        state.sent.push((email.to_string(), order.order_id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::TrackingId;
    use domain::{Address, Money};

    fn order() -> OrderResult {
        OrderResult {
            order_id: OrderId::new(),
            shipping_tracking_id: TrackingId::new("TRACK-0001"),
            shipping_cost: Money::zero("USD"),
            shipping_address: Address::default(),
            items: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_send_records_confirmation() {
        let service = InMemoryNotificationService::new();
        let order = order();

        service
            .send_order_confirmation("someone@example.com", &order)
            .await
            .unwrap();
        assert_eq!(
            service.sent(),
            vec![("someone@example.com".to_string(), order.order_id)]
        );
    }

    #[tokio::test]
    async fn test_fail_on_send() {
        let service = InMemoryNotificationService::new();
        service.set_fail_on_send(true);

        let result = service
            .send_order_confirmation("someone@example.com", &order())
            .await;
        assert!(result.is_err());
        assert!(service.sent().is_empty());
    }
}
