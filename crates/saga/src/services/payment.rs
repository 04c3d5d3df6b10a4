//! Payment service trait and in-memory implementation.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::TransactionId;
use domain::{CreditCardInfo, Money};

use crate::connector::BackendRole;
use crate::error::ServiceError;

/// Trait for payment processing operations.
///
/// A charge moves funds. No idempotency key is sent, so a repeated call
/// after a timeout can charge twice.
#[async_trait]
pub trait PaymentService: Send + Sync {
    /// Charges `amount` to `card` and returns the transaction id.
    async fn charge(
        &self,
        amount: &Money,
        card: &CreditCardInfo,
    ) -> Result<TransactionId, ServiceError>;
}

/// How the in-memory payment service should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentFailure {
    /// The charge is explicitly refused.
    Decline,
    /// The backend cannot be reached.
    Unreachable,
}

#[derive(Debug, Default)]
struct InMemoryPaymentState {
    charges: Vec<(TransactionId, Money)>,
    next_id: u32,
    failure: Option<PaymentFailure>,
    attempts: usize,
}

/// In-memory payment service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentService {
    state: Arc<RwLock<InMemoryPaymentState>>,
}

impl InMemoryPaymentService {
    /// Creates a new in-memory payment service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures how subsequent charge calls fail; `None` lets them succeed.
    pub fn set_failure(&self, failure: Option<PaymentFailure>) {
        self.state.write().unwrap().failure = failure;
    }

    /// Returns the number of successful charges.
    pub fn charge_count(&self) -> usize {
        self.state.read().unwrap().charges.len()
    }

    /// Returns how many times charge was called, successful or not.
    pub fn attempts(&self) -> usize {
        self.state.read().unwrap().attempts
    }

    /// Returns the amounts of all successful charges, in order.
    pub fn charged_amounts(&self) -> Vec<Money> {
        self.state
            .read()
            .unwrap()
            .charges
            .iter()
            .map(|(_, amount)| amount.clone())
            .collect()
    }
}

#[async_trait]
impl PaymentService for InMemoryPaymentService {
    async fn charge(
        &self,
        amount: &Money,
        card: &CreditCardInfo,
    ) -> Result<TransactionId, ServiceError> {
        let mut state = self.state.write().unwrap();
        state.attempts += 1;

        match state.failure {
            Some(PaymentFailure::Decline) => {
                return Err(ServiceError::PaymentDeclined(format!(
                    "Card {} declined",
                    card.masked_number()
                )));
            }
            Some(PaymentFailure::Unreachable) => {
                return Err(ServiceError::Unreachable {
                    role: BackendRole::Payment,
                    address: "in-memory".to_string(),
                    reason: "Payment gateway timeout".to_string(),
                });
            }
            None => {}
        }

        state.next_id += 1;
        let transaction_id = TransactionId::new(format!("TXN-{:04}", state.next_id));
        state
            .charges
            .push((transaction_id.clone(), amount.clone()));

        Ok(transaction_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card() -> CreditCardInfo {
        CreditCardInfo {
            credit_card_number: "4432801561520454".to_string(),
            credit_card_cvv: 672,
            credit_card_expiration_year: 2030,
            credit_card_expiration_month: 1,
        }
    }

    #[tokio::test]
    async fn test_charge() {
        let service = InMemoryPaymentService::new();
        let amount = Money::from_units("USD", 50);

        let txn = service.charge(&amount, &card()).await.unwrap();
        assert_eq!(txn.as_str(), "TXN-0001");
        assert_eq!(service.charge_count(), 1);
        assert_eq!(service.charged_amounts(), vec![amount]);
    }

    #[tokio::test]
    async fn test_decline() {
        let service = InMemoryPaymentService::new();
        service.set_failure(Some(PaymentFailure::Decline));

        let err = service
            .charge(&Money::from_units("USD", 50), &card())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::PaymentDeclined(_)));
        assert!(err.to_string().contains("****0454"));
        assert_eq!(service.charge_count(), 0);
        assert_eq!(service.attempts(), 1);
    }

    #[tokio::test]
    async fn test_unreachable() {
        let service = InMemoryPaymentService::new();
        service.set_failure(Some(PaymentFailure::Unreachable));

        let err = service
            .charge(&Money::from_units("USD", 50), &card())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::DependencyUnreachable);
    }
}
