//! Checkout error types.

use domain::MoneyError;
use thiserror::Error;

use crate::connector::BackendRole;
use crate::state::CheckoutStep;

/// Coarse classification of a checkout failure.
///
/// Callers use this to tell "bad reference" or "card declined" apart from
/// "infrastructure down, try again later".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    DependencyUnreachable,
    DependencyError,
    NotFound,
    CurrencyMismatch,
    InvalidValue,
    PaymentDeclined,
    Cancelled,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::DependencyUnreachable => "DependencyUnreachable",
            ErrorKind::DependencyError => "DependencyError",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::CurrencyMismatch => "CurrencyMismatch",
            ErrorKind::InvalidValue => "InvalidValue",
            ErrorKind::PaymentDeclined => "PaymentDeclined",
            ErrorKind::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by a single backend call.
#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    /// No usable connection to the backend (connect, timeout, I/O).
    #[error("{role} service unreachable at {address}: {reason}")]
    Unreachable {
        role: BackendRole,
        address: String,
        reason: String,
    },

    /// The backend answered but reported a failure.
    #[error("{role} service error: {reason}")]
    Backend { role: BackendRole, reason: String },

    /// The referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The payment backend explicitly refused the charge.
    #[error("Payment declined: {0}")]
    PaymentDeclined(String),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Unreachable { .. } => ErrorKind::DependencyUnreachable,
            ServiceError::Backend { .. } => ErrorKind::DependencyError,
            ServiceError::NotFound { .. } => ErrorKind::NotFound,
            ServiceError::PaymentDeclined(_) => ErrorKind::PaymentDeclined,
        }
    }
}

/// Errors returned by [`CheckoutOrchestrator::place_order`].
///
/// Every variant names the step that failed.
///
/// [`CheckoutOrchestrator::place_order`]: crate::CheckoutOrchestrator::place_order
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// A backend call failed.
    #[error("Checkout step '{step}' failed: {source}")]
    Service {
        step: CheckoutStep,
        #[source]
        source: ServiceError,
    },

    /// Money arithmetic failed while totaling the order.
    #[error("Checkout step '{step}' failed: {source}")]
    Money {
        step: CheckoutStep,
        #[source]
        source: MoneyError,
    },

    /// The checkout deadline elapsed; no later step was started.
    #[error("Checkout deadline exceeded during step '{step}'")]
    DeadlineExceeded { step: CheckoutStep },
}

impl CheckoutError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CheckoutError::Service { source, .. } => source.kind(),
            CheckoutError::Money { source, .. } => match source {
                MoneyError::CurrencyMismatch { .. } => ErrorKind::CurrencyMismatch,
                MoneyError::InvalidValue(_) => ErrorKind::InvalidValue,
            },
            CheckoutError::DeadlineExceeded { .. } => ErrorKind::Cancelled,
        }
    }

    /// Returns the step during which the checkout stopped.
    pub fn step(&self) -> CheckoutStep {
        match self {
            CheckoutError::Service { step, .. }
            | CheckoutError::Money { step, .. }
            | CheckoutError::DeadlineExceeded { step } => *step,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_error_kinds() {
        let unreachable = ServiceError::Unreachable {
            role: BackendRole::Cart,
            address: "cart:7070".to_string(),
            reason: "connection refused".to_string(),
        };
        assert_eq!(unreachable.kind(), ErrorKind::DependencyUnreachable);
        assert_eq!(
            unreachable.to_string(),
            "cart service unreachable at cart:7070: connection refused"
        );

        let declined = ServiceError::PaymentDeclined("card expired".to_string());
        assert_eq!(declined.kind(), ErrorKind::PaymentDeclined);
    }

    #[test]
    fn test_checkout_error_carries_step_and_cause() {
        let err = CheckoutError::Service {
            step: CheckoutStep::Priced,
            source: ServiceError::NotFound {
                entity: "product",
                id: "XYZ".to_string(),
            },
        };
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.step(), CheckoutStep::Priced);
        assert_eq!(
            err.to_string(),
            "Checkout step 'Priced' failed: product not found: XYZ"
        );
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_money_error_kinds() {
        let mismatch = CheckoutError::Money {
            step: CheckoutStep::Totaled,
            source: MoneyError::CurrencyMismatch {
                left: "EUR".to_string(),
                right: "USD".to_string(),
            },
        };
        assert_eq!(mismatch.kind(), ErrorKind::CurrencyMismatch);

        let deadline = CheckoutError::DeadlineExceeded {
            step: CheckoutStep::Charged,
        };
        assert_eq!(deadline.kind(), ErrorKind::Cancelled);
        assert_eq!(deadline.step(), CheckoutStep::Charged);
    }
}
