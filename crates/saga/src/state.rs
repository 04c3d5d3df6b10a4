//! Checkout step state machine.

use serde::{Deserialize, Serialize};

/// The steps a checkout passes through, in order.
///
/// ```text
/// Start ──► CartFetched ──► Priced ──► ShippingQuoted ──► ShippingConverted
///       ──► Totaled ──► Charged ──► Shipped ──► CartCleared
///       ──► NotificationAttempted ──► Completed
/// ```
///
/// `CartFetched` through `Shipped` are fatal: a failure there ends the
/// checkout. `CartCleared` and `NotificationAttempted` are best-effort.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum CheckoutStep {
    #[default]
    Start,
    CartFetched,
    Priced,
    ShippingQuoted,
    ShippingConverted,
    Totaled,
    Charged,
    Shipped,
    CartCleared,
    NotificationAttempted,
    Completed,
}

impl CheckoutStep {
    /// Every step in execution order.
    pub const ALL: [CheckoutStep; 11] = [
        CheckoutStep::Start,
        CheckoutStep::CartFetched,
        CheckoutStep::Priced,
        CheckoutStep::ShippingQuoted,
        CheckoutStep::ShippingConverted,
        CheckoutStep::Totaled,
        CheckoutStep::Charged,
        CheckoutStep::Shipped,
        CheckoutStep::CartCleared,
        CheckoutStep::NotificationAttempted,
        CheckoutStep::Completed,
    ];

    /// Returns true if a failure in this step aborts the checkout.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CheckoutStep::CartFetched
                | CheckoutStep::Priced
                | CheckoutStep::ShippingQuoted
                | CheckoutStep::ShippingConverted
                | CheckoutStep::Totaled
                | CheckoutStep::Charged
                | CheckoutStep::Shipped
        )
    }

    /// Returns true if a failure in this step is only logged.
    pub fn is_best_effort(&self) -> bool {
        matches!(
            self,
            CheckoutStep::CartCleared | CheckoutStep::NotificationAttempted
        )
    }

    /// Returns the step that follows this one, or `None` once completed.
    pub fn next(&self) -> Option<CheckoutStep> {
        let index = Self::ALL.iter().position(|s| s == self)?;
        Self::ALL.get(index + 1).copied()
    }

    /// Returns the step name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutStep::Start => "Start",
            CheckoutStep::CartFetched => "CartFetched",
            CheckoutStep::Priced => "Priced",
            CheckoutStep::ShippingQuoted => "ShippingQuoted",
            CheckoutStep::ShippingConverted => "ShippingConverted",
            CheckoutStep::Totaled => "Totaled",
            CheckoutStep::Charged => "Charged",
            CheckoutStep::Shipped => "Shipped",
            CheckoutStep::CartCleared => "CartCleared",
            CheckoutStep::NotificationAttempted => "NotificationAttempted",
            CheckoutStep::Completed => "Completed",
        }
    }
}

impl std::fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
