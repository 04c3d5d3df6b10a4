//! Orchestrator configuration.

use std::time::Duration;

/// Settings fixed when the orchestrator is built.
///
/// Nothing here is read from the environment at call time; the api crate
/// maps environment variables onto this struct once at startup.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// Currency the shipping backend quotes in.
    pub shipping_reference_currency: String,

    /// Upper bound on a whole checkout. Once elapsed, the running step is
    /// abandoned and no later step starts.
    pub deadline: Option<Duration>,

    /// How many cart items are priced at once. `1` prices them one by one.
    pub pricing_concurrency: usize,

    /// Artificial delay injected at the start of every backend step.
    pub extra_latency: Option<Duration>,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            shipping_reference_currency: "USD".to_string(),
            deadline: None,
            pricing_concurrency: 1,
            extra_latency: None,
        }
    }
}

impl CheckoutConfig {
    /// Set the overall checkout deadline.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Set the pricing concurrency. Zero is treated as one.
    pub fn with_pricing_concurrency(mut self, concurrency: usize) -> Self {
        self.pricing_concurrency = concurrency.max(1);
        self
    }

    /// Set the artificial per-call latency.
    pub fn with_extra_latency(mut self, latency: Duration) -> Self {
        self.extra_latency = Some(latency);
        self
    }
}

/// Network addresses of the six checkout backends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendAddresses {
    pub cart: String,
    pub catalog: String,
    pub currency: String,
    pub shipping: String,
    pub payment: String,
    pub notification: String,
}
