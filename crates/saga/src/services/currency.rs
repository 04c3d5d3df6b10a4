//! Currency conversion trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use domain::{Money, NANOS_PER_UNIT};

use crate::connector::BackendRole;
use crate::error::ServiceError;

/// Trait for converting amounts between currencies.
///
/// Currency codes are validated by the backend, not here.
#[async_trait]
pub trait CurrencyService: Send + Sync {
    /// Converts `from` into `to_code`.
    async fn convert(&self, from: &Money, to_code: &str) -> Result<Money, ServiceError>;
}

#[derive(Debug, Default)]
struct InMemoryCurrencyState {
    /// Target nanos per whole source unit, keyed by (from, to).
    rates: HashMap<(String, String), i64>,
    result_currency_override: Option<String>,
    offline: bool,
    conversions: usize,
}

/// In-memory currency service for testing.
///
/// Converting to the same currency is the identity. Other pairs need a rate.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCurrencyService {
    state: Arc<RwLock<InMemoryCurrencyState>>,
}

impl InMemoryCurrencyService {
    /// Creates a new currency service that only knows the identity rate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the rate for `from` → `to`, in nanos of `to` per whole `from`.
    ///
    /// `set_rate("USD", "EUR", 920_000_000)` means 1 USD = 0.92 EUR.
    pub fn set_rate(&self, from: &str, to: &str, nanos_per_unit: i64) {
        self.state
            .write()
            .unwrap()
            .rates
            .insert((from.to_string(), to.to_string()), nanos_per_unit);
    }

    /// Makes the service label every result with `currency`, regardless of
    /// the requested target.
    pub fn force_result_currency(&self, currency: Option<&str>) {
        self.state.write().unwrap().result_currency_override = currency.map(str::to_string);
    }

    /// Makes every conversion fail as if the backend were down.
    pub fn set_offline(&self, offline: bool) {
        self.state.write().unwrap().offline = offline;
    }

    /// Returns how many conversions were requested.
    pub fn conversions(&self) -> usize {
        self.state.read().unwrap().conversions
    }
}

#[async_trait]
impl CurrencyService for InMemoryCurrencyService {
    async fn convert(&self, from: &Money, to_code: &str) -> Result<Money, ServiceError> {
        let mut state = self.state.write().unwrap();
        state.conversions += 1;
        if state.offline {
            return Err(ServiceError::Unreachable {
                role: BackendRole::Currency,
                address: "in-memory".to_string(),
                reason: "Currency service offline".to_string(),
            });
        }

        let converted = if from.currency_code() == to_code {
            Money::new(to_code, from.units(), from.nanos())
        } else {
            let rate = state
                .rates
                .get(&(from.currency_code().to_string(), to_code.to_string()))
                .copied()
                .ok_or_else(|| ServiceError::Backend {
                    role: BackendRole::Currency,
                    reason: format!(
                        "Unsupported conversion {} -> {to_code}",
                        from.currency_code()
                    ),
                })?;
            convert_at_rate(from, to_code, rate)
        }
        .map_err(|e| ServiceError::Backend {
            role: BackendRole::Currency,
            reason: e.to_string(),
        })?;

        match &state.result_currency_override {
            Some(code) => Money::new(code.as_str(), converted.units(), converted.nanos())
                .map_err(|e| ServiceError::Backend {
                    role: BackendRole::Currency,
                    reason: e.to_string(),
                }),
            None => Ok(converted),
        }
    }
}

// Exact rational conversion, truncated to whole nanos.
fn convert_at_rate(from: &Money, to_code: &str, rate: i64) -> Result<Money, domain::MoneyError> {
    let scale = i128::from(NANOS_PER_UNIT);
    let source = i128::from(from.units()) * scale + i128::from(from.nanos());
    let overflow = || domain::MoneyError::InvalidValue("units overflow".to_string());
    let target = source.checked_mul(i128::from(rate)).ok_or_else(overflow)? / scale;
    let units = i64::try_from(target / scale).map_err(|_| overflow())?;
    Money::new(to_code, units, (target % scale) as i32)
}
