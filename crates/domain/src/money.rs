//! Fixed-point currency amounts.
//!
//! A [`Money`] value is `units + nanos / 1e9` of a currency. Both parts carry
//! the same sign, and `|nanos|` stays below one billion, so every amount has
//! exactly one representation.

use serde::{Deserialize, Serialize};

use crate::error::MoneyError;

/// Number of nano-units in one whole unit.
pub const NANOS_PER_UNIT: i32 = 1_000_000_000;

const NANOS_PER_UNIT_WIDE: i128 = NANOS_PER_UNIT as i128;

/// An amount of money in a specific currency.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawMoney")]
pub struct Money {
    currency_code: String,
    units: i64,
    nanos: i32,
}

/// Wire shape of [`Money`] before the sign and range checks run.
#[derive(Deserialize)]
struct RawMoney {
    currency_code: String,
    #[serde(default)]
    units: i64,
    #[serde(default)]
    nanos: i32,
}

impl TryFrom<RawMoney> for Money {
    type Error = MoneyError;

    fn try_from(raw: RawMoney) -> Result<Self, Self::Error> {
        Money::new(raw.currency_code, raw.units, raw.nanos)
    }
}

impl Money {
    /// Creates a validated amount.
    ///
    /// Fails with [`MoneyError::InvalidValue`] when `|nanos|` is not below one
    /// billion or when `units` and `nanos` have opposite non-zero signs.
    pub fn new(
        currency_code: impl Into<String>,
        units: i64,
        nanos: i32,
    ) -> Result<Self, MoneyError> {
        if !(-(NANOS_PER_UNIT - 1)..=NANOS_PER_UNIT - 1).contains(&nanos) {
            return Err(MoneyError::InvalidValue(format!(
                "nanos {nanos} out of range"
            )));
        }
        if units != 0 && nanos != 0 && (units < 0) != (nanos < 0) {
            return Err(MoneyError::InvalidValue(format!(
                "units {units} and nanos {nanos} have mismatched signs"
            )));
        }
        Ok(Self {
            currency_code: currency_code.into(),
            units,
            nanos,
        })
    }

    /// Returns zero in the given currency.
    pub fn zero(currency_code: impl Into<String>) -> Self {
        Self {
            currency_code: currency_code.into(),
            units: 0,
            nanos: 0,
        }
    }

    /// Creates a whole-unit amount.
    pub fn from_units(currency_code: impl Into<String>, units: i64) -> Self {
        Self {
            currency_code: currency_code.into(),
            units,
            nanos: 0,
        }
    }

    pub fn currency_code(&self) -> &str {
        &self.currency_code
    }

    pub fn units(&self) -> i64 {
        self.units
    }

    pub fn nanos(&self) -> i32 {
        self.nanos
    }

    pub fn is_zero(&self) -> bool {
        self.units == 0 && self.nanos == 0
    }

    pub fn is_positive(&self) -> bool {
        self.units > 0 || (self.units == 0 && self.nanos > 0)
    }

    pub fn is_negative(&self) -> bool {
        self.units < 0 || (self.units == 0 && self.nanos < 0)
    }

    /// Returns true if both amounts are in the same currency.
    pub fn same_currency(&self, other: &Money) -> bool {
        self.currency_code == other.currency_code
    }

    /// Returns the amount with its sign flipped.
    ///
    /// Fails with [`MoneyError::InvalidValue`] for `units == i64::MIN`, which
    /// has no positive counterpart.
    pub fn negate(&self) -> Result<Money, MoneyError> {
        let units = self
            .units
            .checked_neg()
            .ok_or_else(|| MoneyError::InvalidValue("units overflow".to_string()))?;
        Ok(Money {
            currency_code: self.currency_code.clone(),
            units,
            nanos: -self.nanos,
        })
    }

    /// Adds two amounts of the same currency.
    ///
    /// The nano parts carry into the units, and the result is normalized so
    /// both parts share a sign.
    pub fn sum(&self, other: &Money) -> Result<Money, MoneyError> {
        if !self.same_currency(other) {
            return Err(MoneyError::CurrencyMismatch {
                left: self.currency_code.clone(),
                right: other.currency_code.clone(),
            });
        }
        let total = self.total_nanos() + other.total_nanos();
        Self::from_total_nanos(&self.currency_code, total)
    }

    /// Multiplies the amount by a non-negative integer.
    ///
    /// The result is exactly what summing `self` with itself `n` times would
    /// give; `n == 0` yields zero in the same currency.
    pub fn multiply(&self, n: u32) -> Result<Money, MoneyError> {
        let total = self.total_nanos() * i128::from(n);
        Self::from_total_nanos(&self.currency_code, total)
    }

    /// Sums a sequence of amounts, starting from zero in `currency_code`.
    pub fn total<'a>(
        currency_code: &str,
        amounts: impl IntoIterator<Item = &'a Money>,
    ) -> Result<Money, MoneyError> {
        amounts
            .into_iter()
            .try_fold(Money::zero(currency_code), |acc, m| acc.sum(m))
    }

    fn total_nanos(&self) -> i128 {
        i128::from(self.units) * NANOS_PER_UNIT_WIDE + i128::from(self.nanos)
    }

    // Truncating division keeps quotient and remainder on the same side of
    // zero, which is exactly the sign rule.
    fn from_total_nanos(currency_code: &str, total: i128) -> Result<Money, MoneyError> {
        let units = i64::try_from(total / NANOS_PER_UNIT_WIDE)
            .map_err(|_| MoneyError::InvalidValue("units overflow".to_string()))?;
        let nanos = (total % NANOS_PER_UNIT_WIDE) as i32;
        Ok(Money {
            currency_code: currency_code.to_string(),
            units,
            nanos,
        })
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.is_negative() { "-" } else { "" };
        let fraction = format!("{:09}", self.nanos.unsigned_abs());
        let trimmed = fraction.trim_end_matches('0');
        let fraction = if trimmed.len() < 2 {
            &fraction[..2]
        } else {
            trimmed
        };
        write!(
            f,
            "{sign}{}.{fraction} {}",
            self.units.unsigned_abs(),
            self.currency_code
        )
    }
}
