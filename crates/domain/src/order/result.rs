//! Priced order lines and the confirmed order returned by checkout.

use common::{OrderId, TrackingId};
use serde::{Deserialize, Serialize};

use crate::error::MoneyError;
use crate::money::Money;
use crate::order::value_objects::{Address, CartItem};

/// A cart line priced in the shopper's currency.
///
/// `cost` is the price of a single unit; quantity is applied when the order
/// total is computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub item: CartItem,
    pub cost: Money,
}

impl OrderItem {
    pub fn new(item: CartItem, cost: Money) -> Self {
        Self { item, cost }
    }

    /// Returns the unit cost multiplied by the quantity.
    pub fn line_total(&self) -> Result<Money, MoneyError> {
        self.cost.multiply(self.item.quantity)
    }
}

/// Computes what the shopper pays: shipping plus every line total, all in
/// `currency_code`.
///
/// Fails with [`MoneyError::CurrencyMismatch`] if any amount is not in
/// `currency_code`.
pub fn order_total(
    currency_code: &str,
    shipping_cost: &Money,
    items: &[OrderItem],
) -> Result<Money, MoneyError> {
    let mut total = Money::zero(currency_code).sum(shipping_cost)?;
    for line in items {
        total = total.sum(&line.line_total()?)?;
    }
    Ok(total)
}

/// A successfully placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderResult {
    pub order_id: OrderId,
    pub shipping_tracking_id: TrackingId,
    pub shipping_cost: Money,
    pub shipping_address: Address,
    pub items: Vec<OrderItem>,
}
