use common::UserId;
use serde::{Deserialize, Serialize};

use crate::order::value_objects::{Address, CreditCardInfo};

/// Inbound checkout request. The cart itself is looked up by `user_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceOrderRequest {
    pub user_id: UserId,
    pub user_currency: String,
    pub address: Address,
    pub email: String,
    pub credit_card: CreditCardInfo,
}
