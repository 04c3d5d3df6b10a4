//! Domain layer for the checkout service.
//!
//! This crate provides:
//! - [`Money`], a fixed-point currency amount with checked arithmetic
//! - the checkout value objects exchanged with backends and callers

pub mod error;
pub mod money;
pub mod order;

pub use error::MoneyError;
pub use money::{Money, NANOS_PER_UNIT};
pub use order::{
    Address, CartItem, CreditCardInfo, OrderItem, OrderResult, PlaceOrderRequest, Product,
    ProductId, order_total,
};
