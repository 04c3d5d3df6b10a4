//! Checkout value objects: what is bought, where it goes, how it is paid.

mod request;
mod result;
mod value_objects;

pub use request::PlaceOrderRequest;
pub use result::{OrderItem, OrderResult, order_total};
pub use value_objects::{Address, CartItem, CreditCardInfo, Product, ProductId};
