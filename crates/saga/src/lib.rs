//! Checkout saga for placing orders.
//!
//! This crate turns a place-order request into a fixed sequence of calls
//! across independent backends:
//! 1. Fetch the cart
//! 2. Price every item in the shopper's currency
//! 3. Quote and convert shipping
//! 4. Total the order
//! 5. Charge the card
//! 6. Dispatch the shipment
//! 7. Clear the cart (best-effort)
//! 8. Send the confirmation (best-effort)
//!
//! A failure in steps 1-6 aborts the checkout. There is no compensation: a
//! charge is not refunded if dispatch fails afterwards.

pub mod config;
pub mod connector;
pub mod coordinator;
pub mod error;
pub mod services;
pub mod state;

pub use config::{BackendAddresses, CheckoutConfig};
pub use connector::{BackendRole, Connector, ConnectorConfig, ConnectorPool};
pub use coordinator::{CheckoutOrchestrator, CheckoutServices};
pub use error::{CheckoutError, ErrorKind, ServiceError};
pub use services::{
    CartService, CatalogService, CurrencyService, InMemoryCartService, InMemoryCatalogService,
    InMemoryCurrencyService, InMemoryNotificationService, InMemoryPaymentService,
    InMemoryShippingService, NotificationService, PaymentFailure, PaymentService,
    RemoteCartService, RemoteCatalogService, RemoteCurrencyService, RemoteNotificationService,
    RemotePaymentService, RemoteShippingService, ShippingService,
};
pub use state::CheckoutStep;
