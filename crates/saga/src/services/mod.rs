//! Backend service traits with in-memory and HTTP implementations.
//!
//! Each trait wraps one collaborator of the checkout. The `InMemory*` types
//! are test doubles with failure toggles; the `Remote*` types speak the
//! JSON-over-HTTP contract through a shared [`ConnectorPool`].
//!
//! [`ConnectorPool`]: crate::connector::ConnectorPool

pub mod cart;
pub mod catalog;
pub mod currency;
pub mod notification;
pub mod payment;
pub mod remote;
pub mod shipping;

pub use cart::{CartService, InMemoryCartService};
pub use catalog::{CatalogService, InMemoryCatalogService};
pub use currency::{CurrencyService, InMemoryCurrencyService};
pub use notification::{InMemoryNotificationService, NotificationService};
pub use payment::{InMemoryPaymentService, PaymentFailure, PaymentService};
pub use remote::{
    RemoteCartService, RemoteCatalogService, RemoteCurrencyService, RemoteNotificationService,
    RemotePaymentService, RemoteShippingService,
};
pub use shipping::{InMemoryShippingService, ShippingService};
