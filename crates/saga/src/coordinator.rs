//! Checkout orchestrator: turns a place-order request into backend calls.

use std::future::Future;
use std::sync::Arc;

use common::OrderId;
use domain::{CartItem, OrderItem, OrderResult, PlaceOrderRequest, order_total};
use futures_util::{StreamExt, TryStreamExt, stream};
use tokio::time::Instant;

use crate::config::{BackendAddresses, CheckoutConfig};
use crate::connector::ConnectorPool;
use crate::error::{CheckoutError, ServiceError};
use crate::services::{
    CartService, CatalogService, CurrencyService, NotificationService, PaymentService,
    RemoteCartService, RemoteCatalogService, RemoteCurrencyService, RemoteNotificationService,
    RemotePaymentService, RemoteShippingService, ShippingService,
};
use crate::state::CheckoutStep;

/// The backends a checkout talks to.
#[derive(Clone)]
pub struct CheckoutServices {
    pub cart: Arc<dyn CartService>,
    pub catalog: Arc<dyn CatalogService>,
    pub currency: Arc<dyn CurrencyService>,
    pub shipping: Arc<dyn ShippingService>,
    pub payment: Arc<dyn PaymentService>,
    pub notification: Arc<dyn NotificationService>,
}

impl CheckoutServices {
    /// HTTP clients for every backend, sharing one connector pool.
    pub fn remote(pool: Arc<ConnectorPool>, addresses: &BackendAddresses) -> Self {
        Self {
            cart: Arc::new(RemoteCartService::new(pool.clone(), &addresses.cart)),
            catalog: Arc::new(RemoteCatalogService::new(pool.clone(), &addresses.catalog)),
            currency: Arc::new(RemoteCurrencyService::new(pool.clone(), &addresses.currency)),
            shipping: Arc::new(RemoteShippingService::new(pool.clone(), &addresses.shipping)),
            payment: Arc::new(RemotePaymentService::new(pool.clone(), &addresses.payment)),
            notification: Arc::new(RemoteNotificationService::new(
                pool,
                &addresses.notification,
            )),
        }
    }
}

/// Drives the place-order saga.
///
/// Steps run strictly in order. Any failure from fetching the cart up to
/// dispatching the shipment aborts the checkout and is returned. Nothing
/// already committed is undone: a charge followed by a failed dispatch stays
/// charged. Clearing the cart and sending the confirmation are best-effort;
/// their failures are logged and the order is still returned.
///
/// Dropping the returned future abandons every outstanding backend call.
pub struct CheckoutOrchestrator {
    services: CheckoutServices,
    config: CheckoutConfig,
}

impl CheckoutOrchestrator {
    /// Creates a new orchestrator.
    pub fn new(services: CheckoutServices, config: CheckoutConfig) -> Self {
        Self { services, config }
    }

    pub fn config(&self) -> &CheckoutConfig {
        &self.config
    }

    /// Places an order for the user's current cart.
    ///
    /// Every call mints a new order id, so two identical requests produce
    /// two orders (and two charges).
    #[tracing::instrument(
        skip_all,
        fields(
            user_id = %request.user_id,
            user_currency = %request.user_currency,
            order_id = tracing::field::Empty,
        )
    )]
    pub async fn place_order(
        &self,
        request: &PlaceOrderRequest,
    ) -> Result<OrderResult, CheckoutError> {
        metrics::counter!("checkout_orders_total").increment(1);
        let started = std::time::Instant::now();

        let order_id = OrderId::new();
        tracing::Span::current().record("order_id", tracing::field::display(order_id));
        tracing::info!("placing order");

        let deadline = self.config.deadline.map(|d| Instant::now() + d);
        let result = self.run(order_id, request, deadline).await;

        let duration = started.elapsed().as_secs_f64();
        metrics::histogram!("checkout_duration_seconds").record(duration);
        match &result {
            Ok(order) => {
                metrics::counter!("checkout_orders_completed").increment(1);
                tracing::info!(
                    duration,
                    tracking_id = %order.shipping_tracking_id,
                    "order placed"
                );
            }
            Err(err) => {
                metrics::counter!(
                    "checkout_orders_failed",
                    "kind" => err.kind().as_str(),
                    "step" => err.step().as_str()
                )
                .increment(1);
                tracing::warn!(
                    error = %err,
                    kind = %err.kind(),
                    step = %err.step(),
                    "checkout failed"
                );
            }
        }
        result
    }

    async fn run(
        &self,
        order_id: OrderId,
        request: &PlaceOrderRequest,
        deadline: Option<Instant>,
    ) -> Result<OrderResult, CheckoutError> {
        let currency = request.user_currency.as_str();

        let cart_items = self
            .step(
                CheckoutStep::CartFetched,
                deadline,
                self.services.cart.get_cart(&request.user_id),
            )
            .await?;
        tracing::info!(items = cart_items.len(), "cart fetched");

        let order_items = self
            .step(
                CheckoutStep::Priced,
                deadline,
                self.price_items(&cart_items, currency),
            )
            .await?;

        let shipping_quote = self
            .step(
                CheckoutStep::ShippingQuoted,
                deadline,
                self.services
                    .shipping
                    .get_quote(&request.address, &cart_items),
            )
            .await?;
        if shipping_quote.currency_code() != self.config.shipping_reference_currency {
            tracing::warn!(
                quote = %shipping_quote,
                expected = %self.config.shipping_reference_currency,
                "shipping quote in unexpected currency"
            );
        }

        let shipping_cost = self
            .step(
                CheckoutStep::ShippingConverted,
                deadline,
                self.services.currency.convert(&shipping_quote, currency),
            )
            .await?;

        let total = order_total(currency, &shipping_cost, &order_items).map_err(|source| {
            CheckoutError::Money {
                step: CheckoutStep::Totaled,
                source,
            }
        })?;
        tracing::info!(%total, "order total computed");

        let transaction_id = self
            .step(
                CheckoutStep::Charged,
                deadline,
                self.services.payment.charge(&total, &request.credit_card),
            )
            .await?;
        tracing::info!(%transaction_id, "payment went through");

        let tracking_id = self
            .step(
                CheckoutStep::Shipped,
                deadline,
                self.services
                    .shipping
                    .ship_order(&request.address, &cart_items),
            )
            .await?;

        self.best_effort(
            CheckoutStep::CartCleared,
            deadline,
            self.services.cart.empty_cart(&request.user_id),
        )
        .await;

        let order = OrderResult {
            order_id,
            shipping_tracking_id: tracking_id,
            shipping_cost,
            shipping_address: request.address.clone(),
            items: order_items,
        };

        let sent = self
            .best_effort(
                CheckoutStep::NotificationAttempted,
                deadline,
                self.services
                    .notification
                    .send_order_confirmation(&request.email, &order),
            )
            .await;
        if sent {
            tracing::info!(email = %request.email, "order confirmation sent");
        }

        Ok(order)
    }

    /// Prices every cart item in the user's currency, keeping cart order.
    ///
    /// Up to `pricing_concurrency` items are in flight at once; the first
    /// failure drops the rest.
    async fn price_items(
        &self,
        items: &[CartItem],
        currency: &str,
    ) -> Result<Vec<OrderItem>, ServiceError> {
        let lookups: Vec<_> = items
            .iter()
            .map(|item| self.price_item(item, currency))
            .collect();
        stream::iter(lookups)
            .buffered(self.config.pricing_concurrency.max(1))
            .try_collect()
            .await
    }

    async fn price_item(&self, item: &CartItem, currency: &str) -> Result<OrderItem, ServiceError> {
        let product = self.services.catalog.get_product(&item.product_id).await?;
        let cost = self.services.currency.convert(&product.price, currency).await?;
        Ok(OrderItem::new(item.clone(), cost))
    }

    /// Runs a step whose failure aborts the checkout.
    async fn step<T, F>(
        &self,
        step: CheckoutStep,
        deadline: Option<Instant>,
        call: F,
    ) -> Result<T, CheckoutError>
    where
        F: Future<Output = Result<T, ServiceError>>,
    {
        debug_assert!(step.is_fatal(), "{step} is not a fatal step");
        self.attempt(step, deadline, call).await
    }

    /// Runs one step under the checkout deadline.
    ///
    /// A step whose deadline already passed is never started.
    async fn attempt<T, F>(
        &self,
        step: CheckoutStep,
        deadline: Option<Instant>,
        call: F,
    ) -> Result<T, CheckoutError>
    where
        F: Future<Output = Result<T, ServiceError>>,
    {
        tracing::info!(%step, "step started");
        let call = async {
            if let Some(latency) = self.config.extra_latency {
                tokio::time::sleep(latency).await;
            }
            call.await
        };

        let outcome = match deadline {
            Some(at) => {
                if Instant::now() >= at {
                    return Err(CheckoutError::DeadlineExceeded { step });
                }
                tokio::time::timeout_at(at, call)
                    .await
                    .map_err(|_| CheckoutError::DeadlineExceeded { step })?
            }
            None => call.await,
        };
        outcome.map_err(|source| CheckoutError::Service { step, source })
    }

    /// Runs a step whose failure must not change the outcome. Returns
    /// whether it succeeded.
    async fn best_effort<F>(&self, step: CheckoutStep, deadline: Option<Instant>, call: F) -> bool
    where
        F: Future<Output = Result<(), ServiceError>>,
    {
        debug_assert!(step.is_best_effort(), "{step} is not a best-effort step");
        match self.attempt(step, deadline, call).await {
            Ok(()) => true,
            Err(err) => {
                metrics::counter!("checkout_best_effort_failures", "step" => step.as_str())
                    .increment(1);
                tracing::warn!(%step, error = %err, "best-effort step failed");
                false
            }
        }
    }
}
