//! Cart service trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::UserId;
use domain::CartItem;

use crate::connector::BackendRole;
use crate::error::ServiceError;

/// Trait for shopping cart operations.
#[async_trait]
pub trait CartService: Send + Sync {
    /// Returns every item in the user's cart. Never returns a partial cart.
    async fn get_cart(&self, user_id: &UserId) -> Result<Vec<CartItem>, ServiceError>;

    /// Removes every item from the user's cart.
    async fn empty_cart(&self, user_id: &UserId) -> Result<(), ServiceError>;
}

#[derive(Debug, Default)]
struct InMemoryCartState {
    carts: HashMap<UserId, Vec<CartItem>>,
    fail_on_get: bool,
    fail_on_empty: bool,
    empty_calls: usize,
}

/// In-memory cart service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCartService {
    state: Arc<RwLock<InMemoryCartState>>,
}

impl InMemoryCartService {
    /// Creates a new in-memory cart service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an item to the user's cart.
    pub fn add_item(&self, user_id: &UserId, item: CartItem) {
        self.state
            .write()
            .unwrap()
            .carts
            .entry(user_id.clone())
            .or_default()
            .push(item);
    }

    /// Returns a copy of the user's cart.
    pub fn items(&self, user_id: &UserId) -> Vec<CartItem> {
        self.state
            .read()
            .unwrap()
            .carts
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Configures the service to fail on get_cart calls.
    pub fn set_fail_on_get(&self, fail: bool) {
        self.state.write().unwrap().fail_on_get = fail;
    }

    /// Configures the service to fail on empty_cart calls.
    pub fn set_fail_on_empty(&self, fail: bool) {
        self.state.write().unwrap().fail_on_empty = fail;
    }

    /// Returns how many times empty_cart was called.
    pub fn empty_calls(&self) -> usize {
        self.state.read().unwrap().empty_calls
    }
}

/// Rejects a cart containing a line with zero quantity.
pub(crate) fn check_quantities(items: &[CartItem]) -> Result<(), ServiceError> {
    match items.iter().find(|item| item.quantity == 0) {
        Some(item) => Err(ServiceError::Backend {
            role: BackendRole::Cart,
            reason: format!("cart item {} has zero quantity", item.product_id),
        }),
        None => Ok(()),
    }
}

#[async_trait]
impl CartService for InMemoryCartService {
    async fn get_cart(&self, user_id: &UserId) -> Result<Vec<CartItem>, ServiceError> {
        let state = self.state.read().unwrap();
        if state.fail_on_get {
            return Err(ServiceError::Unreachable {
                role: BackendRole::Cart,
                address: "in-memory".to_string(),
                reason: "Cart store offline".to_string(),
            });
        }
        let items = state.carts.get(user_id).cloned().unwrap_or_default();
        check_quantities(&items)?;
        Ok(items)
    }

    async fn empty_cart(&self, user_id: &UserId) -> Result<(), ServiceError> {
        let mut state = self.state.write().unwrap();
        state.empty_calls += 1;
        if state.fail_on_empty {
            return Err(ServiceError::Backend {
                role: BackendRole::Cart,
                reason: "Cart store is read-only".to_string(),
            });
        }
        state.carts.remove(user_id);
        Ok(())
    }
}
