//! Inventory port and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use common::ProductId;
use domain::Money;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Product data as reported by the inventory service.
///
/// Only used to snapshot name, SKU and price into order items and to
/// judge availability; never stored as its own aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSnapshot {
    pub id: ProductId,
    pub name: String,
    pub sku: String,
    pub price: Money,
    /// Missing or `null` reads as no stock.
    #[serde(default, deserialize_with = "null_as_no_stock")]
    pub stock_quantity: i64,
    /// Missing or `null` reads as active.
    #[serde(default = "default_active", deserialize_with = "null_as_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

fn null_as_no_stock<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    Ok(Option::<i64>::deserialize(deserializer)?.unwrap_or(0))
}

fn null_as_active<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or_else(default_active))
}

impl ProductSnapshot {
    /// Creates an active product.
    pub fn new(
        id: ProductId,
        name: impl Into<String>,
        sku: impl Into<String>,
        price: Money,
        stock_quantity: i64,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            sku: sku.into(),
            price,
            stock_quantity,
            active: true,
        }
    }

    /// Returns true if `quantity` units can be sold.
    pub fn is_available(&self, quantity: u32) -> bool {
        self.active && self.stock_quantity >= i64::from(quantity)
    }
}

/// Failure of a stock delta write.
///
/// Reads never fail; they resolve to "absent" or "unavailable" instead.
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("Product not found with ID: {0}")]
    ProductNotFound(ProductId),

    #[error("Insufficient stock for product: {0}")]
    InsufficientStock(String),

    #[error("Inventory service unavailable")]
    Unavailable,

    #[error("Inventory service rejected the request with status {0}")]
    Rejected(u16),

    #[error("Inventory request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Contract the coordinator uses to read and adjust remote stock.
#[async_trait]
pub trait InventoryPort: Send + Sync {
    /// Looks up a product. Any failure resolves to `None`.
    async fn get_product(&self, product_id: ProductId) -> Option<ProductSnapshot>;

    /// Checks whether `quantity` units are available. Any failure resolves to `false`.
    async fn check_availability(&self, product_id: ProductId, quantity: u32) -> bool;

    /// Applies a signed stock adjustment: negative consumes, positive releases.
    async fn apply_stock_delta(&self, product_id: ProductId, delta: i64)
    -> Result<(), InventoryError>;
}

#[derive(Debug, Default)]
struct InMemoryInventoryState {
    products: HashMap<ProductId, ProductSnapshot>,
    applied: Vec<(ProductId, i64)>,
    failed: Vec<(ProductId, i64)>,
    unavailable: bool,
}

/// In-memory inventory for testing and local runs.
///
/// Follows the product service rules: a product is available when it is
/// active and holds enough stock, and a delta that would leave negative
/// stock is rejected.
#[derive(Debug, Clone, Default)]
pub struct InMemoryInventory {
    state: Arc<RwLock<InMemoryInventoryState>>,
}

impl InMemoryInventory {
    /// Creates an empty inventory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a product.
    pub fn add_product(&self, product: ProductSnapshot) {
        self.state
            .write()
            .unwrap()
            .products
            .insert(product.id, product);
    }

    /// Changes a product's catalog price.
    pub fn set_price(&self, product_id: ProductId, price: Money) {
        if let Some(product) = self.state.write().unwrap().products.get_mut(&product_id) {
            product.price = price;
        }
    }

    /// Simulates an outage: reads resolve to absent/false and writes fail.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.write().unwrap().unavailable = unavailable;
    }

    /// Current stock of a product.
    pub fn stock_of(&self, product_id: ProductId) -> Option<i64> {
        self.state
            .read()
            .unwrap()
            .products
            .get(&product_id)
            .map(|product| product.stock_quantity)
    }

    /// Deltas applied so far, in order.
    pub fn applied_deltas(&self) -> Vec<(ProductId, i64)> {
        self.state.read().unwrap().applied.clone()
    }

    /// Deltas rejected so far, in order.
    pub fn failed_deltas(&self) -> Vec<(ProductId, i64)> {
        self.state.read().unwrap().failed.clone()
    }

    /// Waits until at least `count` deltas were applied or rejected.
    ///
    /// Returns false if `timeout` elapses first.
    pub async fn wait_for_deltas(&self, count: usize, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let seen = {
                let state = self.state.read().unwrap();
                state.applied.len() + state.failed.len()
            };
            if seen >= count {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

#[async_trait]
impl InventoryPort for InMemoryInventory {
    async fn get_product(&self, product_id: ProductId) -> Option<ProductSnapshot> {
        let state = self.state.read().unwrap();
        if state.unavailable {
            return None;
        }
        state.products.get(&product_id).cloned()
    }

    async fn check_availability(&self, product_id: ProductId, quantity: u32) -> bool {
        let state = self.state.read().unwrap();
        if state.unavailable {
            return false;
        }
        state
            .products
            .get(&product_id)
            .is_some_and(|product| product.is_available(quantity))
    }

    async fn apply_stock_delta(
        &self,
        product_id: ProductId,
        delta: i64,
    ) -> Result<(), InventoryError> {
        let mut state = self.state.write().unwrap();

        let result = if state.unavailable {
            Err(InventoryError::Unavailable)
        } else {
            match state.products.get_mut(&product_id) {
                None => Err(InventoryError::ProductNotFound(product_id)),
                Some(product) if product.stock_quantity + delta < 0 => {
                    Err(InventoryError::InsufficientStock(product.name.clone()))
                }
                Some(product) => {
                    product.stock_quantity += delta;
                    Ok(())
                }
            }
        };

        match result {
            Ok(()) => state.applied.push((product_id, delta)),
            Err(_) => state.failed.push((product_id, delta)),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget(stock: i64) -> ProductSnapshot {
        ProductSnapshot::new(
            ProductId::new(1),
            "Widget",
            "WID-001",
            Money::from_cents(1000),
            stock,
        )
    }

    #[tokio::test]
    async fn test_availability_rules() {
        let inventory = InMemoryInventory::new();
        inventory.add_product(widget(3));

        assert!(inventory.check_availability(ProductId::new(1), 3).await);
        assert!(!inventory.check_availability(ProductId::new(1), 4).await);
        assert!(!inventory.check_availability(ProductId::new(2), 1).await);

        let mut inactive = widget(10);
        inactive.active = false;
        inventory.add_product(inactive);
        assert!(!inventory.check_availability(ProductId::new(1), 1).await);
    }

    #[tokio::test]
    async fn test_stock_delta_applied_and_rejected() {
        let inventory = InMemoryInventory::new();
        inventory.add_product(widget(2));

        inventory
            .apply_stock_delta(ProductId::new(1), -2)
            .await
            .unwrap();
        assert_eq!(inventory.stock_of(ProductId::new(1)), Some(0));

        let result = inventory.apply_stock_delta(ProductId::new(1), -1).await;
        assert!(matches!(result, Err(InventoryError::InsufficientStock(_))));
        assert_eq!(inventory.stock_of(ProductId::new(1)), Some(0));

        let result = inventory.apply_stock_delta(ProductId::new(7), 1).await;
        assert!(matches!(result, Err(InventoryError::ProductNotFound(_))));

        assert_eq!(inventory.applied_deltas(), vec![(ProductId::new(1), -2)]);
        assert_eq!(inventory.failed_deltas().len(), 2);
    }

    #[tokio::test]
    async fn test_unavailable_fails_closed() {
        let inventory = InMemoryInventory::new();
        inventory.add_product(widget(5));
        inventory.set_unavailable(true);

        assert!(inventory.get_product(ProductId::new(1)).await.is_none());
        assert!(!inventory.check_availability(ProductId::new(1), 1).await);
        assert!(matches!(
            inventory.apply_stock_delta(ProductId::new(1), 1).await,
            Err(InventoryError::Unavailable)
        ));
        assert_eq!(inventory.stock_of(ProductId::new(1)), Some(5));
    }

    #[test]
    fn test_snapshot_wire_format() {
        let json = r#"{"id":3,"name":"Lamp","sku":"LMP-3","price":"19.99","stockQuantity":4,"active":true,"category":"home"}"#;
        let product: ProductSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(product.id, ProductId::new(3));
        assert_eq!(product.price, Money::from_cents(1999));
        assert_eq!(product.stock_quantity, 4);
        assert!(product.is_available(4));
    }

    #[test]
    fn test_snapshot_accepts_null_stock_and_active() {
        let json = r#"{"id":5,"name":"Mug","sku":"MUG-5","price":"4.50","stockQuantity":null,"active":null}"#;
        let product: ProductSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(product.stock_quantity, 0);
        assert!(product.active);
        assert!(!product.is_available(1));

        let json = r#"{"id":6,"name":"Cup","sku":"CUP-6","price":"3.00"}"#;
        let product: ProductSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(product.stock_quantity, 0);
        assert!(product.active);
    }
}
