//! Order aggregate implementation.

use chrono::{DateTime, Utc};
use common::{OrderId, UserId};

use super::{Money, OrderError, OrderItem, OrderItemRecord, OrderNumber, OrderStatus};

/// Order aggregate root.
///
/// Owns its line items. The total is only ever changed by
/// [`Order::recompute_total`]; adding or removing items leaves it untouched
/// until the caller recomputes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    /// Surrogate id, assigned by storage on first save.
    id: Option<OrderId>,

    order_number: OrderNumber,

    user_id: UserId,

    status: OrderStatus,

    total_amount: Money,

    shipping_address: Option<String>,

    billing_address: Option<String>,

    items: Vec<OrderItem>,

    created_at: DateTime<Utc>,

    updated_at: DateTime<Utc>,
}

/// Flat representation of a stored order, used to rehydrate the aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRecord {
    pub id: OrderId,
    pub order_number: OrderNumber,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub total_amount: Money,
    pub shipping_address: Option<String>,
    pub billing_address: Option<String>,
    pub items: Vec<OrderItemRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Builder for new, not yet persisted orders.
#[derive(Debug, Clone)]
pub struct OrderBuilder {
    order_number: OrderNumber,
    user_id: UserId,
    status: Option<OrderStatus>,
    shipping_address: Option<String>,
    billing_address: Option<String>,
}

impl OrderBuilder {
    /// Sets an explicit initial status. Without one the order starts `Pending`.
    pub fn status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn shipping_address(mut self, address: Option<String>) -> Self {
        self.shipping_address = address;
        self
    }

    pub fn billing_address(mut self, address: Option<String>) -> Self {
        self.billing_address = address;
        self
    }

    pub fn build(self) -> Order {
        let now = Utc::now();
        Order {
            id: None,
            order_number: self.order_number,
            user_id: self.user_id,
            status: self.status.unwrap_or_default(),
            total_amount: Money::zero(),
            shipping_address: self.shipping_address,
            billing_address: self.billing_address,
            items: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

// Construction
impl Order {
    /// Starts building a new order.
    pub fn builder(order_number: OrderNumber, user_id: UserId) -> OrderBuilder {
        OrderBuilder {
            order_number,
            user_id,
            status: None,
            shipping_address: None,
            billing_address: None,
        }
    }

    /// Rehydrates an order exactly as it was stored, total included.
    pub fn from_record(record: OrderRecord) -> Self {
        Self {
            id: Some(record.id),
            order_number: record.order_number,
            user_id: record.user_id,
            status: record.status,
            total_amount: record.total_amount,
            shipping_address: record.shipping_address,
            billing_address: record.billing_address,
            items: record.items.into_iter().map(OrderItem::from_record).collect(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

// Query methods
impl Order {
    pub fn id(&self) -> Option<OrderId> {
        self.id
    }

    pub fn order_number(&self) -> &OrderNumber {
        &self.order_number
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn shipping_address(&self) -> Option<&str> {
        self.shipping_address.as_deref()
    }

    pub fn billing_address(&self) -> Option<&str> {
        self.billing_address.as_deref()
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn has_items(&self) -> bool {
        !self.items.is_empty()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns true if the order is in an absorbing status.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

// Item ownership
impl Order {
    /// Takes ownership of an item and points it back at this order.
    pub fn add_item(&mut self, mut item: OrderItem) {
        item.attach_to(self.id);
        self.items.push(item);
    }

    /// Removes the first item equal to `item`, returning it detached.
    pub fn remove_item(&mut self, item: &OrderItem) -> Option<OrderItem> {
        let position = self.items.iter().position(|existing| existing == item)?;
        let mut removed = self.items.remove(position);
        removed.attach_to(None);
        Some(removed)
    }

    /// Recomputes the total as the sum of item subtotals.
    ///
    /// Leaves the total untouched if the sum overflows.
    pub fn recompute_total(&mut self) -> Result<(), OrderError> {
        self.total_amount = self
            .items
            .iter()
            .try_fold(Money::zero(), |total, item| total.checked_add(item.subtotal()))
            .ok_or(OrderError::AmountOverflow)?;
        Ok(())
    }

    /// Mutable access to items, for storage adapters assigning item ids.
    pub fn items_mut(&mut self) -> impl Iterator<Item = &mut OrderItem> {
        self.items.iter_mut()
    }
}

// Status transitions
impl Order {
    /// Moves the order to `target` if the transition table allows it.
    pub fn change_status(&mut self, target: OrderStatus) -> Result<(), OrderError> {
        if !self.status.can_transition_to(target) {
            return Err(OrderError::InvalidStatusTransition {
                from: self.status,
                to: target,
            });
        }
        self.status = target;
        Ok(())
    }

    /// Cancels the order if it has not shipped yet.
    pub fn cancel(&mut self) -> Result<(), OrderError> {
        if !self.status.can_cancel() {
            return Err(OrderError::NotCancellable {
                status: self.status,
            });
        }
        self.status = OrderStatus::Cancelled;
        Ok(())
    }
}

// Persistence hooks
impl Order {
    /// Records the id assigned by storage and points every item back at it.
    pub fn assign_id(&mut self, id: OrderId) {
        self.id = Some(id);
        for item in &mut self.items {
            item.attach_to(Some(id));
        }
    }

    /// Creation hook, run once when the order is first stored.
    pub fn on_create(&mut self, now: DateTime<Utc>) {
        self.created_at = now;
        self.updated_at = now;
    }

    /// Update hook, run on every later store.
    pub fn on_update(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use common::{OrderItemId, ProductId};

    use super::*;

    fn new_order() -> Order {
        Order::builder(OrderNumber::new("ORD-TEST-00000001"), UserId::new(1)).build()
    }

    fn item(product: i64, quantity: u32, cents: i64) -> OrderItem {
        OrderItem::new(
            ProductId::new(product),
            format!("Product {product}"),
            format!("SKU-{product}"),
            quantity,
            Money::from_cents(cents),
        )
        .unwrap()
    }

    #[test]
    fn test_new_order_defaults_to_pending() {
        let order = new_order();
        assert_eq!(order.status(), OrderStatus::Pending);
        assert!(order.id().is_none());
        assert!(order.total_amount().is_zero());
    }

    #[test]
    fn test_explicit_initial_status_is_kept() {
        let order = Order::builder(OrderNumber::new("ORD-X"), UserId::new(1))
            .status(OrderStatus::Confirmed)
            .build();
        assert_eq!(order.status(), OrderStatus::Confirmed);
    }

    #[test]
    fn test_total_only_changes_on_recompute() {
        let mut order = new_order();
        order.add_item(item(1, 2, 1000));
        order.add_item(item(2, 1, 550));
        assert!(order.total_amount().is_zero());

        order.recompute_total().unwrap();
        assert_eq!(order.total_amount(), Money::from_cents(2550));
    }

    #[test]
    fn test_total_overflow_keeps_previous_total() {
        let mut order = new_order();
        order.add_item(item(1, 1, 1000));
        order.recompute_total().unwrap();

        let huge: Money = "70000000000000000000000000000".parse().unwrap();
        for product in 2..4 {
            order.add_item(
                OrderItem::new(ProductId::new(product), "Huge", "HUGE", 1, huge).unwrap(),
            );
        }

        assert_eq!(order.recompute_total(), Err(OrderError::AmountOverflow));
        assert_eq!(order.total_amount(), Money::from_cents(1000));
    }

    #[test]
    fn test_empty_order_total_is_zero() {
        let mut order = new_order();
        order.recompute_total().unwrap();
        assert!(order.total_amount().is_zero());
    }

    #[test]
    fn test_remove_item_clears_back_reference() {
        let mut order = new_order();
        order.add_item(item(1, 1, 1000));
        order.assign_id(OrderId::new(7));
        assert_eq!(order.items()[0].order_id(), Some(OrderId::new(7)));

        let target = order.items()[0].clone();
        let removed = order.remove_item(&target).unwrap();
        assert!(removed.order_id().is_none());
        assert_eq!(order.item_count(), 0);

        order.recompute_total().unwrap();
        assert!(order.total_amount().is_zero());
    }

    #[test]
    fn test_remove_missing_item_returns_none() {
        let mut order = new_order();
        order.add_item(item(1, 1, 1000));
        assert!(order.remove_item(&item(2, 1, 1000)).is_none());
        assert_eq!(order.item_count(), 1);
    }

    #[test]
    fn test_add_item_to_persisted_order_links_it() {
        let mut order = new_order();
        order.assign_id(OrderId::new(3));
        order.add_item(item(1, 1, 100));
        assert_eq!(order.items()[0].order_id(), Some(OrderId::new(3)));
    }

    #[test]
    fn test_change_status_follows_table() {
        let mut order = new_order();
        order.change_status(OrderStatus::Delivered).unwrap();

        let err = order.change_status(OrderStatus::Processing).unwrap_err();
        assert!(matches!(
            err,
            OrderError::InvalidStatusTransition {
                from: OrderStatus::Delivered,
                to: OrderStatus::Processing
            }
        ));
        assert_eq!(order.status(), OrderStatus::Delivered);

        order.change_status(OrderStatus::Refunded).unwrap();
        assert!(order.change_status(OrderStatus::Pending).is_err());
    }

    #[test]
    fn test_cancel_rejected_after_shipment() {
        let mut order = new_order();
        order.change_status(OrderStatus::Shipped).unwrap();
        assert!(matches!(
            order.cancel(),
            Err(OrderError::NotCancellable {
                status: OrderStatus::Shipped
            })
        ));
        assert_eq!(order.status(), OrderStatus::Shipped);
    }

    #[test]
    fn test_cancel_from_processing() {
        let mut order = new_order();
        order.change_status(OrderStatus::Processing).unwrap();
        order.cancel().unwrap();
        assert!(order.is_terminal());
    }

    #[test]
    fn test_hooks_set_timestamps() {
        let mut order = new_order();
        let created = Utc::now() - Duration::hours(1);
        order.on_create(created);
        assert_eq!(order.created_at(), created);
        assert_eq!(order.updated_at(), created);

        let later = created + Duration::minutes(5);
        order.on_update(later);
        assert_eq!(order.created_at(), created);
        assert_eq!(order.updated_at(), later);
    }

    #[test]
    fn test_from_record_keeps_stored_total() {
        let now = Utc::now();
        let record = OrderRecord {
            id: OrderId::new(1),
            order_number: OrderNumber::new("ORD-1"),
            user_id: UserId::new(2),
            status: OrderStatus::Shipped,
            total_amount: Money::from_cents(999),
            shipping_address: Some("1 Main St".to_string()),
            billing_address: None,
            items: vec![OrderItemRecord {
                id: Some(OrderItemId::new(1)),
                order_id: Some(OrderId::new(1)),
                product_id: ProductId::new(5),
                product_name: "Widget".to_string(),
                product_sku: "W-5".to_string(),
                quantity: 1,
                unit_price: Money::from_cents(999),
                subtotal: Money::from_cents(999),
            }],
            created_at: now,
            updated_at: now,
        };

        let order = Order::from_record(record);
        assert_eq!(order.id(), Some(OrderId::new(1)));
        assert_eq!(order.status(), OrderStatus::Shipped);
        assert_eq!(order.total_amount(), Money::from_cents(999));
        assert_eq!(order.shipping_address(), Some("1 Main St"));
        assert_eq!(order.item_count(), 1);
    }
}
