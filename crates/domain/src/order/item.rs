//! Order line items.

use common::{OrderId, OrderItemId, ProductId};

use super::{Money, OrderError};

/// Largest quantity a single line may carry; storage keeps it as a 32-bit signed integer.
pub const MAX_QUANTITY: u32 = i32::MAX as u32;

/// One product line within an order.
///
/// Product name, SKU and unit price are snapshots taken when the order was
/// placed; they are never refreshed from the live catalog. The subtotal is
/// recomputed by the item itself whenever quantity or price is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItem {
    id: Option<OrderItemId>,
    order_id: Option<OrderId>,
    product_id: ProductId,
    product_name: String,
    product_sku: String,
    quantity: u32,
    unit_price: Money,
    subtotal: Money,
}

/// Flat representation of a stored order item, used to rehydrate items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItemRecord {
    pub id: Option<OrderItemId>,
    pub order_id: Option<OrderId>,
    pub product_id: ProductId,
    pub product_name: String,
    pub product_sku: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub subtotal: Money,
}

impl OrderItem {
    /// Creates a detached line item with its subtotal computed.
    ///
    /// The unit price is rounded to whole cents before it is kept.
    pub fn new(
        product_id: ProductId,
        product_name: impl Into<String>,
        product_sku: impl Into<String>,
        quantity: u32,
        unit_price: Money,
    ) -> Result<Self, OrderError> {
        validate_quantity(quantity)?;
        let unit_price = unit_price.round_to_cents();
        validate_price(unit_price)?;

        Ok(Self {
            id: None,
            order_id: None,
            product_id,
            product_name: product_name.into(),
            product_sku: product_sku.into(),
            quantity,
            unit_price,
            subtotal: subtotal_of(unit_price, quantity)?,
        })
    }

    /// Rehydrates an item exactly as it was stored.
    pub fn from_record(record: OrderItemRecord) -> Self {
        Self {
            id: record.id,
            order_id: record.order_id,
            product_id: record.product_id,
            product_name: record.product_name,
            product_sku: record.product_sku,
            quantity: record.quantity,
            unit_price: record.unit_price,
            subtotal: record.subtotal,
        }
    }

    pub fn id(&self) -> Option<OrderItemId> {
        self.id
    }

    /// Returns the owning order, if the item is attached to a persisted one.
    pub fn order_id(&self) -> Option<OrderId> {
        self.order_id
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    pub fn product_sku(&self) -> &str {
        &self.product_sku
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    pub fn subtotal(&self) -> Money {
        self.subtotal
    }

    /// Sets the quantity and recomputes the subtotal.
    pub fn set_quantity(&mut self, quantity: u32) -> Result<(), OrderError> {
        validate_quantity(quantity)?;
        self.subtotal = subtotal_of(self.unit_price, quantity)?;
        self.quantity = quantity;
        Ok(())
    }

    /// Sets the unit price, rounded to cents, and recomputes the subtotal.
    pub fn set_unit_price(&mut self, unit_price: Money) -> Result<(), OrderError> {
        let unit_price = unit_price.round_to_cents();
        validate_price(unit_price)?;
        self.subtotal = subtotal_of(unit_price, self.quantity)?;
        self.unit_price = unit_price;
        Ok(())
    }

    /// Recomputes `subtotal = unit_price * quantity`.
    pub fn recompute_subtotal(&mut self) -> Result<(), OrderError> {
        self.subtotal = subtotal_of(self.unit_price, self.quantity)?;
        Ok(())
    }

    /// Records the surrogate id assigned by storage.
    pub fn assign_id(&mut self, id: OrderItemId) {
        self.id = Some(id);
    }

    pub(super) fn attach_to(&mut self, order_id: Option<OrderId>) {
        self.order_id = order_id;
    }
}

fn subtotal_of(unit_price: Money, quantity: u32) -> Result<Money, OrderError> {
    unit_price
        .checked_multiply(quantity)
        .ok_or(OrderError::AmountOverflow)
}

fn validate_quantity(quantity: u32) -> Result<(), OrderError> {
    if quantity == 0 || quantity > MAX_QUANTITY {
        return Err(OrderError::InvalidQuantity { quantity });
    }
    Ok(())
}

fn validate_price(price: Money) -> Result<(), OrderError> {
    if price.is_negative() {
        return Err(OrderError::InvalidPrice { price });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget(quantity: u32) -> OrderItem {
        OrderItem::new(
            ProductId::new(1),
            "Widget",
            "WID-001",
            quantity,
            Money::from_cents(1000),
        )
        .unwrap()
    }

    #[test]
    fn test_new_item_computes_subtotal() {
        let item = widget(3);
        assert_eq!(item.subtotal(), Money::from_cents(3000));
        assert!(item.id().is_none());
        assert!(item.order_id().is_none());
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let result = OrderItem::new(ProductId::new(1), "Widget", "WID-001", 0, Money::zero());
        assert!(matches!(
            result,
            Err(OrderError::InvalidQuantity { quantity: 0 })
        ));
    }

    #[test]
    fn test_quantity_above_storage_range_rejected() {
        let result = OrderItem::new(
            ProductId::new(1),
            "Widget",
            "WID-001",
            MAX_QUANTITY + 1,
            Money::from_cents(1),
        );
        assert!(matches!(result, Err(OrderError::InvalidQuantity { .. })));

        let item = OrderItem::new(
            ProductId::new(1),
            "Widget",
            "WID-001",
            MAX_QUANTITY,
            Money::from_cents(1),
        )
        .unwrap();
        assert_eq!(item.quantity(), MAX_QUANTITY);
    }

    #[test]
    fn test_unit_price_rounded_to_cents() {
        let item = OrderItem::new(
            ProductId::new(1),
            "Widget",
            "WID-001",
            3,
            "19.999".parse().unwrap(),
        )
        .unwrap();
        assert_eq!(item.unit_price(), Money::from_cents(2000));
        assert_eq!(item.subtotal(), Money::from_cents(6000));
        assert_eq!(item.subtotal().to_string(), "60.00");
    }

    #[test]
    fn test_subtotal_overflow_is_an_error() {
        let result = OrderItem::new(
            ProductId::new(1),
            "Widget",
            "WID-001",
            1_000_000_000,
            "100000000000000000000".parse().unwrap(),
        );
        assert_eq!(result, Err(OrderError::AmountOverflow));

        let mut item = widget(1);
        assert_eq!(
            item.set_unit_price("100000000000000000000".parse().unwrap()),
            Ok(())
        );
        assert_eq!(item.set_quantity(1_000_000_000), Err(OrderError::AmountOverflow));
        assert_eq!(item.quantity(), 1);
    }

    #[test]
    fn test_negative_price_rejected() {
        let result = OrderItem::new(
            ProductId::new(1),
            "Widget",
            "WID-001",
            1,
            Money::from_cents(-5),
        );
        assert!(matches!(result, Err(OrderError::InvalidPrice { .. })));
    }

    #[test]
    fn test_set_quantity_recomputes_subtotal() {
        let mut item = widget(1);
        item.set_quantity(4).unwrap();
        assert_eq!(item.subtotal(), Money::from_cents(4000));

        assert!(item.set_quantity(0).is_err());
        assert_eq!(item.quantity(), 4);
    }

    #[test]
    fn test_set_unit_price_recomputes_subtotal() {
        let mut item = widget(2);
        item.set_unit_price(Money::from_cents(250)).unwrap();
        assert_eq!(item.subtotal(), Money::from_cents(500));
    }

    #[test]
    fn test_from_record_keeps_stored_values() {
        let record = OrderItemRecord {
            id: Some(OrderItemId::new(9)),
            order_id: Some(OrderId::new(3)),
            product_id: ProductId::new(1),
            product_name: "Widget".to_string(),
            product_sku: "WID-001".to_string(),
            quantity: 2,
            unit_price: Money::from_cents(1000),
            subtotal: Money::from_cents(2000),
        };

        let item = OrderItem::from_record(record);
        assert_eq!(item.id(), Some(OrderItemId::new(9)));
        assert_eq!(item.order_id(), Some(OrderId::new(3)));
        assert_eq!(item.subtotal(), Money::from_cents(2000));
    }
}
