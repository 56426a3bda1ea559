//! Response projections of the order aggregate.

use chrono::{DateTime, Utc};
use common::{OrderId, OrderItemId, ProductId, UserId};
use domain::{Money, Order, OrderItem, OrderNumber, OrderStatus};
use serde::{Deserialize, Serialize};

/// Read-only view of one order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItemResponse {
    pub id: Option<OrderItemId>,
    pub product_id: ProductId,
    pub product_name: String,
    pub product_sku: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub subtotal: Money,
}

impl From<&OrderItem> for OrderItemResponse {
    fn from(item: &OrderItem) -> Self {
        Self {
            id: item.id(),
            product_id: item.product_id(),
            product_name: item.product_name().to_string(),
            product_sku: item.product_sku().to_string(),
            quantity: item.quantity(),
            unit_price: item.unit_price(),
            subtotal: item.subtotal(),
        }
    }
}

/// Read-only view of an order, as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderResponse {
    pub id: Option<OrderId>,
    pub order_number: OrderNumber,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub total_amount: Money,
    pub shipping_address: Option<String>,
    pub billing_address: Option<String>,
    pub items: Vec<OrderItemResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id(),
            order_number: order.order_number().clone(),
            user_id: order.user_id(),
            status: order.status(),
            total_amount: order.total_amount(),
            shipping_address: order.shipping_address().map(str::to_string),
            billing_address: order.billing_address().map(str::to_string),
            items: order.items().iter().map(OrderItemResponse::from).collect(),
            created_at: order.created_at(),
            updated_at: order.updated_at(),
        }
    }
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self::from(&order)
    }
}
