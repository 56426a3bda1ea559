//! Domain layer for the order fulfillment system.
//!
//! This crate provides the order aggregate:
//! - `Order` with owned `OrderItem` lines and an explicitly recomputed total
//! - `OrderStatus` with its transition table
//! - `Money` and `OrderNumber` value objects

pub mod order;

pub use order::{
    MAX_QUANTITY, Money, Order, OrderBuilder, OrderError, OrderItem, OrderItemRecord, OrderNumber,
    OrderRecord, OrderStatus, UnknownStatus,
};
