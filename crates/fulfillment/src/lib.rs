//! Order fulfillment for the order service.
//!
//! The coordinator creates orders against a remote inventory and drives
//! their status lifecycle:
//! 1. Look up every requested product and check its availability
//! 2. Snapshot product data into the order items and store the order
//! 3. Dispatch one stock reservation per item, without waiting
//!
//! Cancellation dispatches the matching stock releases the same way.

pub mod coordinator;
pub mod dispatch;
pub mod error;
pub mod request;
pub mod services;
pub mod view;

pub use coordinator::OrderCoordinator;
pub use dispatch::{DEFAULT_QUEUE_CAPACITY, StockDelta, StockDeltaDispatcher};
pub use error::{FieldError, FulfillmentError, Result};
pub use request::{CreateOrderRequest, MAX_ADDRESS_LENGTH, OrderLineRequest};
pub use services::{
    HttpInventoryClient, InMemoryInventory, InventoryError, InventoryPort, ProductSnapshot,
};
pub use view::{OrderItemResponse, OrderResponse};
