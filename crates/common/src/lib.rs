//! Shared types for the order fulfillment system.

pub mod page;
pub mod types;

pub use page::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, Page, PageRequest, SortDirection};
pub use types::{OrderId, OrderItemId, ProductId, UserId};
