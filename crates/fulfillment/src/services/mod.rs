//! External collaborators used by the coordinator.

pub mod http;
pub mod inventory;

pub use http::HttpInventoryClient;
pub use inventory::{InMemoryInventory, InventoryError, InventoryPort, ProductSnapshot};
