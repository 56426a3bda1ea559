pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod repository;

pub use error::{Result, StoreError};
pub use memory::InMemoryOrderRepository;
pub use postgres::PostgresOrderRepository;
pub use query::{OrderQuery, OrderSort, OrderSortField};
pub use repository::{OrderRepository, OrderRepositoryExt};
