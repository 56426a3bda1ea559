use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use common::{OrderId, Page, PageRequest, UserId};
use domain::{Order, OrderNumber, OrderStatus};

use crate::{OrderQuery, OrderSort, Result};

/// Persistence port for order aggregates.
///
/// Orders are never deleted; items are owned by their order and stored with
/// it. All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Loads an order with its items.
    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>>;

    /// Loads an order by its unique order number.
    async fn find_by_order_number(&self, order_number: &OrderNumber) -> Result<Option<Order>>;

    /// Returns true if an order with this number is already stored.
    async fn exists_by_order_number(&self, order_number: &OrderNumber) -> Result<bool>;

    /// Stores an order and returns it as stored.
    ///
    /// An order without an id is inserted: ids are assigned to it and its
    /// items and the creation hook runs. Fails with `DuplicateOrderNumber`
    /// if the number is taken. An order with an id is updated: the update
    /// hook runs and the stored items are reconciled with the order's items.
    async fn save(&self, order: Order) -> Result<Order>;

    /// Returns one page of orders matching `query`.
    async fn find_page(
        &self,
        query: OrderQuery,
        page: PageRequest,
        sort: OrderSort,
    ) -> Result<Page<Order>>;

    /// Returns every order created within `[start, end]`, oldest first.
    async fn find_created_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Order>>;

    /// Counts a user's orders in one status.
    async fn count_by_user_and_status(&self, user_id: UserId, status: OrderStatus)
    -> Result<u64>;
}

/// Extension trait providing the common paged lookups.
#[async_trait]
pub trait OrderRepositoryExt: OrderRepository {
    /// Every order, in the requested order.
    async fn find_all(&self, page: PageRequest, sort: OrderSort) -> Result<Page<Order>> {
        self.find_page(OrderQuery::new(), page, sort).await
    }

    /// One user's orders, newest first.
    async fn find_by_user(&self, user_id: UserId, page: PageRequest) -> Result<Page<Order>> {
        self.find_page(OrderQuery::for_user(user_id), page, OrderSort::default())
            .await
    }

    /// Orders in one status, newest first.
    async fn find_by_status(&self, status: OrderStatus, page: PageRequest) -> Result<Page<Order>> {
        self.find_page(OrderQuery::for_status(status), page, OrderSort::default())
            .await
    }
}

// Blanket implementation for all OrderRepository implementations
impl<T: OrderRepository + ?Sized> OrderRepositoryExt for T {}

/// Timestamp used by the persistence hooks, truncated to the precision
/// Postgres keeps so stored and returned orders compare equal.
pub(crate) fn store_timestamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
