use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderId, OrderItemId, Page, PageRequest, UserId};
use tokio::sync::RwLock;

use domain::{Order, OrderNumber, OrderStatus};

use crate::{
    OrderQuery, OrderSort, Result, StoreError,
    repository::{OrderRepository, store_timestamp},
};

#[derive(Default)]
struct MemoryState {
    orders: BTreeMap<OrderId, Order>,
    by_number: HashMap<OrderNumber, OrderId>,
    last_order_id: i64,
    last_item_id: i64,
}

impl MemoryState {
    fn assign_item_ids(&mut self, order: &mut Order) {
        for item in order.items_mut() {
            if item.id().is_none() {
                self.last_item_id += 1;
                item.assign_id(OrderItemId::new(self.last_item_id));
            }
        }
    }
}

/// In-memory order repository for testing and local runs.
///
/// This implementation keeps every order in memory and provides
/// the same interface as the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryOrderRepository {
    state: Arc<RwLock<MemoryState>>,
}

impl InMemoryOrderRepository {
    /// Creates a new empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Removes every order.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.orders.clear();
        state.by_number.clear();
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.state.read().await.orders.get(&id).cloned())
    }

    async fn find_by_order_number(&self, order_number: &OrderNumber) -> Result<Option<Order>> {
        let state = self.state.read().await;
        Ok(state
            .by_number
            .get(order_number)
            .and_then(|id| state.orders.get(id))
            .cloned())
    }

    async fn exists_by_order_number(&self, order_number: &OrderNumber) -> Result<bool> {
        Ok(self.state.read().await.by_number.contains_key(order_number))
    }

    async fn save(&self, mut order: Order) -> Result<Order> {
        let mut state = self.state.write().await;
        let now = store_timestamp();

        match order.id() {
            None => {
                if state.by_number.contains_key(order.order_number()) {
                    return Err(StoreError::DuplicateOrderNumber(
                        order.order_number().clone(),
                    ));
                }

                state.last_order_id += 1;
                let id = OrderId::new(state.last_order_id);
                order.assign_id(id);
                state.assign_item_ids(&mut order);
                order.on_create(now);

                state.by_number.insert(order.order_number().clone(), id);
                state.orders.insert(id, order.clone());
                metrics::counter!("order_store_inserts_total").increment(1);
            }
            Some(id) => {
                if !state.orders.contains_key(&id) {
                    return Err(StoreError::OrderNotFound(id));
                }

                state.assign_item_ids(&mut order);
                order.on_update(now);
                state.orders.insert(id, order.clone());
                metrics::counter!("order_store_updates_total").increment(1);
            }
        }

        Ok(order)
    }

    async fn find_page(
        &self,
        query: OrderQuery,
        page: PageRequest,
        sort: OrderSort,
    ) -> Result<Page<Order>> {
        let state = self.state.read().await;
        let mut matching: Vec<&Order> = state
            .orders
            .values()
            .filter(|order| query.matches(order))
            .collect();
        matching.sort_by(|a, b| sort.compare(a, b));

        let total = matching.len() as u64;
        let content = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.size() as usize)
            .cloned()
            .collect();

        Ok(Page::new(content, page, total))
    }

    async fn find_created_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Order>> {
        let state = self.state.read().await;
        let mut orders: Vec<Order> = state
            .orders
            .values()
            .filter(|order| order.created_at() >= start && order.created_at() <= end)
            .cloned()
            .collect();
        orders.sort_by_key(|order| (order.created_at(), order.id()));
        Ok(orders)
    }

    async fn count_by_user_and_status(
        &self,
        user_id: UserId,
        status: OrderStatus,
    ) -> Result<u64> {
        let query = OrderQuery::for_user(user_id).status(status);
        let state = self.state.read().await;
        Ok(state
            .orders
            .values()
            .filter(|order| query.matches(order))
            .count() as u64)
    }
}
