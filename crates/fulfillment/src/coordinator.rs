//! Order fulfillment coordinator.

use std::sync::Arc;

use common::{OrderId, Page, PageRequest, UserId};
use domain::{Order, OrderItem, OrderNumber, OrderStatus};
use order_store::{OrderQuery, OrderRepository, OrderRepositoryExt, OrderSort, StoreError};

use crate::dispatch::{DEFAULT_QUEUE_CAPACITY, StockDelta, StockDeltaDispatcher};
use crate::error::{FulfillmentError, Result};
use crate::request::CreateOrderRequest;
use crate::services::InventoryPort;
use crate::view::OrderResponse;

/// Attempts at drawing an order number the repository does not hold yet.
const ORDER_NUMBER_ATTEMPTS: usize = 3;

/// Creates orders against live inventory and drives their status lifecycle.
///
/// Product lookups and availability checks are awaited. Stock reservations
/// on creation and releases on cancellation are handed to a
/// [`StockDeltaDispatcher`] and never awaited: an order is created or
/// cancelled whatever happens to its stock deltas afterwards.
///
/// Availability check and reservation are separate remote calls, so two
/// concurrent orders may both pass the check for the same last unit.
pub struct OrderCoordinator<R, I>
where
    R: OrderRepository,
    I: InventoryPort + 'static,
{
    repository: R,
    inventory: Arc<I>,
    dispatcher: StockDeltaDispatcher,
}

impl<R, I> OrderCoordinator<R, I>
where
    R: OrderRepository,
    I: InventoryPort + 'static,
{
    /// Creates a coordinator with the default stock-delta queue.
    ///
    /// Must be called within a tokio runtime; the dispatch worker is spawned here.
    pub fn new(repository: R, inventory: I) -> Self {
        Self::with_queue_capacity(repository, inventory, DEFAULT_QUEUE_CAPACITY)
    }

    /// Creates a coordinator whose stock-delta queue holds `capacity` deltas.
    pub fn with_queue_capacity(repository: R, inventory: I, capacity: usize) -> Self {
        let inventory = Arc::new(inventory);
        let dispatcher = StockDeltaDispatcher::spawn(inventory.clone(), capacity);
        Self {
            repository,
            inventory,
            dispatcher,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn inventory(&self) -> &I {
        &self.inventory
    }

    /// Places a new order.
    ///
    /// Every line is checked against the inventory before anything is
    /// stored. Items snapshot the product's name, SKU and price. Once the
    /// order is stored, one reservation delta per item is dispatched.
    #[tracing::instrument(skip(self, request), fields(user_id = %request.user_id, lines = request.items.len()))]
    pub async fn create(&self, request: CreateOrderRequest) -> Result<OrderResponse> {
        let started = std::time::Instant::now();
        let result = self.place_order(request).await;
        metrics::histogram!("order_create_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        result
    }

    async fn place_order(&self, request: CreateOrderRequest) -> Result<OrderResponse> {
        request.validate().map_err(rejected)?;

        let mut items = Vec::with_capacity(request.items.len());
        for line in &request.items {
            let product = self
                .inventory
                .get_product(line.product_id)
                .await
                .ok_or_else(|| rejected(FulfillmentError::ProductNotFound(line.product_id)))?;

            if !self
                .inventory
                .check_availability(line.product_id, line.quantity)
                .await
            {
                return Err(rejected(FulfillmentError::InsufficientStock {
                    product_id: line.product_id,
                    product_name: product.name,
                }));
            }

            let item = OrderItem::new(
                line.product_id,
                product.name,
                product.sku,
                line.quantity,
                product.price,
            )
            .map_err(|e| rejected(e.into()))?;
            items.push(item);
        }

        let order_number = self.next_order_number().await?;
        let mut order = Order::builder(order_number, request.user_id)
            .shipping_address(request.shipping_address)
            .billing_address(request.billing_address)
            .build();
        for item in items {
            order.add_item(item);
        }
        order
            .recompute_total()
            .map_err(|e| rejected(e.into()))?;

        let order = self.repository.save(order).await?;

        for item in order.items() {
            self.dispatcher
                .dispatch(StockDelta::reserve(item.product_id(), item.quantity()));
        }

        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(
            order_id = ?order.id(),
            order_number = %order.order_number(),
            total = %order.total_amount(),
            "order created"
        );

        Ok(OrderResponse::from(&order))
    }

    async fn next_order_number(&self) -> Result<OrderNumber> {
        let mut order_number = OrderNumber::generate();
        for _ in 1..ORDER_NUMBER_ATTEMPTS {
            if !self
                .repository
                .exists_by_order_number(&order_number)
                .await?
            {
                return Ok(order_number);
            }
            tracing::debug!(%order_number, "order number taken, regenerating");
            order_number = OrderNumber::generate();
        }

        if self
            .repository
            .exists_by_order_number(&order_number)
            .await?
        {
            return Err(StoreError::DuplicateOrderNumber(order_number).into());
        }
        Ok(order_number)
    }

    async fn load(&self, id: OrderId) -> Result<Order> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| FulfillmentError::order_not_found(id))
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_by_id(&self, id: OrderId) -> Result<OrderResponse> {
        tracing::debug!("fetching order");
        let order = self.load(id).await?;
        Ok(OrderResponse::from(order))
    }

    #[tracing::instrument(skip(self, order_number), fields(order_number = %order_number))]
    pub async fn get_by_number(&self, order_number: &OrderNumber) -> Result<OrderResponse> {
        tracing::debug!("fetching order by number");
        self.repository
            .find_by_order_number(order_number)
            .await?
            .map(OrderResponse::from)
            .ok_or_else(|| FulfillmentError::order_number_not_found(order_number))
    }

    /// Lists orders matching `query`.
    #[tracing::instrument(skip(self))]
    pub async fn list(
        &self,
        query: OrderQuery,
        page: PageRequest,
        sort: OrderSort,
    ) -> Result<Page<OrderResponse>> {
        tracing::debug!("listing orders");
        let orders = self.repository.find_page(query, page, sort).await?;
        Ok(orders.map(OrderResponse::from))
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_by_user(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> Result<Page<OrderResponse>> {
        tracing::debug!("listing orders for user");
        let orders = self.repository.find_by_user(user_id, page).await?;
        Ok(orders.map(OrderResponse::from))
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_by_status(
        &self,
        status: OrderStatus,
        page: PageRequest,
    ) -> Result<Page<OrderResponse>> {
        tracing::debug!("listing orders by status");
        let orders = self.repository.find_by_status(status, page).await?;
        Ok(orders.map(OrderResponse::from))
    }

    /// Moves an order to `status` if the transition table allows it.
    ///
    /// Has no inventory side effects, even when the target is `Cancelled`.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(&self, id: OrderId, status: OrderStatus) -> Result<OrderResponse> {
        let mut order = self.load(id).await?;
        let previous = order.status();

        order
            .change_status(status)
            .map_err(|e| rejected(e.into()))?;
        let order = self.repository.save(order).await?;

        metrics::counter!("order_status_updates_total", "status" => status.as_str()).increment(1);
        tracing::info!(from = %previous, to = %status, "order status updated");

        Ok(OrderResponse::from(&order))
    }

    /// Cancels an order and dispatches one release delta per item.
    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self, id: OrderId) -> Result<OrderResponse> {
        let mut order = self.load(id).await?;
        let previous = order.status();

        order.cancel().map_err(|e| rejected(e.into()))?;
        let order = self.repository.save(order).await?;

        for item in order.items() {
            self.dispatcher
                .dispatch(StockDelta::release(item.product_id(), item.quantity()));
        }

        metrics::counter!("orders_cancelled_total").increment(1);
        tracing::info!(from = %previous, "order cancelled");

        Ok(OrderResponse::from(&order))
    }
}

/// Logs and counts a rejected request.
fn rejected(err: FulfillmentError) -> FulfillmentError {
    tracing::warn!(code = err.code(), error = %err, "order request rejected");
    metrics::counter!("order_rejections_total", "code" => err.code()).increment(1);
    err
}
