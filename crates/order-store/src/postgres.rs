use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderId, OrderItemId, Page, PageRequest, ProductId, UserId};
use domain::{Money, Order, OrderItem, OrderItemRecord, OrderNumber, OrderRecord, OrderStatus};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};

use crate::{
    OrderQuery, OrderSort, Result, StoreError,
    repository::{OrderRepository, store_timestamp},
};

const ORDER_COLUMNS: &str = "id, order_number, user_id, status, total_amount, \
     shipping_address, billing_address, created_at, updated_at";

const ORDER_NUMBER_CONSTRAINT: &str = "uq_orders_order_number";

/// PostgreSQL-backed order repository.
#[derive(Clone)]
pub struct PostgresOrderRepository {
    pool: PgPool,
}

impl PostgresOrderRepository {
    /// Creates a new PostgreSQL order repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_item(row: PgRow) -> Result<OrderItemRecord> {
        let quantity: i32 = row.try_get("quantity")?;
        let quantity = u32::try_from(quantity)
            .map_err(|_| StoreError::CorruptRecord(format!("negative quantity {quantity}")))?;

        Ok(OrderItemRecord {
            id: Some(OrderItemId::new(row.try_get("id")?)),
            order_id: Some(OrderId::new(row.try_get("order_id")?)),
            product_id: ProductId::new(row.try_get("product_id")?),
            product_name: row.try_get("product_name")?,
            product_sku: row.try_get("product_sku")?,
            quantity,
            unit_price: Money::new(row.try_get::<Decimal, _>("unit_price")?),
            subtotal: Money::new(row.try_get::<Decimal, _>("subtotal")?),
        })
    }

    fn row_to_order(row: PgRow, items: Vec<OrderItemRecord>) -> Result<Order> {
        let status: String = row.try_get("status")?;
        let status = status
            .parse::<OrderStatus>()
            .map_err(|e| StoreError::CorruptRecord(e.to_string()))?;

        Ok(Order::from_record(OrderRecord {
            id: OrderId::new(row.try_get("id")?),
            order_number: OrderNumber::new(row.try_get::<String, _>("order_number")?),
            user_id: UserId::new(row.try_get("user_id")?),
            status,
            total_amount: Money::new(row.try_get::<Decimal, _>("total_amount")?),
            shipping_address: row.try_get("shipping_address")?,
            billing_address: row.try_get("billing_address")?,
            items,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        }))
    }

    /// Loads the items of every listed order in one round trip.
    async fn load_items(&self, order_ids: &[i64]) -> Result<HashMap<i64, Vec<OrderItemRecord>>> {
        let mut grouped: HashMap<i64, Vec<OrderItemRecord>> = HashMap::new();
        if order_ids.is_empty() {
            return Ok(grouped);
        }

        let rows = sqlx::query(
            r#"
            SELECT id, order_id, product_id, product_name, product_sku, quantity, unit_price, subtotal
            FROM order_items
            WHERE order_id = ANY($1)
            ORDER BY id ASC
            "#,
        )
        .bind(order_ids)
        .fetch_all(&self.pool)
        .await?;

        for row in rows {
            let order_id: i64 = row.try_get("order_id")?;
            grouped
                .entry(order_id)
                .or_default()
                .push(Self::row_to_item(row)?);
        }
        Ok(grouped)
    }

    /// Maps order rows to aggregates, attaching their items.
    async fn hydrate(&self, rows: Vec<PgRow>) -> Result<Vec<Order>> {
        let ids = rows
            .iter()
            .map(|row| row.try_get::<i64, _>("id"))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let mut items = self.load_items(&ids).await?;

        rows.into_iter()
            .zip(ids)
            .map(|(row, id)| Self::row_to_order(row, items.remove(&id).unwrap_or_default()))
            .collect()
    }

    async fn insert_item(
        tx: &mut Transaction<'_, Postgres>,
        order_id: OrderId,
        item: &OrderItem,
    ) -> Result<OrderItemId> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO order_items (order_id, product_id, product_name, product_sku, quantity, unit_price, subtotal)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(order_id.value())
        .bind(item.product_id().value())
        .bind(item.product_name())
        .bind(item.product_sku())
        .bind(stored_quantity(item)?)
        .bind(item.unit_price().amount())
        .bind(item.subtotal().amount())
        .fetch_one(&mut **tx)
        .await?;

        Ok(OrderItemId::new(id))
    }

    async fn insert(&self, mut order: Order) -> Result<Order> {
        order.on_create(store_timestamp());

        let mut tx = self.pool.begin().await?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO orders (order_number, user_id, status, total_amount, shipping_address, billing_address, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(order.order_number().as_str())
        .bind(order.user_id().value())
        .bind(order.status().as_str())
        .bind(order.total_amount().amount())
        .bind(order.shipping_address())
        .bind(order.billing_address())
        .bind(order.created_at())
        .bind(order.updated_at())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some(ORDER_NUMBER_CONSTRAINT)
            {
                return StoreError::DuplicateOrderNumber(order.order_number().clone());
            }
            StoreError::Database(e)
        })?;

        let order_id = OrderId::new(id);
        order.assign_id(order_id);
        for item in order.items_mut() {
            let item_id = Self::insert_item(&mut tx, order_id, item).await?;
            item.assign_id(item_id);
        }

        tx.commit().await?;
        metrics::counter!("order_store_inserts_total").increment(1);
        Ok(order)
    }

    async fn update(&self, order_id: OrderId, mut order: Order) -> Result<Order> {
        order.on_update(store_timestamp());

        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE orders
            SET status = $2, total_amount = $3, shipping_address = $4, billing_address = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(order_id.value())
        .bind(order.status().as_str())
        .bind(order.total_amount().amount())
        .bind(order.shipping_address())
        .bind(order.billing_address())
        .bind(order.updated_at())
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::OrderNotFound(order_id));
        }

        // Items no longer on the order are removed
        let kept: Vec<i64> = order
            .items()
            .iter()
            .filter_map(OrderItem::id)
            .map(|id| id.value())
            .collect();
        sqlx::query("DELETE FROM order_items WHERE order_id = $1 AND NOT (id = ANY($2))")
            .bind(order_id.value())
            .bind(&kept)
            .execute(&mut *tx)
            .await?;

        for item in order.items_mut() {
            match item.id() {
                Some(item_id) => {
                    sqlx::query(
                        r#"
                        UPDATE order_items
                        SET product_id = $3, product_name = $4, product_sku = $5, quantity = $6, unit_price = $7, subtotal = $8
                        WHERE id = $1 AND order_id = $2
                        "#,
                    )
                    .bind(item_id.value())
                    .bind(order_id.value())
                    .bind(item.product_id().value())
                    .bind(item.product_name())
                    .bind(item.product_sku())
                    .bind(stored_quantity(item)?)
                    .bind(item.unit_price().amount())
                    .bind(item.subtotal().amount())
                    .execute(&mut *tx)
                    .await?;
                }
                None => {
                    let item_id = Self::insert_item(&mut tx, order_id, item).await?;
                    item.assign_id(item_id);
                }
            }
        }

        tx.commit().await?;
        metrics::counter!("order_store_updates_total").increment(1);

        // created_at is never rewritten, so reload it from the row
        match self.find_by_id(order_id).await? {
            Some(stored) => Ok(stored),
            None => Err(StoreError::OrderNotFound(order_id)),
        }
    }
}

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    #[tracing::instrument(skip(self))]
    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn find_by_order_number(&self, order_number: &OrderNumber) -> Result<Option<Order>> {
        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE order_number = $1"
        ))
        .bind(order_number.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn exists_by_order_number(&self, order_number: &OrderNumber) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM orders WHERE order_number = $1)")
                .bind(order_number.as_str())
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    #[tracing::instrument(skip(self, order), fields(order_number = %order.order_number()))]
    async fn save(&self, order: Order) -> Result<Order> {
        match order.id() {
            None => self.insert(order).await,
            Some(id) => self.update(id, order).await,
        }
    }

    async fn find_page(
        &self,
        query: OrderQuery,
        page: PageRequest,
        sort: OrderSort,
    ) -> Result<Page<Order>> {
        let user_id = query.user_id.map(|id| id.value());
        let status = query.status.map(|status| status.as_str());

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM orders
            WHERE ($1::BIGINT IS NULL OR user_id = $1)
              AND ($2::TEXT IS NULL OR status = $2)
            "#,
        )
        .bind(user_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        // Sort column and direction come from closed enums, never from input
        let sql = format!(
            r#"
            SELECT {ORDER_COLUMNS} FROM orders
            WHERE ($1::BIGINT IS NULL OR user_id = $1)
              AND ($2::TEXT IS NULL OR status = $2)
            ORDER BY {column} {direction}, id {direction}
            LIMIT $3 OFFSET $4
            "#,
            column = sort.field.column(),
            direction = sort.direction.as_sql(),
        );

        let rows = sqlx::query(&sql)
            .bind(user_id)
            .bind(status)
            .bind(i64::from(page.size()))
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        let content = self.hydrate(rows).await?;
        Ok(Page::new(content, page, total.max(0) as u64))
    }

    async fn find_created_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Order>> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE created_at BETWEEN $1 AND $2 \
             ORDER BY created_at ASC, id ASC"
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        self.hydrate(rows).await
    }

    async fn count_by_user_and_status(
        &self,
        user_id: UserId,
        status: OrderStatus,
    ) -> Result<u64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE user_id = $1 AND status = $2")
                .bind(user_id.value())
                .bind(status.as_str())
                .fetch_one(&self.pool)
                .await?;

        Ok(count.max(0) as u64)
    }
}

/// Converts an item quantity to the `INT` column type.
fn stored_quantity(item: &OrderItem) -> Result<i32> {
    i32::try_from(item.quantity()).map_err(|_| {
        StoreError::CorruptRecord(format!(
            "quantity {} of product {} exceeds the storable range",
            item.quantity(),
            item.product_id()
        ))
    })
}
