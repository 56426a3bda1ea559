//! Order endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{DEFAULT_PAGE_SIZE, OrderId, Page, PageRequest, SortDirection, UserId};
use domain::{OrderNumber, OrderStatus};
use fulfillment::{CreateOrderRequest, InventoryPort, OrderCoordinator, OrderResponse};
use order_store::{OrderQuery, OrderRepository, OrderSort, OrderSortField};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<R, I>
where
    R: OrderRepository,
    I: InventoryPort + 'static,
{
    pub coordinator: OrderCoordinator<R, I>,
}

type SharedState<R, I> = State<Arc<AppState<R, I>>>;

// -- Request types --

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl PageParams {
    fn page_request(&self) -> PageRequest {
        PageRequest::new(
            self.page.unwrap_or(0),
            self.size.unwrap_or(DEFAULT_PAGE_SIZE),
        )
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub sort_by: Option<String>,
    pub sort_dir: Option<String>,
    pub user_id: Option<i64>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusParams {
    pub status: String,
}

// -- Response types --

/// Success envelope shared by every order endpoint.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: T,
    pub timestamp: DateTime<Utc>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data,
            timestamp: Utc::now(),
        }
    }

    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::ok(data)
        }
    }
}

type OrderResult = Result<Json<ApiResponse<OrderResponse>>, ApiError>;
type PageResult = Result<Json<ApiResponse<Page<OrderResponse>>>, ApiError>;

// -- Handlers --

/// POST /api/v1/orders: place a new order.
#[tracing::instrument(skip(state, payload))]
pub async fn create<R: OrderRepository + 'static, I: InventoryPort + 'static>(
    State(state): SharedState<R, I>,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<OrderResponse>>), ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let order = state.coordinator.create(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("Order created successfully", order)),
    ))
}

/// GET /api/v1/orders/{id}: load one order.
#[tracing::instrument(skip(state, id))]
pub async fn get<R: OrderRepository + 'static, I: InventoryPort + 'static>(
    State(state): SharedState<R, I>,
    id: Result<Path<i64>, PathRejection>,
) -> OrderResult {
    let id = parse_order_id(id)?;
    let order = state.coordinator.get_by_id(id).await?;
    Ok(Json(ApiResponse::ok(order)))
}

/// GET /api/v1/orders/number/{order_number}: load one order by its number.
#[tracing::instrument(skip(state))]
pub async fn get_by_number<R: OrderRepository + 'static, I: InventoryPort + 'static>(
    State(state): SharedState<R, I>,
    Path(order_number): Path<String>,
) -> OrderResult {
    let order = state
        .coordinator
        .get_by_number(&OrderNumber::new(order_number))
        .await?;
    Ok(Json(ApiResponse::ok(order)))
}

/// GET /api/v1/orders: list orders, optionally filtered by user and status.
#[tracing::instrument(skip(state, params))]
pub async fn list<R: OrderRepository + 'static, I: InventoryPort + 'static>(
    State(state): SharedState<R, I>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> PageResult {
    let Query(params) = params.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let mut query = OrderQuery::new();
    if let Some(user_id) = params.user_id {
        query = query.user_id(UserId::new(user_id));
    }
    if let Some(status) = params.status.as_deref() {
        query = query.status(parse_status(status)?);
    }

    let field = match params.sort_by.as_deref() {
        Some(property) => OrderSortField::parse(property)
            .ok_or_else(|| ApiError::BadRequest(format!("Unknown sort property: {property}")))?,
        None => OrderSortField::default(),
    };
    let direction = params
        .sort_dir
        .as_deref()
        .map(SortDirection::parse_lenient)
        .unwrap_or_default();

    let page = PageRequest::new(
        params.page.unwrap_or(0),
        params.size.unwrap_or(DEFAULT_PAGE_SIZE),
    );
    let orders = state
        .coordinator
        .list(query, page, OrderSort::new(field, direction))
        .await?;
    Ok(Json(ApiResponse::ok(orders)))
}

/// GET /api/v1/orders/user/{user_id}: one user's orders, newest first.
#[tracing::instrument(skip(state, user_id, params))]
pub async fn by_user<R: OrderRepository + 'static, I: InventoryPort + 'static>(
    State(state): SharedState<R, I>,
    user_id: Result<Path<i64>, PathRejection>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> PageResult {
    let Path(user_id) = user_id.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let Query(params) = params.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let orders = state
        .coordinator
        .get_by_user(UserId::new(user_id), params.page_request())
        .await?;
    Ok(Json(ApiResponse::ok(orders)))
}

/// GET /api/v1/orders/status/{status}: orders in one status, newest first.
#[tracing::instrument(skip(state, params))]
pub async fn by_status<R: OrderRepository + 'static, I: InventoryPort + 'static>(
    State(state): SharedState<R, I>,
    Path(status): Path<String>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> PageResult {
    let status = parse_status(&status)?;
    let Query(params) = params.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let orders = state
        .coordinator
        .get_by_status(status, params.page_request())
        .await?;
    Ok(Json(ApiResponse::ok(orders)))
}

/// PATCH /api/v1/orders/{id}/status?status=X: move an order to a new status.
#[tracing::instrument(skip(state, id, params))]
pub async fn update_status<R: OrderRepository + 'static, I: InventoryPort + 'static>(
    State(state): SharedState<R, I>,
    id: Result<Path<i64>, PathRejection>,
    params: Result<Query<StatusParams>, QueryRejection>,
) -> OrderResult {
    let id = parse_order_id(id)?;
    let Query(params) = params.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let status = parse_status(&params.status)?;

    let order = state.coordinator.update_status(id, status).await?;
    Ok(Json(ApiResponse::with_message("Order status updated", order)))
}

/// POST /api/v1/orders/{id}/cancel: cancel an order and release its stock.
#[tracing::instrument(skip(state, id))]
pub async fn cancel<R: OrderRepository + 'static, I: InventoryPort + 'static>(
    State(state): SharedState<R, I>,
    id: Result<Path<i64>, PathRejection>,
) -> OrderResult {
    let id = parse_order_id(id)?;
    let order = state.coordinator.cancel(id).await?;
    Ok(Json(ApiResponse::with_message(
        "Order cancelled successfully",
        order,
    )))
}

fn parse_order_id(id: Result<Path<i64>, PathRejection>) -> Result<OrderId, ApiError> {
    let Path(id) = id.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    Ok(OrderId::new(id))
}

fn parse_status(status: &str) -> Result<OrderStatus, ApiError> {
    status
        .parse()
        .map_err(|e: domain::UnknownStatus| ApiError::BadRequest(e.to_string()))
}
