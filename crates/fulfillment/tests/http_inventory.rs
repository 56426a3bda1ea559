//! Tests for the HTTP inventory client against an in-process product service stub.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch};
use common::ProductId;
use domain::Money;
use fulfillment::{HttpInventoryClient, InventoryError, InventoryPort};
use serde::Deserialize;
use serde_json::json;

/// Product id whose lookup never answers within the client timeout.
const SLOW_PRODUCT: i64 = 99;

#[derive(Clone, Default)]
struct StubState {
    stock: Arc<Mutex<HashMap<i64, i64>>>,
}

#[derive(Deserialize)]
struct QuantityParam {
    quantity: i64,
}

fn product_json(id: i64, stock: i64) -> serde_json::Value {
    json!({
        "id": id,
        "name": "Widget",
        "description": "A widget",
        "sku": "WID-001",
        "price": 19.99,
        "stockQuantity": stock,
        "category": "tools",
        "active": true
    })
}

fn not_found(id: i64) -> Response {
    (
        StatusCode::NOT_FOUND,
        axum::Json(json!({
            "success": false,
            "message": format!("Product not found with id: '{id}'")
        })),
    )
        .into_response()
}

async fn get_product(Path(id): Path<i64>, State(state): State<StubState>) -> Response {
    if id == SLOW_PRODUCT {
        tokio::time::sleep(Duration::from_secs(2)).await;
    }
    let stock = state.stock.lock().unwrap().get(&id).copied();
    match stock {
        Some(stock) => axum::Json(json!({
            "success": true,
            "data": product_json(id, stock)
        }))
        .into_response(),
        None => not_found(id),
    }
}

async fn availability(
    Path(id): Path<i64>,
    Query(param): Query<QuantityParam>,
    State(state): State<StubState>,
) -> Response {
    let stock = state.stock.lock().unwrap().get(&id).copied();
    match stock {
        Some(stock) => axum::Json(json!({
            "success": true,
            "data": stock >= param.quantity
        }))
        .into_response(),
        None => not_found(id),
    }
}

async fn update_stock(
    Path(id): Path<i64>,
    Query(param): Query<QuantityParam>,
    State(state): State<StubState>,
) -> Response {
    let mut stock = state.stock.lock().unwrap();
    let Some(current) = stock.get_mut(&id) else {
        return not_found(id);
    };
    if *current + param.quantity < 0 {
        return (
            StatusCode::BAD_REQUEST,
            axum::Json(json!({
                "success": false,
                "message": "Insufficient stock for product: Widget"
            })),
        )
            .into_response();
    }
    *current += param.quantity;
    axum::Json(json!({ "success": true, "data": product_json(id, *current) })).into_response()
}

async fn spawn_stub(state: StubState) -> String {
    let app = Router::new()
        .route("/api/v1/products/{id}", get(get_product))
        .route("/api/v1/products/{id}/availability", get(availability))
        .route("/api/v1/products/{id}/stock", patch(update_stock))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}

async fn client_with_stock(stock: i64) -> (HttpInventoryClient, StubState) {
    let state = StubState::default();
    state.stock.lock().unwrap().insert(1, stock);
    state.stock.lock().unwrap().insert(SLOW_PRODUCT, 10);

    let base_url = spawn_stub(state.clone()).await;
    let client = HttpInventoryClient::new(base_url, Duration::from_millis(500)).unwrap();
    (client, state)
}

#[tokio::test]
async fn get_product_unwraps_envelope() {
    let (client, _) = client_with_stock(7).await;

    let product = client.get_product(ProductId::new(1)).await.unwrap();
    assert_eq!(product.id, ProductId::new(1));
    assert_eq!(product.name, "Widget");
    assert_eq!(product.sku, "WID-001");
    assert_eq!(product.price, Money::from_cents(1999));
    assert_eq!(product.stock_quantity, 7);
    assert!(product.active);
}

#[tokio::test]
async fn unknown_product_reads_as_absent() {
    let (client, _) = client_with_stock(7).await;

    assert!(client.get_product(ProductId::new(2)).await.is_none());
    assert!(!client.check_availability(ProductId::new(2), 1).await);
}

#[tokio::test]
async fn availability_follows_stock() {
    let (client, _) = client_with_stock(3).await;

    assert!(client.check_availability(ProductId::new(1), 3).await);
    assert!(!client.check_availability(ProductId::new(1), 4).await);
}

#[tokio::test]
async fn stock_delta_is_applied_remotely() {
    let (client, state) = client_with_stock(3).await;

    client
        .apply_stock_delta(ProductId::new(1), -2)
        .await
        .unwrap();
    assert_eq!(state.stock.lock().unwrap()[&1], 1);

    client.apply_stock_delta(ProductId::new(1), 4).await.unwrap();
    assert_eq!(state.stock.lock().unwrap()[&1], 5);
}

#[tokio::test]
async fn rejected_stock_delta_reports_status() {
    let (client, state) = client_with_stock(1).await;

    let result = client.apply_stock_delta(ProductId::new(1), -5).await;
    assert!(matches!(result, Err(InventoryError::Rejected(400))));
    assert_eq!(state.stock.lock().unwrap()[&1], 1);
}

#[tokio::test]
async fn slow_lookup_times_out_to_absent() {
    let (client, _) = client_with_stock(1).await;

    assert!(client.get_product(ProductId::new(SLOW_PRODUCT)).await.is_none());
}

#[tokio::test]
async fn unreachable_service_fails_closed() {
    // Bind and release a port so nothing is listening on it
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client =
        HttpInventoryClient::new(format!("http://{addr}/"), Duration::from_millis(500)).unwrap();
    assert_eq!(client.base_url(), format!("http://{addr}"));

    assert!(client.get_product(ProductId::new(1)).await.is_none());
    assert!(!client.check_availability(ProductId::new(1), 1).await);
    assert!(matches!(
        client.apply_stock_delta(ProductId::new(1), -1).await,
        Err(InventoryError::Http(_))
    ));
}
