//! HTTP adapter for the product service's inventory endpoints.

use std::time::Duration;

use async_trait::async_trait;
use common::ProductId;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::inventory::{InventoryError, InventoryPort, ProductSnapshot};

/// Response envelope used by the product service.
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    success: bool,
    data: Option<T>,
}

/// Inventory port backed by the product service REST API.
///
/// Every call carries the configured timeout. Read failures of any kind are
/// logged and resolved to "absent" or "unavailable".
#[derive(Debug, Clone)]
pub struct HttpInventoryClient {
    client: Client,
    base_url: String,
}

impl HttpInventoryClient {
    /// Creates a client for the product service at `base_url`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, InventoryError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn product_url(&self, product_id: ProductId) -> String {
        format!("{}/api/v1/products/{}", self.base_url, product_id)
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Option<T>, InventoryError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(InventoryError::Rejected(status.as_u16()));
        }

        let envelope: ApiEnvelope<T> = response.json().await?;
        Ok(if envelope.success { envelope.data } else { None })
    }
}

#[async_trait]
impl InventoryPort for HttpInventoryClient {
    #[tracing::instrument(skip(self))]
    async fn get_product(&self, product_id: ProductId) -> Option<ProductSnapshot> {
        let request = self.client.get(self.product_url(product_id));
        match self.fetch::<ProductSnapshot>(request).await {
            Ok(product) => product,
            Err(e) => {
                tracing::error!(%product_id, error = %e, "failed to fetch product");
                None
            }
        }
    }

    #[tracing::instrument(skip(self))]
    async fn check_availability(&self, product_id: ProductId, quantity: u32) -> bool {
        let request = self
            .client
            .get(format!("{}/availability", self.product_url(product_id)))
            .query(&[("quantity", quantity)]);
        match self.fetch::<bool>(request).await {
            Ok(available) => available.unwrap_or(false),
            Err(e) => {
                tracing::error!(%product_id, quantity, error = %e, "failed to check availability");
                false
            }
        }
    }

    #[tracing::instrument(skip(self))]
    async fn apply_stock_delta(
        &self,
        product_id: ProductId,
        delta: i64,
    ) -> Result<(), InventoryError> {
        let response = self
            .client
            .patch(format!("{}/stock", self.product_url(product_id)))
            .query(&[("quantity", delta)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(InventoryError::Rejected(status.as_u16()));
        }
        Ok(())
    }
}
