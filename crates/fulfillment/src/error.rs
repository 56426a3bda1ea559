//! Fulfillment error types.

use common::{OrderId, ProductId};
use domain::{OrderError, OrderNumber, OrderStatus};
use order_store::StoreError;
use serde::Serialize;
use thiserror::Error;

/// A rejected request field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Errors that can occur during order fulfillment operations.
#[derive(Debug, Error)]
pub enum FulfillmentError {
    /// The targeted order does not exist.
    #[error("Order not found with {field}: '{value}'")]
    OrderNotFound { field: &'static str, value: String },

    /// A requested product is unknown to the inventory service.
    #[error("Product not found with ID: {0}")]
    ProductNotFound(ProductId),

    /// A requested quantity is not available.
    #[error("Insufficient stock for product: {product_name}")]
    InsufficientStock {
        product_id: ProductId,
        product_name: String,
    },

    /// The status update is not in the transition table.
    #[error("{reason}")]
    InvalidStatusTransition {
        from: OrderStatus,
        to: OrderStatus,
        reason: String,
    },

    /// The order has left the cancellable statuses.
    #[error("Order cannot be cancelled in status: {0}")]
    NotCancellable(OrderStatus),

    /// The request failed validation before any work was done.
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    /// Order storage failed.
    #[error("Order store error: {0}")]
    Store(#[from] StoreError),
}

impl FulfillmentError {
    pub fn order_not_found(id: OrderId) -> Self {
        Self::OrderNotFound {
            field: "id",
            value: id.to_string(),
        }
    }

    pub fn order_number_not_found(order_number: &OrderNumber) -> Self {
        Self::OrderNotFound {
            field: "order_number",
            value: order_number.to_string(),
        }
    }

    /// Machine-readable category code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::OrderNotFound { .. } => "NOT_FOUND",
            Self::ProductNotFound(_) => "PRODUCT_NOT_FOUND",
            Self::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            Self::InvalidStatusTransition { .. } => "INVALID_STATUS_TRANSITION",
            Self::NotCancellable(_) => "INVALID_STATUS",
            Self::Validation(_) => "VALIDATION_FAILED",
            Self::Store(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns true if the targeted order does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::OrderNotFound { .. })
    }

    /// Returns true for rejections caused by domain policy.
    pub fn is_business_rule(&self) -> bool {
        matches!(
            self,
            Self::ProductNotFound(_)
                | Self::InsufficientStock { .. }
                | Self::InvalidStatusTransition { .. }
                | Self::NotCancellable(_)
        )
    }
}

impl From<OrderError> for FulfillmentError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::InvalidStatusTransition { from, to } => Self::InvalidStatusTransition {
                from,
                to,
                reason: err.to_string(),
            },
            OrderError::NotCancellable { status } => Self::NotCancellable(status),
            OrderError::InvalidQuantity { .. } => {
                Self::Validation(vec![FieldError::new("quantity", err.to_string())])
            }
            OrderError::InvalidPrice { .. } => {
                Self::Validation(vec![FieldError::new("unit_price", err.to_string())])
            }
            OrderError::AmountOverflow => {
                Self::Validation(vec![FieldError::new("items", err.to_string())])
            }
        }
    }
}

/// Convenience type alias for fulfillment results.
pub type Result<T> = std::result::Result<T, FulfillmentError>;
