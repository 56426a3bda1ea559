//! Order creation request.

use common::{ProductId, UserId};
use domain::MAX_QUANTITY;
use serde::{Deserialize, Serialize};

use crate::error::{FieldError, FulfillmentError};

/// Longest accepted shipping or billing address, in characters.
pub const MAX_ADDRESS_LENGTH: usize = 500;

/// One requested product line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl OrderLineRequest {
    pub fn new(product_id: ProductId, quantity: u32) -> Self {
        Self {
            product_id,
            quantity,
        }
    }
}

/// Request to place a new order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub user_id: UserId,
    pub items: Vec<OrderLineRequest>,
    #[serde(default)]
    pub shipping_address: Option<String>,
    #[serde(default)]
    pub billing_address: Option<String>,
}

impl CreateOrderRequest {
    pub fn new(user_id: UserId, items: Vec<OrderLineRequest>) -> Self {
        Self {
            user_id,
            items,
            shipping_address: None,
            billing_address: None,
        }
    }

    pub fn with_shipping_address(mut self, address: impl Into<String>) -> Self {
        self.shipping_address = Some(address.into());
        self
    }

    pub fn with_billing_address(mut self, address: impl Into<String>) -> Self {
        self.billing_address = Some(address.into());
        self
    }

    /// Checks the request shape, collecting every field error.
    pub fn validate(&self) -> Result<(), FulfillmentError> {
        let mut errors = Vec::new();

        if self.items.is_empty() {
            errors.push(FieldError::new("items", "Order must have at least one item"));
        }
        for (index, line) in self.items.iter().enumerate() {
            if line.quantity < 1 {
                errors.push(FieldError::new(
                    format!("items[{index}].quantity"),
                    "Quantity must be at least 1",
                ));
            } else if line.quantity > MAX_QUANTITY {
                errors.push(FieldError::new(
                    format!("items[{index}].quantity"),
                    format!("Quantity must be at most {MAX_QUANTITY}"),
                ));
            }
        }

        if exceeds_limit(self.shipping_address.as_deref()) {
            errors.push(FieldError::new(
                "shipping_address",
                format!("Shipping address cannot exceed {MAX_ADDRESS_LENGTH} characters"),
            ));
        }
        if exceeds_limit(self.billing_address.as_deref()) {
            errors.push(FieldError::new(
                "billing_address",
                format!("Billing address cannot exceed {MAX_ADDRESS_LENGTH} characters"),
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(FulfillmentError::Validation(errors))
        }
    }
}

fn exceeds_limit(address: Option<&str>) -> bool {
    address.is_some_and(|a| a.chars().count() > MAX_ADDRESS_LENGTH)
}
