//! Order aggregate and related types.

mod aggregate;
mod item;
mod state;
mod value_objects;

pub use aggregate::{Order, OrderBuilder, OrderRecord};
pub use item::{MAX_QUANTITY, OrderItem, OrderItemRecord};
pub use state::{OrderStatus, UnknownStatus};
pub use value_objects::{Money, OrderNumber};

use thiserror::Error;

/// Errors raised by the order aggregate's own rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// The status update is not in the transition table.
    #[error("{}", rejected_transition_message(.from, .to))]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },

    /// Cancellation requested after the order left the cancellable statuses.
    #[error("Order cannot be cancelled in status: {status}")]
    NotCancellable { status: OrderStatus },

    /// Invalid quantity.
    #[error("Invalid quantity: {quantity} (must be between 1 and {max})", max = MAX_QUANTITY)]
    InvalidQuantity { quantity: u32 },

    /// Invalid price.
    #[error("Invalid price: {price} (must not be negative)")]
    InvalidPrice { price: Money },

    /// A subtotal or the order total does not fit the decimal range.
    #[error("Order amount exceeds the supported range")]
    AmountOverflow,
}

fn rejected_transition_message(from: &OrderStatus, to: &OrderStatus) -> String {
    if *from == OrderStatus::Delivered {
        "Delivered order can only be refunded".to_string()
    } else {
        format!("Cannot change status from {from} to {to}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_messages() {
        let err = OrderError::InvalidStatusTransition {
            from: OrderStatus::Cancelled,
            to: OrderStatus::Pending,
        };
        assert_eq!(err.to_string(), "Cannot change status from CANCELLED to PENDING");

        let err = OrderError::InvalidStatusTransition {
            from: OrderStatus::Delivered,
            to: OrderStatus::Shipped,
        };
        assert_eq!(err.to_string(), "Delivered order can only be refunded");
    }

    #[test]
    fn test_not_cancellable_message() {
        let err = OrderError::NotCancellable {
            status: OrderStatus::Shipped,
        };
        assert_eq!(err.to_string(), "Order cannot be cancelled in status: SHIPPED");
    }
}
