//! Order status lifecycle.

use serde::{Deserialize, Serialize};

/// The status of an order in its lifecycle.
///
/// Nominal flow:
/// ```text
/// Pending ──► Confirmed ──► Processing ──► Shipped ──► Delivered ──► Refunded
///    │            │              │
///    └────────────┴──────────────┴──► Cancelled
/// ```
///
/// `Cancelled` and `Refunded` are absorbing. Administrative status updates are
/// checked against [`OrderStatus::allowed_targets`], cancellation against
/// [`OrderStatus::can_cancel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Order created but not yet confirmed.
    #[default]
    Pending,

    /// Order confirmed.
    Confirmed,

    /// Order is being prepared for shipment.
    Processing,

    /// Order handed to the carrier.
    Shipped,

    /// Order delivered to the customer.
    Delivered,

    /// Order cancelled before fulfillment (terminal state).
    Cancelled,

    /// Order refunded after delivery (terminal state).
    Refunded,
}

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [OrderStatus; 7] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
        OrderStatus::Refunded,
    ];

    /// Transition table for status updates: the statuses this one may move to.
    ///
    /// Absorbing statuses have no targets and a delivered order may only be
    /// refunded. Every other status accepts any target.
    pub fn allowed_targets(&self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::Pending
            | OrderStatus::Confirmed
            | OrderStatus::Processing
            | OrderStatus::Shipped => &Self::ALL,
            OrderStatus::Delivered => &[OrderStatus::Refunded],
            OrderStatus::Cancelled | OrderStatus::Refunded => &[],
        }
    }

    /// Returns true if a status update from this status to `target` is allowed.
    pub fn can_transition_to(&self, target: OrderStatus) -> bool {
        self.allowed_targets().contains(&target)
    }

    /// Returns true if the order can be cancelled in this status.
    pub fn can_cancel(&self) -> bool {
        matches!(
            self,
            OrderStatus::Pending | OrderStatus::Confirmed | OrderStatus::Processing
        )
    }

    /// Returns true if this is an absorbing status.
    pub fn is_terminal(&self) -> bool {
        self.allowed_targets().is_empty()
    }

    /// Returns the wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Refunded => "REFUNDED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when a string does not name an order status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown order status: {0}")]
pub struct UnknownStatus(pub String);

impl std::str::FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}
