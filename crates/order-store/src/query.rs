use common::{SortDirection, UserId};
use domain::{Order, OrderStatus};

/// Filter for paged order queries.
///
/// An empty query matches every order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderQuery {
    /// Filter by owning user.
    pub user_id: Option<UserId>,

    /// Filter by current status.
    pub status: Option<OrderStatus>,
}

impl OrderQuery {
    /// Creates a query matching every order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query for one user's orders.
    pub fn for_user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            ..Default::default()
        }
    }

    /// Creates a query for orders in one status.
    pub fn for_status(status: OrderStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// Filters by owning user.
    pub fn user_id(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Filters by status.
    pub fn status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Returns true if `order` satisfies every filter.
    pub fn matches(&self, order: &Order) -> bool {
        if let Some(user_id) = self.user_id
            && order.user_id() != user_id
        {
            return false;
        }
        if let Some(status) = self.status
            && order.status() != status
        {
            return false;
        }
        true
    }
}

/// Sortable order columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderSortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    TotalAmount,
    OrderNumber,
    Id,
}

impl OrderSortField {
    /// Parses a sort property in either `camelCase` or `snake_case`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "createdAt" | "created_at" => Some(Self::CreatedAt),
            "updatedAt" | "updated_at" => Some(Self::UpdatedAt),
            "totalAmount" | "total_amount" => Some(Self::TotalAmount),
            "orderNumber" | "order_number" => Some(Self::OrderNumber),
            "id" => Some(Self::Id),
            _ => None,
        }
    }

    /// Column name in the `orders` table.
    pub fn column(&self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
            Self::TotalAmount => "total_amount",
            Self::OrderNumber => "order_number",
            Self::Id => "id",
        }
    }
}

/// Sort order for paged queries. Defaults to newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OrderSort {
    pub field: OrderSortField,
    pub direction: SortDirection,
}

impl OrderSort {
    pub fn new(field: OrderSortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Compares two orders under this sort, breaking ties by id.
    pub fn compare(&self, a: &Order, b: &Order) -> std::cmp::Ordering {
        let ordering = match self.field {
            OrderSortField::CreatedAt => a.created_at().cmp(&b.created_at()),
            OrderSortField::UpdatedAt => a.updated_at().cmp(&b.updated_at()),
            OrderSortField::TotalAmount => a.total_amount().cmp(&b.total_amount()),
            OrderSortField::OrderNumber => a.order_number().as_str().cmp(b.order_number().as_str()),
            OrderSortField::Id => std::cmp::Ordering::Equal,
        }
        .then_with(|| a.id().cmp(&b.id()));

        match self.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}
