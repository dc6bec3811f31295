use thiserror::Error;

use crate::db_types::{Order, OrderUpdate};

#[derive(Debug, Clone, Error)]
pub enum OrderGatewayError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order #{0} does not exist")]
    OrderNotFound(i64),
}

impl From<sqlx::Error> for OrderGatewayError {
    fn from(e: sqlx::Error) -> Self {
        OrderGatewayError::DatabaseError(e.to_string())
    }
}

/// The engine's narrow window onto the orders owned by the surrounding system.
#[allow(async_fn_in_trait)]
pub trait OrderGateway {
    /// Reads the order as it is committed right now. Implementations must not serve this from a cache.
    async fn read_for_claim(&self, order_id: i64) -> Result<Option<Order>, OrderGatewayError>;

    /// Applies the non-empty fields of `update` to the order. An empty update is a no-op.
    ///
    /// Returns [`OrderGatewayError::OrderNotFound`] if the order does not exist.
    async fn update_partial(&self, order_id: i64, update: OrderUpdate) -> Result<(), OrderGatewayError>;
}
