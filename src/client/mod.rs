// Order-book service access: the api seam the harness drives, plus its HTTP implementation.

use async_trait::async_trait;

use crate::book::{AuctionRequest, DepthSnapshot, Order, Settlement};
use crate::error::ClientResult;

/// Operations the harness needs from the order-book service. Every call is a single
/// request/response; failures come back as `ClientError` and are never retried.
#[async_trait]
pub trait OrderbookApi: Send + Sync {
    async fn depth(&self, symbol: &str) -> ClientResult<DepthSnapshot>;

    /// Places a resting limit order and returns the service-assigned order id.
    async fn create_order(&self, order: &Order) -> ClientResult<String>;

    async fn cancel_all_orders(&self) -> ClientResult<()>;

    async fn begin_auction(&self, request: &AuctionRequest) -> ClientResult<Settlement>;

    /// Releases an auction begun with `begin_auction`.
    async fn abort_auction(&self, auction_id: &str) -> ClientResult<()>;
}

pub mod auth;
pub mod rest;
pub mod wire;

#[cfg(test)]
pub(crate) mod fake;

pub use auth::{ApiKeyAuth, AuthStrategy, PublicKeyAuth};
pub use rest::OrderbookClient;
