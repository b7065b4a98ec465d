// JSON bodies exchanged with the order-book service.
// Shared by the HTTP client and the mock service so both sides agree on field names.

use serde::{Deserialize, Serialize};

use crate::book::DepthSnapshot;

/// Application-level success code carried by the depth endpoint.
pub const CODE_OK: &str = "OK";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepthResponse {
    pub code: String,
    #[serde(default)]
    pub data: Option<DepthSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderBody {
    pub price: String,
    pub size: String,
    pub side: String,
    pub symbol: String,
    #[serde(rename = "ClientOrderId", alias = "clientOrderId")]
    pub client_order_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderResponse {
    #[serde(rename = "orderId", default)]
    pub order_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelOrdersResponse {
    #[serde(rename = "cancelledOrderIds", default)]
    pub cancelled_order_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeginAuctionBody {
    #[serde(rename = "amountIn")]
    pub amount_in: String,
    pub symbol: String,
    pub side: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeginAuctionResponse {
    #[serde(rename = "auctionId")]
    pub auction_id: String,
    #[serde(rename = "amountOut")]
    pub amount_out: String,
}
