use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::book::{decimal_string, AuctionRequest, DepthSnapshot, Order, Settlement};
use crate::client::auth::AuthStrategy;
use crate::client::wire::{BeginAuctionBody, CreateOrderBody, CreateOrderResponse, DepthResponse, CODE_OK};
use crate::client::OrderbookApi;
use crate::error::{ClientError, ClientResult};

pub const DEFAULT_DEPTH_LIMIT: u32 = 20;

// What a successful call produced: a JSON document, or just the status for bodiless answers.
#[derive(Debug)]
enum Payload {
    Json(Value),
    Status(StatusCode),
}

fn expect_json<T: DeserializeOwned>(payload: Payload, what: &str) -> ClientResult<T> {
    match payload {
        Payload::Json(value) => serde_json::from_value(value)
            .map_err(|e| ClientError::Decode(format!("{}: {}", what, e))),
        Payload::Status(status) => Err(ClientError::Decode(format!(
            "{}: expected a JSON body, got bare status {}",
            what, status
        ))),
    }
}

/// HTTP client for the order-book service. Holds nothing between calls except the
/// connection pool, base URL and credential strategy.
#[derive(Clone, Debug)]
pub struct OrderbookClient {
    http: Client,
    base_url: String,
    auth: Arc<dyn AuthStrategy>,
    depth_limit: u32,
}

impl OrderbookClient {
    pub fn new(base_url: impl Into<String>, auth: Arc<dyn AuthStrategy>) -> Self {
        let base_url: String = base_url.into();
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
            depth_limit: DEFAULT_DEPTH_LIMIT,
        }
    }

    pub fn with_depth_limit(mut self, limit: u32) -> Self {
        self.depth_limit = limit;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn scheme(&self) -> &'static str {
        self.auth.scheme()
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.auth
            .authorize(self.http.request(method, url))
            .header(CONTENT_TYPE, "application/json")
    }

    async fn get(&self, path: &str) -> ClientResult<Payload> {
        self.send(self.request(Method::GET, path)).await
    }

    async fn post<B: Serialize + Sync + ?Sized>(&self, path: &str, body: Option<&B>) -> ClientResult<Payload> {
        let mut request = self.request(Method::POST, path);
        if let Some(body) = body {
            request = request.json(body);
        }
        self.send(request).await
    }

    async fn delete(&self, path: &str) -> ClientResult<Payload> {
        self.send(self.request(Method::DELETE, path)).await
    }

    async fn send(&self, request: RequestBuilder) -> ClientResult<Payload> {
        let response = request.send().await.map_err(|e| {
            warn!(error = %e, "Request to order book failed");
            ClientError::Transport(e)
        })?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %body.trim(), "Order book answered with an error status");
            return Err(ClientError::Status { status, body: body.trim().to_string() });
        }

        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map_or(false, |v| v.contains("application/json"));
        if !is_json {
            debug!(status = status.as_u16(), "Response carried no JSON body");
            return Ok(Payload::Status(status));
        }

        let value = response.json::<Value>().await.map_err(|e| {
            warn!(error = %e, "Order book sent malformed JSON");
            ClientError::Decode(e.to_string())
        })?;
        Ok(Payload::Json(value))
    }
}

#[async_trait]
impl OrderbookApi for OrderbookClient {
    #[instrument(skip(self))]
    async fn depth(&self, symbol: &str) -> ClientResult<DepthSnapshot> {
        let path = format!("/api/v1/orderbook/{}?limit={}", symbol, self.depth_limit);
        let response: DepthResponse = expect_json(self.get(&path).await?, "market depth")?;

        if response.code != CODE_OK {
            warn!(code = %response.code, "Failed to get market depth");
            return Err(ClientError::Application { code: response.code });
        }
        let snapshot = response
            .data
            .ok_or_else(|| ClientError::Decode("market depth: missing data".into()))?;
        debug!(asks = snapshot.asks.len(), bids = snapshot.bids.len(), "Fetched market depth");
        Ok(snapshot)
    }

    #[instrument(skip(self, order), fields(client_order_id = %order.client_order_id, side = %order.side))]
    async fn create_order(&self, order: &Order) -> ClientResult<String> {
        let body = CreateOrderBody {
            price: decimal_string(order.price),
            size: decimal_string(order.size),
            side: order.side.order_str().to_string(),
            symbol: order.symbol.clone(),
            client_order_id: order.client_order_id.clone(),
        };
        let response: CreateOrderResponse =
            expect_json(self.post("/api/v1/order", Some(&body)).await?, "create order")?;

        if response.order_id.is_empty() {
            warn!("Order accepted without an orderId");
            return Err(ClientError::MissingOrderId);
        }
        debug!(order_id = %response.order_id, price = %body.price, size = %body.size, "Order placed");
        Ok(response.order_id)
    }

    #[instrument(skip(self))]
    async fn cancel_all_orders(&self) -> ClientResult<()> {
        match self.delete("/api/v1/orders").await {
            Ok(payload) => {
                debug!(?payload, "Cancelled resting orders");
                Ok(())
            }
            // the service reports an already-empty book as not found
            Err(ClientError::Status { status, .. }) if status == StatusCode::NOT_FOUND => {
                info!("No resting orders to cancel");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self, request), fields(auction_id = %request.auction_id, side = %request.side, amount_in = %request.amount_in))]
    async fn begin_auction(&self, request: &AuctionRequest) -> ClientResult<Settlement> {
        let body = BeginAuctionBody {
            amount_in: request.amount_in.clone(),
            symbol: request.symbol.clone(),
            side: request.side.auction_str().to_string(),
        };
        let path = format!("/lh/v1/begin_auction/{}", request.auction_id);
        let settlement: Settlement = expect_json(self.post(&path, Some(&body)).await?, "begin auction")?;
        debug!(amount_out = %settlement.amount_out, "Auction settled");
        Ok(settlement)
    }

    #[instrument(skip(self))]
    async fn abort_auction(&self, auction_id: &str) -> ClientResult<()> {
        let path = format!("/lh/v1/abort_auction/{}", auction_id);
        self.post::<()>(&path, None).await?;
        debug!("Auction aborted");
        Ok(())
    }
}
