use std::collections::HashMap;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::{Path, Query, Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use uuid::Uuid;

use crate::book::{decimal_string, Side};
use crate::client::auth::{API_KEY_HEADER, PUBLIC_KEY_HEADER};
use crate::client::wire::{BeginAuctionBody, BeginAuctionResponse, CancelOrdersResponse, CreateOrderBody, CreateOrderResponse, CODE_OK};
use crate::mock::book::{BookError, MockBook};

pub const DEFAULT_LIMIT: usize = 10;
pub const MAX_LIMIT: usize = 1000;

/// Credential header seen on the most recent request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeenCredential {
    ApiKey(String),
    PublicKey(String),
}

/// Shared state behind the mock service: one book per symbol.
#[derive(Debug, Clone, Default)]
pub struct MockState {
    books: Arc<Mutex<HashMap<String, MockBook>>>,
    last_credential: Arc<Mutex<Option<SeenCredential>>>,
}

impl MockState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` against the book for `symbol`, creating it if needed.
    pub fn with_book<T>(&self, symbol: &str, f: impl FnOnce(&mut MockBook) -> T) -> T {
        let mut books = self.books.lock();
        f(books.entry(symbol.to_string()).or_default())
    }

    pub fn last_credential(&self) -> Option<SeenCredential> {
        self.last_credential.lock().clone()
    }
}

fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

fn credential(headers: &HeaderMap) -> Result<SeenCredential, &'static str> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .filter(|v| !v.trim().is_empty())
    };
    match (header(API_KEY_HEADER), header(PUBLIC_KEY_HEADER)) {
        (Some(key), _) => match key.strip_prefix("Bearer ") {
            Some(token) if !token.is_empty() => Ok(SeenCredential::ApiKey(token.to_string())),
            _ => Err("Malformed API key"),
        },
        (None, Some(public_key)) => Ok(SeenCredential::PublicKey(public_key)),
        (None, None) => Err("Missing credentials"),
    }
}

async fn require_credentials(State(state): State<MockState>, request: Request, next: Next) -> Response {
    let seen = match credential(request.headers()) {
        Ok(seen) => seen,
        Err(reason) => return json_error(StatusCode::UNAUTHORIZED, reason),
    };
    *state.last_credential.lock() = Some(seen);
    next.run(request).await
}

#[derive(Debug, Deserialize)]
struct DepthQuery {
    limit: Option<usize>,
}

async fn get_depth(State(state): State<MockState>, Path(symbol): Path<String>, Query(query): Query<DepthQuery>) -> Response {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    if limit == 0 || limit > MAX_LIMIT {
        return json_error(StatusCode::BAD_REQUEST, format!("Invalid limit: must be between 1 and {}", MAX_LIMIT));
    }
    let snapshot = state.with_book(&symbol, |book| book.depth(limit));
    let time = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as i64).unwrap_or_default();

    Json(json!({
        "code": CODE_OK,
        "data": {
            "asks": snapshot.asks,
            "bids": snapshot.bids,
            "symbol": symbol,
            "time": time,
        }
    }))
    .into_response()
}

async fn create_order(State(state): State<MockState>, Json(body): Json<CreateOrderBody>) -> Response {
    let Some(side) = Side::parse(&body.side) else {
        return json_error(StatusCode::BAD_REQUEST, "'side' is not valid");
    };
    let (Ok(price), Ok(size)) = (Decimal::from_str(&body.price), Decimal::from_str(&body.size)) else {
        return json_error(StatusCode::BAD_REQUEST, "'price' or 'size' is not a valid number format");
    };
    if body.client_order_id.trim().is_empty() {
        return json_error(StatusCode::BAD_REQUEST, "'clientOrderId' is required");
    }

    match state.with_book(&body.symbol, |book| book.add_order(side, price, size, &body.client_order_id)) {
        Ok(id) => Json(CreateOrderResponse { order_id: id.to_string() }).into_response(),
        Err(e @ BookError::DuplicateClientOrderId(_)) => json_error(StatusCode::CONFLICT, e.to_string()),
        Err(e) => json_error(StatusCode::BAD_REQUEST, e.to_string()),
    }
}

async fn cancel_all(State(state): State<MockState>) -> Response {
    let cancelled: Vec<String> = state
        .books
        .lock()
        .values_mut()
        .flat_map(|book| book.cancel_all())
        .map(|id| id.to_string())
        .collect();
    if cancelled.is_empty() {
        return json_error(StatusCode::NOT_FOUND, "No orders found");
    }
    Json(CancelOrdersResponse { cancelled_order_ids: cancelled }).into_response()
}

// Rejections are plain text, as the real service answers them.
async fn begin_auction(State(state): State<MockState>, Path(auction_id): Path<String>, Json(body): Json<BeginAuctionBody>) -> Response {
    if Uuid::parse_str(&auction_id).is_err() {
        return (StatusCode::BAD_REQUEST, "invalid auctionId").into_response();
    }
    let Some(side) = Side::parse(&body.side) else {
        return (StatusCode::BAD_REQUEST, "'side' is not valid").into_response();
    };
    let Ok(amount_in) = Decimal::from_str(&body.amount_in) else {
        return (StatusCode::BAD_REQUEST, "'amountIn' is not a valid number format").into_response();
    };

    match state.with_book(&body.symbol, |book| book.begin_auction(&auction_id, side, amount_in)) {
        Ok(amount_out) => Json(BeginAuctionResponse { auction_id, amount_out: decimal_string(amount_out) }).into_response(),
        Err(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    }
}

async fn abort_auction(State(state): State<MockState>, Path(auction_id): Path<String>) -> Response {
    let removed = state
        .books
        .lock()
        .values_mut()
        .any(|book| book.abort_auction(&auction_id).is_some());
    if removed {
        Json(json!({ "auctionId": auction_id })).into_response()
    } else {
        json_error(StatusCode::NOT_FOUND, "Auction not found")
    }
}

pub fn router(state: MockState) -> Router {
    Router::new()
        .route("/api/v1/orderbook/:symbol", get(get_depth))
        .route("/api/v1/order", post(create_order))
        .route("/api/v1/orders", delete(cancel_all))
        .route("/lh/v1/begin_auction/:auction_id", post(begin_auction))
        .route("/lh/v1/abort_auction/:auction_id", post(abort_auction))
        .layer(middleware::from_fn_with_state(state.clone(), require_credentials))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// A running mock service. The server task stops when this is dropped.
#[derive(Debug)]
pub struct MockServer {
    pub addr: SocketAddr,
    pub state: MockState,
    handle: JoinHandle<()>,
}

impl MockServer {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Binds an ephemeral localhost port and serves `router(state)` on it.
pub async fn spawn(state: MockState) -> std::io::Result<MockServer> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = router(state.clone());

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "Mock order book stopped");
        }
    });
    info!(%addr, "Mock order book listening");
    Ok(MockServer { addr, state, handle })
}
