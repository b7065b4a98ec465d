// Wire behaviour of OrderbookClient against hand-built routers and the mock service.

use std::sync::Arc;

use auction_harness::book::{AuctionRequest, Order, Side};
use auction_harness::client::{ApiKeyAuth, OrderbookApi, OrderbookClient, PublicKeyAuth};
use auction_harness::error::ClientError;
use auction_harness::mock::{self, MockState, SeenCredential};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use rust_decimal_macros::dec;
use serde_json::json;
use tokio::net::TcpListener;

async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn api_key_client(base_url: String) -> OrderbookClient {
    OrderbookClient::new(base_url, Arc::new(ApiKeyAuth::new("abcdef12345").unwrap()))
}

fn order(cid: &str) -> Order {
    Order {
        symbol: "ETH-USD".into(),
        side: Side::BUY,
        price: dec!(2001),
        size: dec!(10),
        client_order_id: cid.into(),
    }
}

#[tokio::test]
async fn depth_with_error_code_is_an_application_error() {
    let app = Router::new().route(
        "/api/v1/orderbook/:symbol",
        get(|| async { Json(json!({ "code": "ERR", "data": null })) }),
    );
    let client = api_key_client(serve(app).await);

    match client.depth("ETH-USD").await {
        Err(ClientError::Application { code }) => assert_eq!(code, "ERR"),
        other => panic!("expected application error, got {:?}", other),
    }
}

#[tokio::test]
async fn depth_with_error_status_is_a_status_error() {
    let app = Router::new().route(
        "/api/v1/orderbook/:symbol",
        get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "book offline") }),
    );
    match api_key_client(serve(app).await).depth("ETH-USD").await {
        Err(ClientError::Status { status, body }) => {
            assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
            assert_eq!(body, "book offline");
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn depth_without_json_body_is_a_decode_error() {
    let app = Router::new().route("/api/v1/orderbook/:symbol", get(|| async { "not json" }));
    let err = api_key_client(serve(app).await).depth("ETH-USD").await.unwrap_err();
    assert!(matches!(err, ClientError::Decode(_)), "{:?}", err);
    assert!(!err.is_rejection());
}

#[tokio::test]
async fn null_sides_read_as_empty() {
    let app = Router::new().route(
        "/api/v1/orderbook/:symbol",
        get(|| async {
            Json(json!({ "code": "OK", "data": { "asks": [["2001", "10"]], "bids": null, "symbol": "ETH-USD", "time": 0 } }))
        }),
    );
    let depth = api_key_client(serve(app).await).depth("ETH-USD").await.unwrap();
    assert_eq!(depth.asks.len(), 1);
    assert!(depth.bids.is_empty());
}

#[tokio::test]
async fn cancel_without_json_body_succeeds() {
    let app = Router::new().route("/api/v1/orders", delete(|| async { "cancelled" }));
    api_key_client(serve(app).await).cancel_all_orders().await.unwrap();
}

#[tokio::test]
async fn cancel_server_error_is_reported() {
    let app = Router::new().route(
        "/api/v1/orders",
        delete(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let err = api_key_client(serve(app).await).cancel_all_orders().await.unwrap_err();
    assert!(matches!(err, ClientError::Status { status, .. } if status == StatusCode::INTERNAL_SERVER_ERROR));
}

#[tokio::test]
async fn accepted_order_without_id_is_an_error() {
    let app = Router::new().route("/api/v1/order", post(|| async { Json(json!({})) }));
    let err = api_key_client(serve(app).await).create_order(&order("c1")).await.unwrap_err();
    assert!(matches!(err, ClientError::MissingOrderId));
}

#[tokio::test]
async fn numeric_amount_out_is_accepted() {
    let app = Router::new().route(
        "/lh/v1/begin_auction/:id",
        post(|| async { Json(json!({ "amountOut": 60.5 })) }),
    );
    let request = AuctionRequest::new("ETH-USD", Side::BUY, dec!(1));
    let settlement = api_key_client(serve(app).await).begin_auction(&request).await.unwrap();
    assert_eq!(settlement.amount_out, "60.5");
}

#[tokio::test]
async fn mock_rejects_requests_without_credentials() {
    let server = mock::spawn(MockState::new()).await.unwrap();
    let response = reqwest::get(format!("{}/api/v1/orderbook/ETH-USD", server.base_url())).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn credentials_reach_the_service() {
    let server = mock::spawn(MockState::new()).await.unwrap();

    api_key_client(server.base_url()).cancel_all_orders().await.unwrap();
    assert_eq!(server.state.last_credential(), Some(SeenCredential::ApiKey("abcdef12345".into())));

    let client = OrderbookClient::new(server.base_url(), Arc::new(PublicKeyAuth::new("MFYwEAYHKoZI").unwrap()));
    assert_eq!(client.scheme(), "public-key");
    client.depth("ETH-USD").await.unwrap();
    assert_eq!(server.state.last_credential(), Some(SeenCredential::PublicKey("MFYwEAYHKoZI".into())));
}

#[tokio::test]
async fn duplicate_client_order_id_is_a_conflict() {
    let server = mock::spawn(MockState::new()).await.unwrap();
    let client = api_key_client(server.base_url());

    client.create_order(&order("same")).await.unwrap();
    let err = client.create_order(&order("same")).await.unwrap_err();
    assert!(matches!(err, ClientError::Status { status, .. } if status == StatusCode::CONFLICT));
    assert!(err.is_rejection());
}

#[tokio::test]
async fn aborting_an_unknown_auction_is_not_found() {
    let server = mock::spawn(MockState::new()).await.unwrap();
    let err = api_key_client(server.base_url())
        .abort_auction("00000000-0000-0000-0000-000000000000")
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Status { status, .. } if status == StatusCode::NOT_FOUND));
}
