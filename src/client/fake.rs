// Scripted in-memory OrderbookApi for unit tests of the harness logic.

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::StatusCode;

use crate::book::{AuctionRequest, DepthSnapshot, Order, Settlement};
use crate::client::OrderbookApi;
use crate::error::{ClientError, ClientResult};

type SettleFn = Box<dyn Fn(&AuctionRequest) -> ClientResult<Settlement> + Send + Sync>;

pub(crate) fn rejected(body: &str) -> ClientError {
    ClientError::Status { status: StatusCode::BAD_REQUEST, body: body.to_string() }
}

pub(crate) fn settled(amount_out: &str) -> ClientResult<Settlement> {
    Ok(Settlement { auction_id: None, amount_out: amount_out.to_string() })
}

pub(crate) struct FakeApi {
    pub snapshot: Option<DepthSnapshot>,
    pub settle: SettleFn,
    pub fail_cancel: bool,
    pub fail_order_at: Option<usize>,
    pub calls: Mutex<Vec<String>>,
    pub orders: Mutex<Vec<Order>>,
}

impl FakeApi {
    pub fn new(snapshot: Option<DepthSnapshot>) -> Self {
        Self {
            snapshot,
            settle: Box::new(|_| Err(rejected("no script"))),
            fail_cancel: false,
            fail_order_at: None,
            calls: Mutex::new(Vec::new()),
            orders: Mutex::new(Vec::new()),
        }
    }

    pub fn settling_with(mut self, settle: impl Fn(&AuctionRequest) -> ClientResult<Settlement> + Send + Sync + 'static) -> Self {
        self.settle = Box::new(settle);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl OrderbookApi for FakeApi {
    async fn depth(&self, _symbol: &str) -> ClientResult<DepthSnapshot> {
        self.calls.lock().push("depth".into());
        self.snapshot
            .clone()
            .ok_or_else(|| ClientError::Application { code: "ERR".into() })
    }

    async fn create_order(&self, order: &Order) -> ClientResult<String> {
        let mut orders = self.orders.lock();
        self.calls.lock().push(format!("order:{}", order.client_order_id));
        if self.fail_order_at == Some(orders.len()) {
            return Err(ClientError::MissingOrderId);
        }
        orders.push(order.clone());
        Ok(format!("oid-{}", orders.len()))
    }

    async fn cancel_all_orders(&self) -> ClientResult<()> {
        self.calls.lock().push("cancel".into());
        if self.fail_cancel {
            return Err(ClientError::Status { status: StatusCode::INTERNAL_SERVER_ERROR, body: "down".into() });
        }
        self.orders.lock().clear();
        Ok(())
    }

    async fn begin_auction(&self, request: &AuctionRequest) -> ClientResult<Settlement> {
        self.calls.lock().push(format!("auction:{}:{}", request.side, request.amount_in));
        (self.settle)(request)
    }

    async fn abort_auction(&self, auction_id: &str) -> ClientResult<()> {
        self.calls.lock().push(format!("abort:{}", auction_id));
        Ok(())
    }
}
