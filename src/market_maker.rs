use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};

use crate::book::{Order, Side};
use crate::client::OrderbookApi;
use crate::error::SeedError;

/// Deterministic client order id for the n-th seeded order (1-based).
pub fn client_order_id(n: u32) -> String {
    format!("{:08x}-0000-0000-0000-{:012x}", n, n)
}

/// Seeds the book with a fixed ladder so that verification math is exact.
#[derive(Debug, Clone)]
pub struct MarketMaker {
    pub symbol: String,
    pub depth: u32,
    pub price_step: Decimal,
    pub size_step: Decimal,
}

impl MarketMaker {
    pub const DEFAULT_DEPTH: u32 = 3;

    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            depth: Self::DEFAULT_DEPTH,
            price_step: Decimal::ONE,
            size_step: Decimal::TEN,
        }
    }

    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    /// Asks first, then bids. Level i (1-based) on either side sits at
    /// `base_price + i * price_step` with size `i * size_step`.
    pub fn ladder(&self, base_price: Decimal) -> Vec<Order> {
        let mut orders = Vec::with_capacity(2 * self.depth as usize);
        let mut n = 0;
        for side in [Side::SELL, Side::BUY] {
            for level in 1..=self.depth {
                n += 1;
                let fact = Decimal::from(level);
                orders.push(Order {
                    symbol: self.symbol.clone(),
                    side,
                    price: base_price + fact * self.price_step,
                    size: fact * self.size_step,
                    client_order_id: client_order_id(n),
                });
            }
        }
        orders
    }

    /// Cancel everything resting, then place the ladder. Stops at the first failure;
    /// a partial ladder is left in place because the next seed cancels it anyway.
    #[instrument(skip(self, api), fields(symbol = %self.symbol, depth = self.depth))]
    pub async fn seed<A: OrderbookApi + ?Sized>(&self, api: &A, base_price: Decimal) -> Result<(), SeedError> {
        if let Err(e) = api.cancel_all_orders().await {
            warn!(error = %e, "Could not clear resting orders");
            return Err(SeedError::Cancel(e));
        }

        let ladder = self.ladder(base_price);
        for order in &ladder {
            match api.create_order(order).await {
                Ok(order_id) => {
                    debug!(order_id = %order_id, side = %order.side, price = %order.price, size = %order.size, "Placed ladder order");
                }
                Err(source) => {
                    warn!(client_order_id = %order.client_order_id, error = %source, "Ladder order rejected");
                    return Err(SeedError::Place { client_order_id: order.client_order_id.clone(), source });
                }
            }
        }

        info!(orders = ladder.len(), %base_price, "Seeded market");
        Ok(())
    }
}
