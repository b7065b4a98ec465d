use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, info, instrument, trace, warn};
use uuid::Uuid;

use crate::book::{decimal_string, DepthLevel, DepthSnapshot, Side};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BookError {
    #[error("price must be positive, got {0}")]
    InvalidPrice(Decimal),

    #[error("size must be positive, got {0}")]
    InvalidQuantity(Decimal),

    #[error("order with clientOrderId {0} already exists")]
    DuplicateClientOrderId(String),

    #[error("insufficient liquidity for {side} auction")]
    InsufficientLiquidity { side: Side },

    #[error("auction {0} already exists")]
    DuplicateAuction(String),

    #[error("arithmetic overflow")]
    Overflow,
}

// Resting order in the book
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resting {
    pub id: Uuid,
    pub client_order_id: String,
    pub size: Decimal,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Level {
    queue: VecDeque<Resting>,
}

impl Level {
    fn total(&self) -> Decimal {
        self.queue.iter().map(|r| r.size).sum()
    }
}

/// Quote recorded for a begun auction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Auction {
    pub side: Side,
    pub amount_in: Decimal,
    pub amount_out: Decimal,
}

/// In-memory book for one symbol. Orders only rest here: crossing prices are not matched,
/// liquidity is consumed only by auction quotes.
#[derive(Debug, Default)]
pub struct MockBook {
    bids: BTreeMap<Decimal, Level>,
    asks: BTreeMap<Decimal, Level>,
    id_index: HashMap<Uuid, (Side, Decimal)>,
    client_ids: HashSet<String>,
    auctions: HashMap<String, Auction>,
}

impl MockBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn order_count(&self) -> usize {
        self.id_index.len()
    }

    #[instrument(skip(self))]
    pub fn add_order(&mut self, side: Side, price: Decimal, size: Decimal, client_order_id: &str) -> Result<Uuid, BookError> {
        if price <= Decimal::ZERO {
            return Err(BookError::InvalidPrice(price));
        }
        if size <= Decimal::ZERO {
            return Err(BookError::InvalidQuantity(size));
        }
        if !self.client_ids.insert(client_order_id.to_string()) {
            warn!("Rejecting order with clashing clientOrderId");
            return Err(BookError::DuplicateClientOrderId(client_order_id.to_string()));
        }

        let id = Uuid::new_v4();
        let level_map = match side {
            Side::BUY => &mut self.bids,
            Side::SELL => &mut self.asks,
        };
        level_map.entry(price).or_default().queue.push_back(Resting {
            id,
            client_order_id: client_order_id.to_string(),
            size,
        });
        self.id_index.insert(id, (side, price));
        debug!(%id, "Added order to book");
        Ok(id)
    }

    /// Removes every resting order and returns their ids.
    pub fn cancel_all(&mut self) -> Vec<Uuid> {
        let ids: Vec<Uuid> = self.id_index.keys().copied().collect();
        self.bids.clear();
        self.asks.clear();
        self.id_index.clear();
        self.client_ids.clear();
        info!(cancelled = ids.len(), "Cancelled all resting orders");
        ids
    }

    /// Top `limit` price levels per side with sizes summed per price.
    pub fn depth(&self, limit: usize) -> DepthSnapshot {
        let render = |(price, level): (&Decimal, &Level)| DepthLevel::new(decimal_string(*price), decimal_string(level.total()));
        DepthSnapshot {
            asks: self.asks.iter().take(limit).map(render).collect(),
            bids: self.bids.iter().rev().take(limit).map(render).collect(),
        }
    }

    /// What a sweep funded with `amount_in` pays out. A BUY spends quote against the asks from
    /// the lowest price up; a SELL spends base against the bids from the highest price down.
    /// Funding left unspent once the side is exhausted is an error, never a partial fill.
    pub fn amount_out(&self, side: Side, amount_in: Decimal) -> Result<Decimal, BookError> {
        if amount_in <= Decimal::ZERO {
            return Err(BookError::InvalidQuantity(amount_in));
        }
        let levels: Box<dyn Iterator<Item = (&Decimal, &Level)> + '_> = match side {
            Side::BUY => Box::new(self.asks.iter()),
            Side::SELL => Box::new(self.bids.iter().rev()),
        };

        let mut remaining = amount_in;
        let mut out = Decimal::ZERO;
        'sweep: for (price, level) in levels {
            for resting in &level.queue {
                if remaining <= Decimal::ZERO {
                    break 'sweep;
                }
                let gain = match side {
                    Side::BUY => {
                        let capacity = price.checked_mul(resting.size).ok_or(BookError::Overflow)?;
                        let spend = capacity.min(remaining);
                        remaining -= spend;
                        spend.checked_div(*price).ok_or(BookError::Overflow)?
                    }
                    Side::SELL => {
                        let spend = resting.size.min(remaining);
                        remaining -= spend;
                        price.checked_mul(spend).ok_or(BookError::Overflow)?
                    }
                };
                trace!(%price, %gain, %remaining, "Swept resting order");
                out = out.checked_add(gain).ok_or(BookError::Overflow)?;
            }
        }

        if remaining > Decimal::ZERO {
            warn!(%side, %amount_in, %remaining, "Insufficient liquidity");
            return Err(BookError::InsufficientLiquidity { side });
        }
        Ok(out)
    }

    pub fn begin_auction(&mut self, auction_id: &str, side: Side, amount_in: Decimal) -> Result<Decimal, BookError> {
        if self.auctions.contains_key(auction_id) {
            return Err(BookError::DuplicateAuction(auction_id.to_string()));
        }
        let amount_out = self.amount_out(side, amount_in)?;
        self.auctions.insert(auction_id.to_string(), Auction { side, amount_in, amount_out });
        info!(auction_id, %side, %amount_in, %amount_out, "Auction begun");
        Ok(amount_out)
    }

    pub fn abort_auction(&mut self, auction_id: &str) -> Option<Auction> {
        self.auctions.remove(auction_id)
    }

    pub fn auction(&self, auction_id: &str) -> Option<&Auction> {
        self.auctions.get(auction_id)
    }
}
