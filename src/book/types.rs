use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    BUY,
    SELL
}

impl Side {
    /// Spelling used by the order endpoint.
    pub fn order_str(&self) -> &'static str {
        match self {
            Side::BUY => "buy",
            Side::SELL => "sell",
        }
    }

    /// Spelling used by the auction endpoint.
    pub fn auction_str(&self) -> &'static str {
        match self {
            Side::BUY => "BUY",
            Side::SELL => "SELL",
        }
    }

    pub fn parse(s: &str) -> Option<Side> {
        if s.eq_ignore_ascii_case("buy") {
            Some(Side::BUY)
        } else if s.eq_ignore_ascii_case("sell") {
            Some(Side::SELL)
        } else {
            None
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.auction_str())
    }
}

/// Canonical text form of a decimal: no trailing zeros, no exponent.
pub fn decimal_string(value: Decimal) -> String {
    value.normalize().to_string()
}

// A decimal on the wire may arrive quoted ("2001") or bare (2001).
#[derive(Deserialize)]
#[serde(untagged)]
enum WireDecimal {
    Text(String),
    Number(serde_json::Number),
}

impl WireDecimal {
    fn into_text(self) -> String {
        match self {
            WireDecimal::Text(s) => s,
            WireDecimal::Number(n) => n.to_string(),
        }
    }
}

pub(crate) fn decimal_text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    WireDecimal::deserialize(d).map(WireDecimal::into_text)
}

// Go encodes an empty slice as `null`.
fn levels_or_empty<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<DepthLevel>, D::Error> {
    Ok(Option::<Vec<DepthLevel>>::deserialize(d)?.unwrap_or_default())
}

/// One price level of a depth snapshot, kept in the decimal text the service sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepthLevel {
    pub price: String,
    pub size: String,
}

impl DepthLevel {
    pub fn new(price: impl Into<String>, size: impl Into<String>) -> Self {
        Self { price: price.into(), size: size.into() }
    }
}

impl<'de> Deserialize<'de> for DepthLevel {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let (price, size) = <(WireDecimal, WireDecimal)>::deserialize(d)?;
        Ok(DepthLevel { price: price.into_text(), size: size.into_text() })
    }
}

impl Serialize for DepthLevel {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        (&self.price, &self.size).serialize(s)
    }
}

/// Asks ascending by price, bids descending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthSnapshot {
    #[serde(default, deserialize_with = "levels_or_empty")]
    pub asks: Vec<DepthLevel>,
    #[serde(default, deserialize_with = "levels_or_empty")]
    pub bids: Vec<DepthLevel>,
}

impl DepthSnapshot {
    /// The resting liquidity an auction on `side` sweeps: a BUY lifts asks, a SELL hits bids.
    pub fn liquidity_for(&self, side: Side) -> &[DepthLevel] {
        match side {
            Side::BUY => &self.asks,
            Side::SELL => &self.bids,
        }
    }
}

/// Totals over one side of a snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateLiquidity {
    pub quote_total: Decimal,
    pub base_total: Decimal,
}

impl AggregateLiquidity {
    /// Amount of the asset a sweep on `side` is funded with.
    pub fn funding(&self, side: Side) -> Decimal {
        match side {
            Side::BUY => self.quote_total,
            Side::SELL => self.base_total,
        }
    }

    /// Amount of the opposite asset a full sweep on `side` pays out.
    pub fn proceeds(&self, side: Side) -> Decimal {
        match side {
            Side::BUY => self.base_total,
            Side::SELL => self.quote_total,
        }
    }
}

// Auction as submitted to the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuctionRequest {
    pub auction_id: Uuid,
    pub symbol: String,
    pub side: Side,
    pub amount_in: String,
}

impl AuctionRequest {
    pub fn new(symbol: impl Into<String>, side: Side, amount_in: Decimal) -> Self {
        Self {
            auction_id: Uuid::new_v4(),
            symbol: symbol.into(),
            side,
            amount_in: decimal_string(amount_in),
        }
    }
}

/// Settlement the service quotes for a begun auction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settlement {
    #[serde(rename = "auctionId", default)]
    pub auction_id: Option<String>,
    #[serde(rename = "amountOut", deserialize_with = "decimal_text")]
    pub amount_out: String,
}

// Resting order placed while seeding the book
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub symbol: String,
    pub side: Side,
    pub price: Decimal,
    pub size: Decimal,
    pub client_order_id: String,
}
